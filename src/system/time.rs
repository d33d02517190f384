//! Time keeping module for PineTime
//!
//! The clock runs in local time. It starts from the firmware build time and
//! is replaced whenever the phone writes the Current Time characteristic.

use core::{cell::RefCell, time::Duration};

use chrono::{DateTime, NaiveDateTime};
use cmdtime::clock::{self, Clock};
use embassy_sync::blocking_mutex::{raw::ThreadModeRawMutex, Mutex};
use embassy_time::Instant;

use super::config::TIMEZONE;

// Include current UTC epoch at compile time
include!(concat!(env!("OUT_DIR"), "/utc.rs"));

static CLOCK: Mutex<ThreadModeRawMutex, RefCell<Option<Clock>>> = Mutex::new(RefCell::new(None));

/// Time since boot
pub(crate) fn uptime() -> Duration {
    Duration::from_micros(Instant::now().as_micros())
}

/// Local time the firmware was built at
fn build_time() -> NaiveDateTime {
    let utc = DateTime::from_timestamp(UTC_EPOCH, 0)
        .map(|time| time.naive_utc())
        .unwrap_or_default();
    clock::local_time(utc, TIMEZONE)
}

/// Current local time
pub fn now() -> NaiveDateTime {
    CLOCK.lock(|cell| {
        let mut clock = cell.borrow_mut();
        clock.get_or_insert_with(|| Clock::new(build_time())).now(uptime())
    })
}

/// Set the clock to `local`, as received from the phone
pub fn sync(local: NaiveDateTime) {
    let uptime = uptime();
    CLOCK.lock(|cell| {
        let mut clock = cell.borrow_mut();
        match clock.as_mut() {
            Some(clock) => clock.sync(local, uptime),
            None => {
                let mut fresh = Clock::new(local);
                fresh.sync(local, uptime);
                *clock = Some(fresh);
            }
        }
    });
}
