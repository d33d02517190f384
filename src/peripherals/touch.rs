//! Touch controller module for PineTime

pub use cst816s::TouchGesture;

use cst816s::CST816S;
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_nrf::{
    gpio::{Input, Output},
    peripherals::{P0_10, P0_28},
    twim::{self, Twim},
};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::Delay;

/// Event action reported when the finger leaves the panel
const LIFT_UP: u8 = 1;

type TouchPad<TWI> = CST816S<
    I2cDevice<'static, NoopRawMutex, Twim<'static, TWI>>,
    Input<'static, P0_28>,
    Output<'static, P0_10>,
>;

pub struct TouchController<TWI>
where
    TWI: twim::Instance,
{
    touchpad: TouchPad<TWI>,
}

impl<TWI> TouchController<TWI>
where
    TWI: twim::Instance,
{
    /// Reset and configure the touch controller on boot
    pub fn init(
        twi: I2cDevice<'static, NoopRawMutex, Twim<'static, TWI>>,
        interrupt_pin: Input<'static, P0_28>,
        reset_pin: Output<'static, P0_10>,
    ) -> Self {
        let mut touchpad = CST816S::new(twi, interrupt_pin, reset_pin);
        if touchpad.setup(&mut Delay).is_err() {
            defmt::warn!("Touch controller setup failed");
        }
        Self { touchpad }
    }

    /// Pending touch event, if any, as its gesture and whether the finger lifted
    pub fn try_event_detected(&mut self) -> Option<(TouchGesture, bool)> {
        self.touchpad
            .read_one_touch_event(true)
            .map(|event| (event.gesture, event.action == LIFT_UP))
    }
}
