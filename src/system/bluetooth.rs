//! Bluetooth module
//!
//! The phone talks to the watch through three GATT services:
//! - Battery Service, read only
//! - Current Time Service, the phone writes the local time
//! - Message service, dictionaries in both directions (inbox and outbox)

// Core
use core::mem;

// BLE
use nrf_softdevice::{
    self,
    ble::{
        advertisement_builder::{
            Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
            ServiceUuid16,
        },
        Connection,
    },
    raw, Config,
};

// Others
use cmdtime::{message, weather};
use heapless::Vec;

use super::config::DEVICE_NAME;

/// Largest dictionary exchanged with the phone
pub const MESSAGE_LEN: usize = 128;

/// Raw dictionary as carried by the inbox and outbox characteristics
pub type Message = Vec<u8, MESSAGE_LEN>;

/// Message service UUID in little endian byte order for advertising
const MESSAGE_SERVICE_UUID: [u8; 16] = [
    0xa1, 0xf0, 0xe1, 0xd7, 0x63, 0x6d, 0x3e, 0x9f, 0x4a, 0x4b, 0x7e, 0x4c, 0x01, 0x00, 0x6c,
    0x8e,
];

pub static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(ServiceList::Incomplete, &[ServiceUuid16::BATTERY])
    .full_name("cmdtime")
    .build();

pub static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(ServiceList::Complete, &[MESSAGE_SERVICE_UUID])
    .build();

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub bas: BatteryService,
    pub cts: CurrentTimeService,
    pub messages: MessageService,
}

#[nrf_softdevice::gatt_service(uuid = "180f")]
pub struct BatteryService {
    #[characteristic(uuid = "2a19", read, notify)]
    pub battery_level: u8,
}

#[nrf_softdevice::gatt_service(uuid = "1805")]
pub struct CurrentTimeService {
    #[characteristic(uuid = "2a2b", read, write)]
    pub current_time: [u8; 10],
}

#[nrf_softdevice::gatt_service(uuid = "8e6c0001-4c7e-4b4a-9f3e-6d63d7e1f0a1")]
pub struct MessageService {
    /// Phone to watch
    #[characteristic(uuid = "8e6c0002-4c7e-4b4a-9f3e-6d63d7e1f0a1", write)]
    pub inbox: Message,
    /// Watch to phone
    #[characteristic(uuid = "8e6c0003-4c7e-4b4a-9f3e-6d63d7e1f0a1", read, notify)]
    pub outbox: Message,
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    /// Outgoing dictionary could not be encoded
    Encode(message::Error),
    /// Encoded dictionary exceeds the characteristic size
    TooLong,
    /// Notification was not sent, e.g. the phone unsubscribed
    Notify,
}

impl From<message::Error> for Error {
    fn from(err: message::Error) -> Self {
        Self::Encode(err)
    }
}

impl Server {
    /// Send a weather request through the outbox
    pub fn request_weather(&self, conn: &Connection) -> Result<(), Error> {
        let mut buf = [0u8; 16];
        let request = weather::weather_request(&mut buf)?;
        let value = Message::from_slice(request).map_err(|_| Error::TooLong)?;
        self.messages
            .outbox_notify(conn, &value)
            .map_err(|_| Error::Notify)
    }
}

/// SoftDevice configuration
pub fn softdevice_config() -> Config {
    Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 256 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}
