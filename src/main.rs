#![no_std]
#![no_main]

mod peripherals;
mod system;

// Panic handler and debugging
use defmt::unwrap;

use defmt_rtt as _;
use panic_probe as _;

// Device
use embassy_embedded_hal::shared_bus::blocking::i2c::I2cDevice;
use embassy_executor::Spawner;
use embassy_nrf::{
    bind_interrupts,
    gpio::{Input, Level, Output, OutputDrive, Pull},
    interrupt::{self, InterruptExt, Priority},
    peripherals::{SPI2, TWISPI1},
    saadc::{self, ChannelConfig, Resolution, Saadc},
    spim,
    twim::{self, Twim},
};
use embassy_sync::{
    blocking_mutex::{
        raw::{NoopRawMutex, ThreadModeRawMutex},
        Mutex,
    },
    channel::Channel,
    signal::Signal,
};
use embassy_time::{with_timeout, Duration, Instant, Timer};
use nrf_softdevice::{
    ble::{gatt_server, peripheral},
    Softdevice,
};
use static_cell::StaticCell;

bind_interrupts!(struct Irqs {
    SAADC => saadc::InterruptHandler;
    SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1 => twim::InterruptHandler<TWISPI1>;
    SPIM2_SPIS2_SPI2 => spim::InterruptHandler<SPI2>;
});

// Crate
use peripherals::{
    backlight::Backlight,
    battery::Battery,
    button::Button,
    display::Display,
    touch::{TouchController, TouchGesture},
};
use system::{
    bluetooth::{
        self, BatteryServiceEvent, CurrentTimeServiceEvent, Message, MessageServiceEvent, Server,
        ServerEvent,
    },
    config::{SystemConfig, BRIGHTNESS, CLOCK_STYLE, TYPING_ANIMATION},
    time,
};

// Others
use chrono::Timelike;
use cmdtime::{
    clock, message::Dictionary, weather::Error as WeatherError, HoldLatch, Layout, Typist, Watchface,
    Weather,
};
use core::cell::RefCell;
use embedded_graphics::pixelcolor::{Rgb565, RgbColor};

/// Events handled by the watch face, in arrival order
enum UiEvent {
    /// Minute boundary passed or the clock was set
    Tick,
    /// Dictionary written to the inbox by the phone
    Inbox(Message),
    /// Switch between 12 and 24 hour display
    ToggleClockStyle,
}

// Communication channels
static EVENTS: Channel<ThreadModeRawMutex, UiEvent, 4> = Channel::new();
static BUTTON_PRESSED: Signal<ThreadModeRawMutex, ()> = Signal::new();
static TIME_SYNCED: Signal<ThreadModeRawMutex, ()> = Signal::new();

static SERVER: StaticCell<Server> = StaticCell::new();
static I2C_BUS: StaticCell<Mutex<NoopRawMutex, RefCell<Twim<'static, TWISPI1>>>> =
    StaticCell::new();

/// Run the SoftDevice event loop.
#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Advertise, then serve the phone until it disconnects.
#[embassy_executor::task]
async fn ble_task(sd: &'static Softdevice, server: &'static Server) {
    let config = peripheral::Config::default();
    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &bluetooth::ADV_DATA,
            scan_data: &bluetooth::SCAN_DATA,
        };
        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(err) => {
                defmt::error!("Advertising failed: {:?}", err);
                Timer::after(Duration::from_secs(1)).await;
                continue;
            }
        };
        defmt::info!("Phone connected");

        gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Bas(BatteryServiceEvent::BatteryLevelCccdWrite { notifications }) => {
                defmt::debug!("Battery notifications: {}", notifications);
            }
            ServerEvent::Cts(CurrentTimeServiceEvent::CurrentTimeWrite(bytes)) => {
                match clock::parse_current_time(&bytes) {
                    Ok(local) => {
                        time::sync(local);
                        TIME_SYNCED.signal(());
                    }
                    Err(err) => defmt::warn!("Invalid current time: {:?}", err),
                }
            }
            ServerEvent::Messages(MessageServiceEvent::InboxWrite(message)) => {
                if EVENTS.try_send(UiEvent::Inbox(message)).is_err() {
                    defmt::error!("Message dropped!");
                }
            }
            ServerEvent::Messages(MessageServiceEvent::OutboxCccdWrite { notifications }) => {
                if notifications {
                    match server.request_weather(&conn) {
                        Ok(()) => defmt::info!("Outbox send success!"),
                        Err(err) => defmt::error!("Outbox send failed! {:?}", err),
                    }
                }
            }
        })
        .await;

        defmt::info!("Phone disconnected");
    }
}

/// Post a tick on every wall clock minute.
#[embassy_executor::task]
async fn minute_tick() {
    loop {
        let wait = clock::until_next_minute(&time::now());
        // A time sync moves the next minute boundary, tick right away
        if with_timeout(to_embassy(wait), TIME_SYNCED.wait())
            .await
            .is_ok()
        {
            defmt::info!("Clock synchronised");
        }
        EVENTS.send(UiEvent::Tick).await;
    }
}

/// Own the watch face and redraw it after every event.
#[embassy_executor::task]
async fn update_lcd(mut display: Display<SPI2>) {
    let mut face = Watchface::load(Layout::default(), CLOCK_STYLE);
    let mut weather = Weather::new();
    let mut typist = Typist::new();
    let mut next_step: Option<Instant> = None;

    // Show the prompts right away instead of waiting for the first minute
    face.tick(&time::now());

    loop {
        if let Err(err) = display.draw(&mut face) {
            defmt::error!("Display update failed: {:?}", err);
        }

        let event = match next_step {
            Some(at) => {
                let remaining = at.saturating_duration_since(Instant::now());
                with_timeout(remaining, EVENTS.receive()).await.ok()
            }
            None => Some(EVENTS.receive().await),
        };

        match event {
            None => {
                next_step = typist
                    .step(&mut face)
                    .map(|delay| Instant::now() + to_embassy(delay));
            }
            Some(UiEvent::Tick) => {
                let now = time::now();
                defmt::info!("Current time: {}:{}", now.hour(), now.minute());
                if TYPING_ANIMATION {
                    face.set_time(&now);
                    next_step = Some(Instant::now() + to_embassy(typist.start(&mut face)));
                } else {
                    face.tick(&now);
                }
            }
            Some(UiEvent::Inbox(message)) => handle_inbox(&message, &mut weather, &mut face),
            Some(UiEvent::ToggleClockStyle) => {
                let style = face.clock_style().toggled();
                defmt::info!("Clock style: {:?}", style);
                face.set_clock_style(style);
            }
        }
    }
}

/// Apply a weather dictionary from the phone
fn handle_inbox(message: &[u8], weather: &mut Weather, face: &mut Watchface) {
    let dict = match Dictionary::parse(message) {
        Ok(dict) => dict,
        Err(err) => {
            defmt::error!("Message dropped! {:?}", err);
            return;
        }
    };

    let applied = weather.apply_dictionary(&dict, |err| match err {
        WeatherError::UnrecognizedKey(key) => defmt::error!("Key {} not recognized!", key),
        other => defmt::error!("Weather tuple rejected: {:?}", other),
    });

    if applied > 0 {
        let summary = weather.summary();
        defmt::info!("Weather: {}", summary.as_str());
        face.set_weather(&summary);
    }
}

/// Polls the button state every 10ms
#[embassy_executor::task]
async fn poll_button(mut button: Button) {
    loop {
        if button.pressed().await {
            BUTTON_PRESSED.signal(());
        }

        // Re-schedule the timer interrupt in 10ms
        Timer::after(Duration::from_millis(10)).await;
    }
}

/// Update backlight brightness
#[embassy_executor::task]
async fn update_brightness(mut backlight: Backlight) {
    loop {
        BUTTON_PRESSED.wait().await;
        backlight.cycle();
        defmt::info!("Backlight brightness: {}", backlight.brightness());
    }
}

/// Polls the touch controller every 20ms
#[embassy_executor::task]
async fn poll_touch(mut touch: TouchController<TWISPI1>) {
    let mut hold = HoldLatch::new();
    loop {
        if let Some((gesture, lifted)) = touch.try_event_detected() {
            let long_press = matches!(gesture, TouchGesture::LongPress) && !lifted;
            if hold.report(long_press, time::uptime()) {
                EVENTS.send(UiEvent::ToggleClockStyle).await;
            }
        }

        Timer::after(Duration::from_millis(20)).await;
    }
}

/// Publish the battery level over BLE once a minute.
#[embassy_executor::task]
async fn update_battery(mut battery: Battery, server: &'static Server) {
    loop {
        let percent = battery.percent().await;
        defmt::info!(
            "Battery status: {} ({})",
            percent,
            if battery.is_charging() {
                "charging"
            } else {
                "discharging"
            }
        );
        if let Err(err) = server.bas.battery_level_set(&percent) {
            defmt::warn!("Battery level not published: {:?}", err);
        }

        Timer::after(Duration::from_secs(60)).await;
    }
}

fn to_embassy(duration: core::time::Duration) -> Duration {
    Duration::from_micros(duration.as_micros() as u64)
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let mut p = embassy_nrf::init(SystemConfig::new());
    defmt::info!("Initializing");

    // Priorities 0, 1 and 4 are reserved for the SoftDevice
    interrupt::SAADC.set_priority(Priority::P3);
    interrupt::SPIM1_SPIS1_TWIM1_TWIS1_SPI1_TWI1.set_priority(Priority::P3);
    interrupt::SPIM2_SPIS2_SPI2.set_priority(Priority::P3);

    // Initialize Bluetooth
    let sd = Softdevice::enable(&bluetooth::softdevice_config());
    let server: &'static Server = SERVER.init(unwrap!(Server::new(sd)));
    let sd: &'static Softdevice = sd;
    unwrap!(spawner.spawn(softdevice_task(sd)));

    // Initialize SAADC
    let mut saadc_config = saadc::Config::default();
    // Set resolution to 12bit, necessary for correct battery status calculation
    saadc_config.resolution = Resolution::_12BIT;
    // Pin P0.31: Voltage level
    let channel_config = ChannelConfig::single_ended(&mut p.P0_31);
    let saadc = Saadc::new(p.SAADC, Irqs, saadc_config, [channel_config]);
    saadc.calibrate().await;

    // Initialize Battery
    let battery = Battery::init(saadc, Input::new(p.P0_12, Pull::None));

    // Initialize Backlight
    let backlight = unwrap!(Backlight::init(
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        Output::new(p.P0_22, Level::High, OutputDrive::Standard),
        Output::new(p.P0_23, Level::High, OutputDrive::Standard),
        BRIGHTNESS,
    ));

    // Initialize Button
    let button = Button::init(
        Input::new(p.P0_13, Pull::None),
        Output::new(p.P0_15, Level::Low, OutputDrive::Standard),
    );

    // Initialize I2C
    let mut i2c_config = twim::Config::default();
    // Use I2C at 400KHz (the fastest clock available on the nRF52832),
    i2c_config.frequency = twim::Frequency::K400;
    let i2c_bus = I2C_BUS.init(Mutex::new(RefCell::new(Twim::new(
        p.TWISPI1, Irqs, p.P0_06, p.P0_07, i2c_config,
    ))));

    // Initialize touch controller
    let touch = TouchController::init(
        I2cDevice::new(i2c_bus),
        Input::new(p.P0_28, Pull::Up), // Touchpad external interrupt pin: P0.28/AIN4 (TP_INT)
        Output::new(p.P0_10, Level::High, OutputDrive::Standard), // Touchpad reset pin: P0.10/NFC2 (TP_RESET)
    );

    // Initialize SPI
    let mut spim_config = spim::Config::default();
    // Use SPI at 8MHz (the fastest clock available on the nRF52832),
    // otherwise refreshing will be super slow.
    spim_config.frequency = spim::Frequency::M8;
    // SPI must be used in mode 3. Mode 0 (the default) won't work.
    spim_config.mode = spim::MODE_3;
    let spim = spim::Spim::new(p.SPI2, Irqs, p.P0_02, p.P0_04, p.P0_03, spim_config);

    // Initialize LCD
    let mut display = unwrap!(Display::init(
        spim,
        Output::new(p.P0_25, Level::High, OutputDrive::Standard),
        Output::new(p.P0_18, Level::Low, OutputDrive::Standard),
        Output::new(p.P0_26, Level::Low, OutputDrive::Standard),
    ));
    unwrap!(display.clear(Rgb565::BLACK));

    defmt::info!("Initialization finished");

    // Schedule tasks
    unwrap!(spawner.spawn(ble_task(sd, server)));
    unwrap!(spawner.spawn(minute_tick()));
    unwrap!(spawner.spawn(update_lcd(display)));
    unwrap!(spawner.spawn(poll_button(button)));
    unwrap!(spawner.spawn(update_brightness(backlight)));
    unwrap!(spawner.spawn(poll_touch(touch)));
    unwrap!(spawner.spawn(update_battery(battery, server)));
}
