//! Mailbox sentinel firmware entry point.
//!
//! One boot is one episode: classify the wake, sample, publish what
//! changed, re-arm the wake sources and go back to deep sleep.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   MqttLink+WifiAdapter   LogEventSink         │
//! │  (SensorPort)      (Link + NetworkInfo)   (EventSink)          │
//! │  SleepController   RtcRetained            NvsAdapter  RtcClock │
//! │  (PowerPort)       (RetainedPort)         (Config)    (Clock)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Switch channels · Motion FSM · Telemetry · Wake plan  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use mailbox_sentinel::adapters::device_id;
use mailbox_sentinel::adapters::hardware::HardwareAdapter;
use mailbox_sentinel::adapters::log_sink::LogEventSink;
use mailbox_sentinel::adapters::mqtt::{BrokerSettings, MqttLink};
use mailbox_sentinel::adapters::nvs::NvsAdapter;
use mailbox_sentinel::adapters::power::SleepController;
use mailbox_sentinel::adapters::rtc_memory::RtcRetained;
use mailbox_sentinel::adapters::time::RtcClock;
use mailbox_sentinel::adapters::wifi::{ConnectivityPort, WifiAdapter};
use mailbox_sentinel::app::events::AppEvent;
use mailbox_sentinel::app::ports::{ConfigPort, EventSink, PowerPort, RetainedPort};
use mailbox_sentinel::app::service::AppService;
use mailbox_sentinel::config::SystemConfig;
use mailbox_sentinel::drivers::hw_init;
use mailbox_sentinel::drivers::watchdog::{self, Watchdog};
use mailbox_sentinel::sensors::SensorHub;
use mailbox_sentinel::sensors::battery::BatteryMonitor;
use mailbox_sentinel::sensors::dht22::Dht22;
use mailbox_sentinel::wake::{self, WakeCause, WakePlan};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("mailbox-sentinel v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Config from NVS (or defaults) ──────────────────────
    let nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals(&config) {
        // Wake inputs still read through the RTC mux; vbat reads NaN.
        error!("HAL init failed: {}", e);
    }
    let watchdog = Watchdog::new(watchdog::episode_timeout_ms(&config));

    // ── 4. Wake cause + retained state ────────────────────────
    let mut power = SleepController::new();
    let mut rtc = RtcRetained::new();
    let retained = rtc.load();
    let cause = wake::classify(power.wake_source(), retained.as_ref(), &config.pin_map());
    info!("Boot: {:?}", cause);

    // ── 5. Sensors ────────────────────────────────────────────
    let mut sink = LogEventSink::new();
    let peripherals = Peripherals::take()?;

    // SAFETY: pin numbers come from validated config and each is claimed once.
    let (sda, scl, dht_pin) = unsafe {
        (
            AnyIOPin::new(i32::from(config.pin_i2c_sda)),
            AnyIOPin::new(i32::from(config.pin_i2c_scl)),
            AnyIOPin::new(i32::from(config.pin_dht_data)),
        )
    };
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        sda,
        scl,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let dht = Dht22::new(PinDriver::input_output_od(dht_pin)?, Ets);
    let battery = BatteryMonitor::new(
        hw_init::adc1_channel(config.pin_vbat).unwrap_or(u32::MAX),
        config.vbat_divider_ratio,
    );
    let (hub, missing) = SensorHub::new(
        i2c,
        config.ina_solar_addr,
        config.ina_battery_addr,
        dht,
        battery,
        config.pin_map(),
    );
    for name in missing {
        sink.emit(&AppEvent::SensorUnavailable(name));
    }
    let mut hw = HardwareAdapter::new(hub);

    // ── 6. Messaging link (radio stays off until first publish) ─
    let sysloop = EspSystemEventLoop::take()?;
    let wifi_driver = BlockingWifi::wrap(
        EspWifi::new(peripherals.modem, sysloop.clone(), EspDefaultNvsPartition::take().ok())?,
        sysloop,
    )?;
    let mut wifi = WifiAdapter::new(wifi_driver);
    if let Err(e) = wifi.set_credentials(&config.wifi_ssid, &config.wifi_password) {
        warn!("WiFi credentials rejected: {}", e);
    }
    let client_id = device_id::resolve_client_id(&config.client_id, &device_id::read_mac());
    let mut link = MqttLink::new(wifi, BrokerSettings::from_config(&config, client_id));

    // ── 7. Episodes ───────────────────────────────────────────
    let clock = RtcClock::new();
    let mut app = AppService::new(config.clone(), retained.unwrap_or_default());
    let mut delay = FreeRtos;
    let mut cause = cause;

    loop {
        let report = app.run_episode(cause, &mut hw, &mut link, &mut delay, &clock, &mut sink);
        rtc.store(app.state());
        watchdog.feed();

        match report.plan {
            WakePlan::Stay { .. } => {
                power.enter_low_power(&report.plan);
                cause = WakeCause::Poll;
            }
            WakePlan::DeepSleep { .. } => {
                link.shutdown();
                power.enter_low_power(&report.plan);
                // Only reached if the chip refused to sleep.
                error!("deep sleep returned, restarting");
                esp_idf_svc::hal::reset::restart();
            }
        }
    }
}
