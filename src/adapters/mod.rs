//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements                  | Connects to                |
//! |---------------|-----------------------------|----------------------------|
//! | `hardware`    | SensorPort                  | GPIO, ADC, INA219, DHT22   |
//! | `log_sink`    | EventSink                   | Serial log output          |
//! | `mqtt`        | LinkPort, NetworkInfoPort   | ESP-IDF MQTT client        |
//! | `nvs`         | ConfigPort                  | NVS / in-memory store      |
//! | `power`       | PowerPort                   | ext1 + timer deep sleep    |
//! | `rtc_memory`  | RetainedPort                | RTC slow memory            |
//! | `time`        | ClockPort                   | RTC-backed `gettimeofday`  |
//! | `wifi`        | ConnectivityPort            | ESP-IDF WiFi STA           |
//!
//! `device_id` derives the default MQTT client id from the factory MAC.

pub mod device_id;
pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod power;
pub mod rtc_memory;
pub mod time;
pub(super) mod utils;
pub mod wifi;
