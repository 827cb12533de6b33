//! MQTT messaging link.
//!
//! [`MqttLink`] owns the WiFi adapter and the broker session and exposes
//! them to the domain as [`LinkPort`] + [`NetworkInfoPort`].  Messages go
//! out QoS 0, not retained; every payload is a short UTF-8 string.
//!
//! On ESP-IDF the session is an `EspMqttClient` created lazily on the
//! first `ensure_connected()`.  The client's event callback flips an
//! atomic flag on CONNECTED/DISCONNECTED; `ensure_connected()` waits on
//! that flag for at most `connect_timeout_ms`.

use core::fmt::Write;
use core::net::Ipv4Addr;

use log::{info, warn};

use crate::app::ports::{LinkPort, NetworkInfoPort};
use crate::config::{HostString, SecretString, SystemConfig, UserString};
use crate::error::CommsError;

use super::wifi::ConnectivityPort;

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Broker URL, `mqtt://host:port`.
pub type BrokerUrl = heapless::String<96>;

/// How long a fresh session may take to reach CONNECTED.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u32 = 10_000;

/// Broker session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub url: BrokerUrl,
    pub user: UserString,
    pub password: SecretString,
    pub client_id: UserString,
    pub connect_timeout_ms: u32,
}

impl BrokerSettings {
    pub fn from_config(config: &SystemConfig, client_id: UserString) -> Self {
        Self {
            url: broker_url(&config.broker_host, config.broker_port),
            user: config.broker_user.clone(),
            password: config.broker_password.clone(),
            client_id,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

pub fn broker_url(host: &HostString, port: u16) -> BrokerUrl {
    let mut url = BrokerUrl::new();
    let _ = write!(url, "mqtt://{}:{}", host, port);
    url
}

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

// ───────────────────────────────────────────────────────────────
// Link
// ───────────────────────────────────────────────────────────────

pub struct MqttLink<W: ConnectivityPort> {
    wifi: W,
    settings: BrokerSettings,
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    session_up: Arc<AtomicBool>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

/// Simulation: an in-memory broker that records publishes.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
pub struct SimBroker {
    pub reachable: bool,
    pub session_up: bool,
    pub sessions: u32,
    /// Upcoming publishes that fail even with a live session.
    pub fail_publishes: u32,
    pub published: Vec<(String, String)>,
}

impl<W: ConnectivityPort> MqttLink<W> {
    pub fn new(wifi: W, settings: BrokerSettings) -> Self {
        Self {
            wifi,
            settings,
            #[cfg(target_os = "espidf")]
            client: None,
            #[cfg(target_os = "espidf")]
            session_up: Arc::new(AtomicBool::new(false)),
            #[cfg(not(target_os = "espidf"))]
            sim: SimBroker {
                reachable: true,
                ..SimBroker::default()
            },
        }
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    pub fn wifi(&self) -> &W {
        &self.wifi
    }

    /// Tear the session down and power the radio off before sleeping.
    pub fn shutdown(&mut self) {
        self.close_session();
        self.wifi.disconnect();
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim(&mut self) -> &mut SimBroker {
        &mut self.sim
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn session_is_up(&self) -> bool {
        self.client.is_some() && self.session_up.load(Ordering::Acquire)
    }

    #[cfg(not(target_os = "espidf"))]
    fn session_is_up(&self) -> bool {
        self.sim.session_up
    }

    #[cfg(target_os = "espidf")]
    fn open_session(&mut self) -> Result<(), CommsError> {
        if self.client.is_none() {
            let conf = MqttClientConfiguration {
                client_id: Some(self.settings.client_id.as_str()),
                username: non_empty(&self.settings.user),
                password: non_empty(&self.settings.password),
                ..Default::default()
            };
            let flag = Arc::clone(&self.session_up);
            let client = EspMqttClient::new_cb(self.settings.url.as_str(), &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => flag.store(true, Ordering::Release),
                    EventPayload::Disconnected => flag.store(false, Ordering::Release),
                    _ => {}
                }
            })
            .map_err(|e| {
                warn!("MQTT: client init failed: {}", e);
                CommsError::BrokerConnectFailed
            })?;
            self.client = Some(client);
        }

        const STEP_MS: u32 = 50;
        let mut waited = 0;
        while !self.session_up.load(Ordering::Acquire) {
            if waited >= self.settings.connect_timeout_ms {
                warn!("MQTT: no CONNACK from {} within {} ms", self.settings.url, waited);
                return Err(CommsError::BrokerConnectFailed);
            }
            esp_idf_svc::hal::delay::FreeRtos::delay_ms(STEP_MS);
            waited += STEP_MS;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn open_session(&mut self) -> Result<(), CommsError> {
        if !self.sim.reachable {
            return Err(CommsError::BrokerConnectFailed);
        }
        self.sim.session_up = true;
        self.sim.sessions += 1;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn close_session(&mut self) {
        self.client = None;
        self.session_up.store(false, Ordering::Release);
    }

    #[cfg(not(target_os = "espidf"))]
    fn close_session(&mut self) {
        self.sim.session_up = false;
    }

    #[cfg(target_os = "espidf")]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        let client = self.client.as_mut().ok_or(CommsError::BrokerConnectFailed)?;
        client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes())
            .map(|_| ())
            .map_err(|e| {
                warn!("MQTT: publish to {} failed: {}", topic, e);
                CommsError::PublishFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if self.sim.fail_publishes > 0 {
            self.sim.fail_publishes -= 1;
            return Err(CommsError::PublishFailed);
        }
        self.sim.published.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

impl<W: ConnectivityPort> LinkPort for MqttLink<W> {
    fn ensure_connected(&mut self) -> Result<(), CommsError> {
        if !self.wifi.is_connected() {
            // A stale session cannot survive a dropped association.
            self.close_session();
            self.wifi.connect().map_err(|e| {
                warn!("MQTT: WiFi unavailable: {}", e);
                CommsError::WifiConnectFailed
            })?;
        }
        if self.session_is_up() {
            return Ok(());
        }
        info!(
            "MQTT: connecting to {} as '{}'",
            self.settings.url, self.settings.client_id
        );
        self.open_session()
    }

    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), CommsError> {
        if !self.session_is_up() {
            return Err(CommsError::BrokerConnectFailed);
        }
        self.platform_publish(topic, payload)
    }
}

impl<W: ConnectivityPort> NetworkInfoPort for MqttLink<W> {
    fn rssi_dbm(&self) -> Option<i8> {
        self.wifi.rssi()
    }

    fn local_ip(&self) -> Option<Ipv4Addr> {
        self.wifi.local_ip()
    }
}
