//! Device identity derived from the ESP32 factory MAC address.
//!
//! The MQTT client id defaults to `mailbox-xxyyzz` (last 3 bytes of the
//! 6-byte MAC, lowercase hex).  Stable across reboots and unique per
//! board, so two sensors on one broker never kick each other off.

use core::fmt::Write;

use crate::config::UserString;

/// Full 6-byte MAC address.
pub type MacAddress = [u8; 6];

/// Read the factory MAC address from eFuse.
#[cfg(target_os = "espidf")]
pub fn read_mac() -> MacAddress {
    let mut mac: MacAddress = [0u8; 6];
    // SAFETY: mac is a valid 6-byte buffer.
    unsafe {
        esp_idf_svc::sys::esp_efuse_mac_get_default(mac.as_mut_ptr());
    }
    mac
}

/// Simulation: returns a deterministic fake MAC.
#[cfg(not(target_os = "espidf"))]
pub fn read_mac() -> MacAddress {
    [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE]
}

/// Client id derived from the MAC: `mailbox-xxyyzz`.
pub fn client_id(mac: &MacAddress) -> UserString {
    let mut id = UserString::new();
    let _ = write!(id, "mailbox-{:02x}{:02x}{:02x}", mac[3], mac[4], mac[5]);
    id
}

/// The configured client id, or the MAC-derived one when unset.
pub fn resolve_client_id(configured: &str, mac: &MacAddress) -> UserString {
    if configured.is_empty() {
        client_id(mac)
    } else {
        crate::config::bounded(configured)
    }
}
