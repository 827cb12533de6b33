//! Shared helpers for adapter-layer validation and conversion.

use core::net::Ipv4Addr;

/// Returns `true` if every byte of `s` is in the printable ASCII range
/// `0x20..=0x7E` (space through tilde, inclusive).
///
/// Used to validate WiFi credentials and broker settings.
pub(super) fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

/// Convert an lwIP `ip4_addr_t` word to an address.
///
/// lwIP keeps the address in network byte order inside a native `u32`;
/// on the little-endian Xtensa core the first octet is the low byte.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(super) fn ipv4_from_lwip(addr: u32) -> Option<Ipv4Addr> {
    (addr != 0).then(|| Ipv4Addr::from(addr.to_le_bytes()))
}

/// Convert a `wifi_ap_record_t::rssi` to dBm.  Zero means "no reading".
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
pub(super) fn rssi_from_raw(raw: i8) -> Option<i8> {
    (raw != 0).then_some(raw)
}
