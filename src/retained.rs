//! Fixed-size codec for the controller state kept in RTC slow memory.
//!
//! ```text
//!   0      4     5        7          11                 BLOB_LEN
//!   ┌──────┬─────┬────────┬──────────┬──────────────────┐
//!   │"MBXS"│ ver │ len LE │ sha256[4]│ postcard payload │ zero pad
//!   └──────┴─────┴────────┴──────────┴──────────────────┘
//! ```
//!
//! A blob that fails any header check decodes to an error, and the caller
//! starts from the default state.  That covers the first power-on (RTC RAM
//! holds whatever the reset left there) and firmware updates that changed
//! the layout.

use core::fmt;

use crate::app::state::ControllerState;

pub const MAGIC: [u8; 4] = *b"MBXS";
pub const VERSION: u8 = 2;
pub const HEADER_LEN: usize = 11;
/// Total size of the retained region.
pub const BLOB_LEN: usize = 96;

pub type Blob = [u8; BLOB_LEN];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainedError {
    BadMagic,
    VersionMismatch(u8),
    BadLength,
    DigestMismatch,
    Malformed,
    TooLarge,
}

impl fmt::Display for RetainedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "no retained state"),
            Self::VersionMismatch(v) => write!(f, "layout version {v}, expected {VERSION}"),
            Self::BadLength => write!(f, "payload length out of range"),
            Self::DigestMismatch => write!(f, "digest mismatch"),
            Self::Malformed => write!(f, "payload does not decode"),
            Self::TooLarge => write!(f, "state does not fit the retained region"),
        }
    }
}

fn digest(payload: &[u8]) -> [u8; 4] {
    let h = hmac_sha256::Hash::hash(payload);
    [h[0], h[1], h[2], h[3]]
}

pub fn encode(state: &ControllerState) -> Result<Blob, RetainedError> {
    let mut blob = [0u8; BLOB_LEN];
    let len = postcard::to_slice(state, &mut blob[HEADER_LEN..])
        .map_err(|_| RetainedError::TooLarge)?
        .len();

    blob[0..4].copy_from_slice(&MAGIC);
    blob[4] = VERSION;
    blob[5..7].copy_from_slice(&(len as u16).to_le_bytes());
    let d = digest(&blob[HEADER_LEN..HEADER_LEN + len]);
    blob[7..11].copy_from_slice(&d);
    Ok(blob)
}

pub fn decode(blob: &Blob) -> Result<ControllerState, RetainedError> {
    if blob[0..4] != MAGIC {
        return Err(RetainedError::BadMagic);
    }
    if blob[4] != VERSION {
        return Err(RetainedError::VersionMismatch(blob[4]));
    }
    let len = usize::from(u16::from_le_bytes([blob[5], blob[6]]));
    if len == 0 || len > BLOB_LEN - HEADER_LEN {
        return Err(RetainedError::BadLength);
    }
    let payload = &blob[HEADER_LEN..HEADER_LEN + len];
    if digest(payload) != blob[7..11] {
        return Err(RetainedError::DigestMismatch);
    }
    postcard::from_bytes(payload).map_err(|_| RetainedError::Malformed)
}
