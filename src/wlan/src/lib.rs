//! # wlan
//! A wireless LAN (WLAN) is a wireless computer network that links two or more
//! devices using wireless communication to form a local area network (LAN)
//! within a limited area. Wireless LANs based on the IEEE 802.11 standards are
//! the most widely used computer networks in the world and the tool focuses on them.
//!
//! `wlan` decodes the 802.11 layer of captured frames: the frame control word,
//! the MAC header variants, the tagged parameters of management frames and
//! beacons. Captured data is untrusted, so every read is bounds-checked and
//! malformed input is reported through [`Error`], never by panicking.
mod beacon;
mod cursor;
mod error;
mod frame_control;
mod header;
mod mac;
mod tags;

pub use beacon::{extract_beacon, BeaconRecord, Capabilities, FIXED_PARAMS_LEN};
pub use cursor::ByteCursor;
pub use error::{Error, Result};
pub use frame_control::{FrameControl, FrameKind, FrameType};
pub use header::{decode_header, AddressFields, DecodedHeader, MacHeader};
pub use mac::{InvalidMacAddr, MacAddr};
pub use tags::{id as tag_id, TagChain, TagElement};

/// Frame control flag masks.
pub mod flags {
    pub use crate::frame_control::{
        FROM_DS, MORE_DATA, MORE_FRAGMENTS, ORDER, POWER_MANAGEMENT, PROTECTED, RETRY, TO_DS,
    };
}
