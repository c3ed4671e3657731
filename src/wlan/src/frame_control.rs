//! The frame control word and the frame kinds it encodes.

use std::fmt;

pub const TO_DS: u8 = 0x01;
pub const FROM_DS: u8 = 0x02;
pub const MORE_FRAGMENTS: u8 = 0x04;
pub const RETRY: u8 = 0x08;
pub const POWER_MANAGEMENT: u8 = 0x10;
pub const MORE_DATA: u8 = 0x20;
pub const PROTECTED: u8 = 0x40;
pub const ORDER: u8 = 0x80;

/// The 2 bit frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

impl FrameType {
    fn from_bits(bits: u8) -> FrameType {
        match bits & 0x3 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }

    fn bits(self) -> u8 {
        match self {
            FrameType::Management => 0,
            FrameType::Control => 1,
            FrameType::Data => 2,
            FrameType::Extension => 3,
        }
    }
}

// simple macro that keeps the frame kinds and their (type << 4 | subtype)
// codes in a single table
macro_rules! frame_kinds {
    ($($kind:ident = $code:literal,)+) => {
        /// Every frame kind the decoders recognize
        /// ## Description
        /// Type and subtype form a single space (`type << 4 | subtype`).
        /// Combinations outside the table are kept as `Unknown` instead of
        /// failing, so reserved or vendor subtypes stay representable.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum FrameKind {
            $($kind,)+
            Unknown { ftype: u8, subtype: u8 },
        }

        impl FrameKind {
            pub fn from_parts(ftype: u8, subtype: u8) -> FrameKind {
                match (ftype & 0x3) << 4 | (subtype & 0xf) {
                    $($code => FrameKind::$kind,)+
                    _ => FrameKind::Unknown { ftype: ftype & 0x3, subtype: subtype & 0xf },
                }
            }

            /// The combined `type << 4 | subtype` code.
            pub fn code(self) -> u8 {
                match self {
                    $(FrameKind::$kind => $code,)+
                    FrameKind::Unknown { ftype, subtype } => ftype << 4 | subtype,
                }
            }
        }
    };
}

frame_kinds! {
    AssociationRequest = 0x00,
    AssociationResponse = 0x01,
    ReassociationRequest = 0x02,
    ReassociationResponse = 0x03,
    ProbeRequest = 0x04,
    ProbeResponse = 0x05,
    TimingAdvertisement = 0x06,
    Beacon = 0x08,
    Atim = 0x09,
    Disassociation = 0x0a,
    Authentication = 0x0b,
    Deauthentication = 0x0c,
    Action = 0x0d,
    ActionNoAck = 0x0e,
    Trigger = 0x12,
    BeamformingReportPoll = 0x14,
    VhtNdpAnnouncement = 0x15,
    ControlFrameExtension = 0x16,
    ControlWrapper = 0x17,
    BlockAckRequest = 0x18,
    BlockAck = 0x19,
    PsPoll = 0x1a,
    Rts = 0x1b,
    Cts = 0x1c,
    Ack = 0x1d,
    CfEnd = 0x1e,
    CfEndCfAck = 0x1f,
    Data = 0x20,
    DataCfAck = 0x21,
    DataCfPoll = 0x22,
    DataCfAckCfPoll = 0x23,
    NullData = 0x24,
    CfAck = 0x25,
    CfPoll = 0x26,
    CfAckCfPoll = 0x27,
    QosData = 0x28,
    QosDataCfAck = 0x29,
    QosDataCfPoll = 0x2a,
    QosDataCfAckCfPoll = 0x2b,
    QosNull = 0x2c,
    QosCfPoll = 0x2e,
    QosCfAckCfPoll = 0x2f,
    DmgBeacon = 0x30,
}

impl FrameKind {
    pub fn is_unknown(self) -> bool {
        matches!(self, FrameKind::Unknown { .. })
    }

    /// Data subtypes that can carry a payload (the "no data" subtypes have
    /// bit 2 of the subtype set).
    pub fn carries_data(self) -> bool {
        let code = self.code();
        !self.is_unknown() && code & 0xf0 == 0x20 && code & 0x04 == 0
    }
}

/// The decomposed 16 bit frame control field
/// ## Description
/// On the wire the field is little-endian: the first byte holds the protocol
/// version (bits 0-1), the type (bits 2-3) and the subtype (bits 4-7), the
/// second byte holds the flags.
/// ## Example
/// **Basic usage:**
/// ```
///     use wlan::{FrameControl, FrameKind};
///     let fc = FrameControl::from_bits(0x0188);
///     assert_eq!(FrameKind::QosData, fc.kind());
///     assert!(fc.to_ds() && !fc.from_ds());
///     assert_eq!(0x0188, fc.bits());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub subtype: u8,
    pub flags: u8,
}

impl FrameControl {
    pub fn from_bits(bits: u16) -> FrameControl {
        let [low, high] = bits.to_le_bytes();
        FrameControl {
            protocol_version: low & 0x3,
            frame_type: FrameType::from_bits(low >> 2),
            subtype: low >> 4,
            flags: high,
        }
    }

    pub fn bits(&self) -> u16 {
        let low = (self.protocol_version & 0x3)
            | self.frame_type.bits() << 2
            | (self.subtype & 0xf) << 4;
        u16::from_le_bytes([low, self.flags])
    }

    pub fn kind(&self) -> FrameKind {
        FrameKind::from_parts(self.frame_type.bits(), self.subtype)
    }

    fn flag(&self, mask: u8) -> bool {
        self.flags & mask != 0
    }

    pub fn to_ds(&self) -> bool {
        self.flag(TO_DS)
    }

    pub fn from_ds(&self) -> bool {
        self.flag(FROM_DS)
    }

    pub fn more_fragments(&self) -> bool {
        self.flag(MORE_FRAGMENTS)
    }

    pub fn retry(&self) -> bool {
        self.flag(RETRY)
    }

    pub fn power_management(&self) -> bool {
        self.flag(POWER_MANAGEMENT)
    }

    pub fn more_data(&self) -> bool {
        self.flag(MORE_DATA)
    }

    pub fn protected(&self) -> bool {
        self.flag(PROTECTED)
    }

    pub fn order(&self) -> bool {
        self.flag(ORDER)
    }

    /// QoS data subtypes (0x28 - 0x2f) carry a QoS control field.
    pub fn is_qos(&self) -> bool {
        self.frame_type == FrameType::Data && self.subtype & 0x8 != 0
    }
}

impl fmt::Display for FrameControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:#06x})", self.kind(), self.bits())
    }
}
