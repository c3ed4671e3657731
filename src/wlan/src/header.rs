//! MAC header decoding.

use aux::Endian;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};
use crate::frame_control::{FrameControl, FrameType};
use crate::mac::MacAddr;

/// Fields shared by every header variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFields {
    pub duration_id: u16,
    pub addr1: MacAddr,
    pub addr2: MacAddr,
    pub addr3: MacAddr,
    pub seq_ctrl: u16,
}

/// The fixed part of an 802.11 MAC header
/// ## Description
/// The variant is chosen from the frame control field:
/// * QoS data subtypes use `Qos`. When both DS flags are set the QoS header
///   also carries the fourth address, which precedes the QoS control field.
/// * Both DS flags set selects `FourAddress`.
/// * Everything else is `ThreeAddress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacHeader {
    ThreeAddress(AddressFields),
    FourAddress {
        fields: AddressFields,
        addr4: MacAddr,
    },
    Qos {
        fields: AddressFields,
        addr4: Option<MacAddr>,
        qos_ctrl: u16,
    },
}

impl MacHeader {
    pub fn fields(&self) -> &AddressFields {
        match self {
            MacHeader::ThreeAddress(fields) => fields,
            MacHeader::FourAddress { fields, .. } => fields,
            MacHeader::Qos { fields, .. } => fields,
        }
    }

    pub fn duration_id(&self) -> u16 {
        self.fields().duration_id
    }

    pub fn addr1(&self) -> MacAddr {
        self.fields().addr1
    }

    pub fn addr2(&self) -> MacAddr {
        self.fields().addr2
    }

    pub fn addr3(&self) -> MacAddr {
        self.fields().addr3
    }

    pub fn addr4(&self) -> Option<MacAddr> {
        match self {
            MacHeader::ThreeAddress(_) => None,
            MacHeader::FourAddress { addr4, .. } => Some(*addr4),
            MacHeader::Qos { addr4, .. } => *addr4,
        }
    }

    pub fn seq_ctrl(&self) -> u16 {
        self.fields().seq_ctrl
    }

    pub fn sequence_number(&self) -> u16 {
        self.seq_ctrl() >> 4
    }

    pub fn fragment_number(&self) -> u8 {
        (self.seq_ctrl() & 0xf) as u8
    }

    pub fn qos_ctrl(&self) -> Option<u16> {
        match self {
            MacHeader::Qos { qos_ctrl, .. } => Some(*qos_ctrl),
            _ => None,
        }
    }

    /// Traffic identifier of a QoS frame.
    pub fn tid(&self) -> Option<u8> {
        self.qos_ctrl().map(|qos| (qos & 0xf) as u8)
    }

    /// Encoded length in bytes, frame control included.
    pub fn len(&self) -> usize {
        let addr4 = if self.addr4().is_some() { 6 } else { 0 };
        let qos = if self.qos_ctrl().is_some() { 2 } else { 0 };
        24 + addr4 + qos
    }

    /// The BSSID according to the DS flags, `None` for WDS frames.
    pub fn bssid(&self, frame_control: &FrameControl) -> Option<MacAddr> {
        match (frame_control.to_ds(), frame_control.from_ds()) {
            (false, false) => Some(self.addr3()),
            (true, false) => Some(self.addr1()),
            (false, true) => Some(self.addr2()),
            (true, true) => None,
        }
    }

    /// Writes the header, frame control first, in wire order.
    pub fn encode(&self, frame_control: &FrameControl, out: &mut Vec<u8>) {
        let fields = self.fields();
        out.extend(Endian::Little.u16_bytes(frame_control.bits()));
        out.extend(Endian::Little.u16_bytes(fields.duration_id));
        out.extend(fields.addr1.0);
        out.extend(fields.addr2.0);
        out.extend(fields.addr3.0);
        out.extend(Endian::Little.u16_bytes(fields.seq_ctrl));
        if let Some(addr4) = self.addr4() {
            out.extend(addr4.0);
        }
        if let Some(qos_ctrl) = self.qos_ctrl() {
            out.extend(Endian::Little.u16_bytes(qos_ctrl));
        }
    }
}

/// A decoded header and the cursor positioned at the start of the frame body.
#[derive(Debug, Clone)]
pub struct DecodedHeader<'a> {
    pub frame_control: FrameControl,
    pub header: MacHeader,
    pub body: ByteCursor<'a>,
}

fn read_mac(cursor: &mut ByteCursor<'_>) -> Result<MacAddr> {
    Ok(MacAddr(cursor.read_array()?))
}

/// Decodes the MAC header at the start of a frame
/// ## Description
/// Reads the little-endian frame control field, classifies it and decodes
/// the matching header variant. Unknown kinds, control frames and extension
/// frames such as DMG beacons (which use short headers without the address
/// layout) are reported with [`Error::UnsupportedFrameType`] so the caller
/// can skip them.
/// ## Example
/// **Basic usage:**
/// ```
///     let mut frame = vec![0x80, 0x00, 0x00, 0x00];
///     frame.extend([0xff; 6]);
///     frame.extend([0xaa; 6]);
///     frame.extend([0xaa; 6]);
///     frame.extend([0x10, 0x00]);
///     let decoded = wlan::decode_header(&frame).unwrap();
///     assert_eq!(wlan::MacAddr([0xaa; 6]), decoded.header.addr2());
///     assert_eq!(1, decoded.header.sequence_number());
///     assert_eq!(0, decoded.body.remaining());
/// ```
pub fn decode_header(frame: &[u8]) -> Result<DecodedHeader<'_>> {
    let mut cursor = ByteCursor::new(frame);
    let frame_control = FrameControl::from_bits(cursor.read_u16(Endian::Little)?);
    let short_header = matches!(frame_control.frame_type, FrameType::Control | FrameType::Extension);
    if frame_control.kind().is_unknown() || short_header {
        return Err(Error::UnsupportedFrameType(frame_control));
    }

    let four_address = frame_control.to_ds() && frame_control.from_ds();
    let fixed_len = 22
        + if four_address { 6 } else { 0 }
        + if frame_control.is_qos() { 2 } else { 0 };
    if cursor.remaining() < fixed_len {
        return Err(Error::TruncatedInput {
            needed: fixed_len,
            remaining: cursor.remaining(),
        });
    }

    let fields = AddressFields {
        duration_id: cursor.read_u16(Endian::Little)?,
        addr1: read_mac(&mut cursor)?,
        addr2: read_mac(&mut cursor)?,
        addr3: read_mac(&mut cursor)?,
        seq_ctrl: cursor.read_u16(Endian::Little)?,
    };
    let addr4 = if four_address {
        Some(read_mac(&mut cursor)?)
    } else {
        None
    };

    let header = match (frame_control.is_qos(), addr4) {
        (true, addr4) => MacHeader::Qos {
            fields,
            addr4,
            qos_ctrl: cursor.read_u16(Endian::Little)?,
        },
        (false, Some(addr4)) => MacHeader::FourAddress { fields, addr4 },
        (false, None) => MacHeader::ThreeAddress(fields),
    };

    Ok(DecodedHeader {
        frame_control,
        header,
        body: cursor,
    })
}
