//! Beacon and probe response extraction.

use std::borrow::Cow;

use aux::Endian;

use crate::error::{Error, Result};
use crate::frame_control::{FrameControl, FrameKind};
use crate::header::{decode_header, MacHeader};
use crate::mac::MacAddr;
use crate::tags::{id, TagChain, TagElement};

/// Length of the timestamp, interval and capabilities prefix.
pub const FIXED_PARAMS_LEN: usize = 12;

/// The capability information bitfield of a beacon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(pub u16);

impl Capabilities {
    pub const ESS: u16 = 0x0001;
    pub const IBSS: u16 = 0x0002;
    pub const PRIVACY: u16 = 0x0010;
    pub const SHORT_PREAMBLE: u16 = 0x0020;
    pub const SPECTRUM_MANAGEMENT: u16 = 0x0100;
    pub const QOS: u16 = 0x0200;
    pub const SHORT_SLOT_TIME: u16 = 0x0400;
    pub const RADIO_MEASUREMENT: u16 = 0x1000;

    pub fn has(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn ess(&self) -> bool {
        self.has(Self::ESS)
    }

    pub fn ibss(&self) -> bool {
        self.has(Self::IBSS)
    }

    pub fn privacy(&self) -> bool {
        self.has(Self::PRIVACY)
    }

    pub fn short_preamble(&self) -> bool {
        self.has(Self::SHORT_PREAMBLE)
    }

    pub fn spectrum_management(&self) -> bool {
        self.has(Self::SPECTRUM_MANAGEMENT)
    }

    pub fn qos(&self) -> bool {
        self.has(Self::QOS)
    }

    pub fn short_slot_time(&self) -> bool {
        self.has(Self::SHORT_SLOT_TIME)
    }

    pub fn radio_measurement(&self) -> bool {
        self.has(Self::RADIO_MEASUREMENT)
    }
}

/// A decoded beacon or probe response
/// ## Description
/// Holds the fixed parameters and the tag chain of the frame body. Tag
/// values borrow from the captured frame; use [`BeaconRecord::into_owned`] to
/// keep the record after the buffer is gone. Named accessors return `None`
/// for absent tags, optional tags are normal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconRecord<'a> {
    pub frame_control: FrameControl,
    pub header: MacHeader,
    pub timestamp: u64,
    pub beacon_interval: u16,
    pub capabilities: Capabilities,
    pub tags: TagChain<'a>,
}

impl<'a> BeaconRecord<'a> {
    pub fn bssid(&self) -> MacAddr {
        self.header.addr3()
    }

    pub fn is_probe_response(&self) -> bool {
        self.frame_control.kind() == FrameKind::ProbeResponse
    }

    pub fn tag(&self, tag_id: u8) -> Option<&TagElement<'a>> {
        self.tags.first(tag_id)
    }

    pub fn ssid(&self) -> Option<&[u8]> {
        self.tags.value(id::SSID)
    }

    /// The SSID as text, invalid UTF-8 replaced.
    pub fn ssid_lossy(&self) -> Option<Cow<'_, str>> {
        self.ssid().map(String::from_utf8_lossy)
    }

    /// Hidden networks send an empty or zeroed SSID.
    pub fn is_hidden(&self) -> bool {
        self.ssid().map_or(true, aux::is_zeroed)
    }

    pub fn supported_rates(&self) -> Option<&[u8]> {
        self.tags.value(id::SUPPORTED_RATES)
    }

    pub fn extended_rates(&self) -> Option<&[u8]> {
        self.tags.value(id::EXTENDED_RATES)
    }

    /// Rates in units of 500 kb/s, basic-rate bit cleared.
    pub fn rates(&self) -> Vec<u8> {
        self.supported_rates()
            .into_iter()
            .chain(self.extended_rates())
            .flatten()
            .map(|rate| rate & 0x7f)
            .collect()
    }

    /// The current channel from the DS parameter set.
    pub fn channel(&self) -> Option<u8> {
        self.tags.value(id::DS_PARAMETER)?.first().copied()
    }

    pub fn ht_capabilities(&self) -> Option<&[u8]> {
        self.tags.value(id::HT_CAPABILITIES)
    }

    pub fn vht_capabilities(&self) -> Option<&[u8]> {
        self.tags.value(id::VHT_CAPABILITIES)
    }

    pub fn rsn(&self) -> Option<&[u8]> {
        self.tags.value(id::RSN)
    }

    pub fn vendor_specific(&self) -> impl Iterator<Item = &TagElement<'a>> {
        self.tags.all(id::VENDOR_SPECIFIC)
    }

    pub fn into_owned(self) -> BeaconRecord<'static> {
        BeaconRecord {
            frame_control: self.frame_control,
            header: self.header,
            timestamp: self.timestamp,
            beacon_interval: self.beacon_interval,
            capabilities: self.capabilities,
            tags: self.tags.into_owned(),
        }
    }

    /// Writes the frame back in wire format, without FCS.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![];
        self.header.encode(&self.frame_control, &mut out);
        out.extend(Endian::Little.u64_bytes(self.timestamp));
        out.extend(Endian::Little.u16_bytes(self.beacon_interval));
        out.extend(Endian::Little.u16_bytes(self.capabilities.0));
        self.tags.encode(&mut out);
        out
    }
}

/// Extracts a beacon record from a raw frame
/// ## Description
/// The frame has to classify as a beacon or a probe response, any other kind
/// is reported with [`Error::UnsupportedFrameType`]. The tag region is the
/// rest of the frame body after the fixed parameters.
/// ## Example
/// **Basic usage:**
/// ```
///     let mut frame = vec![0x80, 0x00, 0x00, 0x00];
///     frame.extend([0xff; 6]);
///     frame.extend([0x02; 6]);
///     frame.extend([0x02; 6]);
///     frame.extend([0x00; 2]);
///     frame.extend([0x00; 8]); // timestamp
///     frame.extend([0x64, 0x00, 0x11, 0x04]); // interval, capabilities
///     frame.extend([0x00, 0x04, b't', b'e', b's', b't']);
///     let beacon = wlan::extract_beacon(&frame).unwrap();
///     assert_eq!(Some(&b"test"[..]), beacon.ssid());
///     assert!(beacon.capabilities.privacy());
/// ```
pub fn extract_beacon(frame: &[u8]) -> Result<BeaconRecord<'_>> {
    let decoded = decode_header(frame)?;
    match decoded.frame_control.kind() {
        FrameKind::Beacon | FrameKind::ProbeResponse => {}
        _ => return Err(Error::UnsupportedFrameType(decoded.frame_control)),
    }

    let mut body = decoded.body;
    if body.remaining() < FIXED_PARAMS_LEN {
        return Err(Error::TruncatedInput {
            needed: FIXED_PARAMS_LEN,
            remaining: body.remaining(),
        });
    }
    let timestamp = body.read_u64(Endian::Little)?;
    let beacon_interval = body.read_u16(Endian::Little)?;
    let capabilities = Capabilities(body.read_u16(Endian::Little)?);
    let tags = TagChain::walk(body.rest())?;

    Ok(BeaconRecord {
        frame_control: decoded.frame_control,
        header: decoded.header,
        timestamp,
        beacon_interval,
        capabilities,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::AddressFields;

    const AP: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x01, 0x00]);

    fn beacon_frame(subtype_bits: u16, tags: &[u8]) -> Vec<u8> {
        let header = MacHeader::ThreeAddress(AddressFields {
            duration_id: 0,
            addr1: MacAddr::BROADCAST,
            addr2: AP,
            addr3: AP,
            seq_ctrl: 0,
        });
        let mut frame = vec![];
        header.encode(&FrameControl::from_bits(subtype_bits), &mut frame);
        frame.extend(0x0000_0001_0203_0405u64.to_le_bytes());
        frame.extend(100u16.to_le_bytes());
        frame.extend(0x0431u16.to_le_bytes());
        frame.extend_from_slice(tags);
        frame
    }

    #[test]
    fn ssid_and_rates() {
        let frame = beacon_frame(0x0080, &[0x00, 0x04, b't', b'e', b's', b't', 0x01, 0x02, 0x82, 0x84]);
        let beacon = extract_beacon(&frame).unwrap();
        assert_eq!(Some(&b"test"[..]), beacon.ssid());
        assert_eq!(Some(&[0x82, 0x84][..]), beacon.supported_rates());
        assert_eq!(None, beacon.vht_capabilities());
        assert_eq!(None, beacon.tag(id::VHT_CAPABILITIES));
        assert_eq!(None, beacon.ht_capabilities());
        assert_eq!(0, beacon.vendor_specific().count());
        assert_eq!(vec![2, 4], beacon.rates());
        assert_eq!("test", beacon.ssid_lossy().unwrap());
        assert!(!beacon.is_hidden());
    }

    #[test]
    fn fixed_parameters() {
        let frame = beacon_frame(0x0080, &[]);
        let beacon = extract_beacon(&frame).unwrap();
        assert_eq!(0x0000_0001_0203_0405, beacon.timestamp);
        assert_eq!(100, beacon.beacon_interval);
        assert!(beacon.capabilities.ess());
        assert!(beacon.capabilities.privacy());
        assert!(beacon.capabilities.short_preamble());
        assert!(beacon.capabilities.short_slot_time());
        assert!(!beacon.capabilities.ibss());
        assert!(!beacon.capabilities.qos());
        assert_eq!(AP, beacon.bssid());
        assert!(beacon.tags.is_empty());
        assert!(beacon.is_hidden());
    }

    #[test]
    fn probe_response_is_accepted() {
        let frame = beacon_frame(0x0050, &[0x03, 0x01, 0x0b]);
        let beacon = extract_beacon(&frame).unwrap();
        assert!(beacon.is_probe_response());
        assert_eq!(Some(11), beacon.channel());
    }

    #[test]
    fn other_management_frames_are_unsupported() {
        let frame = beacon_frame(0x0040, &[]);
        assert!(matches!(extract_beacon(&frame), Err(Error::UnsupportedFrameType(_))));
    }

    #[test]
    fn short_fixed_parameters() {
        let frame = beacon_frame(0x0080, &[]);
        assert_eq!(
            Err(Error::TruncatedInput { needed: 12, remaining: 11 }),
            extract_beacon(&frame[..frame.len() - 1])
        );
    }

    #[test]
    fn malicious_tag_length() {
        let frame = beacon_frame(0x0080, &[0x00, 0x02, b'a', b'b', 0xdd, 0xff, 0x00]);
        assert!(matches!(
            extract_beacon(&frame),
            Err(Error::MalformedTagChain { tag_id: 0xdd, declared: 255, available: 1, .. })
        ));
    }

    #[test]
    fn hidden_and_vendor_tags() {
        let frame = beacon_frame(
            0x0080,
            &[0x00, 0x03, 0, 0, 0, 0xdd, 0x01, 0x01, 0xdd, 0x02, 0x02, 0x03, 0x32, 0x01, 0x8c],
        );
        let beacon = extract_beacon(&frame).unwrap();
        assert!(beacon.is_hidden());
        let vendor: Vec<&[u8]> = beacon.vendor_specific().map(|t| t.value.as_ref()).collect();
        assert_eq!(vec![&[0x01][..], &[0x02, 0x03][..]], vendor);
        assert_eq!(vec![12], beacon.rates());
    }

    #[test]
    fn owned_record_encodes_back() {
        let frame = beacon_frame(0x0080, &[0x00, 0x01, b'x']);
        let owned = extract_beacon(&frame).unwrap().into_owned();
        assert_eq!(frame, owned.encode());
    }
}
