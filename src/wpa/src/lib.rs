//! # wpa
//! Wi-Fi Protected Access (WPA) is a security certification program developed
//! by the Wi-Fi Alliance to secure wireless devices networks.
//!
//! `wpa` contains the parts of the tool that are responsible for capturing relevant
//! information from the handshake stage and collecting information about near-by
//! networks: EAPOL-Key decoding, handshake assembly, security identification and
//! the pcap capture sources.
use wlan::{BeaconRecord, DecodedHeader, Error, FrameControl, FrameKind, MacHeader};

pub mod capture;
mod consts;
mod eapol;
mod handshake;
mod llc;
mod network_info;
mod security;

pub use consts::*;
pub use eapol::{EapolKeyMessage, KeyInformation, MessageNumber};
pub use handshake::{
    Anomaly, Disposition, Handshake, HandshakeAssembler, HandshakeOutcome, HandshakeSession,
    SessionKey,
};
pub use llc::LlcSnap;
pub use network_info::NetworkInfo;
pub use security::{identify_protocol, Protocol, RsnInfo, Suite};

/// A decoded frame, as far as the tool cares about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedFrame<'a> {
    /// A beacon or a probe response.
    Beacon(BeaconRecord<'a>),
    /// A data frame carrying an EAPOL-Key message. `number` is `None` for
    /// key messages outside the 4-way handshake.
    Eapol {
        frame_control: FrameControl,
        header: MacHeader,
        message: EapolKeyMessage<'a>,
        number: Option<MessageNumber>,
    },
    /// Any other management or data frame.
    Other { frame_control: FrameControl },
}

impl<'a> ParsedFrame<'a> {
    pub fn frame_control(&self) -> FrameControl {
        match self {
            ParsedFrame::Beacon(beacon) => beacon.frame_control,
            ParsedFrame::Eapol { frame_control, .. } => *frame_control,
            ParsedFrame::Other { frame_control } => *frame_control,
        }
    }
}

// --------------------------- Public Functions -------------------------------

/// Decodes a raw 802.11 frame
/// ## Description
/// The function receives a frame without radiotap header and FCS, and sorts
/// it into beacons, EAPOL-Key carrying data frames and everything else.
/// Control, extension and unknown frames are reported with
/// [`Error::UnsupportedFrameType`], which callers usually skip.
/// ## Example
/// **Basic usage:**
/// ```
///     # let frame: Vec<u8> = vec![0x80, 0x00];
///     match wpa::parse_frame(&frame) {
///         Ok(wpa::ParsedFrame::Beacon(beacon)) => println!("{:?}", beacon.ssid_lossy()),
///         Ok(_) => {}
///         Err(e) if !e.is_fatal() => {}
///         Err(e) => eprintln!("{e}"),
///     }
/// ```
pub fn parse_frame(frame: &[u8]) -> wlan::Result<ParsedFrame<'_>> {
    let decoded = wlan::decode_header(frame)?;
    match decoded.frame_control.kind() {
        FrameKind::Beacon | FrameKind::ProbeResponse => {
            Ok(ParsedFrame::Beacon(wlan::extract_beacon(frame)?))
        }
        kind if kind.carries_data() => parse_data(decoded),
        _ => Ok(ParsedFrame::Other { frame_control: decoded.frame_control }),
    }
}

fn parse_data(decoded: DecodedHeader<'_>) -> wlan::Result<ParsedFrame<'_>> {
    match EapolKeyMessage::from_data_frame(&decoded)? {
        Some(message) => Ok(ParsedFrame::Eapol {
            frame_control: decoded.frame_control,
            number: message.message_number(),
            header: decoded.header,
            message,
        }),
        None => Ok(ParsedFrame::Other { frame_control: decoded.frame_control }),
    }
}

/// Feeds a parsed frame to an assembler
/// ## Description
/// Returns `None` for frames that are not EAPOL-Key messages.
pub fn assemble(
    assembler: &mut HandshakeAssembler,
    frame: ParsedFrame<'_>,
) -> Option<Result<HandshakeOutcome, Error>> {
    match frame {
        ParsedFrame::Eapol { frame_control, header, message, .. } => {
            Some(assembler.ingest(&frame_control, &header, message))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eapol::testing::*;

    #[test]
    fn dispatches_beacons() {
        let mut frame = vec![0x80, 0x00, 0x00, 0x00];
        frame.extend([0xff; 6]);
        frame.extend([0x02; 12]);
        frame.extend([0x00; 2]);
        frame.extend([0x00; 12]);
        frame.extend([0x00, 0x01, b'x']);
        match parse_frame(&frame).unwrap() {
            ParsedFrame::Beacon(beacon) => assert_eq!(Some(&b"x"[..]), beacon.ssid()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn dispatches_eapol() {
        let frame = data_frame(FROM_AP, STA, AP, AP, &handshake_messages()[0]);
        let parsed = parse_frame(&frame).unwrap();
        assert_eq!(FROM_AP, parsed.frame_control().bits());
        match &parsed {
            ParsedFrame::Eapol { number, header, .. } => {
                assert_eq!(Some(MessageNumber::One), *number);
                assert_eq!(STA, header.addr1());
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut assembler = HandshakeAssembler::new();
        let outcome = assemble(&mut assembler, parsed).unwrap().unwrap();
        assert_eq!(Disposition::Started, outcome.disposition);
    }

    #[test]
    fn dispatches_other_frames() {
        // authentication frame
        let mut frame = vec![0xb0, 0x00, 0x00, 0x00];
        frame.extend([0x02; 20]);
        assert_eq!(
            ParsedFrame::Other { frame_control: FrameControl::from_bits(0x00b0) },
            parse_frame(&frame).unwrap()
        );

        // data frame carrying IPv4
        let mut frame = vec![0x08, 0x02, 0x00, 0x00];
        frame.extend([0x02; 20]);
        frame.extend([0xaa, 0xaa, 0x03, 0x00, 0x00, 0x00, 0x08, 0x00, 0x45]);
        let parsed = parse_frame(&frame).unwrap();
        assert!(matches!(parsed, ParsedFrame::Other { .. }));
        let mut assembler = HandshakeAssembler::new();
        assert!(assemble(&mut assembler, parsed).is_none());
    }

    #[test]
    fn control_frames_are_skipped() {
        let ack = [0xd4, 0x00, 0x00, 0x00, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02];
        let error = parse_frame(&ack).unwrap_err();
        assert!(matches!(error, Error::UnsupportedFrameType(_)));
        assert!(!error.is_fatal());
    }
}
