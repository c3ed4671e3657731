use std::borrow::Cow;
use std::fmt;

use aux::Endian;
use wlan::{ByteCursor, DecodedHeader, Error};

use crate::consts::*;
use crate::llc::LlcSnap;

/// The key information bitfield of an EAPOL-Key frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyInformation(pub u16);

impl KeyInformation {
    fn has(&self, bit: u16) -> bool {
        self.0 & bit != 0
    }

    pub fn descriptor_version(&self) -> u8 {
        (self.0 & KEY_DESCRIPTOR_VERSION) as u8
    }

    /// Key type bit: pairwise (set) or group (clear).
    pub fn pairwise(&self) -> bool {
        self.has(KEY_TYPE_PAIRWISE)
    }

    pub fn install(&self) -> bool {
        self.has(KEY_INSTALL)
    }

    pub fn ack(&self) -> bool {
        self.has(KEY_ACK)
    }

    pub fn mic(&self) -> bool {
        self.has(KEY_MIC)
    }

    pub fn secure(&self) -> bool {
        self.has(KEY_SECURE)
    }

    pub fn error(&self) -> bool {
        self.has(KEY_ERROR)
    }

    pub fn request(&self) -> bool {
        self.has(KEY_REQUEST)
    }

    pub fn encrypted_key_data(&self) -> bool {
        self.has(KEY_ENCRYPTED_DATA)
    }
}

/// Position of a frame in the 4-way handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageNumber {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl MessageNumber {
    pub fn number(self) -> u8 {
        self as u8
    }

    /// The message that has to be present before this one is accepted.
    pub fn previous(self) -> Option<MessageNumber> {
        match self {
            MessageNumber::One => None,
            MessageNumber::Two => Some(MessageNumber::One),
            MessageNumber::Three => Some(MessageNumber::Two),
            MessageNumber::Four => Some(MessageNumber::Three),
        }
    }

    pub fn index(self) -> usize {
        self as usize - 1
    }
}

impl fmt::Display for MessageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M{}", self.number())
    }
}

/// A decoded EAPOL-Key frame
/// ## Description
/// All multi-byte fields are big-endian on the wire. `key_data` and `raw`
/// (the whole EAPOL PDU, header included, without link layer padding)
/// borrow from the captured frame until [`EapolKeyMessage::into_owned`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapolKeyMessage<'a> {
    pub version: u8,
    pub packet_type: u8,
    pub body_length: u16,
    pub key_descriptor_type: u8,
    pub key_information: KeyInformation,
    pub key_length: u16,
    pub replay_counter: u64,
    pub key_nonce: [u8; NONCE_LEN],
    pub key_iv: [u8; KEY_IV_LEN],
    pub key_rsc: u64,
    pub key_id: u64,
    pub key_mic: [u8; MIC_LEN],
    pub key_data_length: u16,
    pub key_data: Cow<'a, [u8]>,
    pub raw: Cow<'a, [u8]>,
}

fn malformed(reason: impl Into<String>) -> Error {
    Error::MalformedHandshakeMessage(reason.into())
}

impl<'a> EapolKeyMessage<'a> {
    /// Decodes an EAPOL-Key PDU
    /// ## Description
    /// `pdu` starts at the EAPOL header, right after the LLC/SNAP header.
    /// Bytes past the declared body length are link layer padding and are
    /// ignored. The declared key data length has to match the bytes left in
    /// the body exactly.
    pub fn decode(pdu: &'a [u8]) -> wlan::Result<EapolKeyMessage<'a>> {
        let mut cursor = ByteCursor::new(pdu);
        let version = cursor.read_u8()?;
        let packet_type = cursor.read_u8()?;
        let body_length = cursor.read_u16(Endian::Big)?;
        if packet_type != EAPOL_KEY_PACKET {
            return Err(malformed(format!("packet type {packet_type} is not EAPOL-Key")));
        }
        if body_length as usize > cursor.remaining() {
            return Err(malformed(format!(
                "body length {body_length} exceeds the {} bytes captured",
                cursor.remaining()
            )));
        }
        let raw = &pdu[..EAPOL_HEADER_LENGTH + body_length as usize];
        let mut body = ByteCursor::new(&raw[EAPOL_HEADER_LENGTH..]);

        let key_descriptor_type = body.read_u8()?;
        let key_information = KeyInformation(body.read_u16(Endian::Big)?);
        let key_length = body.read_u16(Endian::Big)?;
        let replay_counter = body.read_u64(Endian::Big)?;
        let key_nonce = body.read_array()?;
        let key_iv = body.read_array()?;
        let key_rsc = body.read_u64(Endian::Big)?;
        let key_id = body.read_u64(Endian::Big)?;
        let key_mic = body.read_array()?;
        let key_data_length = body.read_u16(Endian::Big)?;
        if key_data_length as usize != body.remaining() {
            return Err(malformed(format!(
                "key data length {key_data_length} but {} bytes remain",
                body.remaining()
            )));
        }
        let key_data = body.read_bytes(key_data_length as usize)?;

        Ok(EapolKeyMessage {
            version,
            packet_type,
            body_length,
            key_descriptor_type,
            key_information,
            key_length,
            replay_counter,
            key_nonce,
            key_iv,
            key_rsc,
            key_id,
            key_mic,
            key_data_length,
            key_data: Cow::Borrowed(key_data),
            raw: Cow::Borrowed(raw),
        })
    }

    /// Extracts the EAPOL-Key message carried by a data frame
    /// ## Description
    /// Returns `Ok(None)` for frames that do not carry one: management
    /// frames, null data, protected payloads, other Ethertypes and 802.1X
    /// packets of other types (EAP, start, logoff). A frame that does carry
    /// an EAPOL-Key message but fails to decode is an error.
    pub fn from_data_frame(decoded: &DecodedHeader<'a>) -> wlan::Result<Option<EapolKeyMessage<'a>>> {
        let frame_control = &decoded.frame_control;
        if !frame_control.kind().carries_data() || frame_control.protected() {
            return Ok(None);
        }
        let mut body = decoded.body.clone();
        if body.remaining() < LLC_HEADER_LENGTH || !LlcSnap::decode(&mut body)?.is_eapol() {
            return Ok(None);
        }
        match body.rest().get(1) {
            Some(&EAPOL_KEY_PACKET) => EapolKeyMessage::decode(body.rest()).map(Some),
            Some(_) => Ok(None),
            None => Err(Error::TruncatedInput {
                needed: EAPOL_HEADER_LENGTH,
                remaining: body.remaining(),
            }),
        }
    }

    /// Which 4-way handshake message the key information flags describe
    /// ## Description
    /// * ACK without MIC is message 1.
    /// * MIC with install is message 3.
    /// * MIC without ACK is message 2 when it carries key data (the station's
    ///   RSN element) and message 4 otherwise.
    ///
    /// Group key frames, requests and error reports are not part of the
    /// 4-way handshake and give `None`.
    pub fn message_number(&self) -> Option<MessageNumber> {
        let info = self.key_information;
        if !info.pairwise() || info.request() || info.error() {
            return None;
        }
        match (info.ack(), info.mic(), info.install()) {
            (true, false, _) => Some(MessageNumber::One),
            (_, true, true) => Some(MessageNumber::Three),
            (false, true, false) if self.key_data_length == 0 => Some(MessageNumber::Four),
            (false, true, false) => Some(MessageNumber::Two),
            _ => None,
        }
    }

    pub fn has_zero_nonce(&self) -> bool {
        aux::is_zeroed(&self.key_nonce)
    }

    /// The PDU with the MIC field zeroed, the input of the MIC computation.
    pub fn mic_message(&self) -> Vec<u8> {
        let mut message = self.raw.to_vec();
        if let Some(mic) = message.get_mut(EAPOL_MIC_OFFSET..EAPOL_MIC_OFFSET + MIC_LEN) {
            mic.fill(0);
        }
        message
    }

    pub fn into_owned(self) -> EapolKeyMessage<'static> {
        EapolKeyMessage {
            version: self.version,
            packet_type: self.packet_type,
            body_length: self.body_length,
            key_descriptor_type: self.key_descriptor_type,
            key_information: self.key_information,
            key_length: self.key_length,
            replay_counter: self.replay_counter,
            key_nonce: self.key_nonce,
            key_iv: self.key_iv,
            key_rsc: self.key_rsc,
            key_id: self.key_id,
            key_mic: self.key_mic,
            key_data_length: self.key_data_length,
            key_data: Cow::Owned(self.key_data.into_owned()),
            raw: Cow::Owned(self.raw.into_owned()),
        }
    }

    /// Serializes the fields, ignoring `raw`. Length fields are written as
    /// stored, which lets tests build inconsistent frames.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.version, self.packet_type];
        out.extend(Endian::Big.u16_bytes(self.body_length));
        out.push(self.key_descriptor_type);
        out.extend(Endian::Big.u16_bytes(self.key_information.0));
        out.extend(Endian::Big.u16_bytes(self.key_length));
        out.extend(Endian::Big.u64_bytes(self.replay_counter));
        out.extend(self.key_nonce);
        out.extend(self.key_iv);
        out.extend(Endian::Big.u64_bytes(self.key_rsc));
        out.extend(Endian::Big.u64_bytes(self.key_id));
        out.extend(self.key_mic);
        out.extend(Endian::Big.u16_bytes(self.key_data_length));
        out.extend_from_slice(&self.key_data);
        out
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn decodes_message_fields() {
        let pdu = key_message(EAPOL_MSG_2, 7, 0x5b, MSG_2_DATA);
        let message = EapolKeyMessage::decode(&pdu).unwrap();
        assert_eq!(2, message.version);
        assert_eq!(EAPOL_KEY_PACKET, message.packet_type);
        assert_eq!(117, message.body_length);
        assert_eq!(2, message.key_descriptor_type);
        assert_eq!(2, message.key_information.descriptor_version());
        assert!(message.key_information.pairwise());
        assert!(message.key_information.mic());
        assert!(!message.key_information.ack());
        assert_eq!(16, message.key_length);
        assert_eq!(7, message.replay_counter);
        assert_eq!([0x5b; 32], message.key_nonce);
        assert_eq!([0x4d; 16], message.key_mic);
        assert_eq!(22, message.key_data_length);
        assert_eq!(MSG_2_DATA, message.key_data.as_ref());
        assert_eq!(&pdu[..], message.raw.as_ref());
    }

    #[test]
    fn classifies_the_four_messages() {
        let numbers: Vec<Option<MessageNumber>> = handshake_messages()
            .iter()
            .map(|pdu| EapolKeyMessage::decode(pdu).unwrap().message_number())
            .collect();
        assert_eq!(
            vec![
                Some(MessageNumber::One),
                Some(MessageNumber::Two),
                Some(MessageNumber::Three),
                Some(MessageNumber::Four)
            ],
            numbers
        );
    }

    #[test]
    fn group_key_and_request_frames_are_not_classified() {
        // group key message 1: ack, mic, secure, encrypted data, no pairwise bit
        let group = key_message(0x1382, 3, 0, &[0x01; 8]);
        assert_eq!(None, EapolKeyMessage::decode(&group).unwrap().message_number());
        let request = key_message(0x0b0a, 3, 0, &[]);
        assert_eq!(None, EapolKeyMessage::decode(&request).unwrap().message_number());
    }

    #[test]
    fn key_data_length_larger_than_remaining() {
        let mut pdu = key_message(EAPOL_MSG_2, 1, 0x5b, MSG_2_DATA);
        // declare two bytes more key data than the body holds
        let at = EAPOL_HEADER_LENGTH + EAPOL_KEY_FIXED_LENGTH - 2;
        pdu[at..at + 2].copy_from_slice(&(MSG_2_DATA.len() as u16 + 2).to_be_bytes());
        assert!(matches!(
            EapolKeyMessage::decode(&pdu),
            Err(Error::MalformedHandshakeMessage(_))
        ));
    }

    #[test]
    fn key_data_length_smaller_than_remaining() {
        let mut pdu = key_message(EAPOL_MSG_2, 1, 0x5b, MSG_2_DATA);
        let at = EAPOL_HEADER_LENGTH + EAPOL_KEY_FIXED_LENGTH - 2;
        pdu[at..at + 2].copy_from_slice(&1u16.to_be_bytes());
        assert!(matches!(
            EapolKeyMessage::decode(&pdu),
            Err(Error::MalformedHandshakeMessage(_))
        ));
    }

    #[test]
    fn body_length_beyond_capture() {
        let pdu = key_message(EAPOL_MSG_1, 1, 0xa1, &[]);
        assert!(matches!(
            EapolKeyMessage::decode(&pdu[..pdu.len() - 1]),
            Err(Error::MalformedHandshakeMessage(_))
        ));
    }

    #[test]
    fn short_body_is_truncated() {
        let mut pdu = key_message(EAPOL_MSG_1, 1, 0xa1, &[]);
        pdu.truncate(50);
        pdu[2..4].copy_from_slice(&46u16.to_be_bytes());
        assert!(matches!(
            EapolKeyMessage::decode(&pdu),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn padding_after_body_is_ignored() {
        let mut pdu = key_message(EAPOL_MSG_4, 2, 0, &[]);
        let len = pdu.len();
        pdu.extend([0u8; 6]);
        let message = EapolKeyMessage::decode(&pdu).unwrap();
        assert_eq!(len, message.raw.len());
        assert_eq!(Some(MessageNumber::Four), message.message_number());
    }

    #[test]
    fn non_key_packets_are_rejected() {
        let eap_start = [0x01, 0x01, 0x00, 0x00];
        assert!(matches!(
            EapolKeyMessage::decode(&eap_start),
            Err(Error::MalformedHandshakeMessage(_))
        ));
    }

    #[test]
    fn extracted_from_data_frames() {
        let pdu = key_message(EAPOL_MSG_1, 1, 0xa1, &[]);
        let frame = data_frame(FROM_AP, STA, AP, AP, &pdu);
        let decoded = wlan::decode_header(&frame).unwrap();
        let message = EapolKeyMessage::from_data_frame(&decoded).unwrap().unwrap();
        assert_eq!(Some(MessageNumber::One), message.message_number());

        // same payload in a plain (non QoS) data frame
        let frame = data_frame(0x0208, STA, AP, AP, &pdu);
        let decoded = wlan::decode_header(&frame).unwrap();
        assert!(EapolKeyMessage::from_data_frame(&decoded).unwrap().is_some());
    }

    #[test]
    fn frames_without_eapol_key() {
        let eap = [0x02, 0x00, 0x00, 0x05, 0x01, 0x01, 0x00, 0x05, 0x01];
        let frame = data_frame(TO_AP, AP, STA, AP, &eap);
        let decoded = wlan::decode_header(&frame).unwrap();
        assert_eq!(None, EapolKeyMessage::from_data_frame(&decoded).unwrap());

        let pdu = key_message(EAPOL_MSG_1, 1, 0xa1, &[]);
        // protected flag set
        let frame = data_frame(0x4288, STA, AP, AP, &pdu);
        let decoded = wlan::decode_header(&frame).unwrap();
        assert_eq!(None, EapolKeyMessage::from_data_frame(&decoded).unwrap());

        let frame = data_frame(FROM_AP, STA, AP, AP, &[]);
        let decoded = wlan::decode_header(&frame).unwrap();
        assert!(matches!(
            EapolKeyMessage::from_data_frame(&decoded),
            Err(Error::TruncatedInput { .. })
        ));
    }

    #[test]
    fn mic_message_zeroes_the_mic() {
        let pdu = key_message(EAPOL_MSG_2, 1, 0x5b, MSG_2_DATA);
        let message = EapolKeyMessage::decode(&pdu).unwrap();
        let zeroed = message.mic_message();
        assert_eq!(pdu.len(), zeroed.len());
        assert!(aux::is_zeroed(&zeroed[EAPOL_MIC_OFFSET..EAPOL_MIC_OFFSET + MIC_LEN]));
        assert_eq!(&pdu[..EAPOL_MIC_OFFSET], &zeroed[..EAPOL_MIC_OFFSET]);
        assert_eq!(&pdu[EAPOL_MIC_OFFSET + MIC_LEN..], &zeroed[EAPOL_MIC_OFFSET + MIC_LEN..]);
    }
}
