use std::collections::HashMap;
use core::fmt;

use wlan::{Error, FrameControl, MacAddr, MacHeader};

use crate::consts::*;
use crate::eapol::{EapolKeyMessage, MessageNumber};

/// Anomalies a session keeps; older ones are dropped but still counted.
pub const MAX_ANOMALIES: usize = 8;

/// Identifies the handshake of one station with one access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub station: MacAddr,
    pub ap: MacAddr,
}

impl SessionKey {
    /// Picks station and AP from the header addresses according to the
    /// DS flags, so both directions of a handshake share one key.
    pub fn from_header(frame_control: &FrameControl, header: &MacHeader) -> SessionKey {
        let (addr1, addr2, addr3) = (header.addr1(), header.addr2(), header.addr3());
        match (frame_control.to_ds(), frame_control.from_ds()) {
            (false, true) => SessionKey { station: addr1, ap: addr2 },
            (false, false) => SessionKey {
                station: if addr2 == addr3 { addr1 } else { addr2 },
                ap: addr3,
            },
            (true, _) => SessionKey { station: addr2, ap: addr1 },
        }
    }

    /// Like [`SessionKey::from_header`], but resolves WDS frames, where
    /// both DS flags are set, by the direction of the key message: the
    /// authenticator sets the ACK bit, so an acknowledged message travels
    /// from the AP to the station.
    pub fn for_message(
        frame_control: &FrameControl,
        header: &MacHeader,
        message: &EapolKeyMessage<'_>,
    ) -> SessionKey {
        if !(frame_control.to_ds() && frame_control.from_ds()) {
            return SessionKey::from_header(frame_control, header);
        }
        let (addr1, addr2) = (header.addr1(), header.addr2());
        match message.key_information.ack() {
            true => SessionKey { station: addr1, ap: addr2 },
            false => SessionKey { station: addr2, ap: addr1 },
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {}", self.ap, self.station)
    }
}

/// A message that broke the expected order, kept with the message itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anomaly {
    pub error: Error,
    pub number: MessageNumber,
    pub message: EapolKeyMessage<'static>,
}

/// The messages captured so far for one station/AP pair
/// ## Description
/// Accepted messages always form an unbroken run starting at message 1.
/// Messages that arrive without their predecessor are kept as anomalies,
/// the latest [`MAX_ANOMALIES`] of them. The session completes when message
/// 4 is accepted and no anomaly was seen since the last message 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeSession {
    key: SessionKey,
    messages: [Option<EapolKeyMessage<'static>>; 4],
    anomalies: Vec<Anomaly>,
    anomaly_count: usize,
    complete: bool,
    restarts: usize,
    last_seen: u64,
}

impl HandshakeSession {
    fn new(key: SessionKey) -> Self {
        HandshakeSession {
            key,
            messages: Default::default(),
            anomalies: vec![],
            anomaly_count: 0,
            complete: false,
            restarts: 0,
            last_seen: 0,
        }
    }

    fn record_anomaly(&mut self, anomaly: Anomaly) {
        if self.anomalies.len() == MAX_ANOMALIES {
            self.anomalies.remove(0);
        }
        self.anomalies.push(anomaly);
        self.anomaly_count += 1;
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn message(&self, number: MessageNumber) -> Option<&EapolKeyMessage<'static>> {
        self.messages[number.index()].as_ref()
    }

    /// Accepted messages in handshake order.
    pub fn messages(&self) -> impl Iterator<Item = &EapolKeyMessage<'static>> {
        self.messages.iter().map_while(Option::as_ref)
    }

    /// The most recent anomalies, oldest first.
    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }

    /// Every anomaly since the last message 1, including dropped ones.
    pub fn anomaly_count(&self) -> usize {
        self.anomaly_count
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// How many times message 1 restarted this pair's handshake.
    pub fn restarts(&self) -> usize {
        self.restarts
    }

    /// Assembler tick of the last message ingested for this pair; larger
    /// is more recent.
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    /// The message the session waits for next.
    pub fn expected(&self) -> u8 {
        (self.messages().count() + 1).min(4) as u8
    }

    /// Handshake material, available once messages 1 and 2 are accepted.
    pub fn handshake(&self) -> Option<Handshake> {
        Handshake::from_session(self)
    }
}

/// What the assembler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Message 1 opened a new session.
    Started,
    /// Message 1 replaced a session that already existed for the pair.
    Restarted,
    Accepted,
    /// Message 4 completed the session.
    Completed,
    /// Recorded as an anomaly, see [`HandshakeOutcome::anomaly`].
    OutOfOrder,
    /// The session was already complete; the message was not applied.
    Duplicate,
    /// A group key, request or error frame. Not part of the 4-way
    /// handshake, so no session was touched.
    NotFourWay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeOutcome {
    pub key: SessionKey,
    /// `None` exactly when the disposition is [`Disposition::NotFourWay`].
    pub number: Option<MessageNumber>,
    pub disposition: Disposition,
    pub anomaly: Option<Error>,
}

impl HandshakeOutcome {
    pub fn is_complete(&self) -> bool {
        self.disposition == Disposition::Completed
    }
}

/// Tracks 4-way handshakes across frames
/// ## Description
/// Sessions are keyed by station and AP. Message 1 always starts the
/// pair's session over, dropping whatever was captured before. Messages 2-4
/// are accepted when their predecessor is present, accepting message N
/// drops anything captured after it (a retransmission rewinds the session).
/// Sessions never expire by themselves; the owner removes them with
/// [`HandshakeAssembler::remove`], and [`HandshakeAssembler::least_recent`]
/// names the pair that went quiet first.
/// ## Example
/// **Basic usage:**
/// ```
///     let mut assembler = wpa::HandshakeAssembler::new();
///     # let frames: Vec<Vec<u8>> = vec![];
///     for frame in &frames {
///         if let Ok(outcome) = assembler.ingest_frame(frame) {
///             if outcome.is_complete() {
///                 println!("captured handshake {}", outcome.key);
///             }
///         }
///     }
/// ```
#[derive(Debug, Default)]
pub struct HandshakeAssembler {
    sessions: HashMap<SessionKey, HandshakeSession>,
    tick: u64,
}

impl HandshakeAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a raw frame and feeds its EAPOL-Key message to the sessions.
    /// Frames without one are reported as [`Error::UnsupportedFrameType`].
    pub fn ingest_frame(&mut self, frame: &[u8]) -> wlan::Result<HandshakeOutcome> {
        let decoded = wlan::decode_header(frame)?;
        match EapolKeyMessage::from_data_frame(&decoded)? {
            Some(message) => self.ingest(&decoded.frame_control, &decoded.header, message),
            None => Err(Error::UnsupportedFrameType(decoded.frame_control)),
        }
    }

    pub fn ingest(
        &mut self,
        frame_control: &FrameControl,
        header: &MacHeader,
        message: EapolKeyMessage<'_>,
    ) -> wlan::Result<HandshakeOutcome> {
        let key = SessionKey::for_message(frame_control, header, &message);
        let number = match message.message_number() {
            Some(number) => number,
            None => {
                return Ok(HandshakeOutcome {
                    key,
                    number: None,
                    disposition: Disposition::NotFourWay,
                    anomaly: None,
                })
            }
        };
        let message = message.into_owned();
        self.tick += 1;

        if number == MessageNumber::One {
            let mut session = HandshakeSession::new(key);
            session.messages[0] = Some(message);
            session.last_seen = self.tick;
            let disposition = match self.sessions.get(&key) {
                Some(previous) => {
                    session.restarts = previous.restarts + 1;
                    Disposition::Restarted
                }
                None => Disposition::Started,
            };
            self.sessions.insert(key, session);
            return Ok(HandshakeOutcome { key, number: Some(number), disposition, anomaly: None });
        }

        let session = self
            .sessions
            .entry(key)
            .or_insert_with(|| HandshakeSession::new(key));
        session.last_seen = self.tick;
        if session.complete {
            return Ok(HandshakeOutcome {
                key,
                number: Some(number),
                disposition: Disposition::Duplicate,
                anomaly: None,
            });
        }

        let has_previous = number
            .previous()
            .map_or(false, |previous| session.messages[previous.index()].is_some());
        if !has_previous {
            let error = Error::OutOfOrderHandshakeMessage {
                expected: session.expected(),
                received: number.number(),
            };
            session.record_anomaly(Anomaly { error: error.clone(), number, message });
            return Ok(HandshakeOutcome {
                key,
                number: Some(number),
                disposition: Disposition::OutOfOrder,
                anomaly: Some(error),
            });
        }

        session.messages[number.index()] = Some(message);
        session.messages[number.index() + 1..].fill(None);
        let disposition = if number == MessageNumber::Four && session.anomaly_count == 0 {
            session.complete = true;
            Disposition::Completed
        } else {
            Disposition::Accepted
        };
        Ok(HandshakeOutcome { key, number: Some(number), disposition, anomaly: None })
    }

    pub fn session(&self, key: &SessionKey) -> Option<&HandshakeSession> {
        self.sessions.get(key)
    }

    pub fn sessions(&self) -> impl Iterator<Item = &HandshakeSession> {
        self.sessions.values()
    }

    pub fn completed(&self) -> impl Iterator<Item = &HandshakeSession> {
        self.sessions.values().filter(|session| session.complete)
    }

    /// The session that received a message longest ago.
    pub fn least_recent(&self) -> Option<SessionKey> {
        self.sessions
            .values()
            .min_by_key(|session| session.last_seen)
            .map(|session| session.key)
    }

    pub fn remove(&mut self, key: &SessionKey) -> Option<HandshakeSession> {
        self.sessions.remove(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// contains the information captured from the handshake
/// ## Description
/// The material needed to verify a passphrase offline, taken from
/// messages 1 and 2:
/// * ESSID (from a beacon of the network, if known)
/// * A Nonce
/// * S Nonce
/// * AP and station MAC addresses
/// * MIC
/// * the message 2 EAPOL frame with its MIC zeroed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub essid: Option<Vec<u8>>,
    pub ap_mac: MacAddr,
    pub station_mac: MacAddr,
    pub a_nonce: [u8; NONCE_LEN],
    pub s_nonce: [u8; NONCE_LEN],
    pub mic: [u8; MIC_LEN],
    pub mic_msg: Vec<u8>,
    /// Message 2 answered message 1's replay counter.
    pub replay_counter_match: bool,
    /// The session reached message 4.
    pub complete: bool,
}

impl Handshake {
    pub fn from_session(session: &HandshakeSession) -> Option<Handshake> {
        let msg_1 = session.message(MessageNumber::One)?;
        let msg_2 = session.message(MessageNumber::Two)?;
        Some(Handshake {
            essid: None,
            ap_mac: session.key.ap,
            station_mac: session.key.station,
            a_nonce: msg_1.key_nonce,
            s_nonce: msg_2.key_nonce,
            mic: msg_2.key_mic,
            mic_msg: msg_2.mic_message(),
            replay_counter_match: msg_1.replay_counter == msg_2.replay_counter,
            complete: session.complete,
        })
    }

    pub fn with_essid(mut self, essid: &[u8]) -> Self {
        self.essid = Some(essid.to_vec());
        self
    }

    /// hashcat message pair byte: M1+M2 with the EAPOL frame taken from M2,
    /// high bit set when the replay counters did not match.
    pub fn message_pair(&self) -> u8 {
        if self.replay_counter_match {
            0x00
        } else {
            0x80
        }
    }

    /// The handshake as a hashcat mode 22000 line, if the ESSID is known.
    pub fn hc22000(&self) -> Option<String> {
        let essid = self.essid.as_ref()?;
        Some(format!(
            "WPA*02*{}*{}*{}*{}*{}*{}*{:02x}",
            hex::encode(self.mic),
            self.ap_mac.to_hex(),
            self.station_mac.to_hex(),
            hex::encode(essid),
            hex::encode(self.a_nonce),
            hex::encode(&self.mic_msg),
            self.message_pair()
        ))
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let essid = self
            .essid
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        write!(
            f,
            "- ssid: {}\n- bssid: {}\n- client: {}\n- ANONCE: {}\n- SNONCE: {}\n- MIC: {}\n- MIC MSG: {}\n",
            essid,
            self.ap_mac,
            self.station_mac,
            hex::encode(self.a_nonce),
            hex::encode(self.s_nonce),
            hex::encode(self.mic),
            hex::encode(&self.mic_msg)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eapol::testing::*;

    const OTHER_STA: MacAddr = MacAddr([0x02, 0x00, 0x00, 0x00, 0x00, 0x07]);

    /// Frame for message `n` (1-4) of the standard handshake, in the
    /// direction that message travels.
    fn frame(n: usize, station: MacAddr) -> Vec<u8> {
        let pdu = &handshake_messages()[n - 1];
        if n % 2 == 1 {
            data_frame(FROM_AP, station, AP, AP, pdu)
        } else {
            data_frame(TO_AP, AP, station, AP, pdu)
        }
    }

    fn feed(assembler: &mut HandshakeAssembler, order: &[usize]) -> Vec<HandshakeOutcome> {
        order
            .iter()
            .map(|n| assembler.ingest_frame(&frame(*n, STA)).unwrap())
            .collect()
    }

    fn key() -> SessionKey {
        SessionKey { station: STA, ap: AP }
    }

    #[test]
    fn complete_handshake_in_order() {
        let mut assembler = HandshakeAssembler::new();
        let outcomes = feed(&mut assembler, &[1, 2, 3, 4]);
        let dispositions: Vec<Disposition> = outcomes.iter().map(|o| o.disposition).collect();
        assert_eq!(
            vec![
                Disposition::Started,
                Disposition::Accepted,
                Disposition::Accepted,
                Disposition::Completed
            ],
            dispositions
        );
        assert!(outcomes.iter().all(|o| o.key == key() && o.anomaly.is_none()));
        assert!(outcomes[3].is_complete());

        let session = assembler.session(&key()).unwrap();
        assert!(session.is_complete());
        let numbers: Vec<Option<MessageNumber>> =
            session.messages().map(|m| m.message_number()).collect();
        assert_eq!(
            vec![
                Some(MessageNumber::One),
                Some(MessageNumber::Two),
                Some(MessageNumber::Three),
                Some(MessageNumber::Four)
            ],
            numbers
        );
        assert_eq!(1, assembler.completed().count());
    }

    #[test]
    fn message_3_before_message_1() {
        let mut assembler = HandshakeAssembler::new();
        let outcome = assembler.ingest_frame(&frame(3, STA)).unwrap();
        assert_eq!(Disposition::OutOfOrder, outcome.disposition);
        assert_eq!(
            Some(Error::OutOfOrderHandshakeMessage { expected: 1, received: 3 }),
            outcome.anomaly
        );
        assert!(!outcome.anomaly.as_ref().unwrap().is_fatal());

        let session = assembler.session(&key()).unwrap();
        assert!(!session.is_complete());
        assert_eq!(1, session.anomalies().len());
        assert_eq!(MessageNumber::Three, session.anomalies()[0].number);
        assert_eq!(0, session.messages().count());
    }

    #[test]
    fn anomaly_blocks_completion_until_restart() {
        let mut assembler = HandshakeAssembler::new();
        let outcomes = feed(&mut assembler, &[1, 3, 2, 3, 4]);
        assert_eq!(Disposition::OutOfOrder, outcomes[1].disposition);
        assert_eq!(
            Some(Error::OutOfOrderHandshakeMessage { expected: 2, received: 3 }),
            outcomes[1].anomaly
        );
        assert_eq!(Disposition::Accepted, outcomes[4].disposition);
        assert!(!assembler.session(&key()).unwrap().is_complete());
        assert_eq!(4, assembler.session(&key()).unwrap().messages().count());

        let outcomes = feed(&mut assembler, &[1, 2, 3, 4]);
        assert_eq!(Disposition::Restarted, outcomes[0].disposition);
        assert!(outcomes[3].is_complete());
        let session = assembler.session(&key()).unwrap();
        assert!(session.anomalies().is_empty());
        assert_eq!(1, session.restarts());
    }

    #[test]
    fn message_1_restarts_a_partial_session() {
        let mut assembler = HandshakeAssembler::new();
        feed(&mut assembler, &[1, 2]);
        let outcome = assembler.ingest_frame(&frame(1, STA)).unwrap();
        assert_eq!(Disposition::Restarted, outcome.disposition);
        let session = assembler.session(&key()).unwrap();
        assert_eq!(1, session.messages().count());
        assert_eq!(2, session.expected());
    }

    #[test]
    fn retransmission_rewinds() {
        let mut assembler = HandshakeAssembler::new();
        let outcomes = feed(&mut assembler, &[1, 2, 3, 2, 3, 3, 4]);
        assert!(outcomes.iter().all(|o| o.anomaly.is_none()));
        assert!(outcomes[6].is_complete());
    }

    #[test]
    fn completed_sessions_ignore_late_frames() {
        let mut assembler = HandshakeAssembler::new();
        feed(&mut assembler, &[1, 2, 3, 4]);
        let outcome = assembler.ingest_frame(&frame(4, STA)).unwrap();
        assert_eq!(Disposition::Duplicate, outcome.disposition);
        assert!(assembler.session(&key()).unwrap().is_complete());
        assert!(assembler.remove(&key()).is_some());
        assert!(assembler.is_empty());
    }

    #[test]
    fn sessions_are_per_station() {
        let mut assembler = HandshakeAssembler::new();
        assembler.ingest_frame(&frame(1, STA)).unwrap();
        let outcome = assembler.ingest_frame(&frame(2, OTHER_STA)).unwrap();
        assert_eq!(Disposition::OutOfOrder, outcome.disposition);
        assert_eq!(SessionKey { station: OTHER_STA, ap: AP }, outcome.key);
        assert_eq!(2, assembler.len());
        assert_eq!(1, assembler.session(&key()).unwrap().messages().count());
    }

    #[test]
    fn session_key_roles() {
        let from_ap = frame(1, STA);
        let to_ap = frame(2, STA);
        for data in [from_ap, to_ap] {
            let decoded = wlan::decode_header(&data).unwrap();
            assert_eq!(key(), SessionKey::from_header(&decoded.frame_control, &decoded.header));
        }
        let header = MacHeader::ThreeAddress(wlan::AddressFields {
            duration_id: 0,
            addr1: STA,
            addr2: AP,
            addr3: AP,
            seq_ctrl: 0,
        });
        assert_eq!(key(), SessionKey::from_header(&FrameControl::from_bits(0x0008), &header));
    }

    #[test]
    fn wds_handshake_shares_one_session() {
        let wds = FrameControl::from_bits(0x0308);
        let mut assembler = HandshakeAssembler::new();
        let outcomes: Vec<HandshakeOutcome> = handshake_messages()
            .iter()
            .enumerate()
            .map(|(i, pdu)| {
                // the authenticator's messages travel AP -> station
                let (addr1, addr2) = if i % 2 == 0 { (STA, AP) } else { (AP, STA) };
                let fields = wlan::AddressFields { duration_id: 0, addr1, addr2, addr3: AP, seq_ctrl: 0 };
                let header = MacHeader::FourAddress { fields, addr4: STA };
                let message = EapolKeyMessage::decode(pdu).unwrap();
                assembler.ingest(&wds, &header, message).unwrap()
            })
            .collect();
        assert!(outcomes.iter().all(|o| o.key == key() && o.anomaly.is_none()));
        assert!(outcomes[3].is_complete());
        assert_eq!(1, assembler.len());
    }

    #[test]
    fn anomalies_are_capped() {
        let mut assembler = HandshakeAssembler::new();
        feed(&mut assembler, &[3; 100]);
        let session = assembler.session(&key()).unwrap();
        assert_eq!(MAX_ANOMALIES, session.anomalies().len());
        assert_eq!(100, session.anomaly_count());

        feed(&mut assembler, &[1]);
        assert_eq!(0, assembler.session(&key()).unwrap().anomaly_count());
    }

    #[test]
    fn least_recent_session() {
        let mut assembler = HandshakeAssembler::new();
        assert_eq!(None, assembler.least_recent());
        assembler.ingest_frame(&frame(1, STA)).unwrap();
        assembler.ingest_frame(&frame(1, OTHER_STA)).unwrap();
        assert_eq!(Some(key()), assembler.least_recent());

        assembler.ingest_frame(&frame(2, STA)).unwrap();
        assert_eq!(Some(SessionKey { station: OTHER_STA, ap: AP }), assembler.least_recent());
    }

    #[test]
    fn non_handshake_frames() {
        let mut assembler = HandshakeAssembler::new();
        let group = key_message(0x1382, 3, 0, &[0x01; 8]);
        let frame = data_frame(FROM_AP, STA, AP, AP, &group);
        let outcome = assembler.ingest_frame(&frame).unwrap();
        assert_eq!(Disposition::NotFourWay, outcome.disposition);
        assert_eq!(None, outcome.number);
        assert_eq!(key(), outcome.key);
        let beacon = [0x80, 0x00, 0x00, 0x00];
        assert!(assembler.ingest_frame(&beacon).is_err());
        assert!(assembler.is_empty());
    }

    #[test]
    fn handshake_material() {
        let mut assembler = HandshakeAssembler::new();
        feed(&mut assembler, &[1, 2]);
        let handshake = assembler.session(&key()).unwrap().handshake().unwrap();
        assert!(!handshake.complete);
        assert!(handshake.replay_counter_match);
        assert_eq!([0xa1; 32], handshake.a_nonce);
        assert_eq!([0x5b; 32], handshake.s_nonce);
        assert_eq!([0x4d; 16], handshake.mic);
        assert_eq!(None, handshake.hc22000());

        let line = handshake.with_essid(b"test").hc22000().unwrap();
        let fields: Vec<&str> = line.split('*').collect();
        assert_eq!(9, fields.len());
        assert_eq!("WPA", fields[0]);
        assert_eq!("02", fields[1]);
        assert_eq!("4d".repeat(16), fields[2]);
        assert_eq!("001122334455", fields[3]);
        assert_eq!("66778899aabb", fields[4]);
        assert_eq!("74657374", fields[5]);
        assert_eq!("a1".repeat(32), fields[6]);
        assert!(!fields[7].contains(&"4d".repeat(16)));
        assert_eq!(2 * (EAPOL_HEADER_LENGTH + EAPOL_KEY_FIXED_LENGTH + 22), fields[7].len());
        assert_eq!("00", fields[8]);
    }

    #[test]
    fn handshake_needs_messages_1_and_2() {
        let mut assembler = HandshakeAssembler::new();
        feed(&mut assembler, &[1]);
        assert_eq!(None, assembler.session(&key()).unwrap().handshake());
    }
}
