use crate::ipc::{IPCMessage, Report, IPC};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};
use wlan::{BeaconRecord, FrameControl, MacAddr, MacHeader};
use wpa::{
    Disposition, EapolKeyMessage, HandshakeAssembler, NetworkInfo, ParsedFrame, SessionKey,
};

type CollectorSender = Sender<IPCMessage>;
type CollectorReciever = Receiver<Report>;

/// Settings of a collector thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Only collect frames of this access point.
    pub bssid: Option<MacAddr>,
    /// Keep completed sessions in the assembler after reporting them.
    pub keep_completed: bool,
    /// Sessions kept at most; past it the least recently active one is
    /// evicted.
    pub max_sessions: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig {
            bssid: None,
            keep_completed: true,
            max_sessions: 4096,
        }
    }
}

/// Everything the collector learned, handed back when it stops
#[derive(Debug, Default)]
pub struct CollectorState {
    pub networks: HashMap<MacAddr, NetworkInfo>,
    pub assembler: HandshakeAssembler,
    pub frames: usize,
    pub rejected: usize,
    /// Sessions dropped to stay within [`CollectorConfig::max_sessions`].
    pub evicted: usize,
}

/// Owns the handshake sessions and the network table
/// ## Description
/// Producers send raw frames through [`IPCMessage::Frame`]; the thread
/// decodes them in arrival order and reports new networks, completed
/// handshakes, anomalies and undecodable frames. Being the only owner of the
/// sessions, it needs no locking.
/// ## Example
/// **Basic usage:**
/// ```
///     use threads::{CollectorConfig, CollectorThread, IPCMessage};
///
///     let (tx, rx, handle) = CollectorThread::spawn(CollectorConfig::default());
///     tx.send(IPCMessage::Frame(vec![0x80, 0x00])).unwrap();
///     tx.send(IPCMessage::EndCommunication).unwrap();
///     let state = handle.join().unwrap();
///     assert_eq!(1, state.frames);
///     assert_eq!(1, rx.try_iter().count()); // the frame was rejected
/// ```
pub struct CollectorThread {
    config: CollectorConfig,
    channels: IPC,
    state: CollectorState,
}

impl CollectorThread {
    pub fn init(config: CollectorConfig, rx: Receiver<IPCMessage>, tx: Sender<Report>) -> Self {
        CollectorThread {
            config,
            channels: IPC { rx, tx },
            state: CollectorState::default(),
        }
    }

    /// Starts a collector on its own thread.
    pub fn spawn(
        config: CollectorConfig,
    ) -> (CollectorSender, CollectorReciever, JoinHandle<CollectorState>) {
        let (frame_tx, frame_rx) = channel();
        let (report_tx, report_rx) = channel();
        let collector = CollectorThread::init(config, frame_rx, report_tx);
        let handle = thread::spawn(move || collector.run());
        (frame_tx, report_rx, handle)
    }

    /// Processes messages until `EndCommunication`, or until every sender
    /// is gone, and returns the final state.
    pub fn run(mut self) -> CollectorState {
        while let Ok(msg) = self.channels.rx.recv() {
            match msg {
                IPCMessage::Frame(frame) => self.handle_frame(&frame),
                IPCMessage::EndCommunication => break,
            }
        }
        log::debug!(
            "collector stopped after {} frames, {} networks, {} sessions",
            self.state.frames,
            self.state.networks.len(),
            self.state.assembler.len()
        );
        self.state
    }

    fn report(&self, report: Report) {
        if self.channels.tx.send(report).is_err() {
            log::trace!("report receiver is gone");
        }
    }

    fn accepts(&self, bssid: MacAddr) -> bool {
        self.config.bssid.map_or(true, |filter| filter == bssid)
    }

    fn handle_frame(&mut self, frame: &[u8]) {
        self.state.frames += 1;
        match wpa::parse_frame(frame) {
            Ok(ParsedFrame::Beacon(beacon)) => self.handle_beacon(&beacon),
            Ok(ParsedFrame::Eapol { frame_control, header, message, .. }) => {
                self.handle_eapol(&frame_control, &header, message)
            }
            Ok(ParsedFrame::Other { .. }) => {}
            Err(e) if !e.is_fatal() => log::trace!("skipping frame: {e}"),
            Err(e) => {
                log::debug!("rejected frame {}: {e}", self.state.frames);
                self.state.rejected += 1;
                self.report(Report::Rejected(e));
            }
        }
    }

    fn handle_beacon(&mut self, beacon: &BeaconRecord<'_>) {
        let bssid = beacon.bssid();
        if !self.accepts(bssid) {
            return;
        }
        match self.state.networks.get_mut(&bssid) {
            Some(network) => network.update(beacon),
            None => {
                let network = NetworkInfo::from_beacon(beacon);
                log::info!("new network {} ({})", network.ssid_lossy(), bssid);
                self.report(Report::Network(network.clone()));
                self.state.networks.insert(bssid, network);
            }
        }
    }

    fn handle_eapol(
        &mut self,
        frame_control: &FrameControl,
        header: &MacHeader,
        message: EapolKeyMessage<'_>,
    ) {
        let key = SessionKey::for_message(frame_control, header, &message);
        if !self.accepts(key.ap) {
            return;
        }
        let outcome = match self.state.assembler.ingest(frame_control, header, message) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::debug!("{key}: {e}");
                self.state.rejected += 1;
                self.report(Report::Rejected(e));
                return;
            }
        };
        let number = match outcome.number {
            Some(number) => number,
            None => {
                log::trace!("{key}: key message outside the 4-way handshake");
                return;
            }
        };
        log::debug!("{key}: {number} {:?}", outcome.disposition);
        self.evict();

        if let Some(error) = outcome.anomaly {
            log::info!("{key}: {error}");
            self.report(Report::Anomaly { key, error });
            return;
        }

        let handshake = self
            .state
            .assembler
            .session(&key)
            .and_then(|session| session.handshake());
        let network = self
            .state
            .networks
            .entry(key.ap)
            .or_insert_with(|| NetworkInfo::new(key.ap));
        network.add_client(key.station);
        if let Some(handshake) = handshake {
            network.add_handshake(handshake);
        }

        if outcome.disposition == Disposition::Completed {
            if let Some(handshake) = network.handshake.clone() {
                log::info!("captured handshake {key}");
                self.report(Report::Handshake(handshake));
            }
            if !self.config.keep_completed {
                self.state.assembler.remove(&key);
            }
        }
    }

    fn evict(&mut self) {
        while self.state.assembler.len() > self.config.max_sessions {
            let Some(key) = self.state.assembler.least_recent() else {
                break;
            };
            log::debug!("{key}: evicting idle session");
            self.state.assembler.remove(&key);
            self.state.evicted += 1;
        }
    }
}
