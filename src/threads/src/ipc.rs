use std::sync::mpsc::{Receiver, Sender};
use wlan::MacAddr;
use wpa::{Handshake, NetworkInfo, SessionKey};

/// Messages sent to the collector thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IPCMessage {
    /// A captured 802.11 frame, radiotap header already removed.
    Frame(Vec<u8>),
    EndCommunication,
}

/// What the collector thread reports back
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// A BSSID seen for the first time.
    Network(NetworkInfo),
    /// A completed handshake, labeled with the network's SSID when known.
    Handshake(Handshake),
    /// A handshake message that arrived out of order.
    Anomaly { key: SessionKey, error: wlan::Error },
    /// A frame that failed to decode.
    Rejected(wlan::Error),
}

impl Report {
    /// The access point the report is about, if any.
    pub fn bssid(&self) -> Option<MacAddr> {
        match self {
            Report::Network(network) => Some(network.bssid),
            Report::Handshake(handshake) => Some(handshake.ap_mac),
            Report::Anomaly { key, .. } => Some(key.ap),
            Report::Rejected(_) => None,
        }
    }
}

pub struct IPC {
    pub rx: Receiver<IPCMessage>,
    pub tx: Sender<Report>,
}
