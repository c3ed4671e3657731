use core::fmt;
use std::borrow::Cow;

use wlan::{BeaconRecord, Capabilities, MacAddr};

use crate::handshake::Handshake;
use crate::security::{identify_protocol, Protocol};

/// contains information about a network
/// ## Description
/// The struct aggregates what was captured about one BSSID:
/// * BSSID - MAC address
/// * SSID - network's name, kept once seen even if later beacons hide it
/// * Channel
/// * Security protocol
/// * Clients - stations seen in handshakes with the network
/// * Handshake - the best handshake captured so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub bssid: MacAddr,
    pub ssid: Option<Vec<u8>>,
    pub channel: Option<u8>,
    pub capabilities: Capabilities,
    pub protocol: Protocol,
    pub beacons: usize,
    pub clients: Vec<MacAddr>,
    pub handshake: Option<Handshake>,
}

impl NetworkInfo {
    pub fn new(bssid: MacAddr) -> Self {
        NetworkInfo {
            bssid,
            ssid: None,
            channel: None,
            capabilities: Capabilities::default(),
            protocol: Protocol::Unknown,
            beacons: 0,
            clients: vec![],
            handshake: None,
        }
    }

    pub fn from_beacon(beacon: &BeaconRecord<'_>) -> Self {
        let mut network = NetworkInfo::new(beacon.bssid());
        network.update(beacon);
        network
    }

    /// Folds a beacon or probe response of the network into the record.
    pub fn update(&mut self, beacon: &BeaconRecord<'_>) {
        self.beacons += 1;
        if !beacon.is_hidden() {
            self.ssid = beacon.ssid().map(<[u8]>::to_vec);
        }
        if let Some(channel) = beacon.channel() {
            self.channel = Some(channel);
        }
        self.capabilities = beacon.capabilities;
        self.protocol = identify_protocol(beacon);
        if let Some(handshake) = self.handshake.take() {
            self.handshake = Some(self.label(handshake));
        }
    }

    pub fn add_client(&mut self, client: MacAddr) {
        if let Err(position) = self.clients.binary_search(&client) {
            self.clients.insert(position, client);
        }
    }

    /// Keeps the handshake unless a complete one is already held.
    pub fn add_handshake(&mut self, handshake: Handshake) {
        self.add_client(handshake.station_mac);
        let replace = match &self.handshake {
            Some(current) => !current.complete || handshake.complete,
            None => true,
        };
        if replace {
            self.handshake = Some(self.label(handshake));
        }
    }

    fn label(&self, handshake: Handshake) -> Handshake {
        match &self.ssid {
            Some(ssid) => handshake.with_essid(ssid),
            None => handshake,
        }
    }

    pub fn ssid_lossy(&self) -> Cow<'_, str> {
        match &self.ssid {
            Some(ssid) => String::from_utf8_lossy(ssid),
            None => Cow::Borrowed("<hidden>"),
        }
    }
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<32} | {:>3} | {:<8} | {} | {:>5} | {}",
            self.ssid_lossy(),
            self.channel.unwrap_or(0),
            self.protocol,
            self.bssid,
            self.beacons,
            if self.handshake.is_some() { "handshake" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wlan::{AddressFields, FrameControl, MacHeader};

    const AP: MacAddr = MacAddr([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    const STA: MacAddr = MacAddr([0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb]);

    fn beacon(tags: &[u8]) -> Vec<u8> {
        let header = MacHeader::ThreeAddress(AddressFields {
            duration_id: 0,
            addr1: MacAddr::BROADCAST,
            addr2: AP,
            addr3: AP,
            seq_ctrl: 0,
        });
        let mut frame = vec![];
        header.encode(&FrameControl::from_bits(0x0080), &mut frame);
        frame.extend([0; 8]);
        frame.extend(100u16.to_le_bytes());
        frame.extend(0x0001u16.to_le_bytes());
        frame.extend_from_slice(tags);
        frame
    }

    fn handshake(complete: bool) -> Handshake {
        Handshake {
            essid: None,
            ap_mac: AP,
            station_mac: STA,
            a_nonce: [0xa1; 32],
            s_nonce: [0x5b; 32],
            mic: [0x4d; 16],
            mic_msg: vec![0x02, 0x03],
            replay_counter_match: true,
            complete,
        }
    }

    #[test]
    fn aggregates_beacons() {
        let frame = beacon(&[0x00, 0x04, b'h', b'o', b'm', b'e', 0x03, 0x01, 0x06]);
        let mut network = NetworkInfo::from_beacon(&wlan::extract_beacon(&frame).unwrap());
        assert_eq!(AP, network.bssid);
        assert_eq!("home", network.ssid_lossy());
        assert_eq!(Some(6), network.channel);
        assert_eq!(Protocol::Open, network.protocol);

        let hidden = beacon(&[0x00, 0x00]);
        network.update(&wlan::extract_beacon(&hidden).unwrap());
        assert_eq!(2, network.beacons);
        assert_eq!(Some(b"home".to_vec()), network.ssid);
        assert_eq!(Some(6), network.channel);
    }

    #[test]
    fn hidden_network() {
        let frame = beacon(&[0x00, 0x03, 0, 0, 0]);
        let network = NetworkInfo::from_beacon(&wlan::extract_beacon(&frame).unwrap());
        assert_eq!(None, network.ssid);
        assert_eq!("<hidden>", network.ssid_lossy());
    }

    #[test]
    fn clients_are_unique() {
        let mut network = NetworkInfo::new(AP);
        network.add_client(STA);
        network.add_client(MacAddr([0x02; 6]));
        network.add_client(STA);
        assert_eq!(vec![MacAddr([0x02; 6]), STA], network.clients);
    }

    #[test]
    fn handshakes_get_the_essid() {
        let mut network = NetworkInfo::new(AP);
        network.add_handshake(handshake(false));
        assert_eq!(None, network.handshake.as_ref().unwrap().essid);
        assert_eq!(vec![STA], network.clients);

        let frame = beacon(&[0x00, 0x04, b'h', b'o', b'm', b'e']);
        network.update(&wlan::extract_beacon(&frame).unwrap());
        assert_eq!(Some(b"home".to_vec()), network.handshake.as_ref().unwrap().essid);
    }

    #[test]
    fn complete_handshake_is_kept() {
        let mut network = NetworkInfo::new(AP);
        network.add_handshake(handshake(true));
        let mut partial = handshake(false);
        partial.mic = [0; 16];
        network.add_handshake(partial);
        assert_eq!([0x4d; 16], network.handshake.as_ref().unwrap().mic);
    }
}
