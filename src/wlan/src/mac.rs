use std::fmt;
use std::str::FromStr;

use hex::FromHex;
use itertools::Itertools;

/// A 48 bit IEEE MAC address
/// ## Description
/// Displays as colon separated lowercase hex. Parses from `aa:bb:cc:dd:ee:ff`,
/// `aa-bb-cc-dd-ee-ff` or the bare `aabbccddeeff` form used for BSSIDs on the
/// command line.
/// ## Example
/// **Basic usage:**
/// ```
///     let bssid: wlan::MacAddr = "AABBCCDDEEFF".parse().unwrap();
///     assert_eq!("aa:bb:cc:dd:ee:ff", bssid.to_string());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        aux::compare_arrays(&self.0, &Self::BROADCAST.0)
    }

    /// Group addresses have the I/G bit of the first octet set.
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }

    /// Locally administered, typically a randomized station address.
    pub fn is_local(&self) -> bool {
        self.0[0] & 0x02 != 0
    }

    /// Bare lowercase hex, as used in hashcat lines.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        MacAddr(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().map(|b| format!("{b:02x}")).join(":"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid mac address {0:?}")]
pub struct InvalidMacAddr(pub String);

impl FromStr for MacAddr {
    type Err = InvalidMacAddr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != ':' && *c != '-').collect();
        <[u8; 6]>::from_hex(&digits)
            .map(MacAddr)
            .map_err(|_| InvalidMacAddr(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let expected = MacAddr([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]);
        assert_eq!(expected, "00:11:22:aa:bb:cc".parse().unwrap());
        assert_eq!(expected, "00-11-22-AA-BB-CC".parse().unwrap());
        assert_eq!(expected, "001122aabbcc".parse().unwrap());
        assert_eq!("00:11:22:aa:bb:cc", expected.to_string());
        assert_eq!("001122aabbcc", expected.to_hex());
    }

    #[test]
    fn rejects_bad_input() {
        assert!("00:11:22".parse::<MacAddr>().is_err());
        assert!("zz1122aabbcc".parse::<MacAddr>().is_err());
        assert!("".parse::<MacAddr>().is_err());
    }

    #[test]
    fn address_classes() {
        assert!(MacAddr::BROADCAST.is_broadcast());
        assert!(MacAddr::BROADCAST.is_multicast());
        assert!(MacAddr([0x01, 0x00, 0x5e, 0, 0, 1]).is_multicast());
        assert!(MacAddr([0xda, 0, 0, 0, 0, 0]).is_local());
        assert!(!MacAddr([0x00, 0x11, 0x22, 0, 0, 0]).is_local());
    }
}
