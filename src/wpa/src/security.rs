use core::fmt;

use aux::Endian;
use wlan::{BeaconRecord, ByteCursor};

use crate::consts::*;

/// The security protocol a network advertises
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    Open,
    Wep,
    Wpa,
    Wpa2Psk,
    Wpa2Eap,
    Wpa3Sae,
    #[default]
    Unknown,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Protocol::Open => "OPEN",
            Protocol::Wep => "WEP",
            Protocol::Wpa => "WPA",
            Protocol::Wpa2Psk => "WPA2-PSK",
            Protocol::Wpa2Eap => "WPA2-EAP",
            Protocol::Wpa3Sae => "WPA3-SAE",
            Protocol::Unknown => "unknown",
        };
        f.pad(name)
    }
}

/// A cipher or AKM suite selector: OUI and suite type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suite {
    pub oui: u32,
    pub suite_type: u8,
}

impl Suite {
    fn decode(cursor: &mut ByteCursor<'_>) -> wlan::Result<Suite> {
        Ok(Suite {
            oui: cursor.read_u24(Endian::Big)?,
            suite_type: cursor.read_u8()?,
        })
    }

    fn decode_list(cursor: &mut ByteCursor<'_>) -> wlan::Result<Vec<Suite>> {
        let count = cursor.read_u16(Endian::Little)?;
        (0..count).map(|_| Suite::decode(cursor)).collect()
    }

    pub fn is_rsn(&self) -> bool {
        self.oui == RSN_OUI
    }
}

/// The fields of an RSN element
/// ## Description
/// Everything after the group cipher is optional on the air; absent lists
/// decode as empty and absent capabilities as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsnInfo {
    pub version: u16,
    pub group_cipher: Suite,
    pub pairwise_ciphers: Vec<Suite>,
    pub akm_suites: Vec<Suite>,
    pub capabilities: Option<u16>,
}

impl RsnInfo {
    /// Parses the value of an RSN element (the tag header excluded).
    pub fn parse(value: &[u8]) -> wlan::Result<RsnInfo> {
        let mut cursor = ByteCursor::new(value);
        let version = cursor.read_u16(Endian::Little)?;
        let group_cipher = Suite::decode(&mut cursor)?;
        let pairwise_ciphers = match cursor.is_empty() {
            true => vec![],
            false => Suite::decode_list(&mut cursor)?,
        };
        let akm_suites = match cursor.is_empty() {
            true => vec![],
            false => Suite::decode_list(&mut cursor)?,
        };
        let capabilities = match cursor.is_empty() {
            true => None,
            false => Some(cursor.read_u16(Endian::Little)?),
        };
        Ok(RsnInfo {
            version,
            group_cipher,
            pairwise_ciphers,
            akm_suites,
            capabilities,
        })
    }

    /// The strongest protocol among the advertised AKM suites. Transition
    /// networks offering both SAE and PSK count as WPA3.
    pub fn protocol(&self) -> Protocol {
        let akms = || self.akm_suites.iter().filter(|suite| suite.is_rsn());
        let has = |types: &[u8]| akms().any(|suite| types.contains(&suite.suite_type));
        if has(&[AKM_SAE, AKM_FT_SAE, AKM_SAE_EXT_KEY, AKM_FT_SAE_EXT_KEY]) {
            Protocol::Wpa3Sae
        } else if has(&[AKM_PSK, AKM_FT_PSK, AKM_PSK_SHA256]) {
            Protocol::Wpa2Psk
        } else if has(&[AKM_8021X, AKM_FT_8021X, AKM_8021X_SHA256]) {
            Protocol::Wpa2Eap
        } else {
            Protocol::Unknown
        }
    }
}

fn is_wpa_element(value: &[u8]) -> bool {
    let mut cursor = ByteCursor::new(value);
    matches!(
        (cursor.read_u24(Endian::Big), cursor.read_u8()),
        (Ok(WPA_OUI), Ok(WPA_VENDOR_TYPE))
    )
}

/// Identifies the security protocol of a network from its beacon
/// ## Description
/// The RSN element decides when present, a malformed one gives
/// [`Protocol::Unknown`]. Without it, a WPA vendor element means WPA, and
/// the privacy capability alone means WEP.
/// ## Example
/// **Basic usage:**
/// ```
///     # let frame: Vec<u8> = vec![];
///     if let Ok(beacon) = wlan::extract_beacon(&frame) {
///         println!("{}", wpa::identify_protocol(&beacon));
///     }
/// ```
pub fn identify_protocol(beacon: &BeaconRecord<'_>) -> Protocol {
    if let Some(rsn) = beacon.rsn() {
        return RsnInfo::parse(rsn)
            .map(|info| info.protocol())
            .unwrap_or(Protocol::Unknown);
    }
    if beacon.vendor_specific().any(|tag| is_wpa_element(&tag.value)) {
        Protocol::Wpa
    } else if beacon.capabilities.privacy() {
        Protocol::Wep
    } else {
        Protocol::Open
    }
}
