use aux::Endian;
use wlan::ByteCursor;

use crate::consts::*;

/// LLC header with a SNAP extension, as it precedes the Ethertype of data
/// frame payloads. Every field has a fixed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlcSnap {
    pub dsap: u8,
    pub ssap: u8,
    pub control: u8,
    pub oui: u32,
    pub ethertype: u16,
}

impl LlcSnap {
    pub fn eapol() -> LlcSnap {
        LlcSnap {
            dsap: LLC_SNAP_SAP,
            ssap: LLC_SNAP_SAP,
            control: LLC_UNNUMBERED_INFORMATION,
            oui: RFC1042_OUI,
            ethertype: EAPOL_ETHERTYPE,
        }
    }

    pub fn decode(cursor: &mut ByteCursor<'_>) -> wlan::Result<LlcSnap> {
        Ok(LlcSnap {
            dsap: cursor.read_u8()?,
            ssap: cursor.read_u8()?,
            control: cursor.read_u8()?,
            oui: cursor.read_u24(Endian::Big)?,
            ethertype: cursor.read_u16(Endian::Big)?,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend([self.dsap, self.ssap, self.control]);
        out.extend(&Endian::Big.u32_bytes(self.oui)[1..]);
        out.extend(Endian::Big.u16_bytes(self.ethertype));
    }

    /// RFC 1042 SNAP encapsulation of an 802.1X payload.
    pub fn is_eapol(&self) -> bool {
        self.dsap == LLC_SNAP_SAP
            && self.ssap == LLC_SNAP_SAP
            && self.control == LLC_UNNUMBERED_INFORMATION
            && self.oui == RFC1042_OUI
            && self.ethertype == EAPOL_ETHERTYPE
    }
}
