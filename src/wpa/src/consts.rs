// LLC/SNAP
pub const LLC_HEADER_LENGTH: usize = 8;
pub const LLC_SNAP_SAP: u8 = 0xaa;
pub const LLC_UNNUMBERED_INFORMATION: u8 = 0x03;
pub const RFC1042_OUI: u32 = 0x000000;
pub const EAPOL_ETHERTYPE: u16 = 0x888e;

// EAPOL
pub const EAPOL_HEADER_LENGTH: usize = 4;
pub const EAPOL_KEY_PACKET: u8 = 0x3;
pub const EAPOL_KEY_FIXED_LENGTH: usize = 95;
pub const EAPOL_MIC_OFFSET: usize = 0x51;
pub const NONCE_LEN: usize = 32;
pub const KEY_IV_LEN: usize = 16;
pub const MIC_LEN: usize = 16;

// KEY INFORMATION BITS
pub const KEY_DESCRIPTOR_VERSION: u16 = 0x0007;
pub const KEY_TYPE_PAIRWISE: u16 = 0x0008;
pub const KEY_INSTALL: u16 = 0x0040;
pub const KEY_ACK: u16 = 0x0080;
pub const KEY_MIC: u16 = 0x0100;
pub const KEY_SECURE: u16 = 0x0200;
pub const KEY_ERROR: u16 = 0x0400;
pub const KEY_REQUEST: u16 = 0x0800;
pub const KEY_ENCRYPTED_DATA: u16 = 0x1000;

// TYPICAL WPA2 KEY INFORMATION VALUES
pub const EAPOL_MSG_1: u16 = 0x8a;
pub const EAPOL_MSG_2: u16 = 0x10a;
pub const EAPOL_MSG_3: u16 = 0x13ca;
pub const EAPOL_MSG_4: u16 = 0x30a;

// WPA IDENTIFICATIONS
pub const RSN_OUI: u32 = 0x000fac;
pub const WPA_OUI: u32 = 0x0050f2;
pub const WPA_VENDOR_TYPE: u8 = 0x1;
pub const AKM_8021X: u8 = 0x1;
pub const AKM_PSK: u8 = 0x2;
pub const AKM_FT_8021X: u8 = 0x3;
pub const AKM_FT_PSK: u8 = 0x4;
pub const AKM_8021X_SHA256: u8 = 0x5;
pub const AKM_PSK_SHA256: u8 = 0x6;
pub const AKM_SAE: u8 = 0x8;
pub const AKM_FT_SAE: u8 = 0x9;
pub const AKM_SAE_EXT_KEY: u8 = 0x18;
pub const AKM_FT_SAE_EXT_KEY: u8 = 0x19;
pub const CCMP_CIPHER_TYPE: u8 = 0x4;
