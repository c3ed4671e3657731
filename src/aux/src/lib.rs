//! # aux
//! `aux` is a collection of utilities shared by the other crates of the tool:
//! the byte-order conversions used by every wire decoder, small array helpers
//! and the logger setup.

// ---------------------------- Byte Order ------------------------------------

/// Converts a 16 bit value between little-endian wire order and host order.
/// ## Description
/// The conversion is its own inverse, so the same function is used when
/// reading from the wire and when writing to it.
/// ## Example
/// **Basic usage:**
/// ```
///     let wire = u16::from_ne_bytes([0x34, 0x12]);
///     assert_eq!(0x1234, aux::le16(wire));
/// ```
pub fn le16(value: u16) -> u16 {
    u16::from_le(value)
}

/// Converts a 16 bit value between big-endian wire order and host order.
pub fn be16(value: u16) -> u16 {
    u16::from_be(value)
}

/// Converts a 32 bit value between little-endian wire order and host order.
pub fn le32(value: u32) -> u32 {
    u32::from_le(value)
}

/// Converts a 32 bit value between big-endian wire order and host order.
pub fn be32(value: u32) -> u32 {
    u32::from_be(value)
}

/// Converts a 64 bit value between little-endian wire order and host order.
pub fn le64(value: u64) -> u64 {
    u64::from_le(value)
}

/// Converts a 64 bit value between big-endian wire order and host order.
pub fn be64(value: u64) -> u64 {
    u64::from_be(value)
}

/// Declared byte order of a wire field
/// ## Description
/// 802.11 headers are little-endian while the 802.1X material they carry is
/// big-endian, so decoders take the order of every multi-byte field as a
/// parameter instead of assuming one.
/// ## Example
/// **Basic usage:**
/// ```
///     use aux::Endian;
///     assert_eq!(0x888e, Endian::Big.u16([0x88, 0x8e]));
///     assert_eq!(0x8e88, Endian::Little.u16([0x88, 0x8e]));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    pub fn u16(self, bytes: [u8; 2]) -> u16 {
        let raw = u16::from_ne_bytes(bytes);
        match self {
            Endian::Little => le16(raw),
            Endian::Big => be16(raw),
        }
    }

    /// 24 bit fields (OUIs, some vendor counters) are widened to `u32`.
    pub fn u24(self, bytes: [u8; 3]) -> u32 {
        match self {
            Endian::Little => self.u32([bytes[0], bytes[1], bytes[2], 0]),
            Endian::Big => self.u32([0, bytes[0], bytes[1], bytes[2]]),
        }
    }

    pub fn u32(self, bytes: [u8; 4]) -> u32 {
        let raw = u32::from_ne_bytes(bytes);
        match self {
            Endian::Little => le32(raw),
            Endian::Big => be32(raw),
        }
    }

    pub fn u64(self, bytes: [u8; 8]) -> u64 {
        let raw = u64::from_ne_bytes(bytes);
        match self {
            Endian::Little => le64(raw),
            Endian::Big => be64(raw),
        }
    }

    pub fn u16_bytes(self, value: u16) -> [u8; 2] {
        match self {
            Endian::Little => le16(value),
            Endian::Big => be16(value),
        }
        .to_ne_bytes()
    }

    pub fn u32_bytes(self, value: u32) -> [u8; 4] {
        match self {
            Endian::Little => le32(value),
            Endian::Big => be32(value),
        }
        .to_ne_bytes()
    }

    pub fn u64_bytes(self, value: u64) -> [u8; 8] {
        match self {
            Endian::Little => le64(value),
            Endian::Big => be64(value),
        }
        .to_ne_bytes()
    }
}

// ---------------------------- Aux Functions ---------------------------------

/// Check if two equal sized array are the same
/// ## Description
/// Receives 2 arrays of the same size and returns whether the arrays are
/// equal by comparing all elements.
/// ## Example
/// **Basic usage:**
/// ```
///     let a = [10, 4, 8];
///     let b = [10, 4, 8];
///     let c = [20, 6, 8];
///
///     assert!(aux::compare_arrays(&a, &b));
///     assert!(!aux::compare_arrays(&a, &c));
/// ```
pub fn compare_arrays<const N: usize>(a: &[u8; N], b: &[u8; N]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

/// Checks whether every byte of a slice is zero
pub fn is_zeroed(data: &[u8]) -> bool {
    data.iter().all(|b| *b == 0)
}

/// Initializes the global logger
/// ## Description
/// Maps the number of `-v` flags to a default filter (`warn`, `info`,
/// `debug`, `trace`). `RUST_LOG` still takes precedence. Calling it twice is
/// harmless, the second call is ignored.
pub fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .try_init();
}
