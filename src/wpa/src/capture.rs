//! Reading 802.11 frames from pcap files and monitor mode interfaces.
use std::path::Path;
use std::time::{Duration, Instant};

use aux::Endian;
use pcap::{Activated, Active, Capture, Linktype, Offline};
use thiserror::Error;
use wlan::ByteCursor;

/// DLT_IEEE802_11: frames without a link layer header.
pub const DLT_IEEE802_11: i32 = 105;
/// DLT_IEEE802_11_RADIO: frames behind a radiotap header.
pub const DLT_IEEE802_11_RADIO: i32 = 127;

const RADIOTAP_MIN_LENGTH: usize = 8;
const RADIOTAP_EXT: u32 = 1 << 31;
const RADIOTAP_TSFT: u32 = 1 << 0;
const RADIOTAP_FLAGS: u32 = 1 << 1;
const RADIOTAP_FLAG_FCS: u8 = 0x10;
const FCS_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("pcap: {0}")]
    Pcap(#[from] pcap::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Frame(#[from] wlan::Error),
    #[error("unsupported radiotap version {0}")]
    RadiotapVersion(u8),
    #[error("unsupported link type {0}, expected 802.11 or radiotap")]
    Linktype(i32),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) & !(align - 1)
}

/// Strips the radiotap header of a captured packet
/// ## Description
/// The header length is the little-endian u16 at bytes 2..4. A trailing FCS
/// is removed too when the radiotap flags announce one.
/// ## Example
/// **Basic usage:**
/// ```
///     let packet = [0x00, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00];
///     assert_eq!(&[0x80, 0x00], wpa::capture::strip_radiotap(&packet).unwrap());
/// ```
pub fn strip_radiotap(packet: &[u8]) -> Result<&[u8]> {
    let mut cursor = ByteCursor::new(packet);
    let version = cursor.read_u8()?;
    if version != 0 {
        return Err(CaptureError::RadiotapVersion(version));
    }
    cursor.skip(1)?;
    let length = cursor.read_u16(Endian::Little)? as usize;
    if length < RADIOTAP_MIN_LENGTH || length > packet.len() {
        return Err(wlan::Error::TruncatedInput {
            needed: length.max(RADIOTAP_MIN_LENGTH),
            remaining: packet.len(),
        }
        .into());
    }

    let mut header = ByteCursor::new(&packet[cursor.position()..length]);
    let present = header.read_u32(Endian::Little)?;
    let mut word = present;
    while word & RADIOTAP_EXT != 0 {
        word = header.read_u32(Endian::Little)?;
    }

    let mut fcs = false;
    if present & RADIOTAP_FLAGS != 0 {
        let mut offset = cursor.position() + header.position();
        if present & RADIOTAP_TSFT != 0 {
            offset = align_up(offset, 8) + 8;
        }
        if let Some(flags) = packet[..length].get(offset) {
            fcs = flags & RADIOTAP_FLAG_FCS != 0;
        }
    }

    let frame = &packet[length..];
    match fcs {
        true if frame.len() >= FCS_LEN => Ok(&frame[..frame.len() - FCS_LEN]),
        _ => Ok(frame),
    }
}

/// Frames read from a pcap capture, link layer headers removed
/// ## Description
/// Use [`FileSource`] for pcap files and [`LiveSource`] for monitor mode
/// interfaces. Frames are copied out of pcap's buffer so they can be sent
/// to another thread.
pub struct FrameSource<T: Activated + ?Sized> {
    capture: Capture<T>,
    linktype: i32,
    deadline: Option<Instant>,
}

pub type FileSource = FrameSource<Offline>;
pub type LiveSource = FrameSource<Active>;

fn check_linktype(linktype: Linktype) -> Result<i32> {
    match linktype.0 {
        DLT_IEEE802_11 | DLT_IEEE802_11_RADIO => Ok(linktype.0),
        other => Err(CaptureError::Linktype(other)),
    }
}

impl FrameSource<Offline> {
    /// Opens a pcap file
    /// ## Example
    /// **Basic usage:**
    /// ```
    ///     if let Ok(mut source) = wpa::capture::FileSource::open("handshake.pcap") {
    ///         while let Ok(Some(frame)) = source.next_frame() {
    ///             println!("{} bytes", frame.len());
    ///         }
    ///     }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a file", path.display()),
            )
            .into());
        }
        let capture = Capture::from_file(path)?;
        let linktype = check_linktype(capture.get_datalink())?;
        log::debug!("opened {} with link type {}", path.display(), linktype);
        Ok(FrameSource { capture, linktype, deadline: None })
    }
}

impl FrameSource<Active> {
    /// Opens a monitor mode interface, preferring radiotap frames.
    pub fn open(iface: &str) -> Result<Self> {
        let mut capture = Capture::from_device(iface)?
            .promisc(true)
            .rfmon(true)
            .snaplen(65535)
            .timeout(1000)
            .immediate_mode(true)
            .open()?;
        if let Err(e) = capture.set_datalink(Linktype(DLT_IEEE802_11_RADIO)) {
            log::debug!("could not set radiotap link type on {iface}: {e}");
        }
        let linktype = check_linktype(capture.get_datalink())?;
        log::info!("capturing on {iface} with link type {linktype}");
        Ok(FrameSource { capture, linktype, deadline: None })
    }

    /// Stops returning frames once `duration` has passed.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.deadline = Some(Instant::now() + duration);
        self
    }
}

impl<T: Activated + ?Sized> FrameSource<T> {
    pub fn linktype(&self) -> i32 {
        self.linktype
    }

    fn expired(&self) -> bool {
        self.deadline.map_or(false, |deadline| Instant::now() >= deadline)
    }

    /// The next 802.11 frame, `None` at the end of the capture. A packet
    /// with a broken radiotap header is returned as an error; reading can
    /// go on after it.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        loop {
            if self.expired() {
                return Ok(None);
            }
            match self.capture.next_packet() {
                Ok(packet) => {
                    let frame = match self.linktype {
                        DLT_IEEE802_11_RADIO => strip_radiotap(packet.data)?,
                        _ => packet.data,
                    };
                    return Ok(Some(frame.to_vec()));
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => return Ok(None),
                Err(e) => return Err(e.into()),
            }
        }
    }
}
