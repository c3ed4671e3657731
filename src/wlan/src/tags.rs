//! Tagged parameters (information elements).

use std::borrow::Cow;

use crate::cursor::ByteCursor;
use crate::error::{Error, Result};

/// Tag ids used by the accessors of the tool
pub mod id {
    pub const SSID: u8 = 0x00;
    pub const SUPPORTED_RATES: u8 = 0x01;
    pub const DS_PARAMETER: u8 = 0x03;
    pub const TIM: u8 = 0x05;
    pub const COUNTRY: u8 = 0x07;
    pub const HT_CAPABILITIES: u8 = 0x2d;
    pub const RSN: u8 = 0x30;
    pub const EXTENDED_RATES: u8 = 0x32;
    pub const SUPPORTED_OPERATING_CLASSES: u8 = 0x3b;
    pub const HT_INFORMATION: u8 = 0x3d;
    pub const RM_ENABLED_CAPABILITIES: u8 = 0x46;
    pub const EXTENDED_CAPABILITIES: u8 = 0x7f;
    pub const VHT_CAPABILITIES: u8 = 0xbf;
    pub const VHT_OPERATION: u8 = 0xc0;
    pub const VHT_TX_POWER_ENVELOPE: u8 = 0xc3;
    pub const VENDOR_SPECIFIC: u8 = 0xdd;
}

/// One tagged parameter; the value borrows from the frame it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagElement<'a> {
    pub tag_id: u8,
    pub value: Cow<'a, [u8]>,
}

impl<'a> TagElement<'a> {
    pub fn new(tag_id: u8, value: &'a [u8]) -> Self {
        TagElement {
            tag_id,
            value: Cow::Borrowed(value),
        }
    }

    /// The declared length byte; a walked element's value always matches it.
    pub fn len(&self) -> u8 {
        self.value.len() as u8
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn into_owned(self) -> TagElement<'static> {
        TagElement {
            tag_id: self.tag_id,
            value: Cow::Owned(self.value.into_owned()),
        }
    }

    /// Appends the element in wire format. Values longer than 255 bytes are
    /// cut to the maximum a length byte can describe.
    pub fn encode(&self, out: &mut Vec<u8>) {
        let value = &self.value[..self.value.len().min(u8::MAX as usize)];
        out.push(self.tag_id);
        out.push(value.len() as u8);
        out.extend_from_slice(value);
    }
}

/// The ordered tags of a frame body
/// ## Description
/// Built by a single walk over the region. Order is kept because it is
/// meaningful: the first SSID tag is the SSID, repeated vendor tags are
/// reported in frame order.
/// ## Example
/// **Basic usage:**
/// ```
///     let region = [0x00, 0x04, b't', b'e', b's', b't', 0x03, 0x01, 0x06];
///     let chain = wlan::TagChain::walk(&region).unwrap();
///     assert_eq!(2, chain.len());
///     assert_eq!(Some(&b"test"[..]), chain.value(wlan::tag_id::SSID));
///     assert_eq!(None, chain.value(wlan::tag_id::RSN));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagChain<'a> {
    tags: Vec<TagElement<'a>>,
    consumed: usize,
}

impl<'a> TagChain<'a> {
    /// Walks a region that ends exactly where the tags end.
    pub fn walk(region: &'a [u8]) -> Result<TagChain<'a>> {
        let mut cursor = ByteCursor::new(region);
        let mut tags = vec![];
        while !cursor.is_empty() {
            let offset = cursor.position();
            let tag_id = cursor.read_u8()?;
            // a lone trailing byte cannot hold a length
            let declared = match cursor.read_u8() {
                Ok(len) => len as usize,
                Err(_) => {
                    return Err(Error::MalformedTagChain {
                        offset,
                        tag_id,
                        declared: 1,
                        available: 0,
                    })
                }
            };
            let available = cursor.remaining();
            if declared > available {
                return Err(Error::MalformedTagChain {
                    offset,
                    tag_id,
                    declared,
                    available,
                });
            }
            let value = cursor.read_bytes(declared)?;
            tags.push(TagElement::new(tag_id, value));
        }
        Ok(TagChain {
            tags,
            consumed: cursor.position(),
        })
    }

    /// Walks `data[..end]`, the declared end of the tag region.
    pub fn walk_bounded(data: &'a [u8], end: usize) -> Result<TagChain<'a>> {
        if end > data.len() {
            return Err(Error::TruncatedInput {
                needed: end,
                remaining: data.len(),
            });
        }
        Self::walk(&data[..end])
    }

    /// Bytes consumed by the walk, equal to the region length.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagElement<'a>> {
        self.tags.iter()
    }

    /// The first tag with the given id.
    pub fn first(&self, tag_id: u8) -> Option<&TagElement<'a>> {
        self.tags.iter().find(|tag| tag.tag_id == tag_id)
    }

    pub fn value(&self, tag_id: u8) -> Option<&[u8]> {
        self.first(tag_id).map(|tag| tag.value.as_ref())
    }

    /// Every tag with the given id, in frame order.
    pub fn all(&self, tag_id: u8) -> impl Iterator<Item = &TagElement<'a>> {
        self.tags.iter().filter(move |tag| tag.tag_id == tag_id)
    }

    pub fn into_owned(self) -> TagChain<'static> {
        TagChain {
            tags: self.tags.into_iter().map(TagElement::into_owned).collect(),
            consumed: self.consumed,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        self.tags.iter().for_each(|tag| tag.encode(out));
    }
}

impl<'a> FromIterator<TagElement<'a>> for TagChain<'a> {
    fn from_iter<I: IntoIterator<Item = TagElement<'a>>>(iter: I) -> Self {
        let tags: Vec<TagElement<'a>> = iter.into_iter().collect();
        let consumed = tags.iter().map(|tag| 2 + tag.value.len()).sum();
        TagChain { tags, consumed }
    }
}
