//! Bounds-checked reading of wire structures.

use aux::Endian;

use crate::error::{Error, Result};

/// Read cursor over an immutable byte buffer
/// ## Description
/// Every read checks the remaining length first and fails with
/// [`Error::TruncatedInput`] without moving the cursor, so a failed read
/// never leaves the cursor half way through a field. Slices handed out by
/// [`ByteCursor::read_bytes`] borrow from the underlying buffer.
/// ## Example
/// **Basic usage:**
/// ```
///     use aux::Endian;
///     let mut cursor = wlan::ByteCursor::new(&[0x88, 0x8e, 0x01]);
///     assert_eq!(0x888e, cursor.read_u16(Endian::Big).unwrap());
///     assert_eq!(1, cursor.remaining());
///     assert!(cursor.read_u16(Endian::Big).is_err());
///     assert_eq!(1, cursor.read_u8().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        ByteCursor { data, pos: 0 }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread part of the buffer, without consuming it.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.remaining();
        if needed > remaining {
            return Err(Error::TruncatedInput { needed, remaining });
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.peek_u8()?;
        self.pos += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self, order: Endian) -> Result<u16> {
        Ok(order.u16(self.read_array()?))
    }

    pub fn read_u24(&mut self, order: Endian) -> Result<u32> {
        Ok(order.u24(self.read_array()?))
    }

    pub fn read_u32(&mut self, order: Endian) -> Result<u32> {
        Ok(order.u32(self.read_array()?))
    }

    pub fn read_u64(&mut self, order: Endian) -> Result<u64> {
        Ok(order.u64(self.read_array()?))
    }
}
