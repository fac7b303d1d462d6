//! Big-endian reader and writer for ROOT's streamer format.
//!
//! Objects are prefixed with a version header. When the top bit pattern
//! `kByteCountMask = 0x4000_0000` is set on the leading u32, the remaining
//! bits count the bytes that follow it (version u16 included), which lets a
//! reader skip members it does not understand.

use crate::error::{Result, RootError};

const BYTE_COUNT_MASK: u32 = 0x4000_0000;
const IS_REFERENCED: u32 = 0x0800_0000;
const NOT_DELETED: u32 = 0x0200_0000;

macro_rules! read_be {
    ($($(#[$doc:meta])* $name:ident -> $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ty> {
                const N: usize = std::mem::size_of::<$ty>();
                let b = self.read_bytes(N)?;
                let mut raw = [0u8; N];
                raw.copy_from_slice(b);
                Ok(<$ty>::from_be_bytes(raw))
            }
        )*
    };
}

macro_rules! write_be {
    ($($(#[$doc:meta])* $name:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self, v: $ty) {
                self.data.extend_from_slice(&v.to_be_bytes());
            }
        )*
    };
}

/// A cursor over a byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Remaining bytes from current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move to an absolute position within the buffer.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: pos - self.pos,
                have: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_bytes(n).map(|_| ())
    }

    /// Read a sub-slice of `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    read_be! {
        /// Read a single byte.
        read_u8 -> u8;
        /// Read a big-endian u16.
        read_u16 -> u16;
        /// Read a big-endian i16.
        read_i16 -> i16;
        /// Read a big-endian u32.
        read_u32 -> u32;
        /// Read a big-endian i32.
        read_i32 -> i32;
        /// Read a big-endian f32.
        read_f32 -> f32;
        /// Read a big-endian f64.
        read_f64 -> f64;
    }

    /// Read a ROOT-encoded string: a length byte (255 escapes to a u32 length), then bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_u8()? {
            255 => self.read_u32()? as usize,
            n => n as usize,
        };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a streamer version header.
    ///
    /// Returns `(version, end)` where `end` is the absolute position just past
    /// the object, when the header carries a byte count.
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok((version, Some(start + 4 + byte_count)))
        } else {
            // No byte count: the first two bytes were the version.
            self.pos = start + 2;
            Ok(((raw >> 16) as u16, None))
        }
    }

    /// Jump to the end of an object if its header carried a byte count.
    pub fn finish_object(&mut self, end: Option<usize>) -> Result<()> {
        match end {
            Some(end) if end >= self.pos => self.seek(end),
            Some(end) => Err(RootError::Deserialization(format!(
                "object overran its byte count: at {}, expected end {}",
                self.pos, end
            ))),
            None => Ok(()),
        }
    }

    /// Skip an embedded object with a byte-counted header.
    pub fn skip_object(&mut self) -> Result<()> {
        let (_ver, end) = self.read_version()?;
        self.finish_object(end)
    }

    /// Read a `TObject` header: fUniqueID + fBits.
    pub fn read_tobject(&mut self) -> Result<(u32, u32)> {
        let _ver = self.read_u16()?;
        let unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok((unique_id, bits))
    }

    /// Read a `TNamed`: TObject + fName + fTitle.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let (_ver, end) = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        self.finish_object(end)?;
        Ok((name, title))
    }

    /// Read `n` big-endian f64 values.
    pub fn read_array_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure_elements(n, 8)?;
        (0..n).map(|_| self.read_f64()).collect()
    }

    /// Read `n` big-endian f32 values, widened to f64.
    pub fn read_array_f32(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure_elements(n, 4)?;
        (0..n).map(|_| self.read_f32().map(f64::from)).collect()
    }

    /// Read a length-prefixed `TArrayD` body.
    pub fn read_tarray_f64(&mut self) -> Result<Vec<f64>> {
        let n = self.read_u32()? as usize;
        self.read_array_f64(n)
    }

    /// Fail early on a length prefix that cannot fit, before allocating.
    fn ensure_elements(&self, n: usize, width: usize) -> Result<()> {
        let need = n.saturating_mul(width);
        if need > self.remaining() {
            return Err(RootError::BufferUnderflow { offset: self.pos, need, have: self.remaining() });
        }
        Ok(())
    }
}

/// Growable output buffer producing the same layout [`RBuffer`] reads.
#[derive(Default)]
pub struct WBuffer {
    data: Vec<u8>,
}

impl WBuffer {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Finish and return the bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    write_be! {
        /// Write a single byte.
        write_u8(u8);
        /// Write a big-endian u16.
        write_u16(u16);
        /// Write a big-endian i16.
        write_i16(i16);
        /// Write a big-endian u32.
        write_u32(u32);
        /// Write a big-endian i32.
        write_i32(i32);
        /// Write a big-endian f32.
        write_f32(f32);
        /// Write a big-endian f64.
        write_f64(f64);
    }

    /// Write a ROOT-encoded string.
    pub fn write_string(&mut self, s: &str) {
        let bytes = s.as_bytes();
        if bytes.len() < 255 {
            self.write_u8(bytes.len() as u8);
        } else {
            self.write_u8(255);
            self.write_u32(bytes.len() as u32);
        }
        self.data.extend_from_slice(bytes);
    }

    /// Open a byte-counted object; returns the token for [`WBuffer::end_object`].
    pub fn begin_object(&mut self, version: u16) -> usize {
        let start = self.data.len();
        self.write_u32(0);
        self.write_u16(version);
        start
    }

    /// Patch the byte count of the object opened at `start`.
    pub fn end_object(&mut self, start: usize) {
        let byte_count = (self.data.len() - start - 4) as u32;
        self.data[start..start + 4].copy_from_slice(&(byte_count | BYTE_COUNT_MASK).to_be_bytes());
    }

    /// Write a `TObject` header.
    pub fn write_tobject(&mut self) {
        self.write_u16(1);
        self.write_u32(0);
        self.write_u32(NOT_DELETED);
    }

    /// Write a `TNamed`.
    pub fn write_tnamed(&mut self, name: &str, title: &str) {
        let start = self.begin_object(1);
        self.write_tobject();
        self.write_string(name);
        self.write_string(title);
        self.end_object(start);
    }

    /// Write f64 values without a length prefix.
    pub fn write_array_f64(&mut self, xs: &[f64]) {
        for &x in xs {
            self.write_f64(x);
        }
    }

    /// Write f64 values narrowed to f32, without a length prefix.
    pub fn write_array_f32(&mut self, xs: &[f64]) {
        for &x in xs {
            self.write_f32(x as f32);
        }
    }

    /// Write a length-prefixed `TArrayD` body.
    pub fn write_tarray_f64(&mut self, xs: &[f64]) {
        self.write_u32(xs.len() as u32);
        self.write_array_f64(xs);
    }
}
