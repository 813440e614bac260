//! Bounds-checked cursor over document bytes.
//!
//! The cursor has no notion of byte order of its own: every multi-byte read
//! takes the [`ByteOrder`] declared by the definition message in effect.

use alloc::string::String;

use thiserror::Error;

/// Byte order of multi-byte values in a data record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    LittleEndian,
    BigEndian,
}

impl ByteOrder {
    /// Interpret the architecture byte of a definition message.
    pub fn from_architecture(architecture: u8) -> Self {
        if architecture == 1 {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }
}

/// Fewer bytes remained than a read requested.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Needed {needed} bytes at offset {offset}, found {available}.")]
pub struct Truncated {
    pub offset: usize,
    pub needed: usize,
    pub available: usize,
}

/// A sequential cursor over a slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    r: &'a [u8],
    i: usize,
}

macro_rules! read_primitive {
    ($name:ident, $t:ty) => {
        #[doc = concat!("Read a `", stringify!($t), "` in the given byte order.")]
        pub fn $name(&mut self, order: ByteOrder) -> Result<$t, Truncated> {
            let r = self.take()?;
            Ok(match order {
                ByteOrder::LittleEndian => <$t>::from_le_bytes(r),
                ByteOrder::BigEndian => <$t>::from_be_bytes(r),
            })
        }
    };
}

impl<'a> ByteReader<'a> {
    /// A cursor at the start of a slice.
    pub fn new(r: &'a [u8]) -> Self {
        Self { r, i: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.i
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.r.len() - self.i
    }

    /// Whether every byte has been read.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread bytes, without advancing.
    pub fn rest(&self) -> &'a [u8] {
        let r: &'a [u8] = self.r;
        &r[self.i..]
    }

    /// Take an exact number of bytes, advancing the cursor.
    pub fn take<const N: usize>(&mut self) -> Result<[u8; N], Truncated> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.read_bytes(N)?);
        Ok(buf)
    }

    /// Borrow the next `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Truncated> {
        let r: &'a [u8] = self.r;
        let s = self.i;
        let bytes = s
            .checked_add(n)
            .and_then(|e| r.get(s..e))
            .ok_or(Truncated {
                offset: s,
                needed: n,
                available: r.len() - s,
            })?;

        self.i += n;
        Ok(bytes)
    }

    /// Read a string field of `n` bytes, ending at the first NUL.
    ///
    /// Returns `None` for an empty string. Invalid UTF-8 sequences are
    /// replaced rather than rejected.
    pub fn read_string(&mut self, n: usize) -> Result<Option<String>, Truncated> {
        let bytes = self.read_bytes(n)?;
        let len = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());

        Ok(match &bytes[..len] {
            [] => None,
            s => Some(String::from_utf8_lossy(s).into_owned()),
        })
    }

    /// Read a `u8`.
    pub fn read_u8(&mut self) -> Result<u8, Truncated> {
        Ok(self.take::<1>()?[0])
    }

    /// Read an `i8`.
    pub fn read_i8(&mut self) -> Result<i8, Truncated> {
        Ok(self.read_u8()? as i8)
    }

    read_primitive!(read_u16, u16);
    read_primitive!(read_u32, u32);
    read_primitive!(read_u64, u64);
    read_primitive!(read_i16, i16);
    read_primitive!(read_i32, i32);
    read_primitive!(read_i64, i64);
    read_primitive!(read_f32, f32);
    read_primitive!(read_f64, f64);
}
