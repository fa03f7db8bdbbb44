//! Byte windows and the cursor that specialized plans thread through them.

use core::fmt;

use crate::DecodeError;

/// An immutable view `(bytes, offset, length)` over a byte buffer.
///
/// Offsets reported in errors are absolute positions in the underlying
/// buffer, so a window sliced out of a larger frame still points at the
/// right byte.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Window<'a> {
    bytes: &'a [u8],
    offset: usize,
    len: usize,
}

impl<'a> Window<'a> {
    /// A window over the whole buffer.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            len: bytes.len(),
        }
    }

    /// A window over `bytes[offset..offset + len]`.
    ///
    /// Fails with [`DecodeError::DataFragment`] when the range does not fit.
    pub fn slice(bytes: &'a [u8], offset: usize, len: usize) -> Result<Self, DecodeError> {
        match offset.checked_add(len) {
            Some(end) if end <= bytes.len() => Ok(Self { bytes, offset, len }),
            _ => Err(DecodeError::DataFragment {
                offset,
                needed: len,
                available: bytes.len().saturating_sub(offset),
            }),
        }
    }

    /// Number of bytes visible through this window.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the window is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute position of the first visible byte.
    #[inline]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// The visible bytes.
    #[inline]
    pub fn as_bytes(&self) -> &'a [u8] {
        &self.bytes[self.offset..self.offset + self.len]
    }

    /// The window with the first `n` bytes removed.
    pub fn skip(self, n: usize) -> Result<Self, DecodeError> {
        self.require(n)?;
        Ok(Self {
            bytes: self.bytes,
            offset: self.offset + n,
            len: self.len - n,
        })
    }

    /// The first `n` bytes of the window.
    pub fn prefix(self, n: usize) -> Result<Self, DecodeError> {
        self.require(n)?;
        Ok(Self {
            bytes: self.bytes,
            offset: self.offset,
            len: n,
        })
    }

    /// Fails with a fragment error unless at least `n` bytes are visible.
    #[inline]
    pub fn require(&self, n: usize) -> Result<(), DecodeError> {
        if self.len < n {
            return Err(DecodeError::DataFragment {
                offset: self.offset,
                needed: n,
                available: self.len,
            });
        }
        Ok(())
    }

    /// Opens a cursor positioned at the start of this window.
    #[inline]
    pub fn cursor(self) -> Cursor<'a> {
        Cursor {
            bytes: self.bytes,
            start: self.offset,
            pos: self.offset,
            end: self.offset + self.len,
        }
    }
}

impl<'a> From<&'a [u8]> for Window<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Window<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::new(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for Window<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for Window<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

/// Running read position inside a caller's window.
///
/// Specialized plans never open a window of their own: they advance the
/// parent's cursor. Framing combinators narrow the visible end with
/// [`Cursor::limited`] so a child cannot read past its frame.
#[derive(Debug)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    start: usize,
    pos: usize,
    end: usize,
}

impl<'a> Cursor<'a> {
    /// Bytes consumed since the cursor was opened.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.pos - self.start
    }

    /// Absolute position of the next byte.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the current limit.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Fails with a fragment error unless `n` more bytes are available.
    #[inline]
    pub fn require(&self, n: usize) -> Result<(), DecodeError> {
        if self.remaining() < n {
            return Err(DecodeError::DataFragment {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        Ok(())
    }

    /// Takes the next `n` bytes.
    #[inline]
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        self.require(n)?;
        let bytes = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Takes the next `N` bytes as an array.
    #[inline]
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let bytes = self.take(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Moves forward by `n` bytes.
    #[inline]
    pub fn advance(&mut self, n: usize) -> Result<(), DecodeError> {
        self.require(n)?;
        self.pos += n;
        Ok(())
    }

    /// The bytes between the current position and the limit.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..self.end]
    }

    /// The rest of the cursor as a window, for codecs without a plan.
    #[inline]
    pub fn window(&self) -> Window<'a> {
        Window {
            bytes: self.bytes,
            offset: self.pos,
            len: self.remaining(),
        }
    }

    /// Runs `f` with the visible end moved to `len` bytes from here.
    ///
    /// Returns the value and the number of bytes `f` consumed. The original
    /// limit is restored whether or not `f` succeeds.
    pub fn limited<T>(
        &mut self,
        len: usize,
        f: impl FnOnce(&mut Cursor<'a>) -> Result<T, DecodeError>,
    ) -> Result<(T, usize), DecodeError> {
        self.require(len)?;
        let saved_end = self.end;
        let begin = self.pos;
        self.end = self.pos + len;
        let result = f(self);
        self.end = saved_end;
        let value = result?;
        Ok((value, self.pos - begin))
    }
}
