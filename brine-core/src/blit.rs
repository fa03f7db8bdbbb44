//! Raw-copy decoding and encoding.
//!
//! This is the only module in the crate with `unsafe` code. Everything it
//! does goes through [`BlitOps`], a witness that can only be created for a
//! type implementing [`Blit`] (or derived from another witness), so the raw
//! copies below are reachable only for types whose every byte pattern is a
//! valid value and that carry no padding.
//!
//! Codecs hand out a `BlitOps` from [`Jar::blit`](crate::Jar::blit) only
//! when their wire layout equals the memory layout: host byte order for
//! numbers, a verified field layout for records.
#![allow(unsafe_code)]

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::mem::{MaybeUninit, size_of};

use crate::{Cursor, DecodeError};

/// Types that can be copied to and from raw bytes.
///
/// # Safety
///
/// Implementors guarantee that:
/// - every sequence of `size_of::<Self>()` bytes is a valid value of `Self`,
/// - `Self` has no padding bytes, so every byte of a value is initialized.
pub unsafe trait Blit: Copy + Send + Sync + 'static {}

macro_rules! blit_scalars {
    ($($ty:ty),* $(,)?) => {
        $(unsafe impl Blit for $ty {})*
    };
}

blit_scalars!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

// Arrays have no padding between elements.
unsafe impl<T: Blit, const N: usize> Blit for [T; N] {}

/// Witness that `T` may be copied to and from raw bytes.
pub struct BlitOps<T> {
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for BlitOps<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BlitOps<T> {}

impl<T> fmt::Debug for BlitOps<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlitOps")
            .field("type", &core::any::type_name::<T>())
            .field("len", &self.len)
            .finish()
    }
}

impl<T: Blit> BlitOps<T> {
    /// The witness for a [`Blit`] type.
    pub const fn of() -> Self {
        Self {
            len: size_of::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T> BlitOps<T> {
    /// Bytes per value.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// The witness for arrays of `T`.
    pub const fn array<const N: usize>(self) -> BlitOps<[T; N]> {
        BlitOps {
            len: self.len * N,
            _marker: PhantomData,
        }
    }

    /// Copies one value out of the cursor.
    #[inline]
    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<T, DecodeError> {
        let bytes = cursor.take(self.len)?;
        let mut value = MaybeUninit::<T>::zeroed();
        // SAFETY: `self` exists only for `Blit` types (or arrays of them), so
        // `len == size_of::<T>()` and any byte pattern is a valid `T`.
        unsafe {
            copy_bytes(bytes, value.as_mut_ptr().cast::<u8>());
            Ok(value.assume_init())
        }
    }

    /// Copies `count` consecutive values out of the cursor in one pass.
    pub fn decode_many(&self, cursor: &mut Cursor<'_>, count: usize) -> Result<Vec<T>, DecodeError> {
        let total = self.len.checked_mul(count).ok_or(DecodeError::InvalidSize {
            offset: cursor.position(),
            value: count as u64,
        })?;
        let bytes = cursor.take(total)?;
        let mut out = Vec::<T>::with_capacity(count);
        // SAFETY: the allocation holds `count` values of `len` bytes each;
        // all of them are written before `set_len`, and every byte pattern
        // is a valid `T`.
        unsafe {
            copy_bytes(bytes, out.as_mut_ptr().cast::<u8>());
            out.set_len(count);
        }
        Ok(out)
    }

    /// Appends the memory bytes of `value`.
    #[inline]
    pub fn encode(&self, value: &T, out: &mut Vec<u8>) {
        // SAFETY: `T` has no padding, so all `len` bytes are initialized.
        let bytes =
            unsafe { core::slice::from_raw_parts((value as *const T).cast::<u8>(), self.len) };
        out.extend_from_slice(bytes);
    }

    /// Appends the memory bytes of a slice of values in one pass.
    pub fn encode_many(&self, values: &[T], out: &mut Vec<u8>) {
        // SAFETY: slices of padding-free values are contiguous initialized bytes.
        let bytes = unsafe {
            core::slice::from_raw_parts(values.as_ptr().cast::<u8>(), self.len * values.len())
        };
        out.extend_from_slice(bytes);
    }
}

/// Copies `src` to `dst`, eight bytes at a time and then byte by byte.
///
/// # Safety
///
/// `dst` must be valid for `src.len()` bytes of writes and must not overlap `src`.
#[inline]
unsafe fn copy_bytes(src: &[u8], dst: *mut u8) {
    let words = src.len() / 8;
    let src_ptr = src.as_ptr();
    for i in 0..words {
        // SAFETY: `i * 8 + 8 <= src.len()`; unaligned accesses are used on both sides.
        unsafe {
            let word = src_ptr.add(i * 8).cast::<u64>().read_unaligned();
            dst.add(i * 8).cast::<u64>().write_unaligned(word);
        }
    }
    for i in words * 8..src.len() {
        // SAFETY: `i < src.len()`.
        unsafe { *dst.add(i) = *src_ptr.add(i) };
    }
}
