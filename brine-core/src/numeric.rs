//! Numeric codecs: fixed-width primitives, LEB128 varints, booleans, and the
//! [`Length`] trait used by count and size prefixes.

use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::{Blit, BlitOps, Cursor, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window};

/// Byte order of a multi-byte number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl ByteOrder {
    /// The byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: ByteOrder = ByteOrder::Little;
    /// The byte order of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: ByteOrder = ByteOrder::Big;

    /// Whether this is the host's byte order.
    pub const fn is_native(self) -> bool {
        matches!(
            (self, Self::NATIVE),
            (ByteOrder::Big, ByteOrder::Big) | (ByteOrder::Little, ByteOrder::Little)
        )
    }

    const fn suffix(self) -> &'static str {
        match self {
            ByteOrder::Big => "be",
            ByteOrder::Little => "le",
        }
    }
}

/// A fixed-width number with a natural wire encoding.
pub trait Number: Blit + PartialEq + fmt::Debug {
    /// Encoded width in bytes.
    const WIDTH: usize;
    /// Short type name used in labels.
    const NAME: &'static str;

    /// Reads one number from the cursor.
    fn read(cursor: &mut Cursor<'_>, order: ByteOrder) -> Result<Self, DecodeError>;

    /// Appends the number's bytes.
    fn write(self, order: ByteOrder, out: &mut Vec<u8>);
}

macro_rules! numbers {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Number for $ty {
                const WIDTH: usize = core::mem::size_of::<$ty>();
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn read(cursor: &mut Cursor<'_>, order: ByteOrder) -> Result<Self, DecodeError> {
                    let bytes = cursor.take_array::<{ core::mem::size_of::<$ty>() }>()?;
                    Ok(match order {
                        ByteOrder::Big => $ty::from_be_bytes(bytes),
                        ByteOrder::Little => $ty::from_le_bytes(bytes),
                    })
                }

                #[inline]
                fn write(self, order: ByteOrder, out: &mut Vec<u8>) {
                    match order {
                        ByteOrder::Big => out.extend_from_slice(&self.to_be_bytes()),
                        ByteOrder::Little => out.extend_from_slice(&self.to_le_bytes()),
                    }
                }
            }
        )*
    };
}

numbers!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

/// Codec for a fixed-width number in a given byte order.
///
/// Blittable exactly when the byte order is the host's.
pub struct Primitive<N> {
    order: ByteOrder,
    _marker: PhantomData<fn() -> N>,
}

impl<N: Number> Primitive<N> {
    /// A codec for `N` in `order`.
    pub const fn new(order: ByteOrder) -> Self {
        Self {
            order,
            _marker: PhantomData,
        }
    }

    /// Big-endian `N`.
    pub const fn big() -> Self {
        Self::new(ByteOrder::Big)
    }

    /// Little-endian `N`.
    pub const fn little() -> Self {
        Self::new(ByteOrder::Little)
    }

    /// The codec's byte order.
    pub const fn order(&self) -> ByteOrder {
        self.order
    }
}

impl<N> Clone for Primitive<N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for Primitive<N> {}

impl<N: Number> fmt::Debug for Primitive<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Primitive({}{})", N::NAME, self.order.suffix())
    }
}

impl<N: Number> Jar for Primitive<N> {
    type Value = N;

    #[inline]
    fn decode(&self, window: Window<'_>) -> Result<Parsed<N>, DecodeError> {
        let mut cursor = window.cursor();
        let value = N::read(&mut cursor, self.order)?;
        Ok(Parsed::new(value, N::WIDTH))
    }

    #[inline]
    fn encode_into(&self, value: &N, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        value.write(self.order, out);
        Ok(())
    }

    fn meta(&self) -> Meta {
        if self.order.is_native() {
            Meta::blittable(N::WIDTH)
        } else {
            Meta::constant(N::WIDTH)
        }
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}{}", N::NAME, self.order.suffix()))
    }

    fn plan(&self) -> Option<Plan<N>> {
        let order = self.order;
        Some(Plan::new(
            self.label(),
            self.meta(),
            move |cursor| N::read(cursor, order),
            move |value, out| {
                value.write(order, out);
                Ok(())
            },
            |_| Ok(N::WIDTH),
        ))
    }

    fn blit(&self) -> Option<BlitOps<N>> {
        self.order.is_native().then(BlitOps::<N>::of)
    }
}

/// Unsigned LEB128 integer, up to 64 bits in at most ten bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarUInt;

impl VarUInt {
    const MAX_BYTES: usize = 10;

    fn read(cursor: &mut Cursor<'_>) -> Result<u64, DecodeError> {
        let start = cursor.position();
        let mut value = 0u64;
        for i in 0..Self::MAX_BYTES {
            let [byte] = cursor.take_array::<1>()?;
            let bits = u64::from(byte & 0x7f);
            // the tenth byte may only carry the top bit of a u64
            if i == Self::MAX_BYTES - 1 && bits > 1 {
                return Err(DecodeError::InvalidSize {
                    offset: start,
                    value,
                });
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(DecodeError::InvalidSize {
            offset: start,
            value,
        })
    }

    fn write(mut value: u64, out: &mut Vec<u8>) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                out.push(byte);
                return;
            }
            out.push(byte | 0x80);
        }
    }

    /// Encoded length of `value`.
    pub const fn len_of(value: u64) -> usize {
        let bits = 64 - value.leading_zeros() as usize;
        if bits == 0 { 1 } else { bits.div_ceil(7) }
    }
}

impl Jar for VarUInt {
    type Value = u64;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<u64>, DecodeError> {
        let mut cursor = window.cursor();
        let value = Self::read(&mut cursor)?;
        Ok(Parsed::new(value, cursor.consumed()))
    }

    fn encode_into(&self, value: &u64, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        Self::write(*value, out);
        Ok(())
    }

    fn encoded_len(&self, value: &u64) -> Result<usize, EncodeError> {
        Ok(Self::len_of(*value))
    }

    fn meta(&self) -> Meta {
        Meta::variable()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Borrowed("varuint")
    }

    fn plan(&self) -> Option<Plan<u64>> {
        Some(Plan::new(
            "varuint",
            Meta::variable(),
            Self::read,
            |value, out| {
                Self::write(*value, out);
                Ok(())
            },
            |value| Ok(Self::len_of(*value)),
        ))
    }
}

/// One byte, `0` for false and `1` for true.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bool;

impl Bool {
    fn read(cursor: &mut Cursor<'_>) -> Result<bool, DecodeError> {
        let offset = cursor.position();
        match cursor.take_array::<1>()? {
            [0] => Ok(false),
            [1] => Ok(true),
            [value] => Err(DecodeError::InvalidBool { offset, value }),
        }
    }
}

impl Jar for Bool {
    type Value = bool;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<bool>, DecodeError> {
        let mut cursor = window.cursor();
        Ok(Parsed::new(Self::read(&mut cursor)?, 1))
    }

    fn encode_into(&self, value: &bool, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        out.push(u8::from(*value));
        Ok(())
    }

    fn meta(&self) -> Meta {
        Meta::constant(1)
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Borrowed("bool")
    }

    fn plan(&self) -> Option<Plan<bool>> {
        Some(Plan::new(
            "bool",
            Meta::constant(1),
            Self::read,
            |value, out| {
                out.push(u8::from(*value));
                Ok(())
            },
            |_| Ok(1),
        ))
    }
}

/// Integer types usable as count and size prefixes.
pub trait Length: Copy + Send + Sync + 'static {
    /// Short type name used in errors.
    const NAME: &'static str;

    /// The value as a length, or `None` when negative or too large.
    fn to_usize(self) -> Option<usize>;

    /// A length as this type, or `None` when it does not fit.
    fn from_usize(len: usize) -> Option<Self>;

    /// Widened value for error reports.
    fn widen(self) -> u64;
}

macro_rules! lengths {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Length for $ty {
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn to_usize(self) -> Option<usize> {
                    usize::try_from(self).ok()
                }

                #[inline]
                fn from_usize(len: usize) -> Option<Self> {
                    $ty::try_from(len).ok()
                }

                #[inline]
                fn widen(self) -> u64 {
                    // negative values keep their bit pattern
                    self as u64
                }
            }
        )*
    };
}

lengths!(u8, u16, u32, u64, i8, i16, i32, i64);
