//! Constructors for the built-in codecs.
//!
//! Multi-byte numbers come in three flavours: `_be` and `_le` pin the byte
//! order, `_ne` uses the host's and is the only one that is blittable.

use crate::{Bool, ByteOrder, Constant, Encoding, Primitive, Text, VarUInt};

/// `u8`
pub const fn u8() -> Primitive<u8> {
    Primitive::new(ByteOrder::NATIVE)
}

/// `i8`
pub const fn i8() -> Primitive<i8> {
    Primitive::new(ByteOrder::NATIVE)
}

macro_rules! numbers {
    ($($ty:ident: $be:ident, $le:ident, $ne:ident;)*) => {
        $(
            #[doc = concat!("Big-endian `", stringify!($ty), "`")]
            pub const fn $be() -> Primitive<$ty> {
                Primitive::big()
            }

            #[doc = concat!("Little-endian `", stringify!($ty), "`")]
            pub const fn $le() -> Primitive<$ty> {
                Primitive::little()
            }

            #[doc = concat!("Host-order `", stringify!($ty), "`")]
            pub const fn $ne() -> Primitive<$ty> {
                Primitive::new(ByteOrder::NATIVE)
            }
        )*
    };
}

numbers! {
    u16: u16_be, u16_le, u16_ne;
    i16: i16_be, i16_le, i16_ne;
    u32: u32_be, u32_le, u32_ne;
    i32: i32_be, i32_le, i32_ne;
    u64: u64_be, u64_le, u64_ne;
    i64: i64_be, i64_le, i64_ne;
    f32: f32_be, f32_le, f32_ne;
    f64: f64_be, f64_le, f64_ne;
}

/// LEB128 unsigned integer.
pub const fn varuint() -> VarUInt {
    VarUInt
}

/// One byte, 0 or 1.
pub const fn boolean() -> Bool {
    Bool
}

/// UTF-8 text filling the rest of the window.
pub const fn utf8() -> Text {
    Text::new(Encoding::Utf8)
}

/// ASCII text filling the rest of the window.
pub const fn ascii() -> Text {
    Text::new(Encoding::Ascii)
}

/// Latin-1 text filling the rest of the window.
pub const fn latin1() -> Text {
    Text::new(Encoding::Latin1)
}

/// Always `value`, zero bytes on the wire.
pub const fn constant<T>(value: T) -> Constant<T> {
    Constant::new(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Jar, Window};

    #[test]
    fn byte_orders() {
        assert_eq!(u32_le().encode(&0x1234_5678).unwrap(), [0x78, 0x56, 0x34, 0x12]);
        assert_eq!(u32_be().encode(&0x1234_5678).unwrap(), [0x12, 0x34, 0x56, 0x78]);
        let parsed = u32_be().decode(Window::new(&[0x78, 0x56, 0x34, 0x12])).unwrap();
        assert_eq!(parsed.value, 0x7856_3412);
        assert!(u32_ne().meta().is_blittable());
        assert!(u8().meta().is_blittable());
    }

    #[test]
    fn floats_keep_their_bits() {
        let bytes = f64_be().encode(&-1.5).unwrap();
        assert_eq!(bytes, (-1.5f64).to_be_bytes());
        assert_eq!(f64_be().decode(Window::new(&bytes)).unwrap().value, -1.5);
    }
}
