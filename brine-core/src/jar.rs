//! The codec contract.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{BlitOps, DecodeError, EncodeError, Meta, Parsed, Plan, Window};

/// A codec: decodes bytes into `Value`, encodes `Value` into bytes, and
/// describes its wire behavior through [`Meta`].
///
/// Codecs are immutable once built and are shared freely between threads
/// and between the composites that contain them.
///
/// Implementations that can describe their work as a [`Plan`] should return
/// one from [`Jar::plan`]; composites inline such plans into their own
/// routine instead of calling [`Jar::decode`] per value.
pub trait Jar: Send + Sync {
    /// The type this codec produces and consumes.
    ///
    /// Decoded values are owned; nothing borrows from the decoded window.
    type Value: 'static;

    /// Decodes a value from the start of `window`.
    fn decode(&self, window: Window<'_>) -> Result<Parsed<Self::Value>, DecodeError>;

    /// Appends the encoding of `value` to `out`.
    fn encode_into(&self, value: &Self::Value, out: &mut Vec<u8>) -> Result<(), EncodeError>;

    /// Wire-level facts about this codec.
    fn meta(&self) -> Meta;

    /// Exact number of bytes [`Jar::encode_into`] writes for `value`.
    ///
    /// The default answers from the constant length when there is one and
    /// otherwise encodes into a scratch buffer.
    fn encoded_len(&self, value: &Self::Value) -> Result<usize, EncodeError> {
        if let Some(len) = self.meta().constant_length() {
            return Ok(len);
        }
        let mut scratch = Vec::new();
        self.encode_into(value, &mut scratch)?;
        Ok(scratch.len())
    }

    /// Encodes `value` into a buffer sized up front.
    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(self.encoded_len(value)?);
        self.encode_into(value, &mut out)?;
        Ok(out)
    }

    /// Short human-readable description, used in plans and errors.
    fn label(&self) -> Cow<'static, str> {
        Cow::Borrowed(core::any::type_name::<Self>())
    }

    /// A specialized plan a parent can inline, if this codec has one.
    fn plan(&self) -> Option<Plan<Self::Value>> {
        None
    }

    /// Raw-copy operations, offered only when wire bytes equal memory bytes.
    fn blit(&self) -> Option<BlitOps<Self::Value>> {
        None
    }
}

/// A type-erased, shareable codec.
pub type BoxedJar<T> = Arc<dyn Jar<Value = T>>;

macro_rules! forward_jar {
    ($ptr:ident) => {
        impl<J: Jar + ?Sized> Jar for $ptr<J> {
            type Value = J::Value;

            #[inline]
            fn decode(&self, window: Window<'_>) -> Result<Parsed<Self::Value>, DecodeError> {
                (**self).decode(window)
            }

            #[inline]
            fn encode_into(
                &self,
                value: &Self::Value,
                out: &mut Vec<u8>,
            ) -> Result<(), EncodeError> {
                (**self).encode_into(value, out)
            }

            fn meta(&self) -> Meta {
                (**self).meta()
            }

            fn encoded_len(&self, value: &Self::Value) -> Result<usize, EncodeError> {
                (**self).encoded_len(value)
            }

            fn encode(&self, value: &Self::Value) -> Result<Vec<u8>, EncodeError> {
                (**self).encode(value)
            }

            fn label(&self) -> Cow<'static, str> {
                (**self).label()
            }

            fn plan(&self) -> Option<Plan<Self::Value>> {
                (**self).plan()
            }

            fn blit(&self) -> Option<BlitOps<Self::Value>> {
                (**self).blit()
            }
        }
    };
}

forward_jar!(Arc);
forward_jar!(Box);

impl<J: Jar + ?Sized> Jar for &J {
    type Value = J::Value;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<Self::Value>, DecodeError> {
        (**self).decode(window)
    }

    fn encode_into(&self, value: &Self::Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        (**self).encode_into(value, out)
    }

    fn meta(&self) -> Meta {
        (**self).meta()
    }

    fn encoded_len(&self, value: &Self::Value) -> Result<usize, EncodeError> {
        (**self).encoded_len(value)
    }

    fn label(&self) -> Cow<'static, str> {
        (**self).label()
    }

    fn plan(&self) -> Option<Plan<Self::Value>> {
        (**self).plan()
    }

    fn blit(&self) -> Option<BlitOps<Self::Value>> {
        (**self).blit()
    }
}
