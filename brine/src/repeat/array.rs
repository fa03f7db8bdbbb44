//! Fixed-size arrays of items.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use super::{Bulk, require_addressable, require_followable};
use crate::{
    BindError, BlitOps, Compiled, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window,
};

/// A fixed-size array `[T; N]` of items.
///
/// Blittable when the item codec is, in which case the array is copied in
/// one piece.
pub struct ArrayJar<J: Jar, const N: usize> {
    item: Arc<J>,
    compiled: Compiled<[J::Value; N]>,
}

impl<J: Jar + 'static, const N: usize> ArrayJar<J, N> {
    /// An array of `N` items.
    pub fn new(item: J) -> Result<Self, BindError> {
        if N > 1 {
            require_followable(&item)?;
        }
        require_addressable(&item, N)?;
        Ok(Self {
            item: Arc::new(item),
            compiled: Compiled::new(),
        })
    }

    fn compiled(&self) -> &Plan<[J::Value; N]> {
        self.compiled.get_or_lower(|| {
            let meta = self.meta();
            if let Some(ops) = self.blit() {
                return Plan::new(
                    self.label(),
                    meta,
                    move |cursor| ops.decode(cursor),
                    move |value, out| {
                        ops.encode(value, out);
                        Ok(())
                    },
                    move |_| Ok(ops.len()),
                );
            }
            let bulk = Bulk::of(&self.item);
            let storage = bulk.storage();
            let (decode, encode, measure) = (bulk.clone(), bulk.clone(), bulk);
            Plan::new(
                self.label(),
                meta,
                move |cursor| {
                    let offset = cursor.position();
                    let items = decode.decode(cursor, N)?;
                    <[J::Value; N]>::try_from(items).map_err(|_| DecodeError::InvalidSize {
                        offset,
                        value: N as u64,
                    })
                },
                move |value: &[J::Value; N], out| encode.encode(value, out),
                move |value: &[J::Value; N]| measure.measure(value),
            )
            .with_storage(storage)
        })
    }
}

impl<J: Jar + 'static, const N: usize> Jar for ArrayJar<J, N> {
    type Value = [J::Value; N];

    fn decode(&self, window: Window<'_>) -> Result<Parsed<Self::Value>, DecodeError> {
        self.compiled().run(window)
    }

    fn encode_into(&self, value: &Self::Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.compiled().encode_into(value, out)
    }

    fn encoded_len(&self, value: &Self::Value) -> Result<usize, EncodeError> {
        self.compiled().measure(value)
    }

    fn meta(&self) -> Meta {
        let item = self.item.meta();
        match (self.item.blit(), item.constant_length().and_then(|len| len.checked_mul(N))) {
            (Some(_), Some(total)) => Meta::blittable(total),
            _ => item.repeated(N),
        }
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("[{}; {}]", self.item.label(), N))
    }

    fn plan(&self) -> Option<Plan<Self::Value>> {
        Some(self.compiled().clone())
    }

    fn blit(&self) -> Option<BlitOps<Self::Value>> {
        self.item.blit().map(BlitOps::array::<N>)
    }
}

impl<J: Jar, const N: usize> fmt::Debug for ArrayJar<J, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayJar")
            .field("item", &self.item.label())
            .field("len", &N)
            .finish()
    }
}
