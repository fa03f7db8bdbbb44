//! Size-prefixed framing.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::tracing_macros::trace;
use crate::{
    Compiled, Cursor, DecodeError, EncodeError, Jar, Length, Meta, Parsed, Plan, Window, plan_of,
};

/// Frames an inner codec with a size prefix.
///
/// The prefix holds the byte size of the framed item, or of the item plus
/// the prefix itself when [`SizePrefixed::include_prefix`] is set. The item
/// is decoded from exactly that many bytes and must consume all of them.
pub struct SizePrefixed<P: Jar, J: Jar> {
    prefix: Arc<P>,
    inner: Arc<J>,
    include_prefix: bool,
    compiled: Compiled<J::Value>,
}

impl<P, J> SizePrefixed<P, J>
where
    P: Jar + 'static,
    P::Value: Length,
    J: Jar + 'static,
{
    /// Frames `inner` behind a `prefix` holding the item's size.
    pub fn new(prefix: P, inner: J) -> Self {
        Self {
            prefix: Arc::new(prefix),
            inner: Arc::new(inner),
            include_prefix: false,
            compiled: Compiled::new(),
        }
    }

    /// Whether the prefix's value counts the prefix's own bytes.
    pub fn include_prefix(mut self, include: bool) -> Self {
        self.include_prefix = include;
        self.compiled = Compiled::new();
        self
    }

    fn compiled(&self) -> &Plan<J::Value> {
        self.compiled.get_or_lower(|| {
            let frame = Frame {
                prefix: plan_of(&self.prefix),
                inner: plan_of(&self.inner),
                include_prefix: self.include_prefix,
            };
            let storage = frame.prefix.storage().then(frame.inner.storage());
            let (decode, encode, measure) = (frame.clone(), frame.clone(), frame);
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode.decode(cursor),
                move |value, out| encode.encode(value, out),
                move |value| measure.measure(value),
            )
            .with_storage(storage.collapsed(crate::SlotKind::of::<J::Value>()))
        })
    }
}

/// The lowered prefix and item plans.
struct Frame<L, T> {
    prefix: Plan<L>,
    inner: Plan<T>,
    include_prefix: bool,
}

impl<L, T> Clone for Frame<L, T> {
    fn clone(&self) -> Self {
        Self {
            prefix: self.prefix.clone(),
            inner: self.inner.clone(),
            include_prefix: self.include_prefix,
        }
    }
}

impl<L: Length, T: 'static> Frame<L, T> {
    fn decode(&self, cursor: &mut Cursor<'_>) -> Result<T, DecodeError> {
        let start = cursor.position();
        let size = self.prefix.decode(cursor)?;
        let prefix_len = cursor.position() - start;
        let invalid = || DecodeError::InvalidSize {
            offset: start,
            value: size.widen(),
        };
        let mut body = size.to_usize().ok_or_else(invalid)?;
        if self.include_prefix {
            body = body.checked_sub(prefix_len).ok_or_else(invalid)?;
        }
        let body_start = cursor.position();
        let (value, consumed) = cursor.limited(body, |c| self.inner.decode(c))?;
        if consumed != body {
            return Err(DecodeError::LeftoverData {
                offset: body_start,
                expected: body,
                consumed,
            });
        }
        Ok(value)
    }

    fn length(&self, size: usize) -> Result<L, EncodeError> {
        L::from_usize(size).ok_or(EncodeError::Unrepresentable {
            value: size,
            target: L::NAME,
        })
    }

    /// Prefix value and prefix length for an item of `item_len` bytes.
    ///
    /// A self-inclusive variable-width prefix is resolved in one step: the
    /// prefix length is guessed from the bare item size, and the guess must
    /// hold for the size that includes it.
    fn resolve(&self, item_len: usize) -> Result<(L, usize), EncodeError> {
        if let Some(prefix_len) = self.prefix.meta().constant_length() {
            let size = if self.include_prefix {
                item_len + prefix_len
            } else {
                item_len
            };
            return Ok((self.length(size)?, prefix_len));
        }
        let bare = self.length(item_len)?;
        let assumed = self.prefix.measure(&bare)?;
        if !self.include_prefix {
            return Ok((bare, assumed));
        }
        let candidate = self.length(item_len + assumed)?;
        let required = self.prefix.measure(&candidate)?;
        if required != assumed {
            trace!(item_len, assumed, required, "size prefix does not converge");
            return Err(EncodeError::UndefinedSize {
                item_len,
                assumed,
                required,
            });
        }
        Ok((candidate, required))
    }

    /// Writes prefix and item; on failure `out` is left as it was.
    fn encode(&self, value: &T, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        let start = out.len();
        self.encode_at(start, value, out).inspect_err(|_| out.truncate(start))
    }

    fn encode_at(&self, start: usize, value: &T, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self.prefix.meta().constant_length() {
            Some(prefix_len) => {
                // reserve the prefix, write the item, then backfill
                out.resize(start + prefix_len, 0);
                self.inner.encode_into(value, out)?;
                let item_len = out.len() - start - prefix_len;
                let (size, _) = self.resolve(item_len)?;
                let mut prefix = Vec::with_capacity(prefix_len);
                self.prefix.encode_into(&size, &mut prefix)?;
                if prefix.len() != prefix_len {
                    return Err(EncodeError::UndefinedSize {
                        item_len,
                        assumed: prefix_len,
                        required: prefix.len(),
                    });
                }
                out[start..start + prefix_len].copy_from_slice(&prefix);
                Ok(())
            }
            None => {
                let item_len = self.inner.measure(value)?;
                let (size, _) = self.resolve(item_len)?;
                self.prefix.encode_into(&size, out)?;
                self.inner.encode_into(value, out)
            }
        }
    }

    fn measure(&self, value: &T) -> Result<usize, EncodeError> {
        let item_len = self.inner.measure(value)?;
        let (_, prefix_len) = self.resolve(item_len)?;
        Ok(prefix_len + item_len)
    }
}

impl<P, J> Jar for SizePrefixed<P, J>
where
    P: Jar + 'static,
    P::Value: Length,
    J: Jar + 'static,
{
    type Value = J::Value;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<J::Value>, DecodeError> {
        self.compiled().run(window)
    }

    fn encode_into(&self, value: &J::Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.compiled().encode_into(value, out)
    }

    fn encoded_len(&self, value: &J::Value) -> Result<usize, EncodeError> {
        self.compiled().measure(value)
    }

    fn meta(&self) -> Meta {
        let prefix = self.prefix.meta();
        match (prefix.constant_length(), self.inner.meta().constant_length()) {
            (Some(p), Some(i)) => match p.checked_add(i) {
                Some(total) => Meta::constant(total),
                None => Meta::variable(),
            },
            _ => Meta::variable(),
        }
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!(
            "[{}{}]{}",
            self.prefix.label(),
            if self.include_prefix { "+self" } else { "" },
            self.inner.label()
        ))
    }

    fn plan(&self) -> Option<Plan<J::Value>> {
        Some(self.compiled().clone())
    }
}

impl<P: Jar, J: Jar> fmt::Debug for SizePrefixed<P, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SizePrefixed")
            .field("prefix", &self.prefix.label())
            .field("inner", &self.inner.label())
            .field("include_prefix", &self.include_prefix)
            .finish()
    }
}
