//! Predicates checked on both decode and encode.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::{Compiled, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window, plan_of};

/// A codec whose values must satisfy a predicate, on the way in and out.
///
/// A constrained codec is never blittable: a raw copy would skip the check.
pub struct Where<J: Jar, P> {
    inner: Arc<J>,
    predicate: Arc<P>,
    message: Cow<'static, str>,
    compiled: Compiled<J::Value>,
}

impl<J, P> Where<J, P>
where
    J: Jar + 'static,
    P: Fn(&J::Value) -> bool + Send + Sync + 'static,
{
    /// Rejects values for which `predicate` is false, reporting `message`.
    pub fn new(inner: J, message: impl Into<Cow<'static, str>>, predicate: P) -> Self {
        Self {
            inner: Arc::new(inner),
            predicate: Arc::new(predicate),
            message: message.into(),
            compiled: Compiled::new(),
        }
    }

    fn compiled(&self) -> &Plan<J::Value> {
        self.compiled.get_or_lower(|| {
            let inner = plan_of(&self.inner);
            let storage = inner.storage();
            let (decode, accepts) = (inner.clone(), self.predicate.clone());
            let decode_message = self.message.clone();
            let (encode, accepts_encoded) = (inner.clone(), self.predicate.clone());
            let encode_message = self.message.clone();
            let measure = inner;
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| {
                    let value = decode.decode(cursor)?;
                    if accepts(&value) {
                        Ok(value)
                    } else {
                        Err(DecodeError::Constraint {
                            message: decode_message.clone(),
                        })
                    }
                },
                move |value, out| {
                    if !accepts_encoded(value) {
                        return Err(EncodeError::Constraint {
                            message: encode_message.clone(),
                        });
                    }
                    encode.encode_into(value, out)
                },
                move |value| measure.measure(value),
            )
            .with_storage(storage)
        })
    }
}

impl<J, P> Jar for Where<J, P>
where
    J: Jar + 'static,
    P: Fn(&J::Value) -> bool + Send + Sync + 'static,
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
        self.inner.meta().opaque()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{} where {}", self.inner.label(), self.message))
    }

    fn plan(&self) -> Option<Plan<J::Value>> {
        Some(self.compiled().clone())
    }
}

impl<J: Jar, P> fmt::Debug for Where<J, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Where")
            .field("inner", &self.inner.label())
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}
