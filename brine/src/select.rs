//! Projecting a codec onto another value type.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

use crate::{Compiled, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window, plan_of};

/// Projection: maps an inner codec's value to another type and back.
///
/// The mapped value is never blittable, even when the inner one is, since
/// its memory layout is unrelated to the wire bytes.
pub struct Select<J: Jar, T, F, G> {
    inner: Arc<J>,
    into: Arc<F>,
    from: Arc<G>,
    compiled: Compiled<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<J, T, F, G> Select<J, T, F, G>
where
    J: Jar + 'static,
    T: 'static,
    F: Fn(J::Value) -> T + Send + Sync + 'static,
    G: Fn(&T) -> J::Value + Send + Sync + 'static,
{
    /// Maps decoded values through `into` and encoded values through `from`.
    pub fn new(inner: J, into: F, from: G) -> Self {
        Self {
            inner: Arc::new(inner),
            into: Arc::new(into),
            from: Arc::new(from),
            compiled: Compiled::new(),
            _marker: PhantomData,
        }
    }

    fn compiled(&self) -> &Plan<T> {
        self.compiled.get_or_lower(|| {
            let inner = plan_of(&self.inner);
            let storage = inner.storage();
            let (decode, into) = (inner.clone(), self.into.clone());
            let (encode, from) = (inner.clone(), self.from.clone());
            let (measure, from_measured) = (inner, self.from.clone());
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode.decode(cursor).map(|value| into(value)),
                move |value, out| encode.encode_into(&from(value), out),
                move |value| measure.measure(&from_measured(value)),
            )
            .with_storage(storage)
        })
    }
}

impl<J, T, F, G> Jar for Select<J, T, F, G>
where
    J: Jar + 'static,
    T: 'static,
    F: Fn(J::Value) -> T + Send + Sync + 'static,
    G: Fn(&T) -> J::Value + Send + Sync + 'static,
{
    type Value = T;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<T>, DecodeError> {
        self.compiled().run(window)
    }

    fn encode_into(&self, value: &T, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.compiled().encode_into(value, out)
    }

    fn encoded_len(&self, value: &T) -> Result<usize, EncodeError> {
        self.compiled().measure(value)
    }

    fn meta(&self) -> Meta {
        self.inner.meta().opaque()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("select({})", self.inner.label()))
    }

    fn plan(&self) -> Option<Plan<T>> {
        Some(self.compiled().clone())
    }
}

impl<J: Jar, T, F, G> fmt::Debug for Select<J, T, F, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Select")
            .field("inner", &self.inner.label())
            .field("compiled", &self.compiled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JarExt, jars};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Port(u16);

    #[test]
    fn maps_both_ways() {
        let jar = jars::u16_be().select(Port, |port: &Port| port.0);
        let parsed = jar.decode(Window::new(&[0x1f, 0x90])).unwrap();
        assert_eq!(parsed, Parsed::new(Port(8080), 2));
        assert_eq!(jar.encode(&Port(443)).unwrap(), [0x01, 0xbb]);
        assert_eq!(jar.meta().constant_length(), Some(2));
    }

    #[test]
    fn projection_hides_blittability() {
        let inner = jars::u32_ne();
        assert!(inner.meta().is_blittable());
        let jar = inner.select(|v| v as u64, |v: &u64| *v as u32);
        assert!(!jar.meta().is_blittable());
        assert!(jar.blit().is_none());
    }
}
