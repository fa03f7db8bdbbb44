//! Zero-terminated framing.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::{
    Compiled, Cursor, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window, plan_of,
};

/// Frames an inner codec with a trailing zero byte.
///
/// Decoding bounds the inner codec by the first zero byte, which the inner
/// codec must consume up to exactly. The terminator itself counts as one
/// consumed byte. Encoding fails when the inner bytes contain a zero.
pub struct NullTerminated<J: Jar> {
    inner: Arc<J>,
    compiled: Compiled<J::Value>,
}

impl<J: Jar + 'static> NullTerminated<J> {
    /// Frames `inner`.
    pub fn new(inner: J) -> Self {
        Self {
            inner: Arc::new(inner),
            compiled: Compiled::new(),
        }
    }

    fn compiled(&self) -> &Plan<J::Value> {
        self.compiled.get_or_lower(|| {
            let inner = plan_of(&self.inner);
            let storage = inner.storage();
            let (decode, encode, measure) = (inner.clone(), inner.clone(), inner);
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode_framed(cursor, |c| decode.decode(c)),
                move |value, out| encode_framed(out, |out| encode.encode_into(value, out)),
                move |value| Ok(measure.measure(value)? + 1),
            )
            .with_storage(storage)
        })
    }
}

fn decode_framed<'a, T>(
    cursor: &mut Cursor<'a>,
    inner: impl FnOnce(&mut Cursor<'a>) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let offset = cursor.position();
    let rest = cursor.rest();
    let Some(end) = rest.iter().position(|&b| b == 0) else {
        return Err(DecodeError::DataFragment {
            offset,
            needed: rest.len() + 1,
            available: rest.len(),
        });
    };
    let (value, consumed) = cursor.limited(end, inner)?;
    if consumed != end {
        return Err(DecodeError::LeftoverData {
            offset,
            expected: end,
            consumed,
        });
    }
    cursor.advance(1)?;
    Ok(value)
}

fn encode_framed(
    out: &mut Vec<u8>,
    inner: impl FnOnce(&mut Vec<u8>) -> Result<(), EncodeError>,
) -> Result<(), EncodeError> {
    let start = out.len();
    inner(out).inspect_err(|_| out.truncate(start))?;
    if let Some(position) = out[start..].iter().position(|&b| b == 0) {
        out.truncate(start);
        return Err(EncodeError::InteriorNul { position });
    }
    out.push(0);
    Ok(())
}

impl<J: Jar + 'static> Jar for NullTerminated<J> {
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
        Meta::variable()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}\\0", self.inner.label()))
    }

    fn plan(&self) -> Option<Plan<J::Value>> {
        Some(self.compiled().clone())
    }
}

impl<J: Jar> fmt::Debug for NullTerminated<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullTerminated")
            .field("inner", &self.inner.label())
            .field("compiled", &self.compiled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JarExt, jars};
    use alloc::string::String;

    #[test]
    fn terminator_counts_as_consumed() {
        let jar = jars::utf8().null_terminated();
        let parsed = jar.decode(Window::new(b"abc\0def")).unwrap();
        assert_eq!(parsed.value, "abc");
        assert_eq!(parsed.consumed, 4);
        assert!(jar.meta().can_be_followed());
    }

    #[test]
    fn missing_terminator_is_a_fragment() {
        let jar = jars::utf8().null_terminated();
        assert!(matches!(
            jar.decode(Window::new(b"abc")),
            Err(DecodeError::DataFragment {
                needed: 4,
                available: 3,
                ..
            })
        ));
    }

    #[test]
    fn inner_codec_must_fill_the_frame() {
        let jar = jars::u8().null_terminated();
        assert_eq!(
            jar.decode(Window::new(&[7, 8, 0])),
            Err(DecodeError::LeftoverData {
                offset: 0,
                expected: 2,
                consumed: 1
            })
        );
    }

    #[test]
    fn interior_zero_does_not_encode() {
        let jar = jars::utf8().null_terminated();
        assert_eq!(
            jar.encode(&String::from("a\0b")),
            Err(EncodeError::InteriorNul { position: 1 })
        );
        assert_eq!(jar.encode(&String::from("ab")).unwrap(), b"ab\0");
    }

    #[test]
    fn failed_encode_leaves_output_untouched() {
        let jar = jars::latin1().null_terminated();
        let mut out = b"ok".to_vec();
        assert!(jar.encode_into(&String::from("snow\u{2603}"), &mut out).is_err());
        assert!(jar.encode_into(&String::from("a\0"), &mut out).is_err());
        assert_eq!(out, b"ok");
    }
}
