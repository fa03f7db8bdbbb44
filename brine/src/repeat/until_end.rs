//! Repetition that runs to the end of the window.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use super::{Bulk, require_followable};
use crate::{BindError, Compiled, Cursor, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window};

/// Items until the window is exhausted.
///
/// With a constant non-zero item length the item count is computed up
/// front, and a remainder that is not a whole number of items is a
/// [`DecodeError::DataFragment`]. Otherwise items are decoded one at a time,
/// each starting where the previous one ended, until nothing is left; an
/// item that consumes nothing is a [`DecodeError::NoProgress`].
///
/// Consumes the whole window, so it can never be followed.
pub struct RepeatUntilEnd<J: Jar> {
    item: Arc<J>,
    compiled: Compiled<Vec<J::Value>>,
}

impl<J: Jar + 'static> RepeatUntilEnd<J> {
    /// Repeats `item` to the end of the window.
    pub fn new(item: J) -> Result<Self, BindError> {
        require_followable(&item)?;
        Ok(Self {
            item: Arc::new(item),
            compiled: Compiled::new(),
        })
    }

    fn compiled(&self) -> &Plan<Vec<J::Value>> {
        self.compiled.get_or_lower(|| {
            let bulk = Bulk::of(&self.item);
            let storage = bulk.storage();
            let (decode, encode, measure) = (bulk.clone(), bulk.clone(), bulk);
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode_to_end(&decode, cursor),
                move |items: &Vec<J::Value>, out| encode.encode(items, out),
                move |items: &Vec<J::Value>| measure.measure(items),
            )
            .with_storage(storage)
        })
    }
}

fn decode_to_end<T: 'static>(bulk: &Bulk<T>, cursor: &mut Cursor<'_>) -> Result<Vec<T>, DecodeError> {
    let remaining = cursor.remaining();
    match bulk.item().meta().constant_length() {
        Some(len) if len > 0 => {
            let stray = remaining % len;
            if stray != 0 {
                return Err(DecodeError::DataFragment {
                    offset: cursor.position() + remaining - stray,
                    needed: len,
                    available: stray,
                });
            }
            bulk.decode(cursor, remaining / len)
        }
        _ => {
            let mut items = Vec::new();
            while cursor.remaining() > 0 {
                let offset = cursor.position();
                items.push(bulk.item().decode(cursor)?);
                if cursor.position() == offset {
                    return Err(DecodeError::NoProgress { offset });
                }
            }
            Ok(items)
        }
    }
}

impl<J: Jar + 'static> Jar for RepeatUntilEnd<J> {
    type Value = Vec<J::Value>;

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
        Meta::terminal()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}*", self.item.label()))
    }

    fn plan(&self) -> Option<Plan<Self::Value>> {
        Some(self.compiled().clone())
    }
}

impl<J: Jar> fmt::Debug for RepeatUntilEnd<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatUntilEnd")
            .field("item", &self.item.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JarExt, jars};

    #[test]
    fn exact_multiple_recovers_every_item() {
        let jar = jars::u16_be().repeat_until_end().unwrap();
        let parsed = jar.decode(Window::new(&[0, 1, 0, 2, 0, 3])).unwrap();
        assert_eq!(parsed, Parsed::new(vec![1, 2, 3], 6));
        assert!(!jar.meta().can_be_followed());
    }

    #[test]
    fn stray_byte_is_a_fragment() {
        let jar = jars::u16_be().repeat_until_end().unwrap();
        assert_eq!(
            jar.decode(Window::new(&[0, 1, 0, 2, 7])),
            Err(DecodeError::DataFragment {
                offset: 4,
                needed: 2,
                available: 1
            })
        );
    }

    #[test]
    fn variable_items_advance_by_what_they_consume() {
        let jar = jars::varuint().repeat_until_end().unwrap();
        let parsed = jar.decode(Window::new(&[0x05, 0xac, 0x02, 0x7f])).unwrap();
        assert_eq!(parsed.value, vec![5, 300, 127]);
        assert_eq!(parsed.consumed, 4);
    }

    #[test]
    fn empty_items_cannot_make_progress() {
        let jar = crate::Constant::new(1u8).repeat_until_end().unwrap();
        assert_eq!(jar.decode(Window::new(&[])).unwrap().value, Vec::<u8>::new());
        assert_eq!(
            jar.decode(Window::new(&[0])),
            Err(DecodeError::NoProgress { offset: 0 })
        );
    }
}
