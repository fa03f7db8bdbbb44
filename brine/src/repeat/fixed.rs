//! Repetition a fixed number of times.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use super::{Bulk, require_addressable, require_followable};
use crate::{BindError, Compiled, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window};

/// Exactly `count` items, decoded into a `Vec`.
pub struct Repeat<J: Jar> {
    item: Arc<J>,
    count: usize,
    compiled: Compiled<Vec<J::Value>>,
}

impl<J: Jar + 'static> Repeat<J> {
    /// Repeats `item` exactly `count` times.
    ///
    /// More than one repetition of an item that cannot be followed is a
    /// [`BindError::NotFollowable`]; a total length past `usize::MAX` is a
    /// [`BindError::LengthOverflow`].
    pub fn new(item: J, count: usize) -> Result<Self, BindError> {
        if count > 1 {
            require_followable(&item)?;
        }
        require_addressable(&item, count)?;
        Ok(Self {
            item: Arc::new(item),
            count,
            compiled: Compiled::new(),
        })
    }

    /// Number of items.
    pub fn count(&self) -> usize {
        self.count
    }

    fn compiled(&self) -> &Plan<Vec<J::Value>> {
        self.compiled.get_or_lower(|| {
            let bulk = Bulk::of(&self.item);
            let count = self.count;
            let storage = bulk.storage();
            let (decode, encode, measure) = (bulk.clone(), bulk.clone(), bulk);
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode.decode(cursor, count),
                move |items: &Vec<J::Value>, out| {
                    if items.len() != count {
                        return Err(EncodeError::CountMismatch {
                            expected: count,
                            actual: items.len(),
                        });
                    }
                    encode.encode(items, out)
                },
                move |items: &Vec<J::Value>| measure.measure(items),
            )
            .with_storage(storage)
        })
    }
}

impl<J: Jar + 'static> Jar for Repeat<J> {
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
        self.item.meta().repeated(self.count)
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}*{}", self.item.label(), self.count))
    }

    fn plan(&self) -> Option<Plan<Self::Value>> {
        Some(self.compiled().clone())
    }
}

impl<J: Jar> fmt::Debug for Repeat<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repeat")
            .field("item", &self.item.label())
            .field("count", &self.count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JarExt, jars};

    #[test]
    fn length_scales_with_count() {
        let jar = jars::u16_le().repeat(3).unwrap();
        assert_eq!(jar.meta().constant_length(), Some(6));
        let parsed = jar.decode(Window::new(&[1, 0, 2, 0, 3, 0, 9])).unwrap();
        assert_eq!(parsed, Parsed::new(vec![1, 2, 3], 6));
    }

    #[test]
    fn wrong_collection_size_does_not_encode() {
        let jar = jars::u8().repeat(2).unwrap();
        assert_eq!(
            jar.encode(&vec![1, 2, 3]),
            Err(EncodeError::CountMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn unbounded_items_repeat_at_most_once() {
        assert!(matches!(
            jars::utf8().repeat(2),
            Err(BindError::NotFollowable { .. })
        ));
        let once = jars::utf8().repeat(1).unwrap();
        assert!(!once.meta().can_be_followed());
    }

    #[test]
    fn total_length_must_be_addressable() {
        assert!(matches!(
            jars::u32_be().repeat(usize::MAX),
            Err(BindError::LengthOverflow { count: usize::MAX, .. })
        ));
        let units = jars::constant(()).repeat(usize::MAX).unwrap();
        assert_eq!(units.meta().constant_length(), Some(0));
    }
}
