//! Count-prefixed repetition.

use alloc::borrow::Cow;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use super::{Bulk, require_followable};
use crate::{
    BindError, Compiled, Cursor, DecodeError, EncodeError, Jar, Length, Meta, Parsed, Plan,
    Window, plan_of,
};

/// A count, then that many items.
pub struct RepeatCounted<C: Jar, J: Jar> {
    count: Arc<C>,
    item: Arc<J>,
    compiled: Compiled<Vec<J::Value>>,
}

impl<C, J> RepeatCounted<C, J>
where
    C: Jar + 'static,
    C::Value: Length,
    J: Jar + 'static,
{
    /// Items of `item`, preceded by their number encoded with `count`.
    pub fn new(count: C, item: J) -> Result<Self, BindError> {
        require_followable(&count)?;
        require_followable(&item)?;
        Ok(Self {
            count: Arc::new(count),
            item: Arc::new(item),
            compiled: Compiled::new(),
        })
    }

    fn compiled(&self) -> &Plan<Vec<J::Value>> {
        self.compiled.get_or_lower(|| {
            let counted = Counted {
                count: plan_of(&self.count),
                items: Bulk::of(&self.item),
            };
            let storage = counted.count.storage().then(counted.items.storage());
            let (decode, encode, measure) = (counted.clone(), counted.clone(), counted);
            Plan::new(
                self.label(),
                self.meta(),
                move |cursor| decode.decode(cursor),
                move |items: &Vec<J::Value>, out| encode.encode(items, out),
                move |items: &Vec<J::Value>| measure.measure(items),
            )
            .with_storage(storage.collapsed(crate::SlotKind::Boxed))
        })
    }
}

struct Counted<L, T> {
    count: Plan<L>,
    items: Bulk<T>,
}

impl<L, T> Clone for Counted<L, T> {
    fn clone(&self) -> Self {
        Self {
            count: self.count.clone(),
            items: self.items.clone(),
        }
    }
}

impl<L: Length, T: 'static> Counted<L, T> {
    fn decode(&self, cursor: &mut Cursor<'_>) -> Result<Vec<T>, DecodeError> {
        let offset = cursor.position();
        let count = self.count.decode(cursor)?;
        let count = count.to_usize().ok_or(DecodeError::InvalidSize {
            offset,
            value: count.widen(),
        })?;
        self.items.decode_counted(cursor, count)
    }

    fn length(&self, items: &[T]) -> Result<L, EncodeError> {
        L::from_usize(items.len()).ok_or(EncodeError::Unrepresentable {
            value: items.len(),
            target: L::NAME,
        })
    }

    fn encode(&self, items: &[T], out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.count.encode_into(&self.length(items)?, out)?;
        self.items.encode(items, out)
    }

    fn measure(&self, items: &[T]) -> Result<usize, EncodeError> {
        Ok(self.count.measure(&self.length(items)?)? + self.items.measure(items)?)
    }
}

impl<C, J> Jar for RepeatCounted<C, J>
where
    C: Jar + 'static,
    C::Value: Length,
    J: Jar + 'static,
{
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
        Meta::variable()
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{}*[{}]", self.item.label(), self.count.label()))
    }

    fn plan(&self) -> Option<Plan<Self::Value>> {
        Some(self.compiled().clone())
    }
}

impl<C: Jar, J: Jar> fmt::Debug for RepeatCounted<C, J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepeatCounted")
            .field("count", &self.count.label())
            .field("item", &self.item.label())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JarExt, jars};
    use alloc::string::String;

    #[test]
    fn count_then_items() {
        let jar = jars::u16_be().repeat_counted(jars::u8()).unwrap();
        let items = vec![0x0102, 0x0304];
        let bytes = jar.encode(&items).unwrap();
        assert_eq!(bytes, [2, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(
            jar.decode(Window::new(&bytes)).unwrap(),
            Parsed::new(items, 5)
        );
    }

    #[test]
    fn variable_items() {
        let jar = jars::utf8()
            .null_terminated()
            .repeat_counted(jars::varuint())
            .unwrap();
        let items = vec![String::from("a"), String::new(), String::from("bc")];
        let bytes = jar.encode(&items).unwrap();
        assert_eq!(bytes, b"\x03a\0\0bc\0");
        assert_eq!(jar.encoded_len(&items).unwrap(), bytes.len());
        assert_eq!(jar.decode(Window::new(&bytes)).unwrap().value, items);
    }

    #[test]
    fn negative_count_is_invalid() {
        let jar = jars::u8().repeat_counted(jars::i8()).unwrap();
        assert!(matches!(
            jar.decode(Window::new(&[0xff])),
            Err(DecodeError::InvalidSize { offset: 0, .. })
        ));
    }

    #[test]
    fn huge_count_fails_without_allocating() {
        let jar = jars::u32_be().repeat_counted(jars::u32_be()).unwrap();
        assert!(matches!(
            jar.decode(Window::new(&[0xff, 0xff, 0xff, 0xff, 0, 0])),
            Err(DecodeError::DataFragment { .. })
        ));
    }

    #[test]
    fn too_many_items_for_the_count() {
        let jar = jars::u8().repeat_counted(jars::u8()).unwrap();
        assert!(matches!(
            jar.encode(&vec![0; 256]),
            Err(EncodeError::Unrepresentable { value: 256, .. })
        ));
    }
}
