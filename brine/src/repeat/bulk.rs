//! Runs of items, shared by every repetition.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{BlitOps, Cursor, DecodeError, EncodeError, Jar, Plan, Slots, Storage, plan_of};

/// Decodes and encodes runs of items, with one raw copy for the whole run
/// when the item codec offers blit operations.
pub(crate) struct Bulk<T> {
    item: Plan<T>,
    blit: Option<BlitOps<T>>,
}

impl<T> Clone for Bulk<T> {
    fn clone(&self) -> Self {
        Self {
            item: self.item.clone(),
            blit: self.blit,
        }
    }
}

impl<T: 'static> Bulk<T> {
    pub(crate) fn of<J: Jar<Value = T> + ?Sized + 'static>(item: &Arc<J>) -> Self {
        Self {
            item: plan_of(item),
            blit: item.blit(),
        }
    }

    pub(crate) fn item(&self) -> &Plan<T> {
        &self.item
    }

    /// Storage for a growing collection of items.
    pub(crate) fn storage(&self) -> Storage {
        self.item
            .storage()
            .needing(Slots::scratch())
            .collapsed(crate::SlotKind::Boxed)
    }

    pub(crate) fn decode(
        &self,
        cursor: &mut Cursor<'_>,
        count: usize,
    ) -> Result<Vec<T>, DecodeError> {
        if let Some(ops) = self.blit {
            return ops.decode_many(cursor, count);
        }
        if let Some(len) = self.item.meta().constant_length() {
            let total = len.checked_mul(count).ok_or(DecodeError::InvalidSize {
                offset: cursor.position(),
                value: count as u64,
            })?;
            cursor.require(total)?;
        }
        // capacity is bounded by the input, not by the decoded count
        let mut items = Vec::with_capacity(count.min(cursor.remaining()));
        for _ in 0..count {
            items.push(self.item.decode(cursor)?);
        }
        Ok(items)
    }

    /// Like [`Bulk::decode`], for a count read from the input itself.
    ///
    /// Once the count exceeds the bytes left, every item has to consume
    /// something; an item that does not is a [`DecodeError::NoProgress`].
    pub(crate) fn decode_counted(
        &self,
        cursor: &mut Cursor<'_>,
        count: usize,
    ) -> Result<Vec<T>, DecodeError> {
        let sized = matches!(self.item.meta().constant_length(), Some(len) if len > 0);
        if sized || count <= cursor.remaining() {
            return self.decode(cursor, count);
        }
        let mut items = Vec::with_capacity(cursor.remaining());
        for _ in 0..count {
            let offset = cursor.position();
            items.push(self.item.decode(cursor)?);
            if cursor.position() == offset {
                return Err(DecodeError::NoProgress { offset });
            }
        }
        Ok(items)
    }

    pub(crate) fn encode(&self, items: &[T], out: &mut Vec<u8>) -> Result<(), EncodeError> {
        if let Some(ops) = self.blit {
            ops.encode_many(items, out);
            return Ok(());
        }
        for item in items {
            self.item.encode_into(item, out)?;
        }
        Ok(())
    }

    pub(crate) fn measure(&self, items: &[T]) -> Result<usize, EncodeError> {
        match self.item.meta().constant_length() {
            Some(len) => Ok(len * items.len()),
            None => items.iter().try_fold(0, |total, item| {
                Ok(total + self.item.measure(item)?)
            }),
        }
    }
}
