//! Type-erased storage for member values while a record is assembled.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::{DecodeError, SlotKind};

/// A register-sized scalar held by value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    /// `()`
    Unit,
    /// `bool`
    Bool(bool),
    /// `char`
    Char(char),
    /// `u8`
    U8(u8),
    /// `u16`
    U16(u16),
    /// `u32`
    U32(u32),
    /// `u64`
    U64(u64),
    /// `usize`
    Usize(usize),
    /// `i8`
    I8(i8),
    /// `i16`
    I16(i16),
    /// `i32`
    I32(i32),
    /// `i64`
    I64(i64),
    /// `isize`
    Isize(isize),
    /// `f32`
    F32(f32),
    /// `f64`
    F64(f64),
}

/// Moves `value` out as a `V` if that is its type.
fn cast<S: 'static, V: 'static>(value: S) -> Option<V> {
    let mut value = Some(value);
    (&mut value as &mut dyn Any)
        .downcast_mut::<Option<V>>()
        .and_then(Option::take)
}

macro_rules! scalars {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        impl Scalar {
            /// Stores `value` as a scalar, or hands it back if it is not one.
            pub fn from_value<V: 'static>(value: V) -> Result<Scalar, V> {
                let any: &dyn Any = &value;
                if any.is::<()>() {
                    return Ok(Scalar::Unit);
                }
                $(
                    if let Some(v) = any.downcast_ref::<$ty>() {
                        return Ok(Scalar::$variant(*v));
                    }
                )*
                Err(value)
            }

            /// The scalar as a `V`, if that is its type.
            pub fn into_value<V: 'static>(self) -> Option<V> {
                match self {
                    Scalar::Unit => cast(()),
                    $(Scalar::$variant(v) => cast(v),)*
                }
            }
        }
    };
}

scalars!(
    Bool(bool),
    Char(char),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    Usize(usize),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Isize(isize),
    F32(f32),
    F64(f64),
);

/// One decoded member value.
#[derive(Debug, Default)]
pub enum Slot {
    /// Nothing stored, or already taken
    #[default]
    Empty,
    /// A scalar stored by value
    Inline(Scalar),
    /// Anything else
    Boxed(Box<dyn Any>),
}

impl Slot {
    /// Stores `value`, inline when its type is a scalar.
    pub fn new<V: 'static>(value: V) -> Slot {
        match SlotKind::of::<V>() {
            SlotKind::Inline => match Scalar::from_value(value) {
                Ok(scalar) => Slot::Inline(scalar),
                Err(value) => Slot::Boxed(Box::new(value)),
            },
            SlotKind::Boxed => Slot::Boxed(Box::new(value)),
        }
    }

    /// Takes the value out as a `V`, leaving the slot empty.
    ///
    /// `member` names the slot in the error when it is empty or holds
    /// another type.
    pub fn take<V: 'static>(&mut self, member: &'static str) -> Result<V, DecodeError> {
        let taken = match core::mem::take(self) {
            Slot::Empty => None,
            Slot::Inline(scalar) => scalar.into_value(),
            Slot::Boxed(boxed) => boxed.downcast::<V>().ok().map(|boxed| *boxed),
        };
        taken.ok_or(DecodeError::Slot { member })
    }

    /// Whether the slot holds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }
}

/// Constructor arguments, handed out in parameter order.
pub struct Args<'f> {
    slots: &'f mut [Slot],
    order: &'f [usize],
    names: &'f [&'static str],
    next: usize,
}

impl<'f> Args<'f> {
    pub(crate) fn new(
        slots: &'f mut [Slot],
        order: &'f [usize],
        names: &'f [&'static str],
    ) -> Self {
        Self {
            slots,
            order,
            names,
            next: 0,
        }
    }

    /// The next parameter's value.
    pub fn param<V: 'static>(&mut self) -> Result<V, DecodeError> {
        let param = self.next;
        self.next += 1;
        let name = self.names.get(param).copied().unwrap_or("?");
        let slot = self
            .order
            .get(param)
            .and_then(|&index| self.slots.get_mut(index))
            .ok_or(DecodeError::Slot { member: name })?;
        slot.take(name)
    }
}

/// A member read for encoding: borrowed from the record, or copied out of
/// it when the field cannot be referenced (packed layouts).
pub enum MemberRef<'a> {
    /// A reference into the record
    Borrowed(&'a dyn Any),
    /// A copy of the field
    Owned(Box<dyn Any>),
}

impl MemberRef<'_> {
    /// The value, for downcasting.
    pub fn as_any(&self) -> &dyn Any {
        match self {
            MemberRef::Borrowed(value) => *value,
            MemberRef::Owned(value) => &**value,
        }
    }
}

/// A member copied out of the record.
pub fn owned<V: 'static>(value: V) -> MemberRef<'static> {
    MemberRef::Owned(Box::new(value))
}

/// Decoded member values, one slot per member in wire order.
pub(crate) struct Frame {
    pub(crate) slots: Vec<Slot>,
}

impl Frame {
    pub(crate) fn with_capacity(members: usize) -> Self {
        Self {
            slots: Vec::with_capacity(members),
        }
    }

    pub(crate) fn push(&mut self, slot: Slot) {
        self.slots.push(slot);
    }
}
