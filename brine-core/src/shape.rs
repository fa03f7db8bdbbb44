//! Shape descriptors for types bound by the record binder.
//!
//! A [`Shape`] is what the binder and the blittability analysis know about a
//! target type: its size, declared layout, and each field's name, offset,
//! size and type. Shapes are produced by `Record` binding tables (usually
//! through the `record!` macro), not by the compiler.

use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;

use crate::MemberKey;

/// Identity and display name of a Rust type.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// Describes `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: core::any::type_name::<T>(),
        }
    }

    /// The type's id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type's name as reported by the compiler.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether this describes `T`.
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Declared memory layout of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repr {
    /// `#[repr(C)]`: fields in declaration order, padded for alignment
    C,
    /// `#[repr(C, packed)]`: fields in declaration order, no padding
    Packed,
    /// Default Rust layout: the compiler may reorder fields
    #[default]
    Rust,
}

impl Repr {
    /// Whether field order in memory follows declaration order.
    pub const fn is_sequential(self) -> bool {
        matches!(self, Repr::C | Repr::Packed)
    }
}

/// One field of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldShape {
    /// Field name as declared
    pub name: &'static str,
    /// Byte offset from the start of the value
    pub offset: usize,
    /// Size of the field's type in bytes
    pub size: usize,
    /// The field's type
    pub ty: TypeInfo,
}

/// Layout description of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// The type's name
    pub type_name: &'static str,
    /// `size_of` the type
    pub size: usize,
    /// `align_of` the type
    pub align: usize,
    /// Declared layout
    pub repr: Repr,
    /// Fields in declaration order
    pub fields: Vec<FieldShape>,
}

impl Shape {
    /// Starts a shape for `T`.
    pub fn of<T: 'static>(repr: Repr) -> Self {
        Self {
            type_name: core::any::type_name::<T>(),
            size: core::mem::size_of::<T>(),
            align: core::mem::align_of::<T>(),
            repr,
            fields: Vec::new(),
        }
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    /// Bytes of the value not covered by any field.
    pub fn padding(&self) -> usize {
        let covered: usize = self.fields.iter().map(|f| f.size).sum();
        self.size.saturating_sub(covered)
    }

    /// The field whose name canonicalizes to `key`.
    pub fn field_by_key(&self, key: &MemberKey) -> Option<&FieldShape> {
        self.fields.iter().find(|f| key.matches(f.name))
    }
}
