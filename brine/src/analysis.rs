//! Blittability analysis for records.
//!
//! A record can be copied straight from the wire into memory only when its
//! member codecs, laid end to end, describe its memory layout byte for
//! byte. [`BlitLayout::analyze`] proves that or says why not; the record
//! binder runs it once per binding and falls back to the composed plan on
//! any rejection.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::{Meta, MemberKey, Repr, Shape};

/// What the analysis needs to know about one member codec.
#[derive(Debug, Clone, Copy)]
pub struct MemberFacts<'a> {
    /// Name the codec was registered under
    pub name: &'a str,
    /// Canonical key of that name
    pub key: &'a MemberKey,
    /// The codec's metadata
    pub meta: Meta,
}

/// Why a record was not blittable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlitRejection {
    /// Blit was turned off on the builder
    Disabled,
    /// The type does not offer blit operations
    NoWitness,
    /// The declared layout may reorder fields
    Layout(Repr),
    /// Fields do not cover the whole value
    Padding(usize),
    /// A member codec is not blittable
    NotBlittable(Cow<'static, str>),
    /// A member codec's length differs from its field's size
    Length {
        /// The member
        member: Cow<'static, str>,
        /// Codec length
        codec: usize,
        /// Field size
        field: usize,
    },
    /// A member codec matches no field, or a field it shares with another
    Unmatched(Cow<'static, str>),
    /// A field has no member codec
    Uncovered(&'static str),
    /// The codec-implied offset differs from the field's offset
    Offset {
        /// The member
        member: Cow<'static, str>,
        /// Offset implied by the preceding codec lengths
        implied: usize,
        /// Offset of the field in memory
        actual: usize,
    },
}

impl fmt::Display for BlitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlitRejection::Disabled => write!(f, "blit disabled"),
            BlitRejection::NoWitness => write!(f, "type does not implement Blit"),
            BlitRejection::Layout(repr) => write!(f, "layout {repr:?} is not sequential"),
            BlitRejection::Padding(bytes) => write!(f, "{bytes} bytes of padding"),
            BlitRejection::NotBlittable(member) => {
                write!(f, "codec for `{member}` is not blittable")
            }
            BlitRejection::Length {
                member,
                codec,
                field,
            } => write!(
                f,
                "codec for `{member}` is {codec} bytes but the field is {field}"
            ),
            BlitRejection::Unmatched(member) => {
                write!(f, "`{member}` does not match exactly one field")
            }
            BlitRejection::Uncovered(field) => write!(f, "field `{field}` has no codec"),
            BlitRejection::Offset {
                member,
                implied,
                actual,
            } => write!(
                f,
                "`{member}` would be read at offset {implied} but lives at {actual}"
            ),
        }
    }
}

/// A verified mapping from member codecs to field offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlitLayout {
    size: usize,
    offsets: Vec<(&'static str, usize)>,
}

impl BlitLayout {
    /// Checks that `members`, in wire order, lay out `shape` exactly.
    pub fn analyze(shape: &Shape, members: &[MemberFacts<'_>]) -> Result<Self, BlitRejection> {
        if !shape.repr.is_sequential() {
            return Err(BlitRejection::Layout(shape.repr));
        }
        let padding = shape.padding();
        if padding != 0 {
            return Err(BlitRejection::Padding(padding));
        }

        let owned = |name: &str| -> Cow<'static, str> { Cow::Owned(String::from(name)) };
        let mut claimed = alloc::vec![false; shape.fields.len()];
        let mut offsets = Vec::with_capacity(members.len());
        let mut implied = 0usize;
        for member in members {
            let mut matches = shape
                .fields
                .iter()
                .enumerate()
                .filter(|(_, field)| member.key.matches(field.name));
            let (index, field) = match (matches.next(), matches.next()) {
                (Some(found), None) if !claimed[found.0] => found,
                _ => return Err(BlitRejection::Unmatched(owned(member.name))),
            };
            claimed[index] = true;

            if !member.meta.is_blittable() {
                return Err(BlitRejection::NotBlittable(owned(member.name)));
            }
            let len = member.meta.constant_length().unwrap_or(0);
            if len != field.size {
                return Err(BlitRejection::Length {
                    member: owned(member.name),
                    codec: len,
                    field: field.size,
                });
            }
            if implied != field.offset {
                return Err(BlitRejection::Offset {
                    member: owned(member.name),
                    implied,
                    actual: field.offset,
                });
            }
            offsets.push((field.name, field.offset));
            implied += len;
        }
        if let Some(index) = claimed.iter().position(|claimed| !claimed) {
            return Err(BlitRejection::Uncovered(shape.fields[index].name));
        }
        Ok(Self {
            size: shape.size,
            offsets,
        })
    }

    /// Size of the record in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Field names and offsets, in wire order.
    pub fn offsets(&self) -> &[(&'static str, usize)] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldShape, TypeInfo};

    #[repr(C)]
    #[allow(dead_code)]
    struct Pair {
        a: u32,
        b: u16,
        c: u16,
    }

    fn pair_shape(repr: Repr) -> Shape {
        let field = |name, offset, size| FieldShape {
            name,
            offset,
            size,
            ty: TypeInfo::of::<u32>(),
        };
        Shape::of::<Pair>(repr)
            .field(field("a", 0, 4))
            .field(field("b", 4, 2))
            .field(field("c", 6, 2))
    }

    fn facts<'a>(keys: &'a [(MemberKey, &'a str, Meta)]) -> Vec<MemberFacts<'a>> {
        keys.iter()
            .map(|(key, name, meta)| MemberFacts {
                name: *name,
                key,
                meta: *meta,
            })
            .collect()
    }

    fn members(names: &[(&'static str, Meta)]) -> Vec<(MemberKey, &'static str, Meta)> {
        names
            .iter()
            .map(|(name, meta)| (MemberKey::new(name), *name, *meta))
            .collect()
    }

    #[test]
    fn exact_layout_is_accepted() {
        let members = members(&[
            ("a", Meta::blittable(4)),
            ("B", Meta::blittable(2)),
            ("get_c", Meta::blittable(2)),
        ]);
        let layout = BlitLayout::analyze(&pair_shape(Repr::C), &facts(&members)).unwrap();
        assert_eq!(layout.size(), 8);
        assert_eq!(layout.offsets(), &[("a", 0), ("b", 4), ("c", 6)]);
    }

    #[test]
    fn wire_order_must_match_memory_order() {
        let members = members(&[
            ("a", Meta::blittable(4)),
            ("c", Meta::blittable(2)),
            ("b", Meta::blittable(2)),
        ]);
        assert_eq!(
            BlitLayout::analyze(&pair_shape(Repr::C), &facts(&members)),
            Err(BlitRejection::Offset {
                member: Cow::Borrowed("c"),
                implied: 4,
                actual: 6
            })
        );
    }

    #[test]
    fn rust_layout_is_rejected() {
        let members = members(&[("a", Meta::blittable(4))]);
        assert_eq!(
            BlitLayout::analyze(&pair_shape(Repr::Rust), &facts(&members)),
            Err(BlitRejection::Layout(Repr::Rust))
        );
    }

    #[test]
    fn every_field_needs_a_blittable_codec() {
        let missing = members(&[("a", Meta::blittable(4)), ("b", Meta::blittable(2))]);
        assert_eq!(
            BlitLayout::analyze(&pair_shape(Repr::C), &facts(&missing)),
            Err(BlitRejection::Uncovered("c"))
        );

        let foreign = members(&[
            ("a", Meta::constant(4)),
            ("b", Meta::blittable(2)),
            ("c", Meta::blittable(2)),
        ]);
        assert_eq!(
            BlitLayout::analyze(&pair_shape(Repr::C), &facts(&foreign)),
            Err(BlitRejection::NotBlittable(Cow::Borrowed("a")))
        );

        let narrow = members(&[
            ("a", Meta::blittable(2)),
            ("b", Meta::blittable(2)),
            ("c", Meta::blittable(2)),
        ]);
        assert!(matches!(
            BlitLayout::analyze(&pair_shape(Repr::C), &facts(&narrow)),
            Err(BlitRejection::Length { codec: 2, field: 4, .. })
        ));
    }
}
