//! Binding member codecs to a record's accessors and constructors.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use super::{Args, Binding, ConstructFn, Constructor, GetFn, Member, SetFn, Setter, Slot};
use crate::analysis::{BlitLayout, BlitRejection, MemberFacts};
use crate::seq::sequence_meta;
use crate::tracing_macros::debug;
use crate::{BindError, BlitOps, DecodeError, Meta, MemberKey, Shape, TypeInfo};

/// How a decoded record comes into being.
pub(crate) enum Construct<T> {
    /// Through a constructor taking some members as arguments
    Constructor {
        name: &'static str,
        call: ConstructFn<T>,
        /// Member index of each parameter
        order: Vec<usize>,
        /// Member name of each parameter
        names: Vec<&'static str>,
    },
    /// From a zeroed value, with every member set afterwards
    Zeroed(fn() -> T),
}

impl<T> Clone for Construct<T> {
    fn clone(&self) -> Self {
        match self {
            Construct::Constructor {
                name,
                call,
                order,
                names,
            } => Construct::Constructor {
                name: *name,
                call: *call,
                order: order.clone(),
                names: names.clone(),
            },
            Construct::Zeroed(zeroed) => Construct::Zeroed(*zeroed),
        }
    }
}

impl<T> Construct<T> {
    pub(crate) fn call(&self, slots: &mut [Slot]) -> Result<T, DecodeError> {
        match self {
            Construct::Constructor {
                call, order, names, ..
            } => call(&mut Args::new(slots, order, names)),
            Construct::Zeroed(zeroed) => Ok(zeroed()),
        }
    }
}

/// The outcome of binding: everything the record codec runs with.
pub(crate) struct Bound<T> {
    /// One getter per member, in member order
    pub(crate) getters: Vec<GetFn<T>>,
    pub(crate) construct: Construct<T>,
    /// Members not taken by the constructor, by index
    pub(crate) setters: Vec<(usize, SetFn<T>)>,
    pub(crate) meta: Meta,
    pub(crate) blit: Result<(BlitLayout, BlitOps<T>), BlitRejection>,
}

pub(crate) fn bind<T: 'static>(
    shape: &Shape,
    binding: Binding<T>,
    members: &[Member],
    allow_blit: bool,
    blit: Option<BlitOps<T>>,
) -> Result<Bound<T>, BindError> {
    for (index, member) in members.iter().enumerate() {
        if members[..index].iter().any(|earlier| earlier.key == member.key) {
            return Err(BindError::DuplicateMember {
                name: String::from(member.name),
            });
        }
    }

    let labelled: Vec<(Meta, Cow<'static, str>)> =
        members.iter().map(|m| (m.meta, m.label.clone())).collect();
    let sequence = sequence_meta(&labelled)?.opaque();

    let setter_for = |key: &MemberKey| binding.setters.iter().find(|s| &s.key == key);
    let chosen = choose_constructor(shape, &binding, members)?;
    let construct = match chosen {
        Some(constructor) => {
            let mut order = Vec::with_capacity(constructor.params.len());
            let mut names = Vec::with_capacity(constructor.params.len());
            for param in &constructor.params {
                if let Some(index) = members.iter().position(|m| m.key == param.key) {
                    order.push(index);
                    names.push(members[index].name);
                }
            }
            debug!(
                "{}: constructing through `{}` ({} of {} members)",
                shape.type_name,
                constructor.name,
                order.len(),
                members.len()
            );
            Construct::Constructor {
                name: constructor.name,
                call: constructor.construct,
                order,
                names,
            }
        }
        None => {
            let settable = members.iter().all(|m| setter_for(&m.key).is_some());
            match binding.zeroed {
                Some(zeroed) if settable => {
                    debug!("{}: starting from the zeroed value", shape.type_name);
                    Construct::Zeroed(zeroed)
                }
                _ => return Err(unbindable(shape, &binding, members)),
            }
        }
    };

    let mut getters = Vec::with_capacity(members.len());
    let mut setters = Vec::new();
    for (index, member) in members.iter().enumerate() {
        let param = chosen.and_then(|c| c.params.iter().find(|p| p.key == member.key));
        match param {
            Some(param) => check_type(member, param.ty)?,
            None => {
                let setter: Option<&Setter<T>> = setter_for(&member.key);
                let Some(setter) = setter else {
                    return Err(BindError::ReadOnlyMember {
                        type_name: shape.type_name,
                        name: String::from(member.name),
                    });
                };
                check_type(member, setter.ty)?;
                setters.push((index, setter.set));
            }
        }
        let getter = binding
            .getters
            .iter()
            .find(|g| g.key == member.key)
            .ok_or_else(|| BindError::UnreadableMember {
                name: String::from(member.name),
            })?;
        check_type(member, getter.ty)?;
        getters.push(getter.get);
    }

    let blit = match (allow_blit, blit) {
        (false, _) => Err(BlitRejection::Disabled),
        (true, None) => Err(BlitRejection::NoWitness),
        (true, Some(ops)) => {
            let facts: Vec<MemberFacts<'_>> = members
                .iter()
                .map(|m| MemberFacts {
                    name: m.name,
                    key: &m.key,
                    meta: m.meta,
                })
                .collect();
            BlitLayout::analyze(shape, &facts).map(|layout| (layout, ops))
        }
    };
    let meta = match &blit {
        Ok((layout, _)) => {
            debug!("{}: raw copy of {} bytes", shape.type_name, layout.size());
            Meta::blittable(layout.size())
        }
        Err(rejection) => {
            debug!("{}: member by member, {}", shape.type_name, rejection);
            sequence
        }
    };

    Ok(Bound {
        getters,
        construct,
        setters,
        meta,
        blit,
    })
}

/// The qualifying constructor with the most parameters.
///
/// A constructor qualifies when every parameter is fed by a member codec
/// and every member codec reaches either a parameter or a setter.
fn choose_constructor<'b, T>(
    shape: &Shape,
    binding: &'b Binding<T>,
    members: &[Member],
) -> Result<Option<&'b Constructor<T>>, BindError> {
    let qualifies = |constructor: &Constructor<T>| {
        let fed = constructor
            .params
            .iter()
            .all(|p| members.iter().any(|m| m.key == p.key));
        let covered = members.iter().all(|m| {
            constructor.params.iter().any(|p| p.key == m.key)
                || binding.setters.iter().any(|s| s.key == m.key)
        });
        fed && covered
    };
    let qualifying: Vec<&Constructor<T>> =
        binding.constructors.iter().filter(|c| qualifies(c)).collect();
    let Some(most) = qualifying.iter().map(|c| c.params.len()).max() else {
        return Ok(None);
    };
    let mut best = qualifying.into_iter().filter(|c| c.params.len() == most);
    let first = best.next();
    if let (Some(first), Some(second)) = (first, best.next()) {
        return Err(BindError::AmbiguousConstructor {
            type_name: shape.type_name,
            first: first.name,
            second: second.name,
        });
    }
    Ok(first)
}

/// The most specific reason no constructor or zeroed value fits.
fn unbindable<T>(shape: &Shape, binding: &Binding<T>, members: &[Member]) -> BindError {
    let known = |key: &MemberKey| {
        shape.field_by_key(key).is_some()
            || binding.getters.iter().any(|g| &g.key == key)
            || binding.setters.iter().any(|s| &s.key == key)
            || binding
                .constructors
                .iter()
                .any(|c| c.params.iter().any(|p| &p.key == key))
    };
    if let Some(member) = members.iter().find(|m| !known(&m.key)) {
        return BindError::UnknownMember {
            type_name: shape.type_name,
            name: String::from(member.name),
        };
    }
    // only surfaced once nothing binds; such constructors never qualify
    for constructor in &binding.constructors {
        if let Some(param) = constructor
            .params
            .iter()
            .find(|param| shape.field_by_key(&param.key).is_none())
        {
            return BindError::UnknownParameter {
                constructor: constructor.name,
                parameter: param.name,
            };
        }
    }
    if let Some(member) = members
        .iter()
        .find(|m| !binding.setters.iter().any(|s| s.key == m.key))
    {
        return BindError::ReadOnlyMember {
            type_name: shape.type_name,
            name: String::from(member.name),
        };
    }
    BindError::NoConstructor {
        type_name: shape.type_name,
    }
}

fn check_type(member: &Member, expected: TypeInfo) -> Result<(), BindError> {
    if member.ty == expected {
        Ok(())
    } else {
        Err(BindError::TypeMismatch {
            member: String::from(member.name),
            expected: expected.name(),
            found: member.ty.name(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{Args, Binding, MemberRef, Param, Record, RecordBuilder, Slot};
    use crate::{BindError, FieldShape, Jar, JarExt, Repr, Shape, TypeInfo, Window, jars};
    use alloc::string::String;
    use alloc::vec;

    #[derive(Debug, Default, PartialEq)]
    struct Account {
        id: u32,
        owner: String,
        active: bool,
    }

    impl Account {
        fn new(id: u32, owner: String) -> Self {
            Self {
                id,
                owner,
                active: false,
            }
        }
    }

    fn field<V: 'static>(name: &'static str, offset: usize) -> FieldShape {
        FieldShape {
            name,
            offset,
            size: core::mem::size_of::<V>(),
            ty: TypeInfo::of::<V>(),
        }
    }

    impl Record for Account {
        fn shape() -> Shape {
            Shape::of::<Account>(Repr::Rust)
                .field(field::<u32>("id", core::mem::offset_of!(Account, id)))
                .field(field::<String>("owner", core::mem::offset_of!(Account, owner)))
                .field(field::<bool>("active", core::mem::offset_of!(Account, active)))
        }

        fn binding() -> Binding<Self> {
            Binding::new()
                .getter::<u32>("id", |a: &Account| MemberRef::Borrowed(&a.id))
                .getter::<String>("owner", |a: &Account| MemberRef::Borrowed(&a.owner))
                .getter::<bool>("active", |a: &Account| MemberRef::Borrowed(&a.active))
                .setter::<bool>("setActive", |a: &mut Account, slot: &mut Slot| {
                    a.active = slot.take("active")?;
                    Ok(())
                })
                .constructor(
                    "new",
                    vec![Param::of::<u32>("id"), Param::of::<String>("owner")],
                    |args: &mut Args<'_>| Ok(Account::new(args.param()?, args.param()?)),
                )
        }
    }

    #[test]
    fn constructor_then_setters() {
        let jar = RecordBuilder::<Account>::new()
            .member("ID", jars::u32_be())
            .member("owner", jars::utf8().null_terminated())
            .member("active", jars::boolean())
            .build()
            .unwrap();
        assert_eq!(jar.constructor(), Some("new"));
        let bytes = [0, 0, 0, 9, b'a', b'd', b'a', 0, 1];
        let parsed = jar.decode(Window::new(&bytes)).unwrap();
        assert_eq!(
            parsed.value,
            Account {
                id: 9,
                owner: String::from("ada"),
                active: true
            }
        );
        assert_eq!(parsed.consumed, bytes.len());
        assert_eq!(jar.encode(&parsed.value).unwrap(), bytes);
    }

    #[test]
    fn constructor_parameters_need_members() {
        let err = RecordBuilder::<Account>::new()
            .member("id", jars::u32_be())
            .member("active", jars::boolean())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::ReadOnlyMember {
                type_name: core::any::type_name::<Account>(),
                name: String::from("id")
            }
        );
    }

    #[test]
    fn duplicate_keys_are_rejected_first() {
        let err = RecordBuilder::<Account>::new()
            .member("owner", jars::utf8().null_terminated())
            .member("get_owner", jars::utf8().null_terminated())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BindError::DuplicateMember {
                name: String::from("get_owner")
            }
        );
    }

    #[test]
    fn member_types_must_match() {
        let err = RecordBuilder::<Account>::new()
            .member("id", jars::u16_be())
            .member("owner", jars::utf8().null_terminated())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { member, .. } if member == "id"));
    }

    #[test]
    fn unknown_members_are_named() {
        let err = RecordBuilder::<Account>::new()
            .member("id", jars::u32_be())
            .member("owner", jars::utf8().null_terminated())
            .member("balance", jars::u64_be())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnknownMember { name, .. } if name == "balance"));
    }

    #[test]
    fn unbounded_member_must_come_last() {
        let err = RecordBuilder::<Account>::new()
            .member("owner", jars::utf8())
            .member("id", jars::u32_be())
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::NotFollowable { .. }));
    }
}
