//! Sequencing: tuples of codecs decoded one after another.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::{
    BindError, Compiled, DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Storage, Window,
    plan_of,
};

/// A tuple of codecs that can be sequenced.
///
/// Implemented for tuples of 2 to 6 codecs. The decoded value is the tuple
/// of the members' values.
pub trait JarTuple: Send + Sync + 'static {
    /// Tuple of decoded values.
    type Value: 'static;
    /// The same tuple with every codec behind an [`Arc`].
    type Shared: Send + Sync + 'static;

    /// Moves the codecs behind `Arc`s.
    fn share(self) -> Self::Shared;

    /// Checks that every member but the last can be followed, and returns
    /// the sequence's metadata.
    fn meta(shared: &Self::Shared) -> Result<Meta, BindError>;

    /// Member labels, in order.
    fn labels(shared: &Self::Shared) -> Vec<Cow<'static, str>>;

    /// Builds the inlined plan.
    fn lower(shared: &Self::Shared, label: String, meta: Meta) -> Plan<Self::Value>;
}

pub(crate) fn sequence_meta(members: &[(Meta, Cow<'static, str>)]) -> Result<Meta, BindError> {
    let mut iter = members.iter();
    let Some((first, _)) = iter.next() else {
        return Ok(Meta::constant(0));
    };
    let mut meta = *first;
    let mut previous = &members[0];
    for member in iter {
        if !previous.0.can_be_followed() {
            return Err(BindError::NotFollowable {
                label: previous.1.clone().into_owned(),
            });
        }
        meta = meta.then(member.0);
        previous = member;
    }
    Ok(meta)
}

macro_rules! jar_tuple {
    ($($name:ident $idx:tt),+) => {
        impl<$($name: Jar + 'static),+> JarTuple for ($($name,)+) {
            type Value = ($($name::Value,)+);
            type Shared = ($(Arc<$name>,)+);

            fn share(self) -> Self::Shared {
                ($(Arc::new(self.$idx),)+)
            }

            fn meta(shared: &Self::Shared) -> Result<Meta, BindError> {
                sequence_meta(&[$((shared.$idx.meta(), shared.$idx.label())),+])
            }

            fn labels(shared: &Self::Shared) -> Vec<Cow<'static, str>> {
                alloc::vec![$(shared.$idx.label()),+]
            }

            fn lower(shared: &Self::Shared, label: String, meta: Meta) -> Plan<Self::Value> {
                let plans = ($(plan_of(&shared.$idx),)+);
                let storage = Storage::default()
                    $(.then(plans.$idx.storage()))+
                    .collapsed(crate::SlotKind::Boxed);
                let decode = plans.clone();
                let encode = plans.clone();
                let measure = plans;
                Plan::new(
                    label,
                    meta,
                    move |cursor| Ok(($(decode.$idx.decode(cursor)?,)+)),
                    move |value: &Self::Value, out| {
                        $(encode.$idx.encode_into(&value.$idx, out)?;)+
                        Ok(())
                    },
                    move |value: &Self::Value| Ok(0 $(+ measure.$idx.measure(&value.$idx)?)+),
                )
                .with_storage(storage)
            }
        }
    };
}

jar_tuple!(A 0, B 1);
jar_tuple!(A 0, B 1, C 2);
jar_tuple!(A 0, B 1, C 2, D 3);
jar_tuple!(A 0, B 1, C 2, D 3, E 4);
jar_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);

/// Codecs decoded back to back, producing a tuple.
///
/// Built with [`seq`] or [`JarExt::then`](crate::JarExt::then).
pub struct Seq<T: JarTuple> {
    jars: T::Shared,
    meta: Meta,
    compiled: Compiled<T::Value>,
}

/// Two codecs in sequence.
pub type Then<A, B> = Seq<(A, B)>;

/// Sequences a tuple of codecs.
///
/// Fails with [`BindError::NotFollowable`] when a codec other than the last
/// consumes the rest of its window.
pub fn seq<T: JarTuple>(jars: T) -> Result<Seq<T>, BindError> {
    let jars = jars.share();
    let meta = T::meta(&jars)?;
    Ok(Seq {
        jars,
        meta,
        compiled: Compiled::new(),
    })
}

impl<T: JarTuple> Seq<T> {
    fn compiled(&self) -> &Plan<T::Value> {
        self.compiled
            .get_or_lower(|| T::lower(&self.jars, self.label().into_owned(), self.meta))
    }
}

impl<T: JarTuple> Jar for Seq<T> {
    type Value = T::Value;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<T::Value>, DecodeError> {
        self.compiled().run(window)
    }

    fn encode_into(&self, value: &T::Value, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.compiled().encode_into(value, out)
    }

    fn encoded_len(&self, value: &T::Value) -> Result<usize, EncodeError> {
        self.compiled().measure(value)
    }

    fn meta(&self) -> Meta {
        self.meta
    }

    fn label(&self) -> Cow<'static, str> {
        let labels = T::labels(&self.jars);
        Cow::Owned(alloc::format!("({})", labels.join(", ")))
    }

    fn plan(&self) -> Option<Plan<T::Value>> {
        Some(self.compiled().clone())
    }
}

impl<T: JarTuple> fmt::Debug for Seq<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seq")
            .field("label", &self.label())
            .field("meta", &self.meta)
            .field("compiled", &self.compiled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jars;

    #[test]
    fn constant_lengths_sum() {
        let jar = seq((jars::u16_be(), jars::u8(), jars::u32_le())).unwrap();
        assert_eq!(jar.meta().constant_length(), Some(7));
        let bytes = [0x01, 0x02, 0x03, 0x04, 0x00, 0x00, 0x00];
        let parsed = jar.decode(Window::new(&bytes)).unwrap();
        assert_eq!(parsed.value, (0x0102, 0x03, 0x04));
        assert_eq!(parsed.consumed, 7);
        assert_eq!(jar.encode(&parsed.value).unwrap(), bytes);
    }

    #[test]
    fn short_input_fails_before_reading() {
        let jar = seq((jars::u32_be(), jars::u32_be())).unwrap();
        assert_eq!(
            jar.decode(Window::new(&[0u8; 6])),
            Err(DecodeError::DataFragment {
                offset: 0,
                needed: 8,
                available: 6
            })
        );
    }

    #[test]
    fn unbounded_member_must_come_last() {
        let err = seq((jars::utf8(), jars::u8())).unwrap_err();
        assert_eq!(
            err,
            BindError::NotFollowable {
                label: String::from("UTF-8")
            }
        );
        let tail = seq((jars::u8(), jars::utf8())).unwrap();
        assert!(!tail.meta().can_be_followed());
        assert_eq!(tail.meta().constant_length(), None);
    }

    #[test]
    fn variable_members_thread_the_offset() {
        let jar = seq((jars::varuint(), jars::boolean(), jars::varuint())).unwrap();
        let value = (300, true, 5);
        let bytes = jar.encode(&value).unwrap();
        assert_eq!(bytes, [0xac, 0x02, 0x01, 0x05]);
        assert_eq!(jar.encoded_len(&value).unwrap(), 4);
        assert_eq!(
            jar.decode(Window::new(&bytes)).unwrap(),
            Parsed::new(value, 4)
        );
    }
}
