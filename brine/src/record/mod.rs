//! Records: structs bound to an ordered list of member codecs.
//!
//! A type opts in by implementing [`Record`], usually through the
//! [`record!`](crate::record!) macro. The implementation hands the binder a
//! [`Shape`] and a [`Binding`] table of getters, setters, constructors and
//! an optional zeroed value. [`RecordBuilder`] pairs member names with
//! codecs and binds them against that table once, in
//! [`RecordBuilder::build`]; every mismatch surfaces there, never while
//! decoding.
//!
//! A bound record decodes one of two ways. When the layout analysis proves
//! the member codecs describe the type's memory byte for byte, the whole
//! value is copied in one step. Otherwise members decode in declaration
//! order into a frame of slots, the chosen constructor receives its
//! parameters, and setters receive the rest.

mod binder;
mod frame;
mod macros;

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

pub use frame::{Args, MemberRef, Scalar, Slot, owned};

use crate::analysis::{BlitLayout, BlitRejection};
use crate::{
    BindError, BlitOps, Compiled, Cursor, DecodeError, EncodeError, Jar, Meta, MemberKey, Parsed,
    Plan, Shape, SlotKind, Slots, Storage, TypeInfo, Window, plan_of,
};
use binder::{Bound, Construct};
use frame::Frame;

/// A type that can be bound to member codecs.
pub trait Record: Sized + 'static {
    /// Layout of the type.
    fn shape() -> Shape;

    /// Accessors and constructors the binder may use.
    fn binding() -> Binding<Self>;

    /// Raw-copy operations, for types whose every bit pattern is valid.
    fn blit_ops() -> Option<BlitOps<Self>> {
        None
    }
}

/// Reads one member out of a record.
pub type GetFn<T> = for<'a> fn(&'a T) -> MemberRef<'a>;

/// Moves one decoded member into a record.
pub type SetFn<T> = fn(&mut T, &mut Slot) -> Result<(), DecodeError>;

/// Builds a record from constructor arguments.
pub type ConstructFn<T> = fn(&mut Args<'_>) -> Result<T, DecodeError>;

pub(crate) struct Getter<T> {
    pub(crate) name: &'static str,
    pub(crate) key: MemberKey,
    pub(crate) ty: TypeInfo,
    pub(crate) get: GetFn<T>,
}

pub(crate) struct Setter<T> {
    pub(crate) name: &'static str,
    pub(crate) key: MemberKey,
    pub(crate) ty: TypeInfo,
    pub(crate) set: SetFn<T>,
}

/// One constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub(crate) name: &'static str,
    pub(crate) key: MemberKey,
    pub(crate) ty: TypeInfo,
}

impl Param {
    /// A parameter named `name` taking a `V`.
    pub fn of<V: 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: MemberKey::new(name),
            ty: TypeInfo::of::<V>(),
        }
    }

    /// The parameter's name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub(crate) struct Constructor<T> {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<Param>,
    pub(crate) construct: ConstructFn<T>,
}

/// The accessors and constructors of a record type.
pub struct Binding<T> {
    pub(crate) getters: Vec<Getter<T>>,
    pub(crate) setters: Vec<Setter<T>>,
    pub(crate) constructors: Vec<Constructor<T>>,
    pub(crate) zeroed: Option<fn() -> T>,
}

impl<T: 'static> Binding<T> {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            getters: Vec::new(),
            setters: Vec::new(),
            constructors: Vec::new(),
            zeroed: None,
        }
    }

    /// Registers a readable member of type `V`.
    pub fn getter<V: 'static>(mut self, name: &'static str, get: GetFn<T>) -> Self {
        self.getters.push(Getter {
            name,
            key: MemberKey::new(name),
            ty: TypeInfo::of::<V>(),
            get,
        });
        self
    }

    /// Registers a writable member of type `V`.
    pub fn setter<V: 'static>(mut self, name: &'static str, set: SetFn<T>) -> Self {
        self.setters.push(Setter {
            name,
            key: MemberKey::new(name),
            ty: TypeInfo::of::<V>(),
            set,
        });
        self
    }

    /// Registers a constructor. `construct` reads its arguments from
    /// [`Args`] in the order of `params`.
    pub fn constructor(
        mut self,
        name: &'static str,
        params: impl IntoIterator<Item = Param>,
        construct: ConstructFn<T>,
    ) -> Self {
        self.constructors.push(Constructor {
            name,
            params: params.into_iter().collect(),
            construct,
        });
        self
    }

    /// Registers a starting value for records built through setters alone.
    pub fn zeroed(mut self, zeroed: fn() -> T) -> Self {
        self.zeroed = Some(zeroed);
        self
    }
}

impl<T: 'static> Default for Binding<T> {
    fn default() -> Self {
        Self::new()
    }
}

type SlotDecodeFn = Arc<dyn Fn(&mut Cursor<'_>) -> Result<Slot, DecodeError> + Send + Sync>;
type AnyEncodeFn = Arc<dyn Fn(&dyn Any, &mut Vec<u8>) -> Result<(), EncodeError> + Send + Sync>;
type AnyMeasureFn = Arc<dyn Fn(&dyn Any) -> Result<usize, EncodeError> + Send + Sync>;

/// A member's plan with its value type erased.
#[derive(Clone)]
struct ErasedPlan {
    storage: Storage,
    decode: SlotDecodeFn,
    encode: AnyEncodeFn,
    measure: AnyMeasureFn,
}

/// A member codec, as registered on the builder.
pub(crate) struct Member {
    pub(crate) name: &'static str,
    pub(crate) key: MemberKey,
    pub(crate) ty: TypeInfo,
    pub(crate) meta: Meta,
    pub(crate) label: Cow<'static, str>,
    lower: Box<dyn Fn() -> ErasedPlan + Send + Sync>,
}

impl Member {
    fn new<J: Jar + 'static>(name: &'static str, jar: J) -> Self {
        let jar = Arc::new(jar);
        Self {
            name,
            key: MemberKey::new(name),
            ty: TypeInfo::of::<J::Value>(),
            meta: jar.meta(),
            label: jar.label(),
            lower: Box::new(move || erase(name, plan_of(&jar))),
        }
    }
}

fn erase<V: 'static>(member: &'static str, plan: Plan<V>) -> ErasedPlan {
    let storage = plan.storage();
    let (decode, encode, measure) = (plan.clone(), plan.clone(), plan);
    ErasedPlan {
        storage,
        decode: Arc::new(move |cursor: &mut Cursor<'_>| -> Result<Slot, DecodeError> {
            Ok(Slot::new(decode.decode(cursor)?))
        }),
        encode: Arc::new(move |value: &dyn Any, out: &mut Vec<u8>| -> Result<(), EncodeError> {
            let value = value
                .downcast_ref::<V>()
                .ok_or(EncodeError::Member { member })?;
            encode.encode_into(value, out)
        }),
        measure: Arc::new(move |value: &dyn Any| -> Result<usize, EncodeError> {
            let value = value
                .downcast_ref::<V>()
                .ok_or(EncodeError::Member { member })?;
            measure.measure(value)
        }),
    }
}

/// Collects member codecs for a record type.
///
/// ```
/// use brine::{Jar, Window, jars, record::RecordBuilder};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Version {
///     major: u8,
///     minor: u8,
/// }
///
/// brine::record! {
///     Version {
///         layout: Rust,
///         fields: { major: u8, minor: u8 },
///         setters: { major: u8, minor: u8 },
///         zeroed: Version::default,
///     }
/// }
///
/// let jar = RecordBuilder::<Version>::new()
///     .member("major", jars::u8())
///     .member("minor", jars::u8())
///     .build()
///     .unwrap();
/// let parsed = jar.decode(Window::new(&[1, 4])).unwrap();
/// assert_eq!(parsed.value, Version { major: 1, minor: 4 });
/// ```
pub struct RecordBuilder<T: Record> {
    members: Vec<Member>,
    allow_blit: bool,
    _record: core::marker::PhantomData<fn() -> T>,
}

impl<T: Record> RecordBuilder<T> {
    /// A builder with no members.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            allow_blit: true,
            _record: core::marker::PhantomData,
        }
    }

    /// Appends a member codec. Members are decoded and encoded in the order
    /// they are added.
    pub fn member<J: Jar + 'static>(mut self, name: &'static str, jar: J) -> Self {
        self.members.push(Member::new(name, jar));
        self
    }

    /// Always use the member-by-member path, even for blittable layouts.
    pub fn without_blit(mut self) -> Self {
        self.allow_blit = false;
        self
    }

    /// Binds the members against `T`.
    pub fn build(self) -> Result<RecordJar<T>, BindError> {
        let shape = T::shape();
        let blit = if self.allow_blit {
            T::blit_ops()
        } else {
            None
        };
        let bound = binder::bind(&shape, T::binding(), &self.members, self.allow_blit, blit)?;
        Ok(RecordJar {
            type_name: shape.type_name,
            members: self.members,
            bound,
            compiled: Compiled::new(),
        })
    }
}

impl<T: Record> Default for RecordBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A codec for a bound record type.
pub struct RecordJar<T: Record> {
    type_name: &'static str,
    members: Vec<Member>,
    bound: Bound<T>,
    compiled: Compiled<T>,
}

impl<T: Record> RecordJar<T> {
    /// The verified layout, when the raw-copy path is in use.
    pub fn blit_layout(&self) -> Option<&BlitLayout> {
        self.bound.blit.as_ref().ok().map(|(layout, _)| layout)
    }

    /// Why the raw-copy path is not in use.
    pub fn blit_rejection(&self) -> Option<&BlitRejection> {
        self.bound.blit.as_ref().err()
    }

    /// Name of the constructor the binder chose, or `None` when records
    /// start from the zeroed value.
    pub fn constructor(&self) -> Option<&'static str> {
        match &self.bound.construct {
            Construct::Constructor { name, .. } => Some(name),
            Construct::Zeroed(_) => None,
        }
    }

    fn compiled(&self) -> &Plan<T> {
        self.compiled.get_or_lower(|| match &self.bound.blit {
            Ok((layout, ops)) => self.lower_blit(layout, *ops),
            Err(_) => self.lower_composed(),
        })
    }

    fn lower_blit(&self, layout: &BlitLayout, ops: BlitOps<T>) -> Plan<T> {
        let meta = Meta::blittable(layout.size());
        Plan::new(
            self.label(),
            meta,
            move |cursor| ops.decode(cursor),
            move |value, out| {
                ops.encode(value, out);
                Ok(())
            },
            move |_| Ok(ops.len()),
        )
    }

    fn lower_composed(&self) -> Plan<T> {
        let plans: Arc<[ErasedPlan]> = self.members.iter().map(|m| (m.lower)()).collect();
        let storage = plans
            .iter()
            .fold(Storage::default(), |storage, plan| storage.then(plan.storage))
            .needing(Slots::scratch())
            .collapsed(SlotKind::of::<T>());

        let getters: Arc<[GetFn<T>]> = self.bound.getters.iter().copied().collect();
        let construct = Arc::new(self.bound.construct.clone());
        let setters: Arc<[(usize, SetFn<T>)]> = self.bound.setters.iter().copied().collect();

        let decode_plans = plans.clone();
        let decode = move |cursor: &mut Cursor<'_>| -> Result<T, DecodeError> {
            let mut frame = Frame::with_capacity(decode_plans.len());
            for plan in decode_plans.iter() {
                frame.push((plan.decode)(cursor)?);
            }
            let mut value = construct.call(&mut frame.slots)?;
            for &(index, set) in setters.iter() {
                if let Some(slot) = frame.slots.get_mut(index) {
                    set(&mut value, slot)?;
                }
            }
            Ok(value)
        };

        let (encode_plans, encode_getters) = (plans.clone(), getters.clone());
        let encode = move |value: &T, out: &mut Vec<u8>| -> Result<(), EncodeError> {
            for (plan, get) in encode_plans.iter().zip(encode_getters.iter()) {
                (plan.encode)(get(value).as_any(), out)?;
            }
            Ok(())
        };

        let measure = move |value: &T| -> Result<usize, EncodeError> {
            plans
                .iter()
                .zip(getters.iter())
                .try_fold(0, |total, (plan, get)| {
                    Ok(total + (plan.measure)(get(value).as_any())?)
                })
        };

        Plan::new(self.label(), self.bound.meta, decode, encode, measure).with_storage(storage)
    }
}

impl<T: Record> Jar for RecordJar<T> {
    type Value = T;

    fn decode(&self, window: Window<'_>) -> Result<Parsed<T>, DecodeError> {
        self.compiled().run(window)
    }

    fn encode_into(&self, value: &T, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        self.compiled().encode_into(value, out)
    }

    fn encoded_len(&self, value: &T) -> Result<usize, EncodeError> {
        self.compiled().measure(value)
    }

    fn meta(&self) -> Meta {
        self.bound.meta
    }

    fn label(&self) -> Cow<'static, str> {
        let short = self.type_name.rsplit("::").next().unwrap_or(self.type_name);
        let members: Vec<String> = self
            .members
            .iter()
            .map(|m| format!("{}: {}", m.name, m.label))
            .collect();
        Cow::Owned(format!("{short} {{ {} }}", members.join(", ")))
    }

    fn plan(&self) -> Option<Plan<T>> {
        Some(self.compiled().clone())
    }

    fn blit(&self) -> Option<BlitOps<T>> {
        self.bound.blit.as_ref().ok().map(|(_, ops)| *ops)
    }
}

impl<T: Record> fmt::Debug for RecordJar<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordJar")
            .field("type_name", &self.type_name)
            .field("members", &self.members.iter().map(|m| m.name).collect::<Vec<_>>())
            .field("constructor", &self.constructor())
            .field("blit", &self.blit_layout().is_some())
            .finish_non_exhaustive()
    }
}
