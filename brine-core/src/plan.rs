//! Specialization plans.
//!
//! A [`Plan`] is the intermediate form a codec offers its parent: closures
//! that read from and write to the *parent's* cursor and buffer, plus the
//! facts a parent needs to compose them (constant length, storage, whether
//! the plan was specialized or is the generic adapter).
//!
//! Composites ask each child for a plan with [`plan_of`], wrap the child
//! closures into one routine, and lower the result once into a
//! [`Compiled`] cache. Codecs that cannot describe themselves still work:
//! [`Plan::adapter`] calls [`Jar::decode`] on the rest of the cursor and
//! advances by the reported count, trading speed for nothing else.

use alloc::borrow::Cow;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use core::fmt;
use std::sync::OnceLock;

use crate::tracing_macros::trace;
use crate::{Cursor, DecodeError, EncodeError, Jar, Meta, Parsed, Window};

/// Decode step: reads one value from the cursor.
pub type DecodeFn<T> = Arc<dyn Fn(&mut Cursor<'_>) -> Result<T, DecodeError> + Send + Sync>;

/// Encode step: appends one value to the buffer.
pub type EncodeFn<T> = Arc<dyn Fn(&T, &mut Vec<u8>) -> Result<(), EncodeError> + Send + Sync>;

/// Measure step: exact encoded length of one value.
pub type MeasureFn<T> = Arc<dyn Fn(&T) -> Result<usize, EncodeError> + Send + Sync>;

/// How a plan's consumed count is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumed {
    /// Always exactly this many bytes; no slot is needed to report it.
    Constant(usize),
    /// Read back from the cursor after the plan runs.
    Tracked,
}

impl Consumed {
    /// Consumed count of `self` followed by `next`.
    pub const fn then(self, next: Consumed) -> Consumed {
        match (self, next) {
            (Consumed::Constant(a), Consumed::Constant(b)) => Consumed::Constant(a + b),
            _ => Consumed::Tracked,
        }
    }

    fn from_meta(meta: Meta) -> Consumed {
        match meta.constant_length() {
            Some(len) => Consumed::Constant(len),
            None => Consumed::Tracked,
        }
    }
}

/// Where a value of a given type lives while a plan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    /// A register-sized scalar stored by value.
    Inline,
    /// Anything else, stored behind a pointer.
    Boxed,
}

impl SlotKind {
    /// Slot kind used for values of type `T`.
    pub fn of<T: 'static>() -> SlotKind {
        let id = TypeId::of::<T>();
        let inline = [
            TypeId::of::<()>(),
            TypeId::of::<bool>(),
            TypeId::of::<char>(),
            TypeId::of::<u8>(),
            TypeId::of::<u16>(),
            TypeId::of::<u32>(),
            TypeId::of::<u64>(),
            TypeId::of::<usize>(),
            TypeId::of::<i8>(),
            TypeId::of::<i16>(),
            TypeId::of::<i32>(),
            TypeId::of::<i64>(),
            TypeId::of::<isize>(),
            TypeId::of::<f32>(),
            TypeId::of::<f64>(),
        ];
        if inline.contains(&id) {
            SlotKind::Inline
        } else {
            SlotKind::Boxed
        }
    }
}

/// A count of transient slots, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Slots {
    /// Register-sized scalar slots
    pub inline: usize,
    /// Boxed value slots
    pub boxed: usize,
    /// Growable scratch buffers
    pub scratch: usize,
}

impl Slots {
    /// One slot of the given kind.
    pub const fn one(kind: SlotKind) -> Slots {
        match kind {
            SlotKind::Inline => Slots {
                inline: 1,
                boxed: 0,
                scratch: 0,
            },
            SlotKind::Boxed => Slots {
                inline: 0,
                boxed: 1,
                scratch: 0,
            },
        }
    }

    /// One scratch buffer.
    pub const fn scratch() -> Slots {
        Slots {
            inline: 0,
            boxed: 0,
            scratch: 1,
        }
    }

    /// Slots needed by both sets at once.
    pub const fn plus(self, other: Slots) -> Slots {
        Slots {
            inline: self.inline + other.inline,
            boxed: self.boxed + other.boxed,
            scratch: self.scratch + other.scratch,
        }
    }

    /// Slots needed by either set, when they are never live together.
    pub const fn max(self, other: Slots) -> Slots {
        const fn max(a: usize, b: usize) -> usize {
            if a > b { a } else { b }
        }
        Slots {
            inline: max(self.inline, other.inline),
            boxed: max(self.boxed, other.boxed),
            scratch: max(self.scratch, other.scratch),
        }
    }

    /// Total number of slots.
    pub const fn total(&self) -> usize {
        self.inline + self.boxed + self.scratch
    }
}

/// Storage a plan declares.
///
/// `before` lists what must exist while the decode step runs; `after`
/// lists what must exist to read the value back once it has run. The
/// consumed count needs a slot only when it is [`Consumed::Tracked`], and
/// sequenced plans share a single running offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Storage {
    /// Slots live during decoding
    pub before: Slots,
    /// Slots holding the value
    pub after: Slots,
    /// Whether a running-offset slot is needed for the consumed count
    pub consumed_slot: bool,
}

impl Storage {
    /// Storage for a plan producing one `T`.
    pub fn value<T: 'static>(consumed: Consumed) -> Storage {
        Storage {
            before: Slots::default(),
            after: Slots::one(SlotKind::of::<T>()),
            consumed_slot: consumed == Consumed::Tracked,
        }
    }

    /// Storage of `self` followed by `next`, with both values kept.
    ///
    /// `self`'s value stays live while `next` decodes; scratch needed by
    /// each step is reused across steps.
    pub fn then(self, next: Storage) -> Storage {
        Storage {
            before: self.before.max(self.after.plus(next.before)),
            after: self.after.plus(next.after),
            consumed_slot: self.consumed_slot || next.consumed_slot,
        }
    }

    /// The same storage with extra slots needed during decoding.
    pub fn needing(self, extra: Slots) -> Storage {
        Storage {
            before: self.before.plus(extra),
            ..self
        }
    }

    /// The same storage with the value collapsed into one slot of `kind`.
    pub fn collapsed(self, kind: SlotKind) -> Storage {
        Storage {
            before: self.before.max(self.after),
            after: Slots::one(kind),
            ..self
        }
    }
}

/// A specialized decode/encode routine for `T`.
pub struct Plan<T> {
    label: Cow<'static, str>,
    meta: Meta,
    consumed: Consumed,
    storage: Storage,
    specialized: bool,
    decode: DecodeFn<T>,
    encode: EncodeFn<T>,
    measure: MeasureFn<T>,
}

impl<T> Clone for Plan<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            meta: self.meta,
            consumed: self.consumed,
            storage: self.storage,
            specialized: self.specialized,
            decode: self.decode.clone(),
            encode: self.encode.clone(),
            measure: self.measure.clone(),
        }
    }
}

impl<T: 'static> Plan<T> {
    /// A specialized plan.
    ///
    /// The consumed count is derived from `meta`: constant-length plans get
    /// [`Consumed::Constant`] and need no slot for it.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        meta: Meta,
        decode: impl Fn(&mut Cursor<'_>) -> Result<T, DecodeError> + Send + Sync + 'static,
        encode: impl Fn(&T, &mut Vec<u8>) -> Result<(), EncodeError> + Send + Sync + 'static,
        measure: impl Fn(&T) -> Result<usize, EncodeError> + Send + Sync + 'static,
    ) -> Self {
        let consumed = Consumed::from_meta(meta);
        Self {
            label: label.into(),
            meta,
            consumed,
            storage: Storage::value::<T>(consumed),
            specialized: true,
            decode: Arc::new(decode),
            encode: Arc::new(encode),
            measure: Arc::new(measure),
        }
    }

    /// The generic fallback for a codec without a plan of its own.
    pub fn adapter<J>(jar: Arc<J>) -> Self
    where
        J: Jar<Value = T> + ?Sized + 'static,
    {
        let meta = jar.meta();
        let label = format!("adapter({})", jar.label());
        let decoder = jar.clone();
        let encoder = jar.clone();
        let measurer = jar;
        let mut plan = Self::new(
            label,
            meta,
            move |cursor| {
                let Parsed { value, consumed } = decoder.decode(cursor.window())?;
                cursor.advance(consumed)?;
                Ok(value)
            },
            move |value, out| encoder.encode_into(value, out),
            move |value| measurer.encoded_len(value),
        );
        // the adapter materializes a full `Parsed` before unpacking it
        plan.storage = plan
            .storage
            .needing(Slots::one(SlotKind::Boxed))
            .collapsed(SlotKind::of::<T>());
        plan.specialized = false;
        plan
    }

    /// Replaces the storage declaration.
    pub fn with_storage(mut self, storage: Storage) -> Self {
        self.storage = storage;
        self
    }

    /// Replaces the metadata, keeping the consumed count consistent with it.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self.consumed = Consumed::from_meta(meta);
        self
    }

    /// Replaces the label.
    pub fn with_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Human-readable label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Wire metadata.
    pub fn meta(&self) -> Meta {
        self.meta
    }

    /// How the consumed count is known.
    pub fn consumed(&self) -> Consumed {
        self.consumed
    }

    /// Declared storage.
    pub fn storage(&self) -> Storage {
        self.storage
    }

    /// `false` for adapter plans.
    pub fn is_specialized(&self) -> bool {
        self.specialized
    }

    /// Runs the decode step on a parent's cursor.
    #[inline]
    pub fn decode(&self, cursor: &mut Cursor<'_>) -> Result<T, DecodeError> {
        (self.decode)(cursor)
    }

    /// Runs the encode step into a parent's buffer.
    #[inline]
    pub fn encode_into(&self, value: &T, out: &mut Vec<u8>) -> Result<(), EncodeError> {
        (self.encode)(value, out)
    }

    /// Exact encoded length of `value`.
    #[inline]
    pub fn measure(&self, value: &T) -> Result<usize, EncodeError> {
        match self.consumed {
            Consumed::Constant(len) => Ok(len),
            Consumed::Tracked => (self.measure)(value),
        }
    }

    /// Shared handle to the decode step, for embedding into another plan.
    pub fn decoder(&self) -> DecodeFn<T> {
        self.decode.clone()
    }

    /// Shared handle to the encode step.
    pub fn encoder(&self) -> EncodeFn<T> {
        self.encode.clone()
    }

    /// Shared handle to the measure step.
    pub fn measurer(&self) -> MeasureFn<T> {
        self.measure.clone()
    }

    /// Runs the plan as a top-level routine over `window`.
    ///
    /// A constant-length plan checks the whole length before reading
    /// anything, so a short window fails without a partial read.
    pub fn run(&self, window: Window<'_>) -> Result<Parsed<T>, DecodeError> {
        if let Consumed::Constant(len) = self.consumed {
            window.require(len)?;
        }
        let mut cursor = window.cursor();
        let value = (self.decode)(&mut cursor)?;
        Ok(Parsed::new(value, cursor.consumed()))
    }

    /// Encodes `value` into a buffer sized from [`Plan::measure`].
    pub fn encode(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(self.measure(value)?);
        (self.encode)(value, &mut out)?;
        Ok(out)
    }

    /// One-line summary of the plan.
    pub fn describe(&self) -> String {
        let consumed = match self.consumed {
            Consumed::Constant(len) => format!("{len}B"),
            Consumed::Tracked => String::from("tracked"),
        };
        let Storage {
            before,
            after,
            consumed_slot,
        } = self.storage;
        format!(
            "{} [{}{}] before={}i/{}b/{}s after={}i/{}b/{}s{}",
            self.label,
            consumed,
            if self.specialized { "" } else { ", adapter" },
            before.inline,
            before.boxed,
            before.scratch,
            after.inline,
            after.boxed,
            after.scratch,
            if consumed_slot { " +offset" } else { "" },
        )
    }
}

impl<T> fmt::Debug for Plan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("label", &self.label)
            .field("meta", &self.meta)
            .field("consumed", &self.consumed)
            .field("storage", &self.storage)
            .field("specialized", &self.specialized)
            .finish_non_exhaustive()
    }
}

/// The plan of a child codec: its own if it has one, the adapter otherwise.
pub fn plan_of<J>(jar: &Arc<J>) -> Plan<J::Value>
where
    J: Jar + ?Sized + 'static,
{
    match jar.plan() {
        Some(plan) => plan,
        None => {
            trace!("no specialized plan for {}, using adapter", jar.label());
            Plan::adapter(jar.clone())
        }
    }
}

/// A lowered plan, built on first use and kept for the codec's lifetime.
pub struct Compiled<T> {
    cell: OnceLock<Plan<T>>,
}

impl<T: 'static> Compiled<T> {
    /// An empty cache.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// The cached plan, lowering it with `lower` the first time.
    #[inline]
    pub fn get_or_lower(&self, lower: impl FnOnce() -> Plan<T>) -> &Plan<T> {
        self.cell.get_or_init(|| {
            let plan = lower();
            trace!("lowered {}", plan.describe());
            plan
        })
    }

    /// Whether the plan has been lowered yet.
    pub fn is_lowered(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: 'static> Default for Compiled<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Compiled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cell.get() {
            Some(plan) => f.debug_tuple("Compiled").field(plan).finish(),
            None => f.write_str("Compiled(<not lowered>)"),
        }
    }
}
