//! Method-style composition for every codec.

use alloc::borrow::Cow;
use alloc::sync::Arc;

use crate::{
    ArrayJar, BindError, BoxedJar, Jar, Length, NullTerminated, Repeat, RepeatCounted,
    RepeatUntilEnd, Select, SizePrefixed, Then, Where, seq,
};

/// Combinators available on every codec.
pub trait JarExt: Jar + Sized + 'static {
    /// This codec followed by `next`, decoding to a pair.
    fn then<N: Jar + 'static>(self, next: N) -> Result<Then<Self, N>, BindError> {
        seq((self, next))
    }

    /// Maps values through `into` when decoding and `from` when encoding.
    fn select<T, F, G>(self, into: F, from: G) -> Select<Self, T, F, G>
    where
        T: 'static,
        F: Fn(Self::Value) -> T + Send + Sync + 'static,
        G: Fn(&T) -> Self::Value + Send + Sync + 'static,
    {
        Select::new(self, into, from)
    }

    /// Rejects values failing `predicate`.
    fn where_<P>(self, message: impl Into<Cow<'static, str>>, predicate: P) -> Where<Self, P>
    where
        P: Fn(&Self::Value) -> bool + Send + Sync + 'static,
    {
        Where::new(self, message, predicate)
    }

    /// Frames this codec with a trailing zero byte.
    fn null_terminated(self) -> NullTerminated<Self> {
        NullTerminated::new(self)
    }

    /// Frames this codec behind a size prefix encoded with `prefix`.
    fn size_prefixed<P>(self, prefix: P) -> SizePrefixed<P, Self>
    where
        P: Jar + 'static,
        P::Value: Length,
    {
        SizePrefixed::new(prefix, self)
    }

    /// Exactly `count` items.
    fn repeat(self, count: usize) -> Result<Repeat<Self>, BindError> {
        Repeat::new(self, count)
    }

    /// Items preceded by their number, encoded with `count`.
    fn repeat_counted<C>(self, count: C) -> Result<RepeatCounted<C, Self>, BindError>
    where
        C: Jar + 'static,
        C::Value: Length,
    {
        RepeatCounted::new(count, self)
    }

    /// Items until the window is exhausted.
    fn repeat_until_end(self) -> Result<RepeatUntilEnd<Self>, BindError> {
        RepeatUntilEnd::new(self)
    }

    /// A `[Self::Value; N]`.
    fn array<const N: usize>(self) -> Result<ArrayJar<Self, N>, BindError> {
        ArrayJar::new(self)
    }

    /// This codec behind a shared trait object.
    fn boxed(self) -> BoxedJar<Self::Value> {
        Arc::new(self)
    }
}

impl<J: Jar + 'static> JarExt for J {}
