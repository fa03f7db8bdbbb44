//! The metadata triple every codec carries.

/// Static facts about a codec's wire behavior.
///
/// `blittable` can only be set through [`Meta::blittable`], which also fixes
/// the constant length, so a blittable codec always has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Meta {
    can_be_followed: bool,
    blittable: bool,
    constant_length: Option<usize>,
}

impl Meta {
    /// A followable codec whose length depends on the value.
    pub const fn variable() -> Self {
        Self {
            can_be_followed: true,
            blittable: false,
            constant_length: None,
        }
    }

    /// A followable codec that always reads and writes `len` bytes.
    pub const fn constant(len: usize) -> Self {
        Self {
            can_be_followed: true,
            blittable: false,
            constant_length: Some(len),
        }
    }

    /// A constant-length codec whose wire bytes equal the value's memory bytes.
    pub const fn blittable(len: usize) -> Self {
        Self {
            can_be_followed: true,
            blittable: true,
            constant_length: Some(len),
        }
    }

    /// A codec that consumes whatever is left of its window.
    pub const fn terminal() -> Self {
        Self {
            can_be_followed: false,
            blittable: false,
            constant_length: None,
        }
    }

    /// Whether another codec can be sequenced after this one.
    #[inline]
    pub const fn can_be_followed(&self) -> bool {
        self.can_be_followed
    }

    /// Whether the raw-copy path is valid for this codec.
    #[inline]
    pub const fn is_blittable(&self) -> bool {
        self.blittable
    }

    /// Byte count, when it does not depend on the value.
    #[inline]
    pub const fn constant_length(&self) -> Option<usize> {
        self.constant_length
    }

    /// The same codec, minus the blittable claim.
    pub const fn opaque(self) -> Self {
        Self {
            blittable: false,
            ..self
        }
    }

    /// Metadata of `self` followed by `next`.
    ///
    /// The sequence is never blittable on its own; records decide that
    /// through the layout analysis.
    pub const fn then(self, next: Meta) -> Self {
        let constant_length = match (self.constant_length, next.constant_length) {
            (Some(a), Some(b)) => a.checked_add(b),
            _ => None,
        };
        Self {
            can_be_followed: next.can_be_followed,
            blittable: false,
            constant_length,
        }
    }

    /// Metadata of `count` repetitions of an item with this metadata.
    ///
    /// A total length past `usize::MAX` is reported as variable.
    pub const fn repeated(self, count: usize) -> Self {
        let constant_length = match self.constant_length {
            Some(len) => len.checked_mul(count),
            None => None,
        };
        Self {
            can_be_followed: self.can_be_followed || count == 0,
            blittable: false,
            constant_length,
        }
    }
}

/// A decoded value together with the number of bytes it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parsed<T> {
    /// The decoded value
    pub value: T,
    /// Bytes consumed from the decoded window
    pub consumed: usize,
}

impl<T> Parsed<T> {
    /// Bundles a value and its consumed count.
    pub const fn new(value: T, consumed: usize) -> Self {
        Self { value, consumed }
    }

    /// Transforms the value, keeping the consumed count.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            consumed: self.consumed,
        }
    }
}
