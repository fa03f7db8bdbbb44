//! Error types for decoding, encoding and codec composition.

use alloc::borrow::Cow;
use alloc::string::String;
use core::fmt;

/// Errors that can occur while decoding a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes are available than the codec needs
    DataFragment {
        /// Absolute position where the read was attempted
        offset: usize,
        /// Bytes the codec needed
        needed: usize,
        /// Bytes that were available
        available: usize,
    },
    /// A framed region was not fully consumed by its inner codec
    LeftoverData {
        /// Absolute position of the frame
        offset: usize,
        /// Size of the frame
        expected: usize,
        /// Bytes the inner codec actually consumed
        consumed: usize,
    },
    /// A predicate rejected the decoded value
    Constraint {
        /// Description of the violated predicate
        message: Cow<'static, str>,
    },
    /// Bytes are not valid in the requested text encoding
    InvalidText {
        /// Name of the encoding
        encoding: &'static str,
        /// Absolute position of the first bad byte
        offset: usize,
    },
    /// A boolean byte was neither 0 nor 1
    InvalidBool {
        /// Absolute position of the byte
        offset: usize,
        /// The byte found
        value: u8,
    },
    /// A decoded count or size cannot describe a valid frame
    InvalidSize {
        /// Absolute position of the prefix
        offset: usize,
        /// The decoded value, widened
        value: u64,
    },
    /// An item codec consumed nothing inside a loop that needs progress
    NoProgress {
        /// Absolute position where the loop stalled
        offset: usize,
    },
    /// A record slot held a value of an unexpected type
    Slot {
        /// The member whose slot was read
        member: &'static str,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::DataFragment {
                offset,
                needed,
                available,
            } => write!(
                f,
                "data fragment at byte {offset}: needed {needed} bytes, {available} available"
            ),
            DecodeError::LeftoverData {
                offset,
                expected,
                consumed,
            } => write!(
                f,
                "leftover data in frame at byte {offset}: frame is {expected} bytes, inner codec consumed {consumed}"
            ),
            DecodeError::Constraint { message } => write!(f, "constraint violated: {message}"),
            DecodeError::InvalidText { encoding, offset } => {
                write!(f, "invalid {encoding} text at byte {offset}")
            }
            DecodeError::InvalidBool { offset, value } => {
                write!(f, "invalid boolean {value:#04x} at byte {offset}")
            }
            DecodeError::InvalidSize { offset, value } => {
                write!(f, "invalid size or count {value} at byte {offset}")
            }
            DecodeError::NoProgress { offset } => {
                write!(f, "item codec made no progress at byte {offset}")
            }
            DecodeError::Slot { member } => {
                write!(f, "record slot for member `{member}` holds the wrong type")
            }
        }
    }
}

impl core::error::Error for DecodeError {}

/// Errors that can occur while encoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A predicate rejected the value
    Constraint {
        /// Description of the violated predicate
        message: Cow<'static, str>,
    },
    /// A constant codec was asked to encode a different value
    ConstantMismatch,
    /// The inner bytes of a null-terminated codec contain a zero
    InteriorNul {
        /// Position of the zero inside the inner encoding
        position: usize,
    },
    /// A fixed-count codec was given a collection of another length
    CountMismatch {
        /// Count the codec was built for
        expected: usize,
        /// Length of the collection
        actual: usize,
    },
    /// A count or size does not fit in the prefix type
    Unrepresentable {
        /// The value that did not fit
        value: usize,
        /// Name of the prefix type
        target: &'static str,
    },
    /// A self-inclusive size prefix has no stable encoded length
    UndefinedSize {
        /// Encoded length of the framed item
        item_len: usize,
        /// Prefix length assumed for the first candidate size
        assumed: usize,
        /// Prefix length the candidate size actually needs
        required: usize,
    },
    /// The value cannot be represented in the requested text encoding
    InvalidText {
        /// Name of the encoding
        encoding: &'static str,
        /// Index of the first character that cannot be encoded
        position: usize,
    },
    /// A record member could not be read as the codec's value type
    Member {
        /// The member that was read
        member: &'static str,
    },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Constraint { message } => write!(f, "constraint violated: {message}"),
            EncodeError::ConstantMismatch => {
                write!(f, "value differs from the constant this codec encodes")
            }
            EncodeError::InteriorNul { position } => write!(
                f,
                "null-terminated value contains a zero byte at position {position}"
            ),
            EncodeError::CountMismatch { expected, actual } => write!(
                f,
                "expected exactly {expected} items, collection has {actual}"
            ),
            EncodeError::Unrepresentable { value, target } => {
                write!(f, "{value} does not fit in a {target} prefix")
            }
            EncodeError::UndefinedSize {
                item_len,
                assumed,
                required,
            } => write!(
                f,
                "size prefix is undefined: item is {item_len} bytes, prefix assumed {assumed} bytes but needs {required}"
            ),
            EncodeError::InvalidText { encoding, position } => {
                write!(f, "character {position} cannot be encoded as {encoding}")
            }
            EncodeError::Member { member } => {
                write!(f, "record member `{member}` has an unexpected type")
            }
        }
    }
}

impl core::error::Error for EncodeError {}

/// Errors raised while composing codecs, before any byte is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Two member codecs canonicalize to the same key
    DuplicateMember {
        /// Name of the second registration
        name: String,
    },
    /// A member codec names nothing on the target type
    UnknownMember {
        /// Target type
        type_name: &'static str,
        /// Name of the member codec
        name: String,
    },
    /// A member codec targets a member that can only be set by a constructor,
    /// and no qualifying constructor takes it
    ReadOnlyMember {
        /// Target type
        type_name: &'static str,
        /// Name of the member
        name: String,
    },
    /// No constructor or default value can receive every member codec
    NoConstructor {
        /// Target type
        type_name: &'static str,
    },
    /// Two constructors qualify with the same number of parameters
    AmbiguousConstructor {
        /// Target type
        type_name: &'static str,
        /// First candidate
        first: &'static str,
        /// Second candidate
        second: &'static str,
    },
    /// A codec's value type differs from the member it targets
    TypeMismatch {
        /// Name of the member
        member: String,
        /// Type the member holds
        expected: &'static str,
        /// Type the codec produces
        found: &'static str,
    },
    /// A codec that consumes an unbounded tail is followed by another codec
    NotFollowable {
        /// Label of the offending codec
        label: String,
    },
    /// A member has no getter, so the record cannot be encoded
    UnreadableMember {
        /// Name of the member
        name: String,
    },
    /// A constructor parameter names no field of the target type
    UnknownParameter {
        /// Constructor name
        constructor: &'static str,
        /// Parameter name
        parameter: &'static str,
    },
    /// A repetition's total length does not fit in `usize`
    LengthOverflow {
        /// Label of the repeated codec
        label: String,
        /// Number of repetitions
        count: usize,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::DuplicateMember { name } => {
                write!(f, "member `{name}` is registered more than once")
            }
            BindError::UnknownMember { type_name, name } => {
                write!(f, "`{type_name}` has no member matching `{name}`")
            }
            BindError::ReadOnlyMember { type_name, name } => write!(
                f,
                "member `{name}` of `{type_name}` is read-only and no constructor takes it"
            ),
            BindError::NoConstructor { type_name } => write!(
                f,
                "no constructor of `{type_name}` can receive every member codec"
            ),
            BindError::AmbiguousConstructor {
                type_name,
                first,
                second,
            } => write!(
                f,
                "constructors `{first}` and `{second}` of `{type_name}` are equally specific"
            ),
            BindError::TypeMismatch {
                member,
                expected,
                found,
            } => write!(
                f,
                "member `{member}` holds `{expected}` but its codec produces `{found}`"
            ),
            BindError::NotFollowable { label } => write!(
                f,
                "codec `{label}` consumes the rest of its window and cannot be followed"
            ),
            BindError::UnreadableMember { name } => {
                write!(f, "member `{name}` cannot be read for encoding")
            }
            BindError::UnknownParameter {
                constructor,
                parameter,
            } => write!(
                f,
                "parameter `{parameter}` of constructor `{constructor}` names no field"
            ),
            BindError::LengthOverflow { label, count } => write!(
                f,
                "{count} repetitions of `{label}` overflow the addressable length"
            ),
        }
    }
}

impl core::error::Error for BindError {}

/// Any brine error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Decoding failed
    Decode(DecodeError),
    /// Encoding failed
    Encode(EncodeError),
    /// Composition failed
    Bind(BindError),
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Self::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Self {
        Self::Encode(err)
    }
}

impl From<BindError> for Error {
    fn from(err: BindError) -> Self {
        Self::Bind(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Decode(err) => write!(f, "decode error: {err}"),
            Error::Encode(err) => write!(f, "encode error: {err}"),
            Error::Bind(err) => write!(f, "binding error: {err}"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Error::Decode(err) => Some(err),
            Error::Encode(err) => Some(err),
            Error::Bind(err) => Some(err),
        }
    }
}
