#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![deny(unsafe_code)]
#![doc = include_str!("../README.md")]

extern crate alloc;

pub use brine_core::*;

mod tracing_macros;

mod constant;
pub use constant::*;

mod text;
pub use text::*;

mod seq;
pub use seq::*;

mod select;
pub use select::*;

mod constraint;
pub use constraint::*;

mod null_terminated;
pub use null_terminated::*;

mod size_prefixed;
pub use size_prefixed::*;

mod repeat;
pub use repeat::*;

mod analysis;
pub use analysis::*;

pub mod record;

mod ext;
pub use ext::*;

pub mod jars;
