//! Repetition: fixed count, count-prefixed, until the end of the window, and
//! fixed-size arrays.

mod array;
mod bulk;
mod counted;
mod fixed;
mod until_end;

pub use array::ArrayJar;
pub(crate) use bulk::Bulk;
pub use counted::RepeatCounted;
pub use fixed::Repeat;
pub use until_end::RepeatUntilEnd;

use crate::{BindError, Jar};

/// Items repeated back to back must each leave the window well positioned.
fn require_followable<J: Jar + ?Sized>(item: &J) -> Result<(), BindError> {
    if item.meta().can_be_followed() {
        Ok(())
    } else {
        Err(BindError::NotFollowable {
            label: item.label().into_owned(),
        })
    }
}

/// The total length of `count` constant-length items has to fit in `usize`.
fn require_addressable<J: Jar + ?Sized>(item: &J, count: usize) -> Result<(), BindError> {
    match item.meta().constant_length() {
        Some(len) if len.checked_mul(count).is_none() => Err(BindError::LengthOverflow {
            label: item.label().into_owned(),
            count,
        }),
        _ => Ok(()),
    }
}
