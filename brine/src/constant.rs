//! A value that takes no bytes.

use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;
use core::fmt;

use crate::{DecodeError, EncodeError, Jar, Meta, Parsed, Plan, Window};

/// Decodes to a fixed value without reading anything.
///
/// Encoding writes nothing and fails for any value other than the constant.
#[derive(Debug, Clone)]
pub struct Constant<T> {
    value: T,
}

impl<T> Constant<T> {
    /// A codec that always produces `value`.
    pub const fn new(value: T) -> Self {
        Self { value }
    }

    /// The constant.
    pub fn value(&self) -> &T {
        &self.value
    }
}

fn check<T: PartialEq>(expected: &T, value: &T) -> Result<(), EncodeError> {
    if value == expected {
        Ok(())
    } else {
        Err(EncodeError::ConstantMismatch)
    }
}

impl<T> Jar for Constant<T>
where
    T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    type Value = T;

    fn decode(&self, _window: Window<'_>) -> Result<Parsed<T>, DecodeError> {
        Ok(Parsed::new(self.value.clone(), 0))
    }

    fn encode_into(&self, value: &T, _out: &mut Vec<u8>) -> Result<(), EncodeError> {
        check(&self.value, value)
    }

    fn meta(&self) -> Meta {
        Meta::constant(0)
    }

    fn label(&self) -> Cow<'static, str> {
        Cow::Owned(format!("const({:?})", self.value))
    }

    fn plan(&self) -> Option<Plan<T>> {
        let produced = self.value.clone();
        let expected = self.value.clone();
        Some(Plan::new(
            self.label(),
            Meta::constant(0),
            move |_| Ok(produced.clone()),
            move |value, _| check(&expected, value),
            |_| Ok(0),
        ))
    }
}
