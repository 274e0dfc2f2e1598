//! Typed views over raw attribute text.
//!
//! Attributes are stored as strings. An [`AttributeProxy`] pairs an
//! attribute name with a registry type so callers can read and write native
//! values; the per-element modules below declare one proxy per attribute.

use std::marker::PhantomData;

use ligolw_types::{lookup, TypeError, Value};
use tracing::trace;

use crate::element::Element;
use crate::LigoLwError;

/// Native types that can be stored in an attribute.
pub trait AttributeType: Sized {
    /// Registry type used to encode and decode the value.
    const TYPE_NAME: &'static str;

    fn from_value(value: Value) -> Result<Self, TypeError>;

    fn into_value(self) -> Value;
}

fn mismatch(type_name: &'static str, value: &Value) -> TypeError {
    TypeError::Mismatch {
        type_name,
        found: value.kind_name(),
    }
}

impl AttributeType for String {
    const TYPE_NAME: &'static str = "lstring";

    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(mismatch(Self::TYPE_NAME, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl AttributeType for f64 {
    const TYPE_NAME: &'static str = "real_8";

    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Real(v) => Ok(v),
            other => Err(mismatch(Self::TYPE_NAME, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl AttributeType for f32 {
    const TYPE_NAME: &'static str = "real_4";

    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Real(v) => Ok(v as f32),
            other => Err(mismatch(Self::TYPE_NAME, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Real(f64::from(self))
    }
}

impl AttributeType for i32 {
    const TYPE_NAME: &'static str = "int_4s";

    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(v) => i32::try_from(v).map_err(|_| TypeError::OutOfRange {
                type_name: Self::TYPE_NAME,
                value: v.to_string(),
            }),
            other => Err(mismatch(Self::TYPE_NAME, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Int(i64::from(self))
    }
}

impl AttributeType for i64 {
    const TYPE_NAME: &'static str = "int_8s";

    fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch(Self::TYPE_NAME, &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

/// Named, typed accessor for one attribute with an optional default.
#[derive(Debug, Clone, Copy)]
pub struct AttributeProxy<T> {
    name: &'static str,
    default: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: AttributeType> AttributeProxy<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            default: None,
            _marker: PhantomData,
        }
    }

    /// Accessor whose reads fall back to `default` (given in text form)
    /// when the attribute is absent.
    pub const fn with_default(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            default: Some(default),
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn default_text(&self) -> Option<&'static str> {
        self.default
    }

    /// Decode the stored value, or the default if nothing is stored.
    pub fn get(&self, element: &Element) -> Result<T, LigoLwError> {
        let text = element
            .attribute(self.name)
            .or(self.default)
            .ok_or_else(|| LigoLwError::AttributeNotSet(self.name.to_string()))?;
        let value = lookup(T::TYPE_NAME)?.parse(text)?;
        Ok(T::from_value(value)?)
    }

    /// Encode `value` and store it on `element`.
    pub fn set(&self, element: &mut Element, value: T) -> Result<(), LigoLwError> {
        let text = lookup(T::TYPE_NAME)?.format(&value.into_value())?;
        trace!(element = element.tag_name(), attribute = self.name, %text, "set attribute");
        element.set_attribute(self.name, text)
    }

    /// Remove the stored value; later reads see the default again.
    pub fn remove(&self, element: &mut Element) {
        element.remove_attribute(self.name);
    }
}

pub mod ligo_lw {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::new("Type");
}

pub mod param {
    use super::AttributeProxy;

    pub const DATA_UNIT: AttributeProxy<String> = AttributeProxy::new("DataUnit");
    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const SCALE: AttributeProxy<String> = AttributeProxy::new("Scale");
    pub const START: AttributeProxy<String> = AttributeProxy::new("Start");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::new("Type");
    pub const UNIT: AttributeProxy<String> = AttributeProxy::new("Unit");
}

pub mod table {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::new("Type");
}

pub mod column {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::new("Type");
    pub const UNIT: AttributeProxy<String> = AttributeProxy::new("Unit");
}

pub mod array {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::new("Type");
    pub const UNIT: AttributeProxy<String> = AttributeProxy::new("Unit");
}

pub mod dim {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const SCALE: AttributeProxy<f64> = AttributeProxy::new("Scale");
    pub const START: AttributeProxy<f64> = AttributeProxy::new("Start");
    pub const UNIT: AttributeProxy<String> = AttributeProxy::new("Unit");
}

pub mod stream {
    use super::AttributeProxy;

    pub const CONTENT: AttributeProxy<String> = AttributeProxy::new("Content");
    pub const DELIMITER: AttributeProxy<String> = AttributeProxy::with_default("Delimiter", ",");
    pub const ENCODING: AttributeProxy<String> = AttributeProxy::new("Encoding");
    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::with_default("Type", "Local");
}

pub mod igwd_frame {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
}

pub mod detector {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
}

pub mod adc_data {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
}

pub mod adc_interval {
    use super::AttributeProxy;

    pub const DELTA_T: AttributeProxy<f64> = AttributeProxy::new("DeltaT");
    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const START_TIME: AttributeProxy<String> = AttributeProxy::new("StartTime");
}

pub mod time {
    use super::AttributeProxy;

    pub const NAME: AttributeProxy<String> = AttributeProxy::new("Name");
    pub const TYPE: AttributeProxy<String> = AttributeProxy::with_default("Type", "ISO-8601");
}
