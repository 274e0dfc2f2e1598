#![cfg_attr(docsrs, feature(doc_cfg))]
//! LIGO Light Weight type names and the text conversions attached to them.
//!
//! Attribute and stream values are stored as text. This crate maps the
//! format's semantic type names (`real_8`, `int_4s`, `lstring`, ...) to a
//! parser and a formatter so callers can work with native values.

use core::fmt;

use thiserror::Error;

/// Representations accepted by the `Type` attribute of `Time` elements.
pub const TIME_TYPES: [&str; 3] = ["GPS", "Unix", "ISO-8601"];

/// Errors produced while converting between text and typed values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    /// The type name is not part of the registry.
    #[error("unknown type: {0}")]
    UnknownType(String),
    /// The text could not be parsed as the requested type.
    #[error("cannot parse '{value}' as {type_name}")]
    Parse {
        type_name: &'static str,
        value: String,
    },
    /// The value does not fit the width of the requested type.
    #[error("value {value} does not fit {type_name}")]
    OutOfRange {
        type_name: &'static str,
        value: String,
    },
    /// The value has the wrong shape for the requested type.
    #[error("{type_name} cannot hold a {found} value")]
    Mismatch {
        type_name: &'static str,
        found: &'static str,
    },
}

/// Broad class of a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    Integer,
    Real,
    Text,
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Short description of the value's shape, used in error messages.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Real(v) => f.write_str(&format_g(*v, 17)),
            Value::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Repr {
    Signed(u32),
    Unsigned(u32),
    Real { digits: usize },
    Text,
}

/// Registry entry describing how one semantic type converts to and from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    name: &'static str,
    repr: Repr,
}

static REGISTRY: &[TypeInfo] = &[
    TypeInfo::new("char_s", Repr::Text),
    TypeInfo::new("char_v", Repr::Text),
    TypeInfo::new("ilwd:char", Repr::Text),
    TypeInfo::new("lstring", Repr::Text),
    TypeInfo::new("string", Repr::Text),
    TypeInfo::new("int_2s", Repr::Signed(16)),
    TypeInfo::new("int_2u", Repr::Unsigned(16)),
    TypeInfo::new("int_4s", Repr::Signed(32)),
    TypeInfo::new("int_4u", Repr::Unsigned(32)),
    TypeInfo::new("int_8s", Repr::Signed(64)),
    TypeInfo::new("int_8u", Repr::Unsigned(64)),
    TypeInfo::new("real_4", Repr::Real { digits: 9 }),
    TypeInfo::new("real_8", Repr::Real { digits: 17 }),
    TypeInfo::new("float", Repr::Real { digits: 9 }),
    TypeInfo::new("double", Repr::Real { digits: 17 }),
];

/// Look up a type by its name as it appears in `Type` attributes.
pub fn lookup(name: &str) -> Result<&'static TypeInfo, TypeError> {
    REGISTRY
        .iter()
        .find(|info| info.name == name)
        .ok_or_else(|| TypeError::UnknownType(name.to_string()))
}

/// Names of every registered type.
pub fn type_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.iter().map(|info| info.name)
}

impl TypeInfo {
    const fn new(name: &'static str, repr: Repr) -> Self {
        Self { name, repr }
    }

    /// Registered name of the type.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Class of the type.
    pub const fn class(&self) -> TypeClass {
        match self.repr {
            Repr::Signed(_) | Repr::Unsigned(_) => TypeClass::Integer,
            Repr::Real { .. } => TypeClass::Real,
            Repr::Text => TypeClass::Text,
        }
    }

    /// Decode text into a value of this type.
    pub fn parse(&self, text: &str) -> Result<Value, TypeError> {
        match self.repr {
            Repr::Text => Ok(Value::Text(text.to_string())),
            Repr::Real { .. } => text
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|_| self.parse_error(text)),
            Repr::Signed(bits) => {
                let value = text
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| self.parse_error(text))?;
                self.check_signed(bits, value)?;
                Ok(Value::Int(value))
            }
            Repr::Unsigned(bits) => {
                let value = text
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| self.parse_error(text))?;
                self.check_unsigned(bits, value)?;
                Ok(Value::UInt(value))
            }
        }
    }

    /// Encode a value as text following this type's conventions.
    pub fn format(&self, value: &Value) -> Result<String, TypeError> {
        match (self.repr, value) {
            (Repr::Text, value) => Ok(value.to_string()),
            (Repr::Real { digits }, Value::Real(v)) => Ok(format_g(*v, digits)),
            (Repr::Real { digits }, Value::Int(v)) => Ok(format_g(*v as f64, digits)),
            (Repr::Real { digits }, Value::UInt(v)) => Ok(format_g(*v as f64, digits)),
            (Repr::Signed(bits), Value::Int(v)) => {
                self.check_signed(bits, *v)?;
                Ok(v.to_string())
            }
            (Repr::Signed(bits), Value::UInt(v)) => {
                let signed = i64::try_from(*v).map_err(|_| self.range_error(v))?;
                self.check_signed(bits, signed)?;
                Ok(v.to_string())
            }
            (Repr::Unsigned(bits), Value::UInt(v)) => {
                self.check_unsigned(bits, *v)?;
                Ok(v.to_string())
            }
            (Repr::Unsigned(bits), Value::Int(v)) => {
                let unsigned = u64::try_from(*v).map_err(|_| self.range_error(v))?;
                self.check_unsigned(bits, unsigned)?;
                Ok(v.to_string())
            }
            (_, other) => Err(TypeError::Mismatch {
                type_name: self.name,
                found: other.kind_name(),
            }),
        }
    }

    fn check_signed(&self, bits: u32, value: i64) -> Result<(), TypeError> {
        if bits >= 64 {
            return Ok(());
        }
        let max = (1i64 << (bits - 1)) - 1;
        let min = -(1i64 << (bits - 1));
        if value < min || value > max {
            return Err(self.range_error(value));
        }
        Ok(())
    }

    fn check_unsigned(&self, bits: u32, value: u64) -> Result<(), TypeError> {
        if bits >= 64 {
            return Ok(());
        }
        if value > (1u64 << bits) - 1 {
            return Err(self.range_error(value));
        }
        Ok(())
    }

    fn parse_error(&self, text: &str) -> TypeError {
        TypeError::Parse {
            type_name: self.name,
            value: text.to_string(),
        }
    }

    fn range_error(&self, value: impl fmt::Display) -> TypeError {
        TypeError::OutOfRange {
            type_name: self.name,
            value: value.to_string(),
        }
    }
}

/// Format a real number like C's `%.{precision}g`.
///
/// Scientific notation is used when the decimal exponent is below -4 or at
/// least `precision`; trailing zeros in the fraction are removed.
pub fn format_g(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let scientific = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return scientific;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -4 || exponent >= precision as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{sign}{:02}",
            trim_fraction(mantissa),
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        trim_fraction(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}
