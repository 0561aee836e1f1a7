//! # Field Values
//!
//! Message attributes come from arbitrary schema keys. Instead of exposing
//! them as dynamic attributes they are held as tagged [`FieldValue`]s and
//! looked up by name.
//!
//! ## Data Types
//!
//! The `data_type` attribute of a message decides how many payload bytes
//! one element occupies:
//!
//! | Type | Bytes per `length` | Aliases |
//! |------|--------------------|---------|
//! | int16 | length × 2 | (default) |
//! | int32 | length × 4 | |
//! | float | length × 4 | |
//! | string | length × 1 | |
//! | bit | ceil(length / 8) | |

use std::fmt;

use serde_json::Value;

/// Tagged message attribute value.
///
/// # Example
///
/// ```rust
/// use modbus_schema::FieldValue;
///
/// let v = FieldValue::from_json(&serde_json::json!(3)).unwrap();
/// assert_eq!(v, FieldValue::Unsigned(3));
/// assert_eq!(v.as_u64(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Non-negative integer
    Unsigned(u64),
    /// Negative integer
    Signed(i64),
    /// Floating point number
    Float(f64),
    /// Boolean flag
    Bool(bool),
    /// Text
    Text(String),
    /// Bit vector, most significant bit first
    Bits(Vec<bool>),
}

impl FieldValue {
    /// Convert a JSON scalar into a field value.
    ///
    /// Arrays are accepted only when every element is a boolean or 0/1;
    /// they become a bit vector. Objects and `null` are rejected.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(FieldValue::Unsigned(u))
                } else if let Some(i) = n.as_i64() {
                    Some(FieldValue::Signed(i))
                } else {
                    n.as_f64().map(FieldValue::Float)
                }
            }
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Bool(b) => Some(*b),
                    Value::Number(n) => match n.as_u64() {
                        Some(0) => Some(false),
                        Some(1) => Some(true),
                        _ => None,
                    },
                    _ => None,
                })
                .collect::<Option<Vec<bool>>>()
                .map(FieldValue::Bits),
            Value::Null | Value::Object(_) => None,
        }
    }

    /// Integer view used for wire encoding.
    ///
    /// Negative numbers are reinterpreted as two's complement, floats are
    /// truncated toward zero, bit vectors are packed MSB first. Text has no
    /// integer view.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Unsigned(v) => Some(*v),
            FieldValue::Signed(v) => Some(*v as u64),
            FieldValue::Float(v) => Some(v.trunc() as i64 as u64),
            FieldValue::Bool(b) => Some(u64::from(*b)),
            FieldValue::Bits(bits) => {
                if bits.len() > 64 {
                    return None;
                }
                Some(
                    bits.iter()
                        .fold(0u64, |acc, &bit| (acc << 1) | u64::from(bit)),
                )
            }
            FieldValue::Text(_) => None,
        }
    }

    /// Text view (only for `Text`).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the type name as a string for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Unsigned(_) => "unsigned",
            FieldValue::Signed(_) => "signed",
            FieldValue::Float(_) => "float",
            FieldValue::Bool(_) => "bool",
            FieldValue::Text(_) => "text",
            FieldValue::Bits(_) => "bits",
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "\"{}\"", v),
            FieldValue::Bits(bits) => {
                for bit in bits {
                    f.write_str(if *bit { "1" } else { "0" })?;
                }
                Ok(())
            }
        }
    }
}

// ============================================================================
// From implementations for ergonomic construction
// ============================================================================

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::Unsigned(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        FieldValue::Unsigned(u64::from(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        if v >= 0 {
            FieldValue::Unsigned(v as u64)
        } else {
            FieldValue::Signed(v)
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

// ============================================================================
// Data Types
// ============================================================================

/// Element data type of a message payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    #[default]
    Int16,
    Int32,
    Float,
    String,
    Bit,
}

impl DataType {
    /// Parse a data type name (case-insensitive). Unknown names are `None`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "int16" => Some(Self::Int16),
            "int32" => Some(Self::Int32),
            "float" => Some(Self::Float),
            "string" => Some(Self::String),
            "bit" => Some(Self::Bit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::String => "string",
            Self::Bit => "bit",
        }
    }

    /// Number of payload bytes for `length` elements of this type.
    pub fn byte_count(&self, length: u64) -> u64 {
        match self {
            Self::Int16 => length.saturating_mul(2),
            Self::Int32 | Self::Float => length.saturating_mul(4),
            Self::String => length,
            Self::Bit => length.div_ceil(8),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
