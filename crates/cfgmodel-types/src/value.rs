use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A typed value produced by a [`ValueParser`](crate::ValueParser).
///
/// Serializes untagged, so `ParsedValue::Int(8080)` is the JSON number
/// `8080` and a list is a JSON array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParsedValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<ParsedValue>),
}

impl ParsedValue {
    /// Name of the variant, used in type-mismatch diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ParsedValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for ParsedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for ParsedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for ParsedValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<String> for ParsedValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ParsedValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl<T: Into<ParsedValue>> From<Vec<T>> for ParsedValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

macro_rules! int_conversions {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ParsedValue {
                fn from(n: $t) -> Self {
                    Self::Int(i64::from(n))
                }
            }

            impl TryFrom<ParsedValue> for $t {
                type Error = TypeError;

                fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
                    let mismatch = TypeError::Mismatch {
                        expected: stringify!($t),
                        actual: value.kind(),
                    };
                    match value {
                        ParsedValue::Int(n) => <$t>::try_from(n).map_err(|_| mismatch),
                        _ => Err(mismatch),
                    }
                }
            }
        )*
    };
}

int_conversions!(i8, i16, i32, i64, u8, u16, u32);

impl TryFrom<ParsedValue> for u64 {
    type Error = TypeError;

    fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
        let mismatch = TypeError::Mismatch {
            expected: "u64",
            actual: value.kind(),
        };
        match value {
            ParsedValue::Int(n) => u64::try_from(n).map_err(|_| mismatch),
            _ => Err(mismatch),
        }
    }
}

impl TryFrom<ParsedValue> for bool {
    type Error = TypeError;

    fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
        value.as_bool().ok_or(TypeError::Mismatch {
            expected: "bool",
            actual: value.kind(),
        })
    }
}

impl TryFrom<ParsedValue> for f64 {
    type Error = TypeError;

    fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
        value.as_f64().ok_or(TypeError::Mismatch {
            expected: "f64",
            actual: value.kind(),
        })
    }
}

impl TryFrom<ParsedValue> for String {
    type Error = TypeError;

    fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
        match value {
            ParsedValue::Text(s) => Ok(s),
            other => Err(TypeError::Mismatch {
                expected: "text",
                actual: other.kind(),
            }),
        }
    }
}

impl TryFrom<ParsedValue> for Vec<ParsedValue> {
    type Error = TypeError;

    fn try_from(value: ParsedValue) -> Result<Self, Self::Error> {
        match value {
            ParsedValue::List(items) => Ok(items),
            other => Err(TypeError::Mismatch {
                expected: "list",
                actual: other.kind(),
            }),
        }
    }
}
