//! Tagged value model for procedure results.
//!
//! Procedures return ordinary Rust values; the adapter generated at
//! registration turns them into [`Value`]s so the serializer can work on the
//! runtime shape without knowing the concrete type.

use std::collections::{BTreeMap, HashMap};

use serde::ser::{Error as _, Serialize, Serializer};

/// A dynamically shaped result value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent value (`None`, unit inside a structure).
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    Sequence(Vec<Value>),
    /// Associative map / composite record. Keys are kept sorted.
    Record(BTreeMap<String, Value>),
}

impl Value {
    /// Scalars that travel as canonical text rather than structured text.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Bool(_) | Value::Integer(_) | Value::Float(_) | Value::Text(_)
        )
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) if !f.is_finite() => Err(S::Error::custom(format!(
                "non-finite float {} has no structured form",
                f
            ))),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Sequence(items) => serializer.collect_seq(items),
            Value::Record(fields) => serializer.collect_map(fields),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                // u64 above i64::MAX lands here and loses precision.
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Record(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

/// What a procedure produced, shaped by its result arity.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// The procedure returns nothing.
    Empty,
    /// Exactly one value.
    Single(Value),
    /// Several values (tuple returns).
    Multiple(Vec<Value>),
}

/// Conversion of native return values into [`Value`].
pub trait IntoValue {
    /// Convert into the tagged representation.
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for serde_json::Value {
    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! impl_into_value_integer {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Integer(self as i64)
                }
            }
        )*
    };
}

impl_into_value_integer!(i8, i16, i32, i64, isize, u8, u16, u32);

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        // Widen through the shortest decimal form so 1.1f32 prints as 1.1.
        Value::Float(self.to_string().parse().unwrap_or(self as f64))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &'static str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for char {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Sequence(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue> IntoValue for BTreeMap<String, T> {
    fn into_value(self) -> Value {
        Value::Record(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}

impl<T: IntoValue, S> IntoValue for HashMap<String, T, S> {
    fn into_value(self) -> Value {
        Value::Record(self.into_iter().map(|(k, v)| (k, v.into_value())).collect())
    }
}
