//! Return types a procedure may declare.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use serde::Serialize;

use super::descriptor::ResultArity;
use crate::codec::{IntoValue, Output, Value};
use crate::error::{RpcError, Result};

/// A Rust type usable as a procedure's return type.
pub trait IntoOutput {
    /// Result arity recorded in the descriptor.
    const ARITY: ResultArity;

    /// Convert the returned value.
    fn into_output(self) -> Result<Output>;
}

impl IntoOutput for () {
    const ARITY: ResultArity = ResultArity::Zero;

    fn into_output(self) -> Result<Output> {
        Ok(Output::Empty)
    }
}

macro_rules! impl_into_output_single {
    ($($ty:ty),*) => {
        $(
            impl IntoOutput for $ty {
                const ARITY: ResultArity = ResultArity::One;

                fn into_output(self) -> Result<Output> {
                    Ok(Output::Single(self.into_value()))
                }
            }
        )*
    };
}

impl_into_output_single!(
    bool,
    i8,
    i16,
    i32,
    i64,
    isize,
    u8,
    u16,
    u32,
    f32,
    f64,
    char,
    String,
    &'static str,
    Value,
    serde_json::Value
);

impl<T: IntoValue> IntoOutput for Option<T> {
    const ARITY: ResultArity = ResultArity::One;

    fn into_output(self) -> Result<Output> {
        Ok(Output::Single(self.into_value()))
    }
}

impl<T: IntoValue> IntoOutput for Vec<T> {
    const ARITY: ResultArity = ResultArity::One;

    fn into_output(self) -> Result<Output> {
        Ok(Output::Single(self.into_value()))
    }
}

impl<T: IntoValue> IntoOutput for BTreeMap<String, T> {
    const ARITY: ResultArity = ResultArity::One;

    fn into_output(self) -> Result<Output> {
        Ok(Output::Single(self.into_value()))
    }
}

impl<T: IntoValue, S> IntoOutput for HashMap<String, T, S> {
    const ARITY: ResultArity = ResultArity::One;

    fn into_output(self) -> Result<Output> {
        Ok(Output::Single(self.into_value()))
    }
}

/// `Err` becomes an invocation failure carrying the error's text.
impl<T: IntoOutput, E: Display> IntoOutput for std::result::Result<T, E> {
    const ARITY: ResultArity = T::ARITY;

    fn into_output(self) -> Result<Output> {
        match self {
            Ok(value) => value.into_output(),
            Err(e) => Err(RpcError::Invocation(e.to_string())),
        }
    }
}

macro_rules! impl_into_output_tuple {
    ($n:expr; $($ty:ident $var:ident),+) => {
        impl<$($ty: IntoValue),+> IntoOutput for ($($ty,)+) {
            const ARITY: ResultArity = ResultArity::Many($n);

            fn into_output(self) -> Result<Output> {
                let ($($var,)+) = self;
                Ok(Output::Multiple(vec![$($var.into_value()),+]))
            }
        }
    };
}

impl_into_output_tuple!(2; A a, B b);
impl_into_output_tuple!(3; A a, B b, C c);
impl_into_output_tuple!(4; A a, B b, C c, D d);

/// Return any `Serialize` type as a structured result.
///
/// # Example
///
/// ```
/// use serde::Serialize;
/// use wirecall::procedure::{ProcedureRegistry, Structured};
///
/// #[derive(Serialize)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// let mut registry = ProcedureRegistry::new();
/// registry.register("user", |id: i64| Structured(User { id, name: "ada".into() }));
///
/// let payload = registry.call("user", &["7"]).unwrap();
/// assert_eq!(&payload[..], br#"{"id":7,"name":"ada"}"#);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Structured<T>(pub T);

impl<T: Serialize> IntoOutput for Structured<T> {
    const ARITY: ResultArity = ResultArity::One;

    fn into_output(self) -> Result<Output> {
        let json =
            serde_json::to_value(&self.0).map_err(|e| RpcError::Serialization(e.to_string()))?;
        Ok(Output::Single(Value::from(json)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_markers() {
        assert_eq!(<() as IntoOutput>::ARITY, ResultArity::Zero);
        assert_eq!(<i64 as IntoOutput>::ARITY, ResultArity::One);
        assert_eq!(<Vec<String> as IntoOutput>::ARITY, ResultArity::One);
        assert_eq!(<(i64, String) as IntoOutput>::ARITY, ResultArity::Many(2));
        assert_eq!(
            <std::result::Result<(i64, i64, i64), String> as IntoOutput>::ARITY,
            ResultArity::Many(3)
        );
    }

    #[test]
    fn test_tuple_output() {
        let output = (1i64, "two".to_string()).into_output().unwrap();
        assert_eq!(
            output,
            Output::Multiple(vec![Value::Integer(1), Value::Text("two".into())])
        );
    }

    #[test]
    fn test_error_becomes_invocation_failure() {
        let result: std::result::Result<i64, String> = Err("division by zero".to_string());
        let err = result.into_output().unwrap_err();
        assert!(matches!(err, RpcError::Invocation(msg) if msg == "division by zero"));
    }

    #[test]
    fn test_structured_non_string_keys_fail() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");

        let err = Structured(map).into_output().unwrap_err();
        assert!(matches!(err, RpcError::Serialization(_)));
    }
}
