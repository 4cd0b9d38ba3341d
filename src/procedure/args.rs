//! Parameter types a procedure may declare.
//!
//! Each type carries its [`ParameterKind`] tag at compile time, which is how
//! a descriptor is derived without evaluating the callable.

use super::descriptor::ParameterKind;
use crate::codec::Arg;
use crate::error::{RpcError, Result};

/// A Rust type usable as a procedure parameter.
pub trait FromArg: Sized + Send + 'static {
    /// Kind the coercion engine must produce for this parameter.
    const KIND: ParameterKind;

    /// Take the coerced argument at `position`.
    fn from_arg(position: usize, arg: Arg) -> Result<Self>;
}

fn mismatch(position: usize, arg: &Arg, expected: &str) -> RpcError {
    RpcError::Argument {
        position,
        token: arg.token(),
        reason: format!("expected {}", expected),
    }
}

macro_rules! impl_from_arg_integer {
    ($($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                const KIND: ParameterKind = ParameterKind::Integer;

                fn from_arg(position: usize, arg: Arg) -> Result<Self> {
                    match arg {
                        Arg::Integer(i) => <$ty>::try_from(i).map_err(|_| RpcError::Argument {
                            position,
                            token: i.to_string(),
                            reason: format!("out of range for {}", stringify!($ty)),
                        }),
                        other => Err(mismatch(position, &other, "integer")),
                    }
                }
            }
        )*
    };
}

impl_from_arg_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromArg for String {
    const KIND: ParameterKind = ParameterKind::Text;

    fn from_arg(position: usize, arg: Arg) -> Result<Self> {
        match arg {
            Arg::Text(s) => Ok(s),
            other => Err(mismatch(position, &other, "text")),
        }
    }
}

impl FromArg for Option<String> {
    const KIND: ParameterKind = ParameterKind::OptionalText;

    fn from_arg(position: usize, arg: Arg) -> Result<Self> {
        match arg {
            Arg::OptionalText(s) => Ok(s),
            other => Err(mismatch(position, &other, "optional text")),
        }
    }
}

// Declarable but never coercible; calls fail with `UnsupportedType` before
// reaching `from_arg`.
macro_rules! impl_from_arg_unsupported {
    ($($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                const KIND: ParameterKind = ParameterKind::Unsupported;

                fn from_arg(position: usize, arg: Arg) -> Result<Self> {
                    Err(mismatch(position, &arg, stringify!($ty)))
                }
            }
        )*
    };
}

impl_from_arg_unsupported!(bool, f32, f64, char, Vec<String>);
