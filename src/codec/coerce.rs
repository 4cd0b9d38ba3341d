//! Argument coercion: raw wire tokens to typed arguments.
//!
//! Coercion runs before invocation and is all-or-nothing: if the token count
//! is wrong or any token fails, no argument reaches the callable.

use bytes::Bytes;

use crate::error::{RpcError, Result};
use crate::procedure::{ParameterKind, ProcedureDescriptor};

/// Token that decodes to an absent optional text.
pub const ABSENT_SENTINEL: &str = "null";

/// A coerced argument, ready to be handed to the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// Parsed whole number.
    Integer(i64),
    /// Text token.
    Text(String),
    /// Optional text; `None` when the token was the sentinel.
    OptionalText(Option<String>),
}

impl Arg {
    /// Wire-level rendering, used in error messages.
    pub fn token(&self) -> String {
        match self {
            Arg::Integer(i) => i.to_string(),
            Arg::Text(s) | Arg::OptionalText(Some(s)) => s.clone(),
            Arg::OptionalText(None) => ABSENT_SENTINEL.to_string(),
        }
    }
}

/// Coerce every token of one request against a descriptor.
///
/// # Errors
///
/// - `Arity` if the token count differs from the parameter count
/// - `Argument` for the first token that does not parse
/// - `UnsupportedType` for the first parameter of unsupported kind
pub fn coerce_arguments(
    procedure: &str,
    descriptor: &ProcedureDescriptor,
    tokens: &[Bytes],
) -> Result<Vec<Arg>> {
    if tokens.len() != descriptor.param_count() {
        return Err(RpcError::Arity {
            procedure: procedure.to_string(),
            expected: descriptor.param_count(),
            received: tokens.len(),
        });
    }

    descriptor
        .params()
        .iter()
        .zip(tokens)
        .enumerate()
        .map(|(position, (kind, token))| coerce_token(procedure, position, *kind, token))
        .collect()
}

/// Coerce a single token to `kind`.
pub fn coerce_token(
    procedure: &str,
    position: usize,
    kind: ParameterKind,
    token: &[u8],
) -> Result<Arg> {
    let as_text = || {
        std::str::from_utf8(token).map_err(|_| RpcError::Argument {
            position,
            token: String::from_utf8_lossy(token).into_owned(),
            reason: "not valid UTF-8".to_string(),
        })
    };

    match kind {
        ParameterKind::Integer => {
            let text = as_text()?;
            text.parse::<i64>()
                .map(Arg::Integer)
                .map_err(|e| RpcError::Argument {
                    position,
                    token: text.to_string(),
                    reason: e.to_string(),
                })
        }
        ParameterKind::Text => Ok(Arg::Text(as_text()?.to_string())),
        ParameterKind::OptionalText => match as_text()? {
            ABSENT_SENTINEL => Ok(Arg::OptionalText(None)),
            text => Ok(Arg::OptionalText(Some(text.to_string()))),
        },
        ParameterKind::Unsupported => Err(RpcError::UnsupportedType {
            position,
            procedure: procedure.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::ResultArity;

    fn descriptor(params: Vec<ParameterKind>) -> ProcedureDescriptor {
        ProcedureDescriptor::new(params, ResultArity::One)
    }

    fn tokens(values: &[&'static str]) -> Vec<Bytes> {
        values.iter().map(|v| Bytes::from_static(v.as_bytes())).collect()
    }

    #[test]
    fn test_integer_coercion() {
        let d = descriptor(vec![ParameterKind::Integer, ParameterKind::Integer]);
        let args = coerce_arguments("add", &d, &tokens(&["-42", "+7"])).unwrap();
        assert_eq!(args, vec![Arg::Integer(-42), Arg::Integer(7)]);
    }

    #[test]
    fn test_integer_failure_names_position_and_token() {
        let d = descriptor(vec![ParameterKind::Text, ParameterKind::Integer]);
        let err = coerce_arguments("f", &d, &tokens(&["ok", "abc"])).unwrap_err();

        match err {
            RpcError::Argument {
                position, token, ..
            } => {
                assert_eq!(position, 1);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_text_passes_through_unchanged() {
        let d = descriptor(vec![ParameterKind::Text]);
        let args = coerce_arguments("echo", &d, &tokens(&[" spaced null "])).unwrap();
        assert_eq!(args, vec![Arg::Text(" spaced null ".to_string())]);

        let args = coerce_arguments("echo", &d, &tokens(&["null"])).unwrap();
        assert_eq!(args, vec![Arg::Text("null".to_string())]);
    }

    #[test]
    fn test_optional_text_sentinel() {
        let d = descriptor(vec![ParameterKind::OptionalText]);

        for _ in 0..3 {
            let absent = coerce_arguments("f", &d, &tokens(&["null"])).unwrap();
            assert_eq!(absent, vec![Arg::OptionalText(None)]);

            let present = coerce_arguments("f", &d, &tokens(&["NULL"])).unwrap();
            assert_eq!(present, vec![Arg::OptionalText(Some("NULL".to_string()))]);
        }

        let empty = coerce_arguments("f", &d, &tokens(&[""])).unwrap();
        assert_eq!(empty, vec![Arg::OptionalText(Some(String::new()))]);
    }

    #[test]
    fn test_arity_checked_before_coercion() {
        let d = descriptor(vec![ParameterKind::Integer]);
        let err = coerce_arguments("f", &d, &tokens(&["not-a-number", "extra"])).unwrap_err();

        assert!(matches!(
            err,
            RpcError::Arity {
                expected: 1,
                received: 2,
                ..
            }
        ));

        let err = coerce_arguments("f", &d, &[]).unwrap_err();
        assert!(matches!(err, RpcError::Arity { received: 0, .. }));
    }

    #[test]
    fn test_unsupported_kind_rejected_on_call() {
        let d = descriptor(vec![ParameterKind::Text, ParameterKind::Unsupported]);
        let err = coerce_arguments("weird", &d, &tokens(&["a", "1.5"])).unwrap_err();

        match err {
            RpcError::UnsupportedType {
                position,
                procedure,
            } => {
                assert_eq!(position, 1);
                assert_eq!(procedure, "weird");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_utf8_token() {
        let d = descriptor(vec![ParameterKind::Text]);
        let err = coerce_arguments("f", &d, &[Bytes::from_static(&[0xff])]).unwrap_err();
        assert!(matches!(err, RpcError::Argument { position: 0, .. }));
    }

    #[test]
    fn test_arg_token_rendering() {
        assert_eq!(Arg::Integer(5).token(), "5");
        assert_eq!(Arg::OptionalText(None).token(), "null");
        assert_eq!(Arg::Text("x".into()).token(), "x");
    }
}
