//! Result serializer: procedure output to response payload.
//!
//! | Output            | Payload                                        |
//! |-------------------|------------------------------------------------|
//! | `Empty`           | zero bytes                                     |
//! | `Single(scalar)`  | canonical text (`8`, `hi`, `true`, `2.5`)      |
//! | `Single(other)`   | JSON (`{"a":[1,2]}`, `null`)                   |
//! | `Multiple(vs)`    | each value's text form, joined with one space  |

use bytes::Bytes;

use super::value::{Output, Value};
use crate::error::{RpcError, Result};

/// Codec for response payloads.
pub struct ResultCodec;

impl ResultCodec {
    /// Encode a procedure's output into a response payload.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a structured value has no JSON form
    /// (e.g. a non-finite float inside a record).
    pub fn encode(output: &Output) -> Result<Bytes> {
        match output {
            Output::Empty => Ok(Bytes::new()),
            Output::Single(value) => Ok(Bytes::from(Self::text_form(value)?)),
            Output::Multiple(values) => {
                let parts = values
                    .iter()
                    .map(Self::text_form)
                    .collect::<Result<Vec<_>>>()?;
                Ok(Bytes::from(parts.join(" ")))
            }
        }
    }

    /// Canonical text for scalars, structured text for everything else.
    pub fn text_form(value: &Value) -> Result<String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            structured => Self::structured(structured),
        }
    }

    /// Structured-text (JSON) form of any value.
    pub fn structured(value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(|e| RpcError::Serialization(e.to_string()))
    }
}
