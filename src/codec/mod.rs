//! Codec module - converting between wire tokens and Rust values.
//!
//! - [`coerce_arguments`] - raw argument tokens to typed [`Arg`]s
//! - [`ResultCodec`] - procedure [`Output`] to response payload
//! - [`Value`] - the tagged result model both sides agree on
//!
//! # Design
//!
//! Codecs are plain functions and marker structs with static methods rather
//! than trait objects; there is exactly one encoding per direction.
//!
//! # Example
//!
//! ```
//! use wirecall::codec::{IntoValue, Output, ResultCodec};
//!
//! let payload = ResultCodec::encode(&Output::Single(8i64.into_value())).unwrap();
//! assert_eq!(&payload[..], b"8");
//!
//! let payload = ResultCodec::encode(&Output::Single(vec!["a", "b"].into_value())).unwrap();
//! assert_eq!(&payload[..], br#"["a","b"]"#);
//! ```

mod coerce;
mod serialize;
mod value;

pub use coerce::{coerce_arguments, coerce_token, Arg, ABSENT_SENTINEL};
pub use serialize::ResultCodec;
pub use value::{IntoValue, Output, Value};
