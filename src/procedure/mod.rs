//! Procedure module - registration, descriptors and the uniform adapter.
//!
//! Provides:
//! - [`ProcedureRegistry`] - maps names to registered procedures
//! - [`ProcedureDescriptor`] - parameter kinds and result arity of a procedure
//! - [`FromArg`] / [`IntoOutput`] - the parameter and return types a plain
//!   Rust function may use
//!
//! # Example
//!
//! ```
//! use wirecall::procedure::{ParameterKind, ProcedureRegistry};
//!
//! fn get_by_id(id: i64) -> i64 {
//!     id * 10
//! }
//!
//! let mut registry = ProcedureRegistry::new();
//! registry.register("getByID", get_by_id);
//!
//! let entry = registry.lookup("getByID").unwrap();
//! assert_eq!(entry.descriptor().params(), &[ParameterKind::Integer]);
//! ```

mod adapter;
mod args;
mod descriptor;
mod output;
mod registry;

pub use adapter::{Callable, IntoProcedure};
pub use args::FromArg;
pub use descriptor::{ParameterKind, ProcedureDescriptor, ResultArity};
pub use output::{IntoOutput, Structured};
pub use registry::{ProcedureEntry, ProcedureRegistry};
