//! Procedure registry: name to (callable, descriptor).
//!
//! The registry is filled before serving starts and then shared read-only
//! (behind an `Arc`) by every connection, so lookups need no locking.
//!
//! # Example
//!
//! ```
//! use wirecall::procedure::ProcedureRegistry;
//!
//! let mut registry = ProcedureRegistry::new();
//! registry.register("echo", |message: String| message);
//! registry.register("add", |a: String, b: String| -> Result<i64, String> {
//!     let a: i64 = a.parse().map_err(|_| format!("not a number: {}", a))?;
//!     let b: i64 = b.parse().map_err(|_| format!("not a number: {}", b))?;
//!     Ok(a + b)
//! });
//!
//! assert_eq!(&registry.call("echo", &["hi"]).unwrap()[..], b"hi");
//! assert_eq!(&registry.call("add", &["5", "3"]).unwrap()[..], b"8");
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use super::adapter::{Callable, IntoProcedure};
use super::descriptor::ProcedureDescriptor;
use crate::codec::{coerce_arguments, Arg, Output, ResultCodec};
use crate::error::{RpcError, Result};

/// A registered procedure.
#[derive(Debug)]
pub struct ProcedureEntry {
    name: String,
    callable: Callable,
    descriptor: ProcedureDescriptor,
}

impl ProcedureEntry {
    /// Procedure name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor derived at registration.
    #[inline]
    pub fn descriptor(&self) -> &ProcedureDescriptor {
        &self.descriptor
    }

    /// Coerce raw tokens against this procedure's descriptor.
    pub fn coerce(&self, tokens: &[Bytes]) -> Result<Vec<Arg>> {
        coerce_arguments(&self.name, &self.descriptor, tokens)
    }

    /// Invoke the callable on coerced arguments.
    pub fn invoke(&self, args: Vec<Arg>) -> Result<Output> {
        if args.len() != self.descriptor.param_count() {
            return Err(RpcError::Arity {
                procedure: self.name.clone(),
                expected: self.descriptor.param_count(),
                received: args.len(),
            });
        }
        self.callable.invoke(args)
    }

    /// Coerce, invoke and serialize in one step.
    pub fn call(&self, tokens: &[Bytes]) -> Result<Bytes> {
        let args = self.coerce(tokens)?;
        let output = self.invoke(args)?;
        ResultCodec::encode(&output)
    }
}

/// Registry mapping procedure names to entries.
#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    procedures: HashMap<String, Arc<ProcedureEntry>>,
}

impl ProcedureRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure, deriving its descriptor immediately.
    ///
    /// Registering an existing name replaces the previous entry. Parameters of
    /// unsupported types are accepted here and rejected on the first call.
    pub fn register<F, Args>(&mut self, name: &str, procedure: F)
    where
        F: IntoProcedure<Args>,
    {
        let descriptor = F::descriptor();
        if descriptor.has_unsupported() {
            tracing::warn!(
                "Procedure {} declares unsupported parameter types: {}",
                name,
                descriptor
            );
        }

        let entry = ProcedureEntry {
            name: name.to_string(),
            callable: procedure.into_callable(),
            descriptor,
        };

        if self.procedures.insert(name.to_string(), Arc::new(entry)).is_some() {
            tracing::debug!("Replaced procedure {}", name);
        }
    }

    /// Look up a procedure by name.
    ///
    /// Entries are shared; cloning the returned `Arc` does not copy the
    /// name or descriptor.
    #[inline]
    pub fn lookup(&self, name: &str) -> Option<&Arc<ProcedureEntry>> {
        self.procedures.get(name)
    }

    /// Check whether a name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.procedures.contains_key(name)
    }

    /// Number of registered procedures.
    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Entries sorted by name.
    pub fn entries(&self) -> Vec<&ProcedureEntry> {
        let mut entries: Vec<&ProcedureEntry> = self.procedures.values().map(Arc::as_ref).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    /// Call a procedure in-process with textual arguments.
    ///
    /// Runs exactly the path a network request takes, minus the framing.
    pub fn call(&self, name: &str, args: &[&str]) -> Result<Bytes> {
        let entry = self
            .lookup(name)
            .ok_or_else(|| RpcError::ProcedureNotFound(name.to_string()))?;
        let tokens: Vec<Bytes> = args
            .iter()
            .map(|a| Bytes::copy_from_slice(a.as_bytes()))
            .collect();
        entry.call(&tokens)
    }
}
