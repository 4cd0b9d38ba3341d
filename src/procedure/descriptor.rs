//! Procedure descriptors: the shape of a registered callable.
//!
//! A descriptor is derived from the callable's Rust signature at registration
//! time (see [`FromArg::KIND`](super::FromArg::KIND) and
//! [`IntoOutput::ARITY`](super::IntoOutput::ARITY)) and never changes
//! afterwards.

use std::fmt;

/// What the coercion engine must produce for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// Base-10 signed whole number.
    Integer,
    /// Text, passed through unchanged.
    Text,
    /// Text where the sentinel token means "absent".
    OptionalText,
    /// Any other declared type. Calls against it fail with `UnsupportedType`.
    Unsupported,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Integer => "integer",
            ParameterKind::Text => "text",
            ParameterKind::OptionalText => "optional text",
            ParameterKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// How many values a procedure returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultArity {
    /// Returns `()`.
    Zero,
    /// Returns one value.
    One,
    /// Returns a tuple of this many values.
    Many(usize),
}

impl fmt::Display for ResultArity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultArity::Zero => f.write_str("0"),
            ResultArity::One => f.write_str("1"),
            ResultArity::Many(n) => write!(f, "{}", n),
        }
    }
}

/// Ordered parameter kinds plus result arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcedureDescriptor {
    params: Vec<ParameterKind>,
    arity: ResultArity,
}

impl ProcedureDescriptor {
    /// Create a descriptor.
    pub fn new(params: Vec<ParameterKind>, arity: ResultArity) -> Self {
        Self { params, arity }
    }

    /// Parameter kinds in declaration order.
    #[inline]
    pub fn params(&self) -> &[ParameterKind] {
        &self.params
    }

    /// Number of parameters (= argument frames per request).
    #[inline]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Result arity marker.
    #[inline]
    pub fn arity(&self) -> ResultArity {
        self.arity
    }

    /// Whether any parameter is of an unsupported kind.
    pub fn has_unsupported(&self) -> bool {
        self.params.contains(&ParameterKind::Unsupported)
    }
}

impl fmt::Display for ProcedureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, kind) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", kind)?;
        }
        write!(f, "] -> {}", self.arity)
    }
}
