//! Uniform adapter over heterogeneous callables.
//!
//! Every registered function, whatever its signature, is stored as a
//! [`Callable`]: `Fn(Vec<Arg>) -> Result<Output>`. The adapter is generated
//! once per procedure by [`IntoProcedure`], implemented for plain `Fn`s of up
//! to six parameters.

use std::fmt;
use std::sync::Arc;

use super::args::FromArg;
use super::descriptor::ProcedureDescriptor;
use super::output::IntoOutput;
use crate::codec::{Arg, Output};
use crate::error::{RpcError, Result};

type CallFn = dyn Fn(Vec<Arg>) -> Result<Output> + Send + Sync;

/// Type-erased procedure body. Cheap to clone.
#[derive(Clone)]
pub struct Callable(Arc<CallFn>);

impl Callable {
    /// Wrap an adapter closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Vec<Arg>) -> Result<Output> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Run the procedure on already-coerced arguments.
    #[inline]
    pub fn invoke(&self, args: Vec<Arg>) -> Result<Output> {
        (self.0)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// Functions that can be registered as procedures.
///
/// `Args` is the tuple of parameter types; it only exists to keep the
/// per-arity implementations apart and is always inferred.
pub trait IntoProcedure<Args>: Send + Sync + Sized + 'static {
    /// Descriptor derived from the signature alone.
    fn descriptor() -> ProcedureDescriptor;

    /// Build the uniform adapter.
    fn into_callable(self) -> Callable;
}

fn missing_argument() -> RpcError {
    RpcError::Invocation("adapter received too few arguments".to_string())
}

macro_rules! impl_into_procedure {
    ($($ty:ident $var:ident),*) => {
        impl<F, R, $($ty,)*> IntoProcedure<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoOutput,
            $($ty: FromArg,)*
        {
            fn descriptor() -> ProcedureDescriptor {
                ProcedureDescriptor::new(vec![$($ty::KIND),*], R::ARITY)
            }

            #[allow(unused_mut, unused_variables)]
            fn into_callable(self) -> Callable {
                Callable::new(move |args: Vec<Arg>| {
                    let mut args = args.into_iter().enumerate();
                    $(
                        let $var = {
                            let (position, arg) = args.next().ok_or_else(missing_argument)?;
                            $ty::from_arg(position, arg)?
                        };
                    )*
                    (self)($($var),*).into_output()
                })
            }
        }
    };
}

impl_into_procedure!();
impl_into_procedure!(A1 a1);
impl_into_procedure!(A1 a1, A2 a2);
impl_into_procedure!(A1 a1, A2 a2, A3 a3);
impl_into_procedure!(A1 a1, A2 a2, A3 a3, A4 a4);
impl_into_procedure!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_into_procedure!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
