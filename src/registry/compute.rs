// src/registry/compute.rs

//! Adapters turning plain Rust functions into registrable compute handles.
//!
//! A compute function takes zero or more arguments that implement
//! [`FromContainer`] (resolved by type from the injection container) and
//! returns an artifact identifier: an [`ArtifactId`], a `String`, a
//! `&'static str`, or a `Result` of one of those with `anyhow::Error`.
//!
//! The adapter records a [`Signature`] (argument types + return type) at
//! registration time, so the registry can reject producers with a
//! non-identifier return and the validation pass can flag unresolvable
//! argument types without calling anything.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::container::{Container, InjectError};
use crate::types::{ArtifactId, TypeSpec};

/// Why executing one unit of a run failed.
#[derive(Error, Debug)]
pub enum ComputeCallError {
    #[error("could not resolve argument of type `{argument}`: {source}")]
    Argument {
        argument: &'static str,
        #[source]
        source: InjectError,
    },

    #[error("compute function failed: {0}")]
    Failed(#[source] anyhow::Error),

    #[error("compute function returned `{ty}`, expected an artifact identifier")]
    NotAnArtifact { ty: &'static str },

    /// The producer ran, but the follow-up cache request to the engine
    /// failed.
    #[error("cache request for the produced artifact failed: {0}")]
    CacheRequest(#[source] anyhow::Error),
}

/// Declared shape of a compute function.
#[derive(Debug, Clone)]
pub struct Signature {
    pub args: Vec<TypeSpec>,
    pub ret: TypeSpec,
}

impl Signature {
    /// Whether the declared return type is an artifact identifier.
    pub fn returns_artifact(&self) -> bool {
        let id = self.ret.id;
        id == TypeSpec::of::<ArtifactId>().id
            || id == TypeSpec::of::<String>().id
            || id == TypeSpec::of::<&'static str>().id
            || id == TypeSpec::of::<Result<ArtifactId, anyhow::Error>>().id
            || id == TypeSpec::of::<Result<String, anyhow::Error>>().id
    }
}

type ComputeFn = Arc<dyn Fn(&Container) -> Result<ArtifactId, ComputeCallError> + Send + Sync>;

/// A type-erased compute function plus its recorded signature.
#[derive(Clone)]
pub struct ComputeHandle {
    call: ComputeFn,
    signature: Signature,
}

impl ComputeHandle {
    pub fn call(&self, container: &Container) -> Result<ArtifactId, ComputeCallError> {
        (self.call)(container)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for ComputeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeHandle")
            .field("args", &self.signature.args.iter().map(|a| a.name).collect::<Vec<_>>())
            .field("ret", &self.signature.ret.name)
            .finish()
    }
}

/// An argument a compute function can declare, resolved from the container.
pub trait FromContainer: Sized {
    fn type_spec() -> TypeSpec;
    fn from_container(container: &Container) -> Result<Self, InjectError>;
}

impl<T: Send + Sync + 'static> FromContainer for Arc<T> {
    fn type_spec() -> TypeSpec {
        TypeSpec::of::<T>()
    }

    fn from_container(container: &Container) -> Result<Self, InjectError> {
        container.get::<T>()
    }
}

/// Coerce a compute function's return value into an [`ArtifactId`].
fn coerce_output(ret: Box<dyn Any>, ty: &'static str) -> Result<ArtifactId, ComputeCallError> {
    let ret = match ret.downcast::<ArtifactId>() {
        Ok(id) => return Ok(*id),
        Err(other) => other,
    };
    let ret = match ret.downcast::<String>() {
        Ok(s) => return Ok(ArtifactId::from(*s)),
        Err(other) => other,
    };
    let ret = match ret.downcast::<&'static str>() {
        Ok(s) => return Ok(ArtifactId::from(*s)),
        Err(other) => other,
    };
    let ret = match ret.downcast::<Result<ArtifactId, anyhow::Error>>() {
        Ok(r) => return r.map_err(ComputeCallError::Failed),
        Err(other) => other,
    };
    match ret.downcast::<Result<String, anyhow::Error>>() {
        Ok(r) => r.map(ArtifactId::from).map_err(ComputeCallError::Failed),
        Err(_) => Err(ComputeCallError::NotAnArtifact { ty }),
    }
}

/// Conversion of a plain function into a [`ComputeHandle`].
///
/// Implemented for `Fn` items of up to four [`FromContainer`] arguments. The
/// `Args` parameter only disambiguates the implementations; callers never
/// name it.
pub trait IntoCompute<Args>: Send + Sync + 'static {
    fn into_compute(self) -> ComputeHandle;
}

macro_rules! impl_into_compute {
    ($($arg:ident),*) => {
        impl<F, R, $($arg),*> IntoCompute<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Any + 'static,
            $($arg: FromContainer + 'static,)*
        {
            fn into_compute(self) -> ComputeHandle {
                let signature = Signature {
                    args: vec![$($arg::type_spec()),*],
                    ret: TypeSpec::of::<R>(),
                };
                let ret_name = signature.ret.name;
                let call: ComputeFn = Arc::new(move |_container: &Container| {
                    $(
                        #[allow(non_snake_case)]
                        let $arg = $arg::from_container(_container).map_err(|source| {
                            ComputeCallError::Argument {
                                argument: $arg::type_spec().name,
                                source,
                            }
                        })?;
                    )*
                    coerce_output(Box::new((self)($($arg),*)), ret_name)
                });
                ComputeHandle { call, signature }
            }
        }
    };
}

impl_into_compute!();
impl_into_compute!(A1);
impl_into_compute!(A1, A2);
impl_into_compute!(A1, A2, A3);
impl_into_compute!(A1, A2, A3, A4);
