//! Speculator core types.
//!
//! Shared vocabulary for the speculation engine and the runtimes it drives:
//!
//! - [`QualifiedName`] and [`TypeHash`]: identity of namespaces, callables and types
//! - [`Verbosity`]: reporting flags
//! - [`OverloadSignature`], [`ConcreteSignature`], [`Specialization`]: what gets compiled
//! - [`Namespaces`], [`TypeLattice`], [`Compiler`], [`Runtime`]: services a runtime provides
//! - [`SpeculateError`] and friends: the error taxonomy

mod error;
mod qualified_name;
mod runtime;
mod signature;
mod type_hash;
mod verbosity;

pub use error::{
    CompileError, ConfigurationError, DirectiveError, PredicateError, SpeculateError,
    SpeculateResult,
};
pub use qualified_name::QualifiedName;
pub use runtime::{
    Binding, BindingValue, Compilation, Compiler, Namespaces, Runtime, Target, TypeLattice,
};
pub use signature::{ConcreteSignature, OverloadSignature, Param, ParamFlags, Specialization};
pub use type_hash::{TypeHash, hash_constants};
pub use verbosity::Verbosity;
