//! Speculator registry crate.
//!
//! An in-memory runtime that implements the service traits from
//! `speculator-core`: a petgraph-backed [`NamespaceTree`], a precomputed
//! [`TypeRegistry`] lattice, and [`SymbolRegistry`], which ties both together
//! with callable overloads and a compile cache.

mod namespace_tree;
mod registry;
mod type_registry;

pub use namespace_tree::{NamespaceData, NamespaceEdge, NamespaceTree};
pub use registry::{CompileBehavior, FunctionEntry, SymbolRegistry};
pub use type_registry::{TypeEntry, TypeKind, TypeRegistry};

use thiserror::Error;

/// Errors raised while populating a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("duplicate type: {0}")]
    DuplicateType(String),

    #[error("duplicate binding: {0}")]
    DuplicateBinding(String),

    #[error("unknown callable: {0}")]
    UnknownCallable(String),

    #[error("unknown namespace: {0}")]
    UnknownNamespace(String),

    #[error("unknown binding: {0}")]
    UnknownBinding(String),

    #[error("invalid namespace")]
    InvalidNamespace,
}
