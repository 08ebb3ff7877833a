//! Runtime services consumed by the speculation engine.
//!
//! The engine never inspects a runtime directly. Everything it needs is
//! reached through three traits:
//!
//! - [`Namespaces`]: list bindings of a namespace and overloads of a callable
//! - [`TypeLattice`]: concreteness, subtypes and union members of a type
//! - [`Compiler`]: ask whether a specialization exists and trigger one
//!
//! [`Runtime`] is the blanket combination of the three.

use crate::{CompileError, OverloadSignature, QualifiedName, Specialization};

/// What a namespace binding resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingValue {
    /// A namespace, identified by its qualified name.
    Namespace(QualifiedName),
    /// A callable with one or more overloads.
    Callable(QualifiedName),
    /// Any other value. Never a candidate.
    Value,
}

/// A named binding listed by [`Namespaces::bindings`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    pub name: String,
    pub value: BindingValue,
    pub public: bool,
    pub deprecated: bool,
    /// False once the binding has been removed from its namespace.
    pub defined: bool,
}

impl Binding {
    pub fn new(name: impl Into<String>, value: BindingValue) -> Self {
        Self {
            name: name.into(),
            value,
            public: false,
            deprecated: false,
            defined: true,
        }
    }

    /// Bound and not deprecated.
    pub fn is_live(&self) -> bool {
        self.defined && !self.deprecated
    }
}

/// Root of a speculation run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Recursively search a namespace.
    Namespace(QualifiedName),
    /// Search the overloads of one callable.
    Callable(QualifiedName),
    /// Search every top-level namespace the runtime knows about.
    All,
}

impl Target {
    pub fn namespace(name: impl Into<QualifiedName>) -> Self {
        Target::Namespace(name.into())
    }

    pub fn callable(name: impl Into<QualifiedName>) -> Self {
        Target::Callable(name.into())
    }
}

/// Result of a compilation attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compilation {
    /// Compiled without diagnostics.
    Clean,
    /// Compiled (or was rejected) with a recoverable diagnostic.
    Diagnostic(String),
}

/// Namespace and overload introspection.
pub trait Namespaces {
    /// Top-level namespaces, in a stable order.
    fn roots(&self) -> Vec<QualifiedName>;

    /// All bindings of `namespace`, including non-public ones, in a stable order.
    ///
    /// Unknown namespaces have no bindings.
    fn bindings(&self, namespace: &QualifiedName) -> Vec<Binding>;

    /// Declared overloads of `callable`, in declaration order.
    fn overloads(&self, callable: &QualifiedName) -> Vec<OverloadSignature>;

    /// Whether `name` is publicly visible from `namespace`.
    ///
    /// Also asked about the namespace and name of types found while
    /// expanding signatures.
    fn is_public(&self, namespace: &QualifiedName, name: &str) -> bool;
}

/// Subtype enumeration over an open type lattice.
pub trait TypeLattice {
    /// Whether `ty` has exactly one runtime representation.
    fn is_concrete(&self, ty: &QualifiedName) -> bool;

    /// Declared immediate subtypes of `ty`, in a stable order.
    fn immediate_subtypes(&self, ty: &QualifiedName) -> Vec<QualifiedName>;

    /// Members of `ty` if it is a union type.
    fn union_members(&self, ty: &QualifiedName) -> Option<Vec<QualifiedName>>;
}

/// Access to the runtime's specializing compiler.
pub trait Compiler {
    /// Whether compiling `specialization` would be a no-op.
    fn is_specialized(&self, specialization: &Specialization) -> bool;

    /// Compile `specialization` ahead of its first call.
    fn compile(&self, specialization: &Specialization) -> Result<Compilation, CompileError>;
}

/// Everything a speculation run needs from a runtime.
pub trait Runtime: Namespaces + TypeLattice + Compiler + Send + Sync {}

impl<T> Runtime for T where T: Namespaces + TypeLattice + Compiler + Send + Sync {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn liveness() {
        let mut binding = Binding::new("f", BindingValue::Callable("Main::f".into()));
        assert!(binding.is_live());
        binding.deprecated = true;
        assert!(!binding.is_live());
        binding.deprecated = false;
        binding.defined = false;
        assert!(!binding.is_live());
    }
}
