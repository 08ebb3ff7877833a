//! SymbolRegistry - an in-memory runtime for the speculation engine.
//!
//! This module provides [`SymbolRegistry`], which owns a namespace tree, a type
//! lattice, the overloads of every registered callable, and a compile cache.
//! It implements all runtime service traits, so the engine can run against it
//! exactly as it would against a live runtime.
//!
//! # Thread Safety
//!
//! Registration takes `&mut self` and happens before speculation starts.
//! Afterwards the registry is shared behind an `Arc`; the only state mutated
//! during a run is the compile cache, which sits behind a `RwLock`.
//!
//! # Example
//!
//! ```
//! use speculator_core::{Compiler, ConcreteSignature, Specialization};
//! use speculator_registry::{FunctionEntry, SymbolRegistry, TypeEntry};
//!
//! let mut registry = SymbolRegistry::new();
//! registry.register_type(TypeEntry::concrete("Int")).unwrap();
//! registry
//!     .register_function(FunctionEntry::new("Main::g").overload(["Int"]))
//!     .unwrap();
//!
//! let g_int = Specialization::new("Main::g".into(), ConcreteSignature::new(vec!["Int".into()]));
//! assert!(!registry.is_specialized(&g_int));
//! registry.compile(&g_int).unwrap();
//! assert!(registry.is_specialized(&g_int));
//! ```

use std::sync::{PoisonError, RwLock};

use rustc_hash::{FxHashMap, FxHashSet};
use speculator_core::{
    Binding, BindingValue, Compilation, CompileError, Compiler, Namespaces, OverloadSignature,
    Param, ParamFlags, QualifiedName, Specialization, TypeHash, TypeLattice,
};

use crate::{NamespaceTree, RegistrationError, TypeEntry, TypeRegistry};

/// A registered callable and its overloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEntry {
    pub name: QualifiedName,
    pub overloads: Vec<OverloadSignature>,
    pub public: bool,
    pub deprecated: bool,
}

impl FunctionEntry {
    pub fn new(name: impl Into<QualifiedName>) -> Self {
        Self {
            name: name.into(),
            overloads: Vec::new(),
            public: false,
            deprecated: false,
        }
    }

    /// Add an overload whose parameters carry no flags.
    pub fn overload<I, N>(self, params: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<QualifiedName>,
    {
        self.overload_with(params.into_iter().map(Param::new).collect())
    }

    /// Add an overload with explicit parameters.
    pub fn overload_with(mut self, params: Vec<Param>) -> Self {
        self.overloads.push(OverloadSignature::new(params));
        self
    }

    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }
}

/// Scripted compiler response for one specialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileBehavior {
    /// Report a recoverable diagnostic.
    Warn(String),
    /// Fail with a compile error.
    Fail(String),
    /// Panic inside the compiler.
    Panic(String),
}

#[derive(Debug, Default)]
struct CompileCache {
    specialized: FxHashSet<TypeHash>,
    attempts: FxHashMap<TypeHash, usize>,
}

/// In-memory runtime: namespaces, types, callables and a compile cache.
#[derive(Default)]
pub struct SymbolRegistry {
    tree: NamespaceTree,
    types: TypeRegistry,
    functions: FxHashMap<QualifiedName, FunctionEntry>,
    behaviors: FxHashMap<TypeHash, CompileBehavior>,
    cache: RwLock<CompileCache>,
}

impl SymbolRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================================================
    // Registration
    // ==========================================================================

    /// Register a namespace (and its parents).
    pub fn register_namespace(&mut self, name: impl Into<QualifiedName>) {
        self.tree.get_or_create_path(&name.into().segments());
    }

    pub fn register_type(&mut self, entry: TypeEntry) -> Result<(), RegistrationError> {
        self.types.register(entry)
    }

    /// Register a callable and bind it in its namespace.
    pub fn register_function(&mut self, entry: FunctionEntry) -> Result<(), RegistrationError> {
        if self.functions.contains_key(&entry.name) {
            return Err(RegistrationError::DuplicateBinding(entry.name.to_string()));
        }
        let node = self.tree.get_or_create_path(entry.name.namespace_path());
        let mut binding = Binding::new(
            entry.name.simple_name(),
            BindingValue::Callable(entry.name.clone()),
        );
        binding.public = entry.public;
        binding.deprecated = entry.deprecated;
        self.tree.add_binding(node, binding)?;
        self.functions.insert(entry.name.clone(), entry);
        Ok(())
    }

    /// Bind an existing callable under another name (a re-export).
    pub fn register_alias(
        &mut self,
        alias: impl Into<QualifiedName>,
        callable: &QualifiedName,
    ) -> Result<(), RegistrationError> {
        if !self.functions.contains_key(callable) {
            return Err(RegistrationError::UnknownCallable(callable.to_string()));
        }
        let alias = alias.into();
        let node = self.tree.get_or_create_path(alias.namespace_path());
        self.tree.add_binding(
            node,
            Binding::new(alias.simple_name(), BindingValue::Callable(callable.clone())),
        )
    }

    /// Register a plain value binding (never a candidate).
    pub fn register_value(&mut self, name: impl Into<QualifiedName>) -> Result<(), RegistrationError> {
        let name = name.into();
        let node = self.tree.get_or_create_path(name.namespace_path());
        self.tree
            .add_binding(node, Binding::new(name.simple_name(), BindingValue::Value))
    }

    /// Bind namespace `target` inside namespace `into` under `alias`.
    pub fn import_namespace(
        &mut self,
        into: impl Into<QualifiedName>,
        alias: &str,
        target: impl Into<QualifiedName>,
    ) -> Result<(), RegistrationError> {
        let target = target.into();
        let target_node = self
            .tree
            .get_path(&target.segments())
            .ok_or_else(|| RegistrationError::UnknownNamespace(target.to_string()))?;
        let from = self.tree.get_or_create_path(&into.into().segments());
        self.tree.add_import(from, alias, target_node)
    }

    /// Mark a binding as removed. It stays listed but is no longer live.
    pub fn remove_binding(&mut self, name: &QualifiedName) -> Result<(), RegistrationError> {
        let binding = self
            .tree
            .get_path(name.namespace_path())
            .and_then(|node| self.tree.binding_mut(node, name.simple_name()))
            .ok_or_else(|| RegistrationError::UnknownBinding(name.to_string()))?;
        binding.defined = false;
        Ok(())
    }

    /// Script the compiler's response for one specialization.
    pub fn on_compile(&mut self, specialization: &Specialization, behavior: CompileBehavior) {
        self.behaviors.insert(specialization.type_hash(), behavior);
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn function(&self, name: &QualifiedName) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    /// Number of compile attempts made for `specialization`.
    pub fn attempts(&self, specialization: &Specialization) -> usize {
        self.read_cache(|cache| {
            cache
                .attempts
                .get(&specialization.type_hash())
                .copied()
                .unwrap_or(0)
        })
    }

    /// Total compile attempts across all specializations.
    pub fn total_attempts(&self) -> usize {
        self.read_cache(|cache| cache.attempts.values().sum())
    }

    /// Record `specialization` as already compiled, e.g. by an earlier session.
    pub fn mark_specialized(&self, specialization: &Specialization) {
        self.write_cache(|cache| {
            cache.specialized.insert(specialization.type_hash());
        });
    }

    fn read_cache<T>(&self, f: impl FnOnce(&CompileCache) -> T) -> T {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        f(&cache)
    }

    fn write_cache<T>(&self, f: impl FnOnce(&mut CompileCache) -> T) -> T {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut cache)
    }
}

impl Namespaces for SymbolRegistry {
    fn roots(&self) -> Vec<QualifiedName> {
        self.tree.top_level()
    }

    fn bindings(&self, namespace: &QualifiedName) -> Vec<Binding> {
        self.tree
            .get_path(&namespace.segments())
            .map(|node| self.tree.bindings(node))
            .unwrap_or_default()
    }

    /// Overloads with `CONCRETE` set on parameters the lattice knows to be concrete.
    fn overloads(&self, callable: &QualifiedName) -> Vec<OverloadSignature> {
        let Some(entry) = self.functions.get(callable) else {
            return Vec::new();
        };
        entry
            .overloads
            .iter()
            .map(|overload| {
                let params = overload
                    .params
                    .iter()
                    .map(|param| {
                        let mut param = param.clone();
                        if self.types.is_concrete(&param.ty) {
                            param.flags.insert(ParamFlags::CONCRETE);
                        }
                        param
                    })
                    .collect();
                OverloadSignature::new(params)
            })
            .collect()
    }

    // Registered types are always visible.
    fn is_public(&self, namespace: &QualifiedName, name: &str) -> bool {
        if self.types.contains(&namespace.child(name)) {
            return true;
        }
        self.tree
            .get_path(&namespace.segments())
            .map(|node| self.tree.bindings(node))
            .unwrap_or_default()
            .iter()
            .any(|binding| binding.name == name && binding.public)
    }
}

impl TypeLattice for SymbolRegistry {
    fn is_concrete(&self, ty: &QualifiedName) -> bool {
        self.types.is_concrete(ty)
    }

    fn immediate_subtypes(&self, ty: &QualifiedName) -> Vec<QualifiedName> {
        self.types.immediate_subtypes(ty)
    }

    fn union_members(&self, ty: &QualifiedName) -> Option<Vec<QualifiedName>> {
        self.types.union_members(ty)
    }
}

impl Compiler for SymbolRegistry {
    fn is_specialized(&self, specialization: &Specialization) -> bool {
        let hash = specialization.type_hash();
        self.read_cache(|cache| cache.specialized.contains(&hash))
    }

    fn compile(&self, specialization: &Specialization) -> Result<Compilation, CompileError> {
        let hash = specialization.type_hash();
        self.write_cache(|cache| *cache.attempts.entry(hash).or_insert(0) += 1);

        match self.behaviors.get(&hash) {
            Some(CompileBehavior::Warn(message)) => {
                return Ok(Compilation::Diagnostic(message.clone()));
            }
            Some(CompileBehavior::Fail(message)) => return Err(CompileError::new(message.clone())),
            Some(CompileBehavior::Panic(message)) => panic!("{message}"),
            None => {}
        }

        if !self.functions.contains_key(&specialization.callable) {
            return Err(CompileError::new(format!(
                "unknown callable '{}'",
                specialization.callable
            )));
        }
        if let Some(ty) = specialization
            .signature
            .types()
            .iter()
            .find(|ty| !self.types.contains(ty))
        {
            return Err(CompileError::new(format!("unknown type '{ty}'")));
        }

        self.write_cache(|cache| cache.specialized.insert(hash));
        Ok(Compilation::Clean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculator_core::ConcreteSignature;

    fn showcase() -> SymbolRegistry {
        let mut registry = SymbolRegistry::new();
        registry.register_type(TypeEntry::concrete("Int")).unwrap();
        registry.register_type(TypeEntry::concrete("String")).unwrap();
        registry
            .register_function(FunctionEntry::new("Main::f").overload(Vec::<&str>::new()))
            .unwrap();
        registry
            .register_function(FunctionEntry::new("Main::g").overload(["Int"]).public())
            .unwrap();
        registry
    }

    fn spec(callable: &str, types: &[&str]) -> Specialization {
        Specialization::new(
            callable.into(),
            ConcreteSignature::new(types.iter().map(|t| QualifiedName::from(*t)).collect()),
        )
    }

    #[test]
    fn bindings_and_visibility() {
        let registry = showcase();
        let main = QualifiedName::global("Main");
        let names: Vec<String> = registry
            .bindings(&main)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["f", "g"]);
        assert!(registry.is_public(&main, "g"));
        assert!(!registry.is_public(&main, "f"));
        assert_eq!(registry.roots(), vec![main]);
        assert!(registry.bindings(&"Nowhere".into()).is_empty());
    }

    #[test]
    fn overloads_flag_concrete_params() {
        let mut registry = showcase();
        registry
            .register_function(FunctionEntry::new("Main::h").overload(["Any"]))
            .unwrap();

        let g = registry.overloads(&"Main::g".into());
        assert!(g[0].params[0].flags.contains(ParamFlags::CONCRETE));
        let h = registry.overloads(&"Main::h".into());
        assert!(!h[0].params[0].flags.contains(ParamFlags::CONCRETE));
    }

    #[test]
    fn compile_marks_specialized_and_counts_attempts() {
        let registry = showcase();
        let g_int = spec("Main::g", &["Int"]);
        assert_eq!(registry.compile(&g_int), Ok(Compilation::Clean));
        assert!(registry.is_specialized(&g_int));
        assert_eq!(registry.attempts(&g_int), 1);
        assert_eq!(registry.total_attempts(), 1);
    }

    #[test]
    fn scripted_behaviors() {
        let mut registry = showcase();
        let warned = spec("Main::g", &["Int"]);
        let failed = spec("Main::f", &[]);
        registry.on_compile(&warned, CompileBehavior::Warn("ambiguous".into()));
        registry.on_compile(&failed, CompileBehavior::Fail("broken".into()));

        assert_eq!(
            registry.compile(&warned),
            Ok(Compilation::Diagnostic("ambiguous".into()))
        );
        assert!(!registry.is_specialized(&warned));
        assert_eq!(registry.compile(&failed), Err(CompileError::new("broken")));
    }

    #[test]
    fn unknown_types_fail_to_compile() {
        let registry = showcase();
        let err = registry.compile(&spec("Main::g", &["Symbol"])).unwrap_err();
        assert_eq!(err.message(), "unknown type 'Symbol'");
    }

    #[test]
    fn removed_and_deprecated_bindings_are_not_live() {
        let mut registry = showcase();
        registry
            .register_function(FunctionEntry::new("Main::old").overload(["Int"]).deprecated())
            .unwrap();
        registry.remove_binding(&"Main::f".into()).unwrap();

        let live: Vec<String> = registry
            .bindings(&"Main".into())
            .into_iter()
            .filter(Binding::is_live)
            .map(|b| b.name)
            .collect();
        assert_eq!(live, vec!["g"]);
    }

    #[test]
    fn aliases_and_imports() {
        let mut registry = showcase();
        registry.register_namespace("Other");
        registry
            .register_alias("Main::Inner::g2", &"Main::g".into())
            .unwrap();
        registry.import_namespace("Main", "O", "Other").unwrap();
        assert!(registry.register_alias("Main::x", &"Main::nope".into()).is_err());
        assert!(registry.import_namespace("Main", "Y", "Missing").is_err());

        let inner = registry.bindings(&"Main::Inner".into());
        assert_eq!(inner[0].value, BindingValue::Callable("Main::g".into()));
    }

    #[test]
    fn registered_types_are_public() {
        let registry = showcase();
        assert!(registry.is_public(&QualifiedName::global(""), "Int"));
        assert!(!registry.is_public(&QualifiedName::global(""), "Symbol"));
        assert!(!registry.is_public(&"Main".into(), "f"));
    }
}
