//! Candidate discovery.
//!
//! Walks a namespace depth-first, bindings in name order, and yields every
//! live callable the predicate accepts. Only owned child namespaces are
//! descended into; a namespace bound under another name (an import) is left
//! alone unless the caller asked for [`Target::All`].

use rustc_hash::FxHashSet;
use speculator_core::{
    BindingValue, Namespaces, QualifiedName, SpeculateError, SpeculateResult, Target,
};
use tracing::{debug, trace};

use crate::Predicate;

/// Collects the callables reachable from a [`Target`].
pub struct CandidateCollector<'a, N: Namespaces + ?Sized> {
    namespaces: &'a N,
    predicate: &'a Predicate,
    seen_callables: FxHashSet<QualifiedName>,
    seen_namespaces: FxHashSet<QualifiedName>,
    candidates: Vec<QualifiedName>,
}

impl<'a, N: Namespaces + ?Sized> CandidateCollector<'a, N> {
    pub fn new(namespaces: &'a N, predicate: &'a Predicate) -> Self {
        Self {
            namespaces,
            predicate,
            seen_callables: FxHashSet::default(),
            seen_namespaces: FxHashSet::default(),
            candidates: Vec::new(),
        }
    }

    /// Callables to examine, in traversal order, each at most once.
    ///
    /// The first predicate failure aborts collection.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn collect(mut self, target: &Target) -> SpeculateResult<Vec<QualifiedName>> {
        match target {
            Target::Callable(callable) => self.push(callable),
            Target::Namespace(namespace) => self.visit(namespace)?,
            Target::All => {
                for root in self.namespaces.roots() {
                    self.visit(&root)?;
                }
            }
        }
        debug!(
            root = ?target,
            candidates = self.candidates.len(),
            "collected candidates"
        );
        Ok(self.candidates)
    }

    fn visit(&mut self, namespace: &QualifiedName) -> SpeculateResult<()> {
        if !self.seen_namespaces.insert(namespace.clone()) {
            return Ok(());
        }
        trace!(namespace = %namespace, "visiting namespace");

        for binding in self.namespaces.bindings(namespace) {
            if !binding.is_live() || matches!(binding.value, BindingValue::Value) {
                continue;
            }
            let accepted = self
                .predicate
                .test(namespace, &binding.name)
                .map_err(|source| SpeculateError::Predicate {
                    namespace: namespace.clone(),
                    name: binding.name.clone(),
                    source,
                })?;
            if !accepted {
                continue;
            }
            match &binding.value {
                BindingValue::Callable(callable) => self.push(callable),
                BindingValue::Namespace(child) if *child == namespace.child(binding.name.as_str()) => {
                    self.visit(child)?;
                }
                BindingValue::Namespace(imported) => {
                    trace!(namespace = %namespace, imported = %imported, "not crossing import");
                }
                BindingValue::Value => {}
            }
        }
        Ok(())
    }

    fn push(&mut self, callable: &QualifiedName) {
        if self.seen_callables.insert(callable.clone()) {
            self.candidates.push(callable.clone());
        }
    }
}
