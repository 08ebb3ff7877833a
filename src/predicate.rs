//! Binding filters applied while searching a namespace.

use std::fmt;
use std::sync::Arc;

use speculator_core::{Namespaces, PredicateError, QualifiedName};

type PredicateFn = dyn Fn(&QualifiedName, &str) -> Result<bool, PredicateError> + Send + Sync;

/// Decides whether `namespace::name` is searched.
///
/// Returning `Ok(false)` skips the binding. Returning an error aborts the
/// whole run.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    /// Search every binding.
    pub fn accept_all() -> Self {
        Self::new(|_, _| true)
    }

    /// Wrap an infallible filter.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&QualifiedName, &str) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(
            move |namespace: &QualifiedName, name: &str| -> Result<bool, PredicateError> {
                Ok(f(namespace, name))
            },
        ))
    }

    /// Wrap a filter that may fail.
    pub fn fallible<F>(f: F) -> Self
    where
        F: Fn(&QualifiedName, &str) -> Result<bool, PredicateError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Only search publicly visible bindings.
    pub fn public<N>(namespaces: Arc<N>) -> Self
    where
        N: Namespaces + Send + Sync + ?Sized + 'static,
    {
        Self::new(move |namespace, name| namespaces.is_public(namespace, name))
    }

    /// Skip every binding inside the listed top-level namespaces.
    pub fn excluding<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let excluded: Vec<String> = namespaces.into_iter().map(Into::into).collect();
        Self::new(move |namespace, _| {
            let top = namespace.segments().into_iter().next().unwrap_or_default();
            !excluded.contains(&top)
        })
    }

    pub fn test(&self, namespace: &QualifiedName, name: &str) -> Result<bool, PredicateError> {
        (self.0)(namespace, name)
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::accept_all()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").finish_non_exhaustive()
    }
}
