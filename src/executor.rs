//! Compilation attempts.
//!
//! Each specialization goes through a fixed sequence of checks:
//!
//! 0. attempted earlier in this run: skipped
//! 1. recorded in the directive store: skipped
//! 2. already specialized by the runtime: skipped
//! 3. dry run: skipped
//! 4. compiled, with diagnostics, errors and panics becoming warnings
//!
//! Successful compilations are appended to the directive store.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use rustc_hash::FxHashSet;
use speculator_core::{Compilation, Compiler, DirectiveError, Specialization, TypeHash};
use tracing::trace;

use crate::DirectiveStore;

/// Why a specialization was not compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Already attempted in this run.
    Duplicate,
    /// Present in the directive file.
    Recorded,
    /// The runtime has already compiled it.
    Specialized,
    /// Dry run.
    Dry,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::Duplicate => "duplicate",
            SkipReason::Recorded => "recorded",
            SkipReason::Specialized => "already specialized",
            SkipReason::Dry => "dry run",
        })
    }
}

/// Result of processing one specialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompilationOutcome {
    Compiled,
    Skipped(SkipReason),
    /// Compilation produced a diagnostic, failed or panicked.
    Warned(String),
}

/// Runs the compile policy for one speculation run.
pub struct Executor<'a, C: Compiler + ?Sized> {
    compiler: &'a C,
    store: Option<&'a DirectiveStore>,
    dry: bool,
    attempted: FxHashSet<TypeHash>,
}

impl<'a, C: Compiler + ?Sized> Executor<'a, C> {
    pub fn new(compiler: &'a C, store: Option<&'a DirectiveStore>, dry: bool) -> Self {
        Self {
            compiler,
            store,
            dry,
            attempted: FxHashSet::default(),
        }
    }

    /// Process one specialization.
    ///
    /// Only a failure to read or write the directive store is an error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn execute(
        &mut self,
        specialization: &Specialization,
    ) -> Result<CompilationOutcome, DirectiveError> {
        if !self.attempted.insert(specialization.type_hash()) {
            return Ok(CompilationOutcome::Skipped(SkipReason::Duplicate));
        }
        if let Some(store) = self.store
            && store.contains(specialization)?
        {
            return Ok(CompilationOutcome::Skipped(SkipReason::Recorded));
        }
        if self.compiler.is_specialized(specialization) {
            return Ok(CompilationOutcome::Skipped(SkipReason::Specialized));
        }
        if self.dry {
            return Ok(CompilationOutcome::Skipped(SkipReason::Dry));
        }

        let compiled = panic::catch_unwind(AssertUnwindSafe(|| self.compiler.compile(specialization)));
        let outcome = match compiled {
            Ok(Ok(Compilation::Clean)) => CompilationOutcome::Compiled,
            Ok(Ok(Compilation::Diagnostic(message))) => CompilationOutcome::Warned(message),
            Ok(Err(err)) => CompilationOutcome::Warned(err.to_string()),
            Err(payload) => CompilationOutcome::Warned(format!(
                "compiler panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        if outcome == CompilationOutcome::Compiled
            && let Some(store) = self.store
        {
            store.record(specialization)?;
        }
        trace!(specialization = %specialization, ?outcome, "executed");
        Ok(outcome)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
