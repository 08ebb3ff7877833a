//! Speculator
//!
//! Speculative ahead-of-time compilation for runtimes that specialize
//! generic callables on first call. A run walks a namespace, enumerates
//! concrete signatures for every overload it finds, and asks the runtime to
//! compile them before they are ever called.
//!
//! ## Modules
//!
//! - [`collector`]: namespace traversal and candidate discovery
//! - [`expander`]: bounded expansion of overloads into concrete signatures
//! - [`executor`]: the compile policy and its outcomes
//! - [`directive`]: append-only directive files and replay
//! - [`report`]: run reports, verbosity-gated lines and sinks
//! - [`scheduler`]: worker pool for background runs
//! - [`hook`]: process-wide hook for interactive hosts
//!
//! Runtime services and shared types live in `speculator-core`; an
//! in-memory runtime lives in `speculator-registry`.

pub mod collector;
pub mod directive;
mod engine;
pub mod executor;
pub mod expander;
pub mod hook;
mod options;
mod predicate;
pub mod report;
pub mod scheduler;

pub use collector::CandidateCollector;
pub use directive::{DirectiveStore, ReplaySummary};
pub use engine::{Speculation, Speculator};
pub use executor::{CompilationOutcome, Executor, SkipReason};
pub use expander::{Expansion, SignatureExpander};
pub use options::{
    ENV_BACKGROUND, ENV_DRY, ENV_LIMIT, ENV_PATH, ENV_VERBOSITY, Options,
};
pub use predicate::Predicate;
pub use report::{CaptureSink, Level, ReportSink, Reporter, RunReport, TracingSink};
pub use scheduler::{RunHandle, Scheduler};

pub use speculator_core::{
    CompileError, ConfigurationError, DirectiveError, PredicateError, QualifiedName,
    SpeculateError, SpeculateResult, Target, Verbosity,
};
