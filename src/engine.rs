//! The speculation engine.
//!
//! A run has four stages:
//!
//! 1. **Collect**: find the callables reachable from the target
//! 2. **Expand**: turn each overload into at most `limit` concrete signatures,
//!    searching only the subtypes the predicate accepts
//! 3. **Execute**: compile each signature, skipping known ones
//! 4. **Report**: emit outcome and summary lines per the verbosity
//!
//! Collection and the candidate sets of every overload are settled before
//! anything is compiled, so a failing predicate leaves the runtime and the
//! directive file untouched.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;

use speculator_core::{Runtime, SpeculateResult, Specialization, Target};
use tracing::debug;

use crate::{
    CandidateCollector, DirectiveStore, Executor, Options, Predicate, ReportSink, Reporter,
    RunHandle, RunReport, Scheduler, SignatureExpander, TracingSink,
};

/// Outcome of [`Speculator::speculate`].
#[derive(Debug)]
pub enum Speculation {
    /// The run completed on the calling thread.
    Finished(RunReport),
    /// The run was submitted to the scheduler.
    Pending(RunHandle),
}

impl Speculation {
    /// The report, blocking on a background run if needed.
    pub fn wait(self) -> SpeculateResult<RunReport> {
        match self {
            Speculation::Finished(report) => Ok(report),
            Speculation::Pending(handle) => handle.wait(),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Speculation::Pending(_))
    }
}

/// Drives speculation runs against a runtime.
///
/// ```
/// use std::sync::Arc;
/// use speculator::{Options, Speculator};
/// use speculator_core::Target;
/// use speculator_registry::{FunctionEntry, SymbolRegistry, TypeEntry};
///
/// let mut registry = SymbolRegistry::new();
/// registry.register_type(TypeEntry::concrete("Int")).unwrap();
/// registry
///     .register_function(FunctionEntry::new("Main::g").overload(["Int"]))
///     .unwrap();
///
/// let speculator = Speculator::new(Arc::new(registry));
/// let report = speculator
///     .speculate(Target::namespace("Main"), &Options::default())
///     .unwrap()
///     .wait()
///     .unwrap();
/// assert_eq!(report.compiled, 1);
/// ```
pub struct Speculator<R: Runtime + ?Sized> {
    runtime: Arc<R>,
    sink: Arc<dyn ReportSink>,
    scheduler: Option<Arc<Scheduler>>,
}

impl<R: Runtime + ?Sized> Clone for Speculator<R> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            sink: Arc::clone(&self.sink),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<R: Runtime + ?Sized + 'static> Speculator<R> {
    /// Engine reporting through `tracing` and running background work on the
    /// global scheduler.
    pub fn new(runtime: Arc<R>) -> Self {
        Self {
            runtime,
            sink: Arc::new(TracingSink),
            scheduler: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn runtime(&self) -> &Arc<R> {
        &self.runtime
    }

    /// Speculate on every callable reachable from `target`.
    pub fn speculate(&self, target: Target, options: &Options) -> SpeculateResult<Speculation> {
        self.speculate_with(Predicate::accept_all(), target, options)
    }

    /// Speculate on the callables reachable from `target` that `predicate` accepts.
    ///
    /// Invalid options are reported here, before any work is scheduled.
    pub fn speculate_with(
        &self,
        predicate: Predicate,
        target: Target,
        options: &Options,
    ) -> SpeculateResult<Speculation> {
        let limit = options.validate()?;
        let store = if options.persists() {
            Some(DirectiveStore::open(&options.path)?)
        } else {
            None
        };
        debug!(
            root = ?target,
            limit = limit.get(),
            dry = options.dry,
            background = options.background,
            verbosity = %options.verbosity,
            "starting speculation"
        );

        if !options.background {
            let report = self.execute(&predicate, &target, options, limit, store.as_ref())?;
            return Ok(Speculation::Finished(report));
        }

        let scheduler = match &self.scheduler {
            Some(scheduler) => Arc::clone(scheduler),
            None => Scheduler::global()?,
        };
        // A tokio runtime cannot be dropped from its own threads.
        let this = Self {
            scheduler: None,
            ..self.clone()
        };
        let options = options.clone();
        let handle = scheduler.submit(move || {
            let result = this.execute(&predicate, &target, &options, limit, store.as_ref());
            if let Err(err) = &result {
                debug!(root = ?target, error = %err, "background speculation failed");
            }
            result
        });
        Ok(Speculation::Pending(handle))
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn execute(
        &self,
        predicate: &Predicate,
        target: &Target,
        options: &Options,
        limit: NonZeroUsize,
        store: Option<&DirectiveStore>,
    ) -> SpeculateResult<RunReport> {
        let started = Instant::now();
        let runtime = self.runtime.as_ref();
        let reporter = Reporter::new(self.sink.as_ref(), options.verbosity);

        let candidates = CandidateCollector::new(runtime, predicate).collect(target)?;
        let expander = SignatureExpander::new(runtime, limit).with_predicate(predicate.clone());
        let mut report = RunReport::new(options.dry);

        // Every candidate set is settled before the first compile.
        let mut expansions = Vec::new();
        for callable in candidates {
            for overload in &runtime.overloads(&callable) {
                expansions.push((callable.clone(), expander.expand(overload)?));
            }
            report.touched.insert(callable);
        }
        report.methods = expansions.len();

        let mut executor = Executor::new(runtime, store, options.dry);
        for (callable, expansion) in expansions {
            for signature in expansion {
                report.generated += 1;
                let specialization = Specialization::new(callable.clone(), signature);
                let outcome = executor.execute(&specialization)?;
                reporter.outcome(&specialization, &outcome);
                report.record(&outcome);
            }
        }

        report.duration = started.elapsed();
        reporter.summary(&report);
        debug!(
            methods = report.methods,
            generated = report.generated,
            compiled = report.compiled,
            skipped = report.skipped,
            warned = report.warned,
            "finished speculation"
        );
        Ok(report)
    }
}
