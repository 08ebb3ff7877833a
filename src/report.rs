//! Run reports and verbosity-gated output.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use speculator_core::{QualifiedName, Specialization, Verbosity};
use tracing::{info, warn};

use crate::{CompilationOutcome, SkipReason};

/// Counters and metadata for one speculation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Overloads examined.
    pub methods: usize,
    /// Concrete signatures produced by the expander.
    pub generated: usize,
    pub compiled: usize,
    pub skipped: usize,
    pub warned: usize,
    pub duration: Duration,
    pub dry: bool,
    /// Callables whose overloads were examined.
    pub touched: BTreeSet<QualifiedName>,
}

impl RunReport {
    pub fn new(dry: bool) -> Self {
        Self {
            dry,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &CompilationOutcome) {
        match outcome {
            CompilationOutcome::Compiled => self.compiled += 1,
            CompilationOutcome::Skipped(_) => self.skipped += 1,
            CompilationOutcome::Warned(_) => self.warned += 1,
        }
    }

    /// Signatures that reached the executor.
    pub fn outcomes(&self) -> usize {
        self.compiled + self.skipped + self.warned
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Generated {} methods from {} generic methods in {:.4} seconds",
            self.generated,
            self.methods,
            self.duration.as_secs_f64()
        )?;
        if !self.dry {
            write!(
                f,
                " (compiled {}, skipped {}, warned {})",
                self.compiled, self.skipped, self.warned
            )?;
        }
        Ok(())
    }
}

/// Severity of a report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warn,
}

/// Destination for report lines.
pub trait ReportSink: Send + Sync {
    fn emit(&self, level: Level, line: &str);
}

/// Forwards report lines to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn emit(&self, level: Level, line: &str) {
        match level {
            Level::Info => info!(target: "speculator", "{line}"),
            Level::Warn => warn!(target: "speculator", "{line}"),
        }
    }
}

/// Keeps report lines in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Lines at `level`, without their levels.
    pub fn lines_at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl ReportSink for CaptureSink {
    fn emit(&self, level: Level, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, line.to_string()));
    }
}

/// Writes outcome and summary lines allowed by a [`Verbosity`].
pub struct Reporter<'a> {
    sink: &'a dyn ReportSink,
    verbosity: Verbosity,
}

impl<'a> Reporter<'a> {
    pub fn new(sink: &'a dyn ReportSink, verbosity: Verbosity) -> Self {
        Self { sink, verbosity }
    }

    pub fn outcome(&self, specialization: &Specialization, outcome: &CompilationOutcome) {
        if self.verbosity.contains(Verbosity::DEBUG) {
            let line = match outcome {
                CompilationOutcome::Compiled => format!("Compiled `{specialization}`"),
                CompilationOutcome::Skipped(reason) => skipped_line(specialization, *reason),
                CompilationOutcome::Warned(_) => format!("Warned `{specialization}`"),
            };
            self.sink.emit(Level::Info, &line);
        }
        if let CompilationOutcome::Warned(diagnostic) = outcome
            && self.verbosity.contains(Verbosity::WARN)
        {
            self.sink.emit(
                Level::Warn,
                &format!("Failed to compile `{specialization}`: {diagnostic}"),
            );
        }
    }

    pub fn summary(&self, report: &RunReport) {
        if self.verbosity.contains(Verbosity::REVIEW) {
            self.sink.emit(Level::Info, &report.to_string());
        }
    }
}

fn skipped_line(specialization: &Specialization, reason: SkipReason) -> String {
    format!("Skipped `{specialization}` ({reason})")
}
