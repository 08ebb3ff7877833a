//! Bounded worker pool for background runs.
//!
//! Background runs execute on the blocking pool of a dedicated tokio runtime.
//! The pool size is the thread budget: `SPECULATOR_THREADS` when set,
//! otherwise the machine's available parallelism.

use std::env;
use std::future::Future;
use std::num::NonZeroUsize;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::thread;

use lazy_static::lazy_static;
use speculator_core::{ConfigurationError, SpeculateError, SpeculateResult};
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::RunReport;

/// Environment variable holding the worker thread budget.
pub const ENV_THREADS: &str = "SPECULATOR_THREADS";

lazy_static! {
    static ref GLOBAL: Mutex<Option<Arc<Scheduler>>> = Mutex::new(None);
}

/// A pool of at most `budget` worker threads.
pub struct Scheduler {
    runtime: Runtime,
    budget: NonZeroUsize,
}

impl Scheduler {
    pub fn new(budget: NonZeroUsize) -> Result<Self, ConfigurationError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(budget.get())
            .thread_name("speculator-worker")
            .build()
            .map_err(|err| ConfigurationError::InvalidThreadBudget(err.to_string()))?;
        debug!(budget = budget.get(), "started scheduler");
        Ok(Self { runtime, budget })
    }

    /// Scheduler sized by `SPECULATOR_THREADS` or the available parallelism.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::new(budget_from(env::var(ENV_THREADS).ok())?)
    }

    /// The process-wide scheduler, created on first use.
    pub fn global() -> Result<Arc<Self>, ConfigurationError> {
        let mut global = GLOBAL.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(scheduler) = global.as_ref() {
            return Ok(Arc::clone(scheduler));
        }
        let scheduler = Arc::new(Self::from_env()?);
        *global = Some(Arc::clone(&scheduler));
        Ok(scheduler)
    }

    pub fn budget(&self) -> NonZeroUsize {
        self.budget
    }

    /// Run `job` on the pool.
    ///
    /// The job keeps running if the returned handle is dropped.
    pub fn submit<F>(&self, job: F) -> RunHandle
    where
        F: FnOnce() -> SpeculateResult<RunReport> + Send + 'static,
    {
        RunHandle {
            inner: self.runtime.spawn_blocking(job),
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

fn budget_from(value: Option<String>) -> Result<NonZeroUsize, ConfigurationError> {
    match value {
        Some(value) => value
            .trim()
            .parse::<NonZeroUsize>()
            .map_err(|_| ConfigurationError::InvalidThreadBudget(value.clone())),
        None => Ok(thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)),
    }
}

/// Completion of a background run.
///
/// Await it, or call [`RunHandle::wait`] from synchronous code.
#[derive(Debug)]
pub struct RunHandle {
    inner: JoinHandle<SpeculateResult<RunReport>>,
}

impl RunHandle {
    /// Block the current thread until the run finishes.
    pub fn wait(self) -> SpeculateResult<RunReport> {
        futures::executor::block_on(self)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}

impl Future for RunHandle {
    type Output = SpeculateResult<RunReport>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(err) => Err(SpeculateError::Worker(err.to_string())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_parsing() {
        assert_eq!(budget_from(Some("3".to_string())).unwrap().get(), 3);
        assert!(budget_from(None).is_ok());
        assert!(matches!(
            budget_from(Some("0".to_string())),
            Err(ConfigurationError::InvalidThreadBudget(_))
        ));
        assert!(budget_from(Some("lots".to_string())).is_err());
    }

    #[test]
    fn runs_jobs_and_returns_reports() {
        let scheduler = Scheduler::new(NonZeroUsize::new(2).unwrap()).unwrap();
        let handle = scheduler.submit(|| {
            Ok(RunReport {
                generated: 7,
                ..RunReport::default()
            })
        });
        assert_eq!(handle.wait().unwrap().generated, 7);
    }

    #[test]
    fn panicking_job_is_a_worker_error() {
        let scheduler = Scheduler::new(NonZeroUsize::new(1).unwrap()).unwrap();
        let handle = scheduler.submit(|| panic!("worker died"));
        assert!(matches!(handle.wait(), Err(SpeculateError::Worker(_))));
    }

    #[test]
    fn global_is_shared() {
        let a = Scheduler::global().unwrap();
        let b = Scheduler::global().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
