//! Process-wide speculation hook.
//!
//! An interactive host calls [`notify`] after each evaluated definition. If a
//! hook is installed, the target is forwarded to the installed
//! [`Speculator`]; otherwise nothing happens. At most one hook is installed
//! at a time and installing replaces the previous one.

use std::sync::{Arc, PoisonError, RwLock};

use lazy_static::lazy_static;
use speculator_core::{ConfigurationError, Runtime, Target};
use tracing::{debug, warn};

use crate::{Options, Predicate, Speculator};

type Handler = Arc<dyn Fn(Target) + Send + Sync>;

lazy_static! {
    static ref HOOK: RwLock<Option<Handler>> = RwLock::new(None);
}

/// Options used by an installed hook unless others are given: background
/// runs with default settings.
pub fn default_options() -> Options {
    Options {
        background: true,
        ..Options::default()
    }
}

/// Predicate used by [`install_default`]: skips everything inside the
/// `Base` and `Core` top-level namespaces.
pub fn default_predicate() -> Predicate {
    Predicate::excluding(["Base", "Core"])
}

/// Install the hook with [`default_predicate`] and [`default_options`].
pub fn install_default<R>(speculator: Speculator<R>) -> Result<(), ConfigurationError>
where
    R: Runtime + ?Sized + 'static,
{
    install(speculator, default_predicate(), default_options())
}

/// Install the hook, replacing any existing one.
pub fn install<R>(
    speculator: Speculator<R>,
    predicate: Predicate,
    options: Options,
) -> Result<(), ConfigurationError>
where
    R: Runtime + ?Sized + 'static,
{
    options.validate()?;
    let handler: Handler = Arc::new(move |target: Target| {
        if let Err(err) = speculator.speculate_with(predicate.clone(), target.clone(), &options) {
            warn!(root = ?target, error = %err, "speculation hook failed");
        }
    });
    let previous = HOOK
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(handler);
    debug!(replaced = previous.is_some(), "installed speculation hook");
    Ok(())
}

/// Remove the hook. Returns whether one was installed.
pub fn uninstall() -> bool {
    let removed = HOOK
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
        .is_some();
    if removed {
        debug!("uninstalled speculation hook");
    }
    removed
}

pub fn is_installed() -> bool {
    HOOK.read().unwrap_or_else(PoisonError::into_inner).is_some()
}

/// Forward `target` to the installed hook. Returns whether one was installed.
pub fn notify(target: Target) -> bool {
    let handler = HOOK.read().unwrap_or_else(PoisonError::into_inner).clone();
    match handler {
        Some(handler) => {
            handler(target);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculator_core::QualifiedName;

    #[test]
    fn default_predicate_skips_base_and_core() {
        let predicate = default_predicate();
        assert_eq!(predicate.test(&"Base".into(), "map"), Ok(false));
        assert_eq!(predicate.test(&"Core::Intrinsics".into(), "add"), Ok(false));
        assert_eq!(predicate.test(&"Main".into(), "f"), Ok(true));
        assert_eq!(predicate.test(&QualifiedName::global(""), "Int"), Ok(true));
    }

    #[test]
    fn default_options_run_in_background() {
        let options = default_options();
        assert!(options.background);
        assert_eq!(options.limit, Options::default().limit);
    }
}
