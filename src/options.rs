//! Run options and environment configuration.

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use speculator_core::{ConfigurationError, Verbosity};

/// Environment variable for [`Options::limit`].
pub const ENV_LIMIT: &str = "SPECULATOR_LIMIT";
/// Environment variable for [`Options::path`].
pub const ENV_PATH: &str = "SPECULATOR_PATH";
/// Environment variable for [`Options::verbosity`].
pub const ENV_VERBOSITY: &str = "SPECULATOR_VERBOSITY";
/// Environment variable for [`Options::dry`].
pub const ENV_DRY: &str = "SPECULATOR_DRY";
/// Environment variable for [`Options::background`].
pub const ENV_BACKGROUND: &str = "SPECULATOR_BACKGROUND";

/// Options for one speculation run.
///
/// ```
/// use speculator::Options;
/// use speculator_core::Verbosity;
///
/// let options = Options {
///     limit: 2,
///     verbosity: Verbosity::DEBUG | Verbosity::REVIEW,
///     ..Options::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Run on the scheduler instead of the calling thread.
    pub background: bool,
    /// Generate and report signatures without compiling them.
    pub dry: bool,
    /// Maximum concrete signatures generated per overload. Must be at least 1.
    pub limit: usize,
    /// Directive file. Empty disables persistence.
    pub path: PathBuf,
    /// Which logging statements to show.
    pub verbosity: Verbosity,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            background: false,
            dry: false,
            limit: 1,
            path: PathBuf::new(),
            verbosity: Verbosity::WARN,
        }
    }
}

impl Options {
    /// Check the options and return the validated limit.
    pub fn validate(&self) -> Result<NonZeroUsize, ConfigurationError> {
        NonZeroUsize::new(self.limit).ok_or(ConfigurationError::InvalidLimit(self.limit))
    }

    /// Whether this run appends to a directive file.
    pub fn persists(&self) -> bool {
        !self.dry && !self.path.as_os_str().is_empty()
    }

    /// Defaults overridden by `SPECULATOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigurationError> {
        let mut options = Self::default();
        if let Some(value) = lookup(ENV_LIMIT) {
            options.limit = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_LIMIT, &value))?;
        }
        if let Some(value) = lookup(ENV_PATH) {
            options.path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_VERBOSITY) {
            options.verbosity = value.parse()?;
        }
        if let Some(value) = lookup(ENV_DRY) {
            options.dry = parse_bool(ENV_DRY, &value)?;
        }
        if let Some(value) = lookup(ENV_BACKGROUND) {
            options.background = parse_bool(ENV_BACKGROUND, &value)?;
        }
        options.validate()?;
        Ok(options)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigurationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn invalid(key: &str, value: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
