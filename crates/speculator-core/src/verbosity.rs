//! Reporting flags for a speculation run.
//!
//! [`Verbosity`] is a set over `debug`, `review` and `warn`. The empty set is
//! [`Verbosity::SILENT`]. Set algebra is exposed through named methods so
//! callers never depend on operator overloading.
//!
//! ```
//! use speculator_core::Verbosity;
//!
//! let v = Verbosity::DEBUG.union(Verbosity::REVIEW);
//! assert_eq!(v.to_string(), "debug | review");
//! assert!(Verbosity::DEBUG.is_subset(v));
//! assert!(!Verbosity::DEBUG.is_subset(Verbosity::WARN));
//! ```

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::ConfigurationError;

bitflags! {
    /// Which logging statements a speculation run shows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Verbosity: u8 {
        /// One line per generated signature and its outcome.
        const DEBUG = 1 << 0;
        /// A summary line after the run.
        const REVIEW = 1 << 1;
        /// One line per signature that raised a diagnostic.
        const WARN = 1 << 2;
    }
}

/// Canonical rendering order.
const NAMED: [(Verbosity, &str); 3] = [
    (Verbosity::DEBUG, "debug"),
    (Verbosity::REVIEW, "review"),
    (Verbosity::WARN, "warn"),
];

impl Verbosity {
    /// The empty set: no logging statements.
    pub const SILENT: Verbosity = Verbosity::empty();

    /// Check whether every flag in `self` is also in `other`.
    pub fn is_subset(self, other: Verbosity) -> bool {
        other.contains(self)
    }

    /// Check whether every flag in `other` is also in `self`.
    pub fn is_superset(self, other: Verbosity) -> bool {
        self.contains(other)
    }

    /// Check whether `self` and `other` share no flag.
    pub fn is_disjoint(self, other: Verbosity) -> bool {
        !self.intersects(other)
    }

    /// Check whether this is [`Verbosity::SILENT`].
    pub fn is_silent(self) -> bool {
        self.is_empty()
    }

    /// Names of the constituent flags in canonical order.
    pub fn names(self) -> impl Iterator<Item = &'static str> {
        NAMED
            .into_iter()
            .filter(move |(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
    }
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::WARN
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_silent() {
            return f.write_str("silent");
        }
        let names: Vec<&str> = self.names().collect();
        f.write_str(&names.join(" | "))
    }
}

impl FromStr for Verbosity {
    type Err = ConfigurationError;

    /// Parse `"debug | review"`, `"debug,warn"` or `"silent"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut verbosity = Verbosity::SILENT;
        for part in s.split(['|', ',', '+']) {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let flag = match part.to_ascii_lowercase().as_str() {
                "silent" => Verbosity::SILENT,
                other => NAMED
                    .iter()
                    .find(|(_, name)| *name == other)
                    .map(|(flag, _)| *flag)
                    .ok_or_else(|| ConfigurationError::UnknownVerbosity(part.to_string()))?,
            };
            verbosity = verbosity.union(flag);
        }
        Ok(verbosity)
    }
}
