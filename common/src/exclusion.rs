//! Target exclusion rules.
//!
//! A target is excluded when it equals one of the configured exclusion targets
//! or when any configured pattern finds a match anywhere in it. Patterns are
//! unanchored unless they anchor themselves.

use std::collections::HashSet;

use regex::Regex;
use thiserror::Error as ThisError;

/// Errors raised while building an [`ExclusionFilter`].
#[derive(Debug, ThisError)]
pub enum ExclusionError {
    #[error("unable to compile exclusion regexp {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Immutable set of exclusion rules for one run.
#[derive(Debug, Default, Clone)]
pub struct ExclusionFilter {
    targets: HashSet<String>,
    patterns: Vec<Regex>,
}

impl ExclusionFilter {
    /// Builds a filter from exact-match targets and uncompiled patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ExclusionError::InvalidPattern`] for the first pattern that fails to compile.
    pub fn new<T, P>(targets: T, patterns: P) -> Result<Self, ExclusionError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let pattern = p.as_ref();
                Regex::new(pattern).map_err(|source| ExclusionError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            targets: targets.into_iter().map(Into::into).collect(),
            patterns,
        })
    }

    /// Returns `true` if `host` must not be touched.
    #[must_use]
    pub fn is_excluded(&self, host: &str) -> bool {
        self.targets.contains(host) || self.patterns.iter().any(|re| re.is_match(host))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.patterns.is_empty()
    }
}

/// Validates a single `--exclude-target` / `--exclude-regexp` argument.
///
/// Arguments must be a single non-empty token without whitespace.
///
/// # Errors
///
/// Returns a message suitable for a CLI parser when the argument contains whitespace or is empty.
pub fn parse_exclusion_arg(arg: &str) -> Result<String, String> {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        return Err(format!("Invalid hostname: {arg:?}"));
    }
    Ok(arg.to_string())
}
