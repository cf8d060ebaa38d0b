//! Run configuration.
//!
//! A [`RunConfig`] is built once before a run and handed to the
//! [`Scheduler`](crate::scheduler::Scheduler) by reference. It is never
//! mutated while the run is in progress; per leaf timeout overrides live in
//! the [`ExecutionContext`](crate::execution::ExecutionContext) of that leaf.

use std::{env, time::Duration};

use crate::matcher::Matcher;

/// Environment variable holding the leaf filter pattern.
pub const RUN_ENV: &str = "KISPEC_RUN";

/// Environment variable holding the default leaf timeout, e.g. `250ms`.
pub const TIMEOUT_ENV: &str = "KISPEC_TIMEOUT";

/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid filter pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid duration {value:?}, expected something like `10ms`, `2s` or `1m30s`")]
    InvalidDuration { value: String },
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    default_timeout: Duration,
    matcher: Matcher,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_TIMEOUT,
            matcher: Matcher::all(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from [`RUN_ENV`] and [`TIMEOUT_ENV`].
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a key lookup, as [`from_env`](Self::from_env) does
    /// with the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            config = config.with_timeout(parse_duration(&timeout)?);
        }
        if let Some(pattern) = lookup(RUN_ENV) {
            config = config.with_filter(&pattern)?;
        }
        Ok(config)
    }

    pub fn with_timeout(self, default_timeout: Duration) -> Self {
        Self {
            default_timeout,
            ..self
        }
    }

    pub fn with_filter(self, pattern: &str) -> Result<Self, ConfigError> {
        let matcher = Matcher::new(pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(self.with_matcher(matcher))
    }

    pub fn with_matcher(self, matcher: Matcher) -> Self {
        Self { matcher, ..self }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }
}

/// Parse durations like `10ms`, `2s`, `1m30s` or `1h`.
///
/// Supported units are `ns`, `us`, `µs`, `ms`, `s`, `m` and `h`.
/// A bare number is read as milliseconds.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration {
        value: value.to_string(),
    };

    let text = value.trim();
    if text.is_empty() {
        return Err(invalid());
    }
    if let Ok(millis) = text.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let amount: u64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ns" => Duration::from_nanos(amount),
            "us" | "µs" => Duration::from_micros(amount),
            "ms" => Duration::from_millis(amount),
            "s" => Duration::from_secs(amount),
            "m" => Duration::from_secs(amount.checked_mul(60).ok_or_else(invalid)?),
            "h" => Duration::from_secs(amount.checked_mul(3600).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };
        total = total.checked_add(part).ok_or_else(invalid)?;
        rest = &rest[unit_len..];
    }

    Ok(total)
}
