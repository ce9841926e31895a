//! Runtime configuration.
//!
//! Everything arrives via the command line; this module holds the validated
//! form the pipeline consumes. Validation failures are `ConfigError`s so the
//! binary can map them to the conventional usage exit code.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use encoding_rs::Encoding;

use crate::classify::RuleSet;
use crate::render::StripPolicy;

/// Marker for configuration errors (bad regex, count, timeout, encoding).
///
/// Reported to stderr before any streaming starts; `main` downcasts to this
/// to exit with code 2.
#[derive(Debug)]
pub struct ConfigError(String);

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

pub fn config_error(message: impl Into<String>) -> anyhow::Error {
    anyhow::Error::new(ConfigError::new(message))
}

#[derive(Debug, Clone)]
pub struct Config {
    pub rules: RuleSet,
    pub strip: StripPolicy,
    /// Zero disables the partial-line timeout.
    pub partial_line_timeout: Duration,
    /// Status truncation width; zero queries the terminal at each draw.
    pub width: usize,
    pub encoding: &'static Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rules: RuleSet::default(),
            strip: StripPolicy::Auto,
            partial_line_timeout: Duration::from_secs_f64(2.0),
            width: 0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

impl Config {
    /// Sets the partial-line timeout from a seconds value.
    ///
    /// # Errors
    /// Rejects negative and non-finite values.
    pub fn set_partial_line_timeout(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(config_error(format!(
                "invalid --partial-line-timeout {seconds}: must be a non-negative number of seconds"
            )));
        }
        self.partial_line_timeout = Duration::from_secs_f64(seconds);
        Ok(())
    }

    /// Resolves an encoding label (WHATWG names, e.g. `utf-8`, `latin1`).
    ///
    /// # Errors
    /// Rejects labels no encoding is registered under.
    pub fn set_encoding(&mut self, label: &str) -> Result<()> {
        self.encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| config_error(format!("unknown encoding '{label}'")))?;
        Ok(())
    }
}
