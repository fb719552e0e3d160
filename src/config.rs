// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Options for parsing and interpretation.
//!
//! All sections and fields are optional when loading from TOML:
//!
//! ```toml
//! [grammar]
//! enable_lenient_recovery = true
//!
//! [interpreter]
//! on_error = "warn"
//! max_step_repeat_commands = 1000000
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grammar: GrammarOptions,
    pub interpreter: InterpreterOptions,
    pub numeric: NumericOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrammarOptions {
    /// Drop unparseable commands instead of failing.
    pub enable_lenient_recovery: bool,
    /// Accept a G code and a D code in one command, like `G01X0Y0D01*`.
    pub allow_combined_g_d_codes: bool,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        GrammarOptions { enable_lenient_recovery: false, allow_combined_g_d_codes: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterOptions {
    pub on_error: OnError,
    /// Also emit the outline of region contours as visible strokes.
    pub draw_region_outlines: bool,
    /// Most commands one step-and-repeat may produce.
    pub max_step_repeat_commands: u64,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            on_error: OnError::default(),
            draw_region_outlines: false,
            max_step_repeat_commands: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericOptions {
    /// Reject coordinates with more digits than the format allows.
    pub coordinate_digit_budget_enforcement: bool,
}

impl Default for NumericOptions {
    fn default() -> Self {
        NumericOptions { coordinate_digit_budget_enforcement: true }
    }
}

/// What the interpreter does with a command that cannot be executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Skip the command silently.
    Ignore,
    /// Log a warning and skip the command.
    Warn,
    /// Abort the pass with the error.
    Raise,
}

impl Default for OnError {
    fn default() -> Self { OnError::Raise }
}

#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] toml::de::Error);

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Shorthand for a default configuration with another error policy.
    pub fn with_policy(on_error: OnError) -> Self {
        let mut config = Config::default();
        config.interpreter.on_error = on_error;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml() {
        let config = Config::from_toml("[interpreter]\non_error = \"warn\"\n").unwrap();
        assert_eq!(config.interpreter.on_error, OnError::Warn);
        assert!(config.grammar.allow_combined_g_d_codes);
        assert!(config.numeric.coordinate_digit_budget_enforcement);
        assert_eq!(config.interpreter.max_step_repeat_commands, 10_000_000);
        let config = Config::from_toml("[interpreter]\nmax_step_repeat_commands = 100\n").unwrap();
        assert_eq!(config.interpreter.max_step_repeat_commands, 100);
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn bad_toml() {
        assert!(Config::from_toml("[interpreter]\non_error = \"panic\"\n").is_err());
        assert!(Config::from_toml("[grammar]\nenable_lenient_recovery = 1\n").is_err());
    }
}
