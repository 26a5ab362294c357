//! Platform configuration.
//!
//! Supports TOML config files, environment variable overrides, and defaults.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// What a failed `beforeSave` script does to the pending row write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFailurePolicy {
    /// The write is aborted and the script error is surfaced
    #[default]
    Abort,
    /// The failure is logged and the write proceeds with the unmodified row
    Advisory,
}

impl std::str::FromStr for ScriptFailurePolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(ScriptFailurePolicy::Abort),
            "advisory" => Ok(ScriptFailurePolicy::Advisory),
            other => Err(CoreError::Config(format!(
                "Invalid script failure policy: {}",
                other
            ))),
        }
    }
}

/// Sandbox limits for table scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Wall-clock budget per script run in milliseconds (default: 5000)
    pub timeout_ms: u64,
    /// Maximum loop iterations before the interpreter aborts (default: 10 000 000)
    pub loop_iteration_limit: u64,
    /// Maximum call depth (default: 256)
    pub recursion_limit: usize,
    /// Maximum interpreter stack size (default: 64 KiB values)
    pub stack_size_limit: usize,
    /// Behaviour when a `beforeSave` script fails (default: abort)
    pub before_save_failure: ScriptFailurePolicy,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            loop_iteration_limit: 10_000_000,
            recursion_limit: 256,
            stack_size_limit: 64 * 1024,
            before_save_failure: ScriptFailurePolicy::Abort,
        }
    }
}

/// Outgoing email settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// Sender address for script emails
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from: "no-reply@tablekit.local".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Script sandbox settings
    pub script: ScriptConfig,
    /// Email settings
    pub email: EmailConfig,
}

impl PlatformConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CoreError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| CoreError::Config(format!("Invalid TOML: {}", e)))
    }

    /// Applies environment variable overrides.
    ///
    /// Variables are prefixed with `TABLEKIT_`.
    /// Example: `TABLEKIT_SCRIPT_TIMEOUT_MS=2000` overrides `script.timeout_ms`.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(val) = lookup("TABLEKIT_SCRIPT_TIMEOUT_MS") {
            self.script.timeout_ms = val
                .parse()
                .map_err(|_| CoreError::Config(format!("Invalid timeout_ms: {}", val)))?;
        }
        if let Some(val) = lookup("TABLEKIT_SCRIPT_LOOP_LIMIT") {
            self.script.loop_iteration_limit = val.parse().map_err(|_| {
                CoreError::Config(format!("Invalid loop_iteration_limit: {}", val))
            })?;
        }
        if let Some(val) = lookup("TABLEKIT_BEFORE_SAVE_POLICY") {
            self.script.before_save_failure = val.parse()?;
        }
        if let Some(val) = lookup("TABLEKIT_EMAIL_FROM") {
            self.email.from = val;
        }
        self.validate()
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.script.timeout_ms == 0 {
            return Err(CoreError::Config(
                "script.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.script.recursion_limit == 0 {
            return Err(CoreError::Config(
                "script.recursion_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
