//! Engine configuration
//!
//! Loaded from TOML; every field has a default so a partial file works.
//!
//! ```toml
//! latency_ms = 300
//! monitor_interval_ms = 3000
//! event_buffer = 256
//! seed_path = "seed.toml"
//! log_filter = "pir_workflow=debug"
//! ```

use crate::error::WorkflowError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Workflow engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PirConfig {
    /// Simulated latency before each engine mutation
    pub latency_ms: u64,
    /// Monitor board tick interval
    pub monitor_interval_ms: u64,
    /// Capacity of the approval event channel
    pub event_buffer: usize,
    /// Seed file (TOML or JSON); built-in demo data when absent
    pub seed_path: Option<PathBuf>,
    /// `tracing` filter directive used by the binary
    pub log_filter: String,
}

impl PirConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`WorkflowError::Config`] if the file cannot be read or parsed
    pub fn load_from_file(path: &Path) -> Result<Self, WorkflowError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse from TOML text
    ///
    /// # Errors
    /// Returns [`WorkflowError::Config`] on malformed input
    pub fn from_toml(content: &str) -> Result<Self, WorkflowError> {
        toml::from_str(content).map_err(|e| WorkflowError::Config(e.to_string()))
    }

    /// With simulated latency
    #[inline]
    #[must_use]
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// With monitor tick interval
    #[inline]
    #[must_use]
    pub fn with_monitor_interval_ms(mut self, interval_ms: u64) -> Self {
        self.monitor_interval_ms = interval_ms;
        self
    }

    /// With event channel capacity
    #[inline]
    #[must_use]
    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer;
        self
    }

    /// With seed file
    #[inline]
    #[must_use]
    pub fn with_seed_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_path = Some(path.into());
        self
    }

    /// Simulated latency as a duration
    #[inline]
    #[must_use]
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Monitor interval as a duration (never zero)
    #[inline]
    #[must_use]
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms.max(1))
    }
}

impl Default for PirConfig {
    fn default() -> Self {
        Self {
            latency_ms: 300,
            monitor_interval_ms: 3000,
            event_buffer: 256,
            seed_path: None,
            log_filter: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = PirConfig::new();
        assert_eq!(config.latency(), Duration::from_millis(300));
        assert_eq!(config.monitor_interval(), Duration::from_secs(3));
        assert_eq!(config.event_buffer, 256);
        assert!(config.seed_path.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = PirConfig::from_toml("latency_ms = 0\nlog_filter = \"debug\"").unwrap();
        assert_eq!(config.latency_ms, 0);
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.monitor_interval_ms, 3000);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = PirConfig::from_toml("latency_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, WorkflowError::Config(_)));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = PirConfig::new().with_monitor_interval_ms(0);
        assert_eq!(config.monitor_interval(), Duration::from_millis(1));
    }

    #[test]
    fn load_from_missing_file_fails() {
        let err = PirConfig::load_from_file(Path::new("/nonexistent/pir.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/pir.toml"));
    }
}
