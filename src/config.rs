//! Configuration for RosterDB
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a RosterDB store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Which store implementation backs the records
    pub backend: Backend,

    /// Flat binary file holding the slots (file backend only)
    pub data_file: PathBuf,

    // -------------------------------------------------------------------------
    // Decorator Configuration
    // -------------------------------------------------------------------------
    /// Wrap the store in a call-timing decorator
    pub timing: bool,

    /// Wrap the store in a call-logging decorator
    pub call_log: bool,
}

/// Store implementation selected at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Records live in a Vec for the lifetime of the store
    Memory,

    /// Records live in fixed-size slots of a single flat file
    File,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::File,
            data_file: PathBuf::from("./roster.db"),
            timing: false,
            call_log: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Select the backend
    pub fn backend(mut self, backend: Backend) -> Self {
        self.config.backend = backend;
        self
    }

    /// Set the data file path (file backend)
    pub fn data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_file = path.into();
        self
    }

    /// Enable or disable call timing
    pub fn timing(mut self, enabled: bool) -> Self {
        self.config.timing = enabled;
        self
    }

    /// Enable or disable call logging
    pub fn call_log(mut self, enabled: bool) -> Self {
        self.config.call_log = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
