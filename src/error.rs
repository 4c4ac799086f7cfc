//! Error types for the cooker-card crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration field is missing or empty.
    #[error("Configuration error: {field} is required")]
    Configuration {
        /// The name of the offending field.
        field: String,
    },

    /// A telemetry entity or its history could not be read.
    #[error("Data unavailable: {entity}")]
    DataUnavailable {
        /// The entity that was queried.
        entity: String,
    },

    /// A translation table failed to load.
    #[error("Failed to load translations for '{language}': {reason}")]
    TranslationLoad {
        /// The language code that was requested.
        language: String,
        /// Description of the failure.
        reason: String,
    },

    /// The chart could not be created.
    #[error("Chart bootstrap failed: {reason}")]
    ChartBootstrap {
        /// Description of why the chart could not be created.
        reason: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// A command was rejected by the command sink.
    #[error("Command {command} failed: {reason}")]
    CommandFailed {
        /// The command that was dispatched.
        command: String,
        /// Description of the failure.
        reason: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error must abort the caller instead of degrading the display.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
