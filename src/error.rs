//! # Error Handling
//!
//! This module defines the centralized error type for `render-stages`. It
//! uses the `thiserror` library to build a single `Error` enum covering every
//! failure a stage can report back to the pipeline.
//!
//! Failures fall into three groups:
//!
//! - Configuration errors: malformed documents, unknown plugin names, bad
//!   glob patterns or renamer regexes. These carry an optional hint.
//! - Template errors: compile-time (syntax) and render-time (evaluation)
//!   failures raised by the template engine, tagged with the source path.
//! - Environment errors: I/O, lock poisoning and (de)serialization.
//!
//! Files a stage decides not to touch (no contents, binary data, no compiled
//! template, a destination that may not be overwritten) are skipped and
//! never surface as errors.

use thiserror::Error;

/// Main error type for render-stages operations
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration document or option value could not be understood.
    ///
    /// This error includes the specific issue and optionally a hint about
    /// how to fix it.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// The template engine failed to compile or evaluate a template.
    ///
    /// Includes the absolute source path when it is known.
    #[error("Template error{}: {message}", file.as_ref().map(|f| format!(" in {}", f)).unwrap_or_default())]
    Template {
        message: String,
        /// Absolute path of the template source, if applicable
        file: Option<String>,
    },

    /// A renamer rejected a filename.
    #[error("Renamer failed for {filename}: {message}")]
    Renamer { filename: String, message: String },

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON value conversion error, wrapped from `serde_json::Error`.
    #[error("Option value error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A mutex guarding per-pipeline state was poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
