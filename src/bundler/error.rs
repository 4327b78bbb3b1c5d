//! Error types for bundler operations.
//!
//! Provides contextual error chaining, filesystem errors that carry the
//! offending path, and the domain errors raised while resolving
//! requirements, validating naming templates and driving the freezer.
//!
//! # Example
//!
//! ```no_run
//! use standalone_bundler::bundler::{ErrorExt, Result};
//! use std::path::Path;
//!
//! fn read_template(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path).fs_context("reading hook template", path)
//! }
//! ```

use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error as DeriveError;

/// Errors returned by the bundler.
#[derive(Debug, DeriveError)]
#[non_exhaustive]
pub enum Error {
    /// Error with context. Created by the [`Context`] trait.
    #[error("{0}: {1}")]
    Context(String, Box<Self>),

    /// File system error with path context.
    ///
    /// Created by the [`ErrorExt`] trait's `fs_context` method.
    #[error("{context} {path}: {error}")]
    Fs {
        /// Context describing the operation (e.g., "writing hook file")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        error: io::Error,
    },

    /// Child process could not be spawned.
    #[error("failed to run command {command}: {error}")]
    CommandFailed {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        error: io::Error,
    },

    /// JSON serialization error.
    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    /// Handlebars template rendering error.
    #[error("{0}")]
    HandleBarsError(#[from] handlebars::RenderError),

    /// Invalid glob pattern during artifact discovery.
    #[error("{0}")]
    GlobPattern(#[from] glob::PatternError),

    /// Glob execution error during artifact discovery.
    #[error("{0}")]
    Glob(#[from] glob::GlobError),

    /// Package metadata could not be parsed.
    #[error("{0}")]
    Toml(#[from] toml::de::Error),

    /// A declared requirement could not be parsed.
    ///
    /// Resolution stops at the first malformed entry; no partial bucket
    /// list is ever handed to the build.
    #[error("malformed requirement `{requirement}`: {reason}")]
    MalformedRequirement {
        /// The requirement string as declared
        requirement: String,
        /// What was wrong with it
        reason: String,
    },

    /// A naming template references an unknown placeholder or is unbalanced.
    #[error("invalid naming template `{template}`: {reason}")]
    NamingTemplate {
        /// The template as configured
        template: String,
        /// What was wrong with it
        reason: String,
    },

    /// The working directory already exists.
    #[error("work directory must not already exist (it may be deleted): {0}")]
    WorkDirExists(PathBuf),

    /// A metadata field the build cannot proceed without is absent.
    #[error("package metadata is missing `{0}`")]
    MissingMetadata(String),

    /// The entry-point script could not be located or copied.
    #[error(
        "application script not found for console script `{console_script}`\n\
         1. Run the bundler inside the application's virtual environment\n\
         2. Use the --script option to point at the script\n\
         3. Install your application using pip\n\
         4. Make sure your application declares a console script entry point"
    )]
    ScriptNotFound {
        /// Console script name the search was based on
        console_script: String,
        /// Script path that was tried, if one was resolved
        searched: Option<PathBuf>,
    },

    /// The freezer ran but produced nothing matching the standalone name.
    #[error("no artifact starting with `{prefix}` found in {dir}")]
    ArtifactNotFound {
        /// Directory that was searched
        dir: PathBuf,
        /// Expected file name prefix
        prefix: String,
    },

    /// More than one produced file matches the standalone name.
    #[error("ambiguous artifact name `{prefix}`: {} files match ({})", .matches.len(), display_paths(.matches))]
    AmbiguousArtifact {
        /// Expected file name prefix
        prefix: String,
        /// Every match found
        matches: Vec<PathBuf>,
    },

    /// The freezer exited with a non-zero status.
    #[error("freezer exited with error code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "<signal>".into()))]
    FreezerFailed {
        /// Exit code, absent when terminated by a signal
        code: Option<i32>,
    },

    /// Generic error with custom message.
    #[error("{0}")]
    GenericError(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Error {
    /// Whether this error is a usage error: a configuration problem the user
    /// must fix before any build can succeed.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::NamingTemplate { .. }
                | Error::WorkDirExists(_)
                | Error::AmbiguousArtifact { .. }
                | Error::MalformedRequirement { .. }
                | Error::MissingMetadata(_)
        )
    }
}

/// Convenient type alias for Result.
pub type Result<T> = std::result::Result<T, Error>;

/// Trait for adding context to errors.
///
/// Similar to `anyhow::Context` but integrated with the bundler's Error type.
/// Works with both `Result<T, E>` and `Option<T>`.
pub trait Context<T> {
    /// Add context to an error.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Add context to an error using a closure (lazy evaluation).
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::Context(context.to_string(), Box::new(e)))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::Context(f().to_string(), Box::new(e)))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Extension trait for filesystem operations with automatic path context.
pub trait ErrorExt<T> {
    /// Add filesystem context to an I/O error.
    ///
    /// The `context` should be a present-tense verb phrase describing the operation,
    /// e.g., "reading file", "creating directory", "copying binary".
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Macro for early return with error.
///
/// Converts the message into a [`Error::GenericError`] and returns immediately.
///
/// ```ignore
/// bail!("operation failed");
/// bail!("invalid value: {}", value);
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err($crate::bundler::Error::GenericError($err.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
