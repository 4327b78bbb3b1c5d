//! Error types for the command-line surface.
//!
//! This module defines the errors the binary reports, with actionable recovery suggestions.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for the CLI
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Build errors
    #[error("Build error: {0}")]
    Bundler(#[from] crate::bundler::Error),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// The build ran but did not succeed
    #[error("Build {outcome}: {reason}")]
    BuildFailed {
        /// `aborted` or `failed at <stage>`
        outcome: String,
        /// Reason for the failure
        reason: String,
    },
}

impl BundlerError {
    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        use crate::bundler::Error;

        match self {
            _ if self.is_script_problem() => vec![
                "Run the bundler inside the application's virtual environment".to_string(),
                "Use the --script option to point at the entry-point script".to_string(),
                "Install your application using pip".to_string(),
                "Declare a console script in [project.scripts]".to_string(),
            ],
            BundlerError::Bundler(Error::WorkDirExists(path)) => vec![
                format!("Delete {} or choose another --work-dir", path.display()),
                "Omit --work-dir to get a fresh random work directory".to_string(),
            ],
            BundlerError::Bundler(Error::NamingTemplate { .. }) => vec![
                "Name templates accept {an}, {v}, {os} and {m}".to_string(),
                "Label templates additionally accept {An} and {ft}".to_string(),
                "Write {{ or }} for literal braces".to_string(),
            ],
            BundlerError::Bundler(Error::MissingMetadata(field)) => vec![format!(
                "Declare `{field}` in the [project] table of pyproject.toml or pass it as an option"
            )],
            BundlerError::Bundler(Error::MalformedRequirement { requirement, .. }) => vec![format!(
                "Fix the dependency `{requirement}` in pyproject.toml"
            )],
            BundlerError::Bundler(Error::AmbiguousArtifact { .. }) => vec![
                "Make the --name-format template unique, e.g. include {v}, {os} and {m}".to_string(),
            ],
            BundlerError::Cli(CliError::BuildFailed { .. }) => vec![
                "Re-run with --verbose to see the freezer output".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }

    fn is_script_problem(&self) -> bool {
        match self {
            BundlerError::Bundler(crate::bundler::Error::ScriptNotFound { .. }) => true,
            BundlerError::Cli(CliError::BuildFailed { outcome, .. }) => outcome == "aborted",
            _ => false,
        }
    }

    /// Process exit code for this error: 2 for usage errors, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(CliError::InvalidArguments { .. }) => 2,
            BundlerError::Bundler(e) if e.is_usage_error() => 2,
            _ => 1,
        }
    }
}
