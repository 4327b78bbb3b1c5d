//! Standalone executable builder for packaged Python applications
//!
//! This library provides the core functionality for:
//! - Classifying declared dependencies by environment marker
//! - Generating freezer hooks and running the freezer
//! - Staging the executable by version with a SHA-256 and manifests
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
