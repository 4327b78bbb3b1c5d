//! Command line argument parsing and validation.
//!
//! Every option can also be set through an `SB_*` environment variable.

use crate::bundler::{
    BuildConfig, DEFAULT_FREEZER, DEFAULT_LABEL_FORMAT, DEFAULT_NAME_FORMAT, DEFAULT_OUTPUT_DIR,
    DEFAULT_SHA_FORMAT, ShaMode,
};
use clap::Parser;
use std::path::PathBuf;

/// Standalone executable builder for packaged Python applications
#[derive(Parser, Debug, Clone)]
#[command(
    name = "standalone_bundler",
    version,
    about = "Standalone executable builder for packaged Python applications",
    long_about = "Freezes a Python package that declares a console script into a single-file executable.

The executable is named by application, version, operating system and machine type,
staged under <staging-dir>/<version>/, hashed with SHA-256, and described by
info, files and environment-export documents in the output directory.

Usage:
  standalone_bundler --src-dir src --clean
  standalone_bundler -p ../myapp -d src --sha file --with-latest
  SB_EXTRA_DATA=static standalone_bundler --script bin/myapp

Exit code 0 = executable staged under the staging directory."
)]
pub struct Args {
    /// Application name [default: package name]
    #[arg(short = 'a', long, env = "SB_APP_NAME", value_name = "NAME")]
    pub app_name: Option<String>,

    /// Importable package name [default: from package metadata]
    #[arg(short = 'n', long, env = "SB_PKG_NAME", value_name = "NAME")]
    pub pkg_name: Option<String>,

    /// Entry-point script to freeze [default: located from the console script name]
    #[arg(short = 's', long, env = "SB_SCRIPT", value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Source directory, relative to the package directory
    #[arg(short = 'd', long, env = "SB_SRC_DIR", value_name = "DIR", default_value = ".")]
    pub src_dir: PathBuf,

    /// Directory containing pyproject.toml
    #[arg(short = 'p', long, env = "SB_PKG_DIR", value_name = "DIR", default_value = ".")]
    pub pkg_dir: PathBuf,

    /// Show freezer output and debug logging
    #[arg(short = 'v', long, env = "SB_VERBOSE")]
    pub verbose: bool,

    /// Suppress progress output (errors are still shown)
    #[arg(short = 'q', long, env = "SB_QUIET", conflicts_with = "verbose")]
    pub quiet: bool,

    /// Extra data directory, relative to the package source (repeatable)
    #[arg(short = 'e', long = "extra-data", env = "SB_EXTRA_DATA", value_name = "PATH", value_delimiter = ',')]
    pub extra_data: Vec<String>,

    /// Work directory; must not exist [default: <output-dir>/build/<random>]
    #[arg(short = 'w', long, env = "SB_WORK_DIR", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Delete the work directory when done
    #[arg(short = 'c', long, env = "SB_CLEAN")]
    pub clean: bool,

    /// Standalone name template
    #[arg(short = 'f', long, env = "SB_NAME_FORMAT", value_name = "TEMPLATE", default_value = DEFAULT_NAME_FORMAT)]
    pub name_format: String,

    /// Hash manifest name template
    #[arg(long, env = "SB_SHA_FORMAT", value_name = "TEMPLATE", default_value = DEFAULT_SHA_FORMAT)]
    pub sha_format: String,

    /// Files-document label template
    #[arg(long, env = "SB_LABEL_FORMAT", value_name = "TEMPLATE", default_value = DEFAULT_LABEL_FORMAT)]
    pub label_format: String,

    /// Do not write the info, files and environment-export documents
    #[arg(long, env = "SB_NO_FILE")]
    pub no_file: bool,

    /// Where to record the SHA-256
    #[arg(long, env = "SB_SHA", value_enum, default_value_t = ShaMode::Info)]
    pub sha: ShaMode,

    /// Also stage a copy named with `latest` as the version
    #[arg(long, env = "SB_WITH_LATEST")]
    pub with_latest: bool,

    /// Staging directory; wiped before staging [default: <output-dir>/dist]
    #[arg(long, env = "SB_STAGING_DIR", value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Custom hook template file
    #[arg(long, env = "SB_HOOK_TEMPLATE", value_name = "PATH")]
    pub hook_template: Option<PathBuf>,

    /// Extra module passed to the freezer as a hidden import (repeatable)
    #[arg(long = "extra-module", env = "SB_EXTRA_MODULE", value_name = "MODULE", value_delimiter = ',')]
    pub extra_modules: Vec<String>,

    /// Freezer executable
    #[arg(long, env = "SB_FREEZER", value_name = "PROGRAM", default_value = DEFAULT_FREEZER)]
    pub freezer: String,

    /// Python version for environment markers [default: detected]
    #[arg(long, env = "SB_PYTHON_VERSION", value_name = "VERSION")]
    pub python_version: Option<String>,

    /// Directory for the info, files and environment-export documents
    #[arg(long, env = "SB_OUTPUT_DIR", value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        for (flag, value) in [
            ("--name-format", &self.name_format),
            ("--sha-format", &self.sha_format),
            ("--label-format", &self.label_format),
            ("--freezer", &self.freezer),
        ] {
            if value.trim().is_empty() {
                return Err(format!("{flag} cannot be empty"));
            }
        }

        if let Some(entry) = self.extra_data.iter().find(|e| e.trim().is_empty()) {
            return Err(format!("Invalid --extra-data entry: {entry:?}"));
        }

        if self.script.as_ref().is_some_and(|s| s.as_os_str().is_empty()) {
            return Err("--script cannot be empty".to_string());
        }

        Ok(())
    }

    /// Build options for the library.
    pub fn build_config(&self) -> BuildConfig {
        BuildConfig {
            app_name: self.app_name.clone(),
            pkg_name: self.pkg_name.clone(),
            script_path: self.script.clone(),
            src_dir: self.src_dir.clone(),
            pkg_dir: self.pkg_dir.clone(),
            verbose: self.verbose,
            extra_data: self.extra_data.clone(),
            work_dir: self.work_dir.clone(),
            clean: self.clean,
            name_format: self.name_format.clone(),
            sha_format: self.sha_format.clone(),
            label_format: self.label_format.clone(),
            no_file: self.no_file,
            sha: self.sha,
            with_latest: self.with_latest,
            staging_dir: self.staging_dir.clone(),
            output_dir: self.output_dir.clone(),
            hook_template: self.hook_template.clone(),
            extra_modules: self.extra_modules.clone(),
            freezer: self.freezer.clone(),
            language_version: self.python_version.clone(),
        }
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(args.verbose, args.quiet);

        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print success message if not in quiet mode
    pub fn success(&self, message: &str) -> std::io::Result<()> {
        self.output.success(message)
    }

    /// Print warning message if not in quiet mode
    pub fn warn(&self, message: &str) -> std::io::Result<()> {
        self.output.warn(message)
    }

    /// Print progress message
    pub fn progress(&self, message: &str) -> std::io::Result<()> {
        self.output.progress(message)
    }

    /// Print section header
    pub fn section(&self, title: &str) -> std::io::Result<()> {
        self.output.section(title)
    }

    /// Print indented text
    pub fn indent(&self, message: &str) -> std::io::Result<()> {
        self.output.indent(message)
    }
}
