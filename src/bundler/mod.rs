//! Standalone executable builder for packaged Python applications.
//!
//! This module turns a package that declares a console-script entry point
//! into a single-file executable named by version, operating system and
//! machine type, with a SHA-256 and machine-readable manifests.
//!
//! # Configuration
//!
//! Package facts come from `pyproject.toml`:
//!
//! ```toml
//! [project]
//! name = "sampleapp"
//! version = "4.2.6"
//! dependencies = ["click", "pywin32; platform_system == 'Windows'"]
//!
//! [project.scripts]
//! sampleapp = "sampleapp.cli:main"
//! ```
//!
//! # Naming
//!
//! | Template | Default | Placeholders |
//! |----------|---------|--------------|
//! | standalone | `{an}-{v}-standalone-{os}-{m}` | `{an}` `{v}` `{os}` `{m}` |
//! | hash file | `{an}-{v}-sha256-{os}-{m}.json` | `{an}` `{v}` `{os}` `{m}` |
//! | label | `{An} {v} {ft} for {os} [Standalone Build]` | above plus `{An}` `{ft}` |
//!
//! # Integration
//!
//! ```no_run
//! use standalone_bundler::bundler::{BuildConfig, ContextBuilder, Generator};
//! use standalone_bundler::metadata::PyProjectMetadata;
//!
//! # async fn example() -> standalone_bundler::bundler::Result<()> {
//! let config = BuildConfig::default();
//! let metadata = PyProjectMetadata::load(&config.pkg_dir)?;
//! let context = ContextBuilder::new(config).build(&metadata)?;
//!
//! let mut generator = Generator::new(context).await?;
//! let status = generator.generate().await?;
//! println!("{status:?}");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod error;
pub mod naming;
pub mod requirements;
pub mod settings;
pub(crate) mod utils;

// Public re-exports
pub use builder::{BuildResult, BuildStatus, Generator, Stage};
pub use error::{Context, Error, ErrorExt, Result};
pub use naming::{NameFields, NameTemplate, TemplateKind};
pub use requirements::{Buckets, LanguageVersion, Requirement};
pub use settings::{
    BuildConfig, BuildContext, ContextBuilder, DEFAULT_FREEZER, DEFAULT_LABEL_FORMAT,
    DEFAULT_NAME_FORMAT, DEFAULT_OUTPUT_DIR, DEFAULT_SHA_FORMAT, Platform, ShaMode,
};
