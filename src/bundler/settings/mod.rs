//! Configuration structures for a standalone build.
//!
//! [`BuildConfig`] carries raw user options. [`ContextBuilder`] merges them
//! with package metadata and host facts into the immutable [`BuildContext`]
//! consumed by the build pipeline.

mod builder;
mod config;
mod core;
mod platform;

pub use builder::{ContextBuilder, find_script};
pub(crate) use builder::random_token;
pub use config::{
    BuildConfig, DEFAULT_FREEZER, DEFAULT_LABEL_FORMAT, DEFAULT_NAME_FORMAT, DEFAULT_OUTPUT_DIR,
    DEFAULT_SHA_FORMAT, ShaMode,
};
pub use core::BuildContext;
pub use platform::Platform;
