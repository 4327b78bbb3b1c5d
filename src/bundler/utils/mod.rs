//! Shared helpers for the build pipeline.

pub mod fs;
