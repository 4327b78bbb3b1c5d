//! Standalone build pipeline.
//!
//! This module provides the [`Generator`] that turns a [`BuildContext`]
//! into a staged, checksummed standalone executable.
//!
//! # Overview
//!
//! The generator:
//! 1. Resolves the package's requirements for this platform
//! 2. Writes a freezer hook listing extra data and dependency metadata
//! 3. Stages the entry-point script and runs the freezer
//! 4. Locates and hashes the produced executable
//! 5. Stages it by version (optionally also as `latest`)
//! 6. Writes the info, files and environment-export documents
//!
//! # Module Organization
//!
//! - [`artifacts`] - Locating the produced file and staging it
//! - [`checksum`] - Streaming SHA-256 of artifacts
//! - [`freezer`] - Freezer command line and invocation
//! - [`hook`] - Hook text generation
//! - [`manifest`] - Info, files and environment-export documents
//! - [`orchestrator`] - The [`Generator`] state machine
//! - [`tool_detection`] - Freezer and interpreter discovery
//!
//! [`BuildContext`]: crate::bundler::BuildContext

pub mod artifacts;
pub mod checksum;
pub mod freezer;
pub mod hook;
pub mod manifest;
pub mod orchestrator;
pub mod tool_detection;

pub use orchestrator::{BuildResult, BuildStatus, Generator, Stage};
