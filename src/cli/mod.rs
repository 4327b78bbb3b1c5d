//! Command line interface for the standalone builder.
//!
//! This module provides the CLI for standalone builds, with argument
//! parsing, build execution, and user feedback.

mod args;
mod output;

pub use args::{Args, RuntimeConfig};
pub use output::OutputManager;

use crate::bundler::{BuildStatus, ContextBuilder, Generator};
use crate::error::{CliError, Result};
use crate::metadata::PyProjectMetadata;

/// Runs one build for already-parsed arguments.
///
/// Returns the process exit code on success. An aborted or failed build is
/// returned as [`CliError::BuildFailed`].
pub async fn execute(args: Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let runtime = RuntimeConfig::from(&args);
    runtime.section("Standalone build")?;

    let config = args.build_config();
    let metadata = PyProjectMetadata::load(&config.pkg_dir)?;
    let context = ContextBuilder::new(config).build(&metadata)?;

    runtime.progress(&format!(
        "Building {} {} for {}-{}",
        context.app_name(),
        context.app_version(),
        context.platform().os,
        context.platform().machine
    ))?;
    runtime
        .output()
        .verbose(&format!("Work directory: {}", context.work_dir().display()))?;

    let mut generator = Generator::new(context).await?;
    match generator.generate().await? {
        BuildStatus::Success => {
            let result = generator.result();
            runtime.success("Standalone created")?;
            if let Some(path) = &result.gen_file_w_path {
                runtime.indent(&format!("Executable: {}", path.display()))?;
            }
            if let Some(sha) = &result.file_sha {
                runtime.indent(&format!("SHA256: {sha}"))?;
            }
            if let Some(path) = &result.sha_file_w_path {
                runtime.indent(&format!("Hash file: {}", path.display()))?;
            }
            if let Some(latest) = result.staged.as_ref().and_then(|s| s.latest_standalone.as_ref()) {
                runtime.indent(&format!("Latest: {}", latest.display()))?;
            }
            match &result.manifests {
                Some(manifests) => runtime.indent(&format!("Info: {}", manifests.info.display()))?,
                None => runtime.warn("Manifest files were not written")?,
            }
            Ok(0)
        }
        BuildStatus::Aborted { reason } => Err(CliError::BuildFailed {
            outcome: "aborted".to_string(),
            reason,
        }
        .into()),
        BuildStatus::Failed { stage, message } => Err(CliError::BuildFailed {
            outcome: format!("failed at {stage}"),
            reason: message,
        }
        .into()),
    }
}
