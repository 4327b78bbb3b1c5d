//! Artifact discovery and staging.
//!
//! Staging layout:
//!
//! ```text
//! <staging_dir>/
//!     <version>/<standalone>         moved from the freezer's dist directory
//!     <version>/<sha file>           separate hash mode only
//!     latest/<standalone as latest>  with_latest only, copies
//!     latest/<sha file as latest>
//! ```
//!
//! The staging directory is wiped first. Two builds must never share one.

use crate::bundler::error::{Error, Result};
use crate::bundler::naming::LATEST;
use crate::bundler::settings::BuildContext;
use crate::bundler::utils::fs;
use std::path::{Path, PathBuf};

const EXE_SUFFIX: &str = ".exe";

/// Finds the single file in `dir` whose name starts with `prefix`.
///
/// # Errors
///
/// - [`Error::ArtifactNotFound`] when nothing matches
/// - [`Error::AmbiguousArtifact`] when more than one file matches
pub fn locate_artifact(dir: &Path, prefix: &str) -> Result<PathBuf> {
    // the directory may contain `[`, `*` or `?` as well
    let dir_pattern = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&dir_pattern).join(format!("{}*", glob::Pattern::escape(prefix)));
    let pattern = pattern.to_string_lossy();
    log::debug!("Searching for artifact: {}", pattern);

    let mut matches = Vec::new();
    for entry in glob::glob(&pattern)? {
        matches.push(entry?);
    }
    matches.sort();

    match matches.len() {
        0 => Err(Error::ArtifactNotFound {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(Error::AmbiguousArtifact {
            prefix: prefix.to_string(),
            matches,
        }),
    }
}

/// Final locations of staged files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedArtifacts {
    /// Standalone inside the version directory.
    pub standalone: PathBuf,
    /// Hash manifest inside the version directory.
    pub sha_file: Option<PathBuf>,
    /// Copy of the standalone under `latest`.
    pub latest_standalone: Option<PathBuf>,
    /// Copy of the hash manifest under `latest`.
    pub latest_sha_file: Option<PathBuf>,
}

/// Name of the `latest` alias for an artifact. The `.exe` suffix of the
/// produced file is kept.
pub fn latest_standalone_name(context: &BuildContext, gen_file: &str) -> String {
    let mut name = context
        .name_template()
        .render_latest(&context.name_fields());
    if gen_file.ends_with(EXE_SUFFIX) {
        name.push_str(EXE_SUFFIX);
    }
    name
}

/// Stages the standalone and, if given, the hash manifest contents.
///
/// `hash_document` is written as `<version>/<sha file name>`.
pub async fn stage_artifacts(
    context: &BuildContext,
    artifact: &Path,
    hash_document: Option<&str>,
) -> Result<StagedArtifacts> {
    log::info!("Staging artifacts...");

    let staging_dir = context.staging_dir();
    if staging_dir.exists() {
        log::info!("Removing staging directory: {}", staging_dir.display());
    }
    fs::create_dir_all(staging_dir, true).await?;

    let version_dir = staging_dir.join(context.app_version());
    fs::create_dir_all(&version_dir, false).await?;

    let gen_file = artifact
        .file_name()
        .ok_or_else(|| Error::GenericError(format!("{artifact:?} has no file name")))?
        .to_string_lossy()
        .into_owned();

    let standalone = version_dir.join(&gen_file);
    fs::move_file(artifact, &standalone).await?;
    log::info!("Main artifact: {}", standalone.display());

    let mut staged = StagedArtifacts {
        standalone,
        ..Default::default()
    };

    let latest_dir = staging_dir.join(LATEST);
    if context.with_latest() {
        log::info!("Copying to latest...");
        let latest = latest_dir.join(latest_standalone_name(context, &gen_file));
        fs::copy_file(&staged.standalone, &latest).await?;
        log::info!("Latest artifact: {}", latest.display());
        staged.latest_standalone = Some(latest);
    }

    if let Some(document) = hash_document {
        let sha_file = version_dir.join(context.sha_file_name());
        fs::write_file(&sha_file, document).await?;
        log::info!("SHA artifact: {}", sha_file.display());

        if context.with_latest() {
            let latest_sha = latest_dir.join(
                context
                    .sha_template()
                    .render_latest(&context.name_fields()),
            );
            fs::copy_file(&sha_file, &latest_sha).await?;
            log::info!("Latest SHA artifact: {}", latest_sha.display());
            staged.latest_sha_file = Some(latest_sha);
        }
        staged.sha_file = Some(sha_file);
    }

    Ok(staged)
}
