//! Build pipeline orchestration.
//!
//! This module provides the [`Generator`] that drives one standalone build
//! through a fixed sequence of stages:
//!
//! ```text
//! Init → HookWritten → ScriptStaged → Frozen → ArtifactLocated → Hashed
//!      → Staged → Manifested → (Cleaned) → Done
//! ```
//!
//! A missing entry-point script ends the run in `Aborted`. Every stage
//! commits before the next one starts and a failed stage is never followed
//! by another content stage. Cleanup still runs when requested.

use crate::bail;
use crate::bundler::{
    BuildContext, Result, ShaMode,
    error::{Context, Error, ErrorExt},
    requirements::{Buckets, parse_requirements, resolve},
    settings::random_token,
    utils::fs,
};
use std::fmt;
use std::path::PathBuf;

use super::{
    artifacts::{StagedArtifacts, locate_artifact, stage_artifacts},
    checksum::hash_file,
    freezer::{FreezerCommand, run_freezer},
    hook::{generate_hook, load_template, resolve_extra_data},
    manifest::{BuildOutputs, ManifestPaths, hash_document, write_manifests},
    tool_detection::resolve_freezer,
};

/// Pipeline stage. Stages only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Init,
    HookWritten,
    ScriptStaged,
    Frozen,
    ArtifactLocated,
    Hashed,
    Staged,
    Manifested,
    Cleaned,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::HookWritten => "hook written",
            Stage::ScriptStaged => "script staged",
            Stage::Frozen => "frozen",
            Stage::ArtifactLocated => "artifact located",
            Stage::Hashed => "hashed",
            Stage::Staged => "staged",
            Stage::Manifested => "manifested",
            Stage::Cleaned => "cleaned",
            Stage::Done => "done",
            Stage::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Outcome of [`Generator::generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    /// Every stage completed.
    Success,
    /// The entry-point script could not be found; the freezer never ran.
    Aborted { reason: String },
    /// A stage failed; `stage` is the stage that could not be reached.
    Failed { stage: Stage, message: String },
}

impl BuildStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildStatus::Success)
    }
}

/// Everything the build produced, filled in stage by stage.
#[derive(Debug, Clone, Default)]
pub struct BuildResult {
    pub hook_file: Option<PathBuf>,
    pub staged_script: Option<PathBuf>,
    /// Bare file name of the standalone.
    pub gen_file: Option<String>,
    /// Current location of the standalone: the freezer's dist directory
    /// until staged, the version directory afterwards.
    pub gen_file_w_path: Option<PathBuf>,
    pub file_sha: Option<String>,
    /// Bare file name of the hash manifest, separate hash mode only.
    pub sha_file: Option<String>,
    pub sha_file_w_path: Option<PathBuf>,
    pub staged: Option<StagedArtifacts>,
    pub manifests: Option<ManifestPaths>,
}

/// Drives one standalone build.
///
/// # Examples
///
/// ```no_run
/// use standalone_bundler::bundler::{BuildConfig, ContextBuilder, Generator};
/// use standalone_bundler::metadata::PyProjectMetadata;
///
/// # async fn example() -> standalone_bundler::bundler::Result<()> {
/// let config = BuildConfig::default();
/// let metadata = PyProjectMetadata::load(&config.pkg_dir)?;
/// let context = ContextBuilder::new(config).build(&metadata)?;
///
/// let mut generator = Generator::new(context).await?;
/// let status = generator.generate().await?;
/// if status.is_success() {
///     println!("{:?}", generator.result().gen_file_w_path);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Generator {
    context: BuildContext,
    buckets: Buckets,
    script_token: String,
    stage: Stage,
    result: BuildResult,
}

impl Generator {
    /// Creates a generator and its work directory.
    ///
    /// Requirements are resolved here so a malformed requirement stops the
    /// build before anything is written.
    pub async fn new(context: BuildContext) -> Result<Self> {
        let requirements = parse_requirements(context.install_requires())?;
        let buckets = resolve(
            &requirements,
            &context.platform().marker_platform,
            context.language_version(),
        );
        log::info!("Required packages: {}", buckets.required().join(", "));
        if !buckets.other.is_empty() {
            log::info!("Not needed on this platform: {}", buckets.other.join(", "));
        }

        fs::create_dir_all(&context.hooks_dir(), false).await?;

        Ok(Self {
            context,
            buckets,
            script_token: random_token(),
            stage: Stage::Init,
            result: BuildResult::default(),
        })
    }

    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    pub fn buckets(&self) -> &Buckets {
        &self.buckets
    }

    /// Last committed stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn result(&self) -> &BuildResult {
        &self.result
    }

    /// Runs the pipeline.
    ///
    /// Build failures are reported through [`BuildStatus`]. `Err` is
    /// reserved for usage errors such as an ambiguous artifact name, and for
    /// calling `generate` twice.
    pub async fn generate(&mut self) -> Result<BuildStatus> {
        if self.stage != Stage::Init {
            bail!("generate() already ran (stage: {})", self.stage);
        }

        let outcome = self.run_stages().await;

        let status = match outcome {
            Ok(()) => BuildStatus::Success,
            Err(err @ Error::ScriptNotFound { .. }) => {
                log::error!("{}", err);
                self.stage = Stage::Aborted;
                BuildStatus::Aborted {
                    reason: err.to_string(),
                }
            }
            Err(err) if err.is_usage_error() => {
                log::error!("{}", err);
                self.cleanup().await;
                return Err(err);
            }
            Err(err) => {
                let failed = self.next_stage();
                log::error!("Build failed while reaching stage '{}': {}", failed, err);
                BuildStatus::Failed {
                    stage: failed,
                    message: err.to_string(),
                }
            }
        };

        if self.cleanup().await && status.is_success() {
            self.stage = Stage::Cleaned;
        }
        if status.is_success() {
            self.stage = Stage::Done;
            log::info!("Build complete");
        }
        Ok(status)
    }

    fn next_stage(&self) -> Stage {
        match self.stage {
            Stage::Init => Stage::HookWritten,
            Stage::HookWritten => Stage::ScriptStaged,
            Stage::ScriptStaged => Stage::Frozen,
            Stage::Frozen => Stage::ArtifactLocated,
            Stage::ArtifactLocated => Stage::Hashed,
            Stage::Hashed => Stage::Staged,
            Stage::Staged => Stage::Manifested,
            Stage::Manifested => Stage::Cleaned,
            Stage::Cleaned | Stage::Done => Stage::Done,
            Stage::Aborted => Stage::Aborted,
        }
    }

    async fn run_stages(&mut self) -> Result<()> {
        self.write_hook().await?;
        self.stage = Stage::HookWritten;

        self.stage_script().await?;
        self.stage = Stage::ScriptStaged;

        self.freeze().await?;
        self.stage = Stage::Frozen;

        self.locate()?;
        self.stage = Stage::ArtifactLocated;

        self.hash().await?;
        self.stage = Stage::Hashed;

        self.stage_outputs().await?;
        self.stage = Stage::Staged;

        self.write_manifests().await?;
        self.stage = Stage::Manifested;

        Ok(())
    }

    async fn write_hook(&mut self) -> Result<()> {
        let context = &self.context;
        let template = load_template(context.hook_template()).await?;
        let extra_data = resolve_extra_data(
            context.pkg_dir(),
            context.src_dir(),
            context.pkg_name(),
            context.extra_data(),
        );
        let hook = generate_hook(
            &template,
            context.app_name(),
            context.pkg_name(),
            &self.buckets.required(),
            extra_data.as_deref(),
        )?;

        let hook_file = context
            .hooks_dir()
            .join(format!("hook-{}.py", context.pkg_name()));
        fs::write_file(&hook_file, hook).await?;
        log::info!("Created hook file: {}", hook_file.display());

        self.result.hook_file = Some(hook_file);
        Ok(())
    }

    async fn stage_script(&mut self) -> Result<()> {
        let context = &self.context;
        let not_found = |searched: Option<PathBuf>| Error::ScriptNotFound {
            console_script: context.console_script().to_string(),
            searched,
        };

        let script = context.script_path().ok_or_else(|| not_found(None))?;
        if !script.is_file() {
            return Err(not_found(Some(script.to_path_buf())));
        }

        let staged = context.work_dir().join(format!(
            "{}_{}.py",
            self.script_token,
            context.console_script()
        ));
        fs::copy_file(script, &staged).await?;
        log::info!("Staged script: {}", staged.display());

        self.result.staged_script = Some(staged);
        Ok(())
    }

    async fn freeze(&mut self) -> Result<()> {
        let context = &self.context;
        let script = self
            .result
            .staged_script
            .as_deref()
            .context("script was not staged")?;

        let mut hidden_imports = vec![context.pkg_name().to_string()];
        hidden_imports.extend(self.buckets.required());
        hidden_imports.extend(context.extra_modules().iter().cloned());

        let command = FreezerCommand::for_context(
            context,
            resolve_freezer(context.freezer()),
            script,
            &hidden_imports,
        );
        run_freezer(&command, context.verbose()).await
    }

    fn locate(&mut self) -> Result<()> {
        let artifact = locate_artifact(&self.context.dist_dir(), &self.context.standalone_name())?;
        let gen_file = artifact
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .with_context(|| format!("{artifact:?} has no file name"))?;
        log::info!("Located artifact: {}", artifact.display());

        self.result.gen_file = Some(gen_file);
        self.result.gen_file_w_path = Some(artifact);
        Ok(())
    }

    async fn hash(&mut self) -> Result<()> {
        let artifact = self
            .result
            .gen_file_w_path
            .as_deref()
            .context("artifact was not located")?;

        let file_sha = hash_file(artifact).await?.ok_or_else(|| Error::ArtifactNotFound {
            dir: self.context.dist_dir(),
            prefix: self.context.standalone_name(),
        })?;
        log::info!("SHA256: {}", file_sha);

        self.result.file_sha = Some(file_sha);
        Ok(())
    }

    async fn stage_outputs(&mut self) -> Result<()> {
        let (Some(artifact), Some(gen_file), Some(file_sha)) = (
            self.result.gen_file_w_path.clone(),
            self.result.gen_file.clone(),
            self.result.file_sha.clone(),
        ) else {
            bail!("artifact was not hashed");
        };

        let document = match self.context.sha_mode() {
            ShaMode::File => Some(hash_document(&gen_file, &file_sha)?),
            ShaMode::Info => None,
        };

        let staged = stage_artifacts(&self.context, &artifact, document.as_deref()).await?;

        self.result.gen_file_w_path = Some(staged.standalone.clone());
        if let Some(sha_path) = &staged.sha_file {
            self.result.sha_file = Some(self.context.sha_file_name());
            self.result.sha_file_w_path = Some(sha_path.clone());
        }
        self.result.staged = Some(staged);
        Ok(())
    }

    async fn write_manifests(&mut self) -> Result<()> {
        if !self.context.write_manifest() {
            log::info!("Skipping manifest files");
            return Ok(());
        }

        let outputs = BuildOutputs {
            gen_file: self.result.gen_file.clone().unwrap_or_default(),
            gen_file_w_path: self.result.gen_file_w_path.clone().unwrap_or_default(),
            file_sha: self.result.file_sha.clone(),
            sha_file_w_path: self.result.sha_file_w_path.clone(),
        };
        self.result.manifests = Some(write_manifests(&self.context, &outputs).await?);
        Ok(())
    }

    /// Deletes the work directory when the clean flag is set.
    ///
    /// Failures are logged, never returned. Returns whether the directory was removed.
    async fn cleanup(&self) -> bool {
        if !self.context.clean() {
            return false;
        }
        let work_dir = self.context.work_dir();
        log::info!("Deleting working dir: {}", work_dir.display());
        match tokio::fs::remove_dir_all(work_dir)
            .await
            .fs_context("removing work directory", work_dir)
        {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Failed to clean up: {}", e);
                false
            }
        }
    }
}
