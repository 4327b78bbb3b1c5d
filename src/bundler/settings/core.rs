//! The immutable build context.

use super::{Platform, ShaMode};
use crate::bundler::naming::{NameFields, NameTemplate};
use crate::bundler::requirements::LanguageVersion;
use std::path::{Path, PathBuf};

/// Read-only snapshot of everything one build needs.
///
/// Constructed once per invocation via [`ContextBuilder`](super::ContextBuilder),
/// which validates naming templates and guarantees the work directory did
/// not exist at construction time.
#[derive(Clone, Debug)]
pub struct BuildContext {
    app_name: String,
    pkg_name: String,
    app_version: String,
    console_script: String,
    script_path: Option<PathBuf>,
    pkg_dir: PathBuf,
    src_dir: PathBuf,
    platform: Platform,
    language_version: LanguageVersion,
    name_template: NameTemplate,
    sha_template: NameTemplate,
    label_template: NameTemplate,
    work_dir: PathBuf,
    staging_dir: PathBuf,
    output_dir: PathBuf,
    clean: bool,
    write_manifest: bool,
    with_latest: bool,
    verbose: bool,
    sha_mode: ShaMode,
    extra_data: Option<Vec<String>>,
    extra_modules: Vec<String>,
    hook_template: Option<PathBuf>,
    freezer: String,
    install_requires: Vec<String>,
}

/// Fields gathered by the builder. Kept separate so the constructor stays readable.
pub(super) struct ContextParts {
    pub app_name: String,
    pub pkg_name: String,
    pub app_version: String,
    pub console_script: String,
    pub script_path: Option<PathBuf>,
    pub pkg_dir: PathBuf,
    pub src_dir: PathBuf,
    pub platform: Platform,
    pub language_version: LanguageVersion,
    pub name_template: NameTemplate,
    pub sha_template: NameTemplate,
    pub label_template: NameTemplate,
    pub work_dir: PathBuf,
    pub staging_dir: PathBuf,
    pub output_dir: PathBuf,
    pub clean: bool,
    pub write_manifest: bool,
    pub with_latest: bool,
    pub verbose: bool,
    pub sha_mode: ShaMode,
    pub extra_data: Option<Vec<String>>,
    pub extra_modules: Vec<String>,
    pub hook_template: Option<PathBuf>,
    pub freezer: String,
    pub install_requires: Vec<String>,
}

impl BuildContext {
    pub(super) fn new(parts: ContextParts) -> Self {
        Self {
            app_name: parts.app_name,
            pkg_name: parts.pkg_name,
            app_version: parts.app_version,
            console_script: parts.console_script,
            script_path: parts.script_path,
            pkg_dir: parts.pkg_dir,
            src_dir: parts.src_dir,
            platform: parts.platform,
            language_version: parts.language_version,
            name_template: parts.name_template,
            sha_template: parts.sha_template,
            label_template: parts.label_template,
            work_dir: parts.work_dir,
            staging_dir: parts.staging_dir,
            output_dir: parts.output_dir,
            clean: parts.clean,
            write_manifest: parts.write_manifest,
            with_latest: parts.with_latest,
            verbose: parts.verbose,
            sha_mode: parts.sha_mode,
            extra_data: parts.extra_data,
            extra_modules: parts.extra_modules,
            hook_template: parts.hook_template,
            freezer: parts.freezer,
            install_requires: parts.install_requires,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn pkg_name(&self) -> &str {
        &self.pkg_name
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub fn console_script(&self) -> &str {
        &self.console_script
    }

    /// Entry-point script, if one was given or discovered.
    pub fn script_path(&self) -> Option<&Path> {
        self.script_path.as_deref()
    }

    pub fn pkg_dir(&self) -> &Path {
        &self.pkg_dir
    }

    pub fn src_dir(&self) -> &Path {
        &self.src_dir
    }

    /// Source root the freezer searches for imports (`pkg_dir/src_dir`).
    pub fn source_root(&self) -> PathBuf {
        self.pkg_dir.join(&self.src_dir)
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn language_version(&self) -> &LanguageVersion {
        &self.language_version
    }

    pub fn name_template(&self) -> &NameTemplate {
        &self.name_template
    }

    pub fn sha_template(&self) -> &NameTemplate {
        &self.sha_template
    }

    pub fn label_template(&self) -> &NameTemplate {
        &self.label_template
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Directory the hook file is written to.
    pub fn hooks_dir(&self) -> PathBuf {
        self.work_dir.join("hooks")
    }

    /// Freezer intermediate build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.work_dir.join("build")
    }

    /// Directory the freezer writes the standalone to.
    pub fn dist_dir(&self) -> PathBuf {
        self.work_dir.join("dist")
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn clean(&self) -> bool {
        self.clean
    }

    pub fn write_manifest(&self) -> bool {
        self.write_manifest
    }

    pub fn with_latest(&self) -> bool {
        self.with_latest
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn sha_mode(&self) -> ShaMode {
        self.sha_mode
    }

    pub fn extra_data(&self) -> Option<&[String]> {
        self.extra_data.as_deref()
    }

    pub fn extra_modules(&self) -> &[String] {
        &self.extra_modules
    }

    pub fn hook_template(&self) -> Option<&Path> {
        self.hook_template.as_deref()
    }

    pub fn freezer(&self) -> &str {
        &self.freezer
    }

    /// Declared requirement strings, in declaration order.
    pub fn install_requires(&self) -> &[String] {
        &self.install_requires
    }

    /// Naming fields for this build.
    pub fn name_fields(&self) -> NameFields {
        NameFields::new(
            &self.app_name,
            &self.app_version,
            &self.platform.os,
            &self.platform.machine,
        )
    }

    /// Name the freezer is asked to give the standalone.
    pub fn standalone_name(&self) -> String {
        self.name_template.render(&self.name_fields())
    }

    /// File name of the separate hash manifest.
    pub fn sha_file_name(&self) -> String {
        self.sha_template.render(&self.name_fields())
    }

    /// Logs every context field once.
    pub fn log_summary(&self) {
        log::info!("Build context:");
        log::info!("app_name: {}", self.app_name);
        log::info!("app_version: {}", self.app_version);
        log::info!("operating_system: {}", self.platform.os);
        log::info!("machine_type: {}", self.platform.machine);
        log::info!("language_version: {}", self.language_version);
        log::info!("console_script: {}", self.console_script);
        log::info!("pkg_name: {}", self.pkg_name);
        log::info!(
            "script_path: {}",
            self.script_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not found>".into())
        );
        log::info!("pkg_dir: {}", self.pkg_dir.display());
        log::info!("src_dir: {}", self.src_dir.display());
        log::info!("name_format: {}", self.name_template.as_str());
        log::info!("clean: {}", self.clean);
        log::info!("work_dir: {}", self.work_dir.display());
        log::info!("staging_dir: {}", self.staging_dir.display());
        log::info!("with_latest: {}", self.with_latest);
        log::info!("sha: {}", self.sha_mode.as_str());
        log::info!("freezer: {}", self.freezer);
        if let Some(template) = &self.hook_template {
            log::info!("hook_template: {}", template.display());
        }
        for extra in self.extra_data.iter().flatten() {
            log::info!("extra_data: {}", extra);
        }
    }
}
