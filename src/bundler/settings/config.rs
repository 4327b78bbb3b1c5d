//! Raw build options as supplied by the user.

use std::path::PathBuf;

/// Default standalone naming template.
pub const DEFAULT_NAME_FORMAT: &str = "{an}-{v}-standalone-{os}-{m}";

/// Default hash manifest naming template.
pub const DEFAULT_SHA_FORMAT: &str = "{an}-{v}-sha256-{os}-{m}.json";

/// Default files-document label template.
pub const DEFAULT_LABEL_FORMAT: &str = "{An} {v} {ft} for {os} [Standalone Build]";

/// Directory holding manifests, the default work area and the default staging tree.
pub const DEFAULT_OUTPUT_DIR: &str = ".standalone";

/// Default freezer executable.
pub const DEFAULT_FREEZER: &str = "pyinstaller";

/// Where the SHA-256 of the standalone is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaMode {
    /// Only in the info document.
    #[default]
    Info,
    /// Also in a separate JSON hash manifest staged next to the executable.
    File,
}

impl ShaMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShaMode::Info => "info",
            ShaMode::File => "file",
        }
    }
}

/// Build options before they are merged with package metadata.
///
/// Every `Option` left as `None` is filled from package metadata or a
/// derived default when the [`BuildContext`](super::BuildContext) is built.
///
/// # Examples
///
/// ```
/// use standalone_bundler::bundler::{BuildConfig, ShaMode};
///
/// let config = BuildConfig {
///     pkg_dir: "tests/fixtures/sampleapp".into(),
///     src_dir: "src".into(),
///     sha: ShaMode::File,
///     clean: true,
///     ..Default::default()
/// };
/// assert_eq!(config.name_format, "{an}-{v}-standalone-{os}-{m}");
/// ```
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Application name.
    ///
    /// Default: package `name` from metadata
    pub app_name: Option<String>,

    /// Importable package name of the application.
    ///
    /// Default: first entry of the package's `packages` metadata
    pub pkg_name: Option<String>,

    /// Entry-point script to freeze.
    ///
    /// Default: discovered from the console-script name
    pub script_path: Option<PathBuf>,

    /// Source directory, relative to `pkg_dir`.
    ///
    /// Default: `.`
    pub src_dir: PathBuf,

    /// Directory holding the package metadata file.
    ///
    /// Default: `.`
    pub pkg_dir: PathBuf,

    /// Surface captured freezer output.
    pub verbose: bool,

    /// Extra data paths, relative to the package source directory.
    pub extra_data: Vec<String>,

    /// Work directory. Must not exist yet.
    ///
    /// Default: `<output_dir>/build/<16 random hex chars>`
    pub work_dir: Option<PathBuf>,

    /// Delete the work directory when done.
    pub clean: bool,

    /// Standalone naming template.
    pub name_format: String,

    /// Hash manifest naming template.
    pub sha_format: String,

    /// Files-document label template.
    pub label_format: String,

    /// Skip writing the info, files and environment-export documents.
    pub no_file: bool,

    /// Where to record the SHA-256.
    pub sha: ShaMode,

    /// Also stage a copy under `latest`.
    pub with_latest: bool,

    /// Staging directory. Wiped at the start of staging.
    ///
    /// Default: `<output_dir>/dist`
    pub staging_dir: Option<PathBuf>,

    /// Directory receiving the info, files and environment-export documents.
    ///
    /// Default: `.standalone`
    pub output_dir: PathBuf,

    /// Custom hook template file.
    ///
    /// Default: built-in template
    pub hook_template: Option<PathBuf>,

    /// Extra modules passed to the freezer as hidden imports.
    pub extra_modules: Vec<String>,

    /// Freezer executable name or path.
    ///
    /// Default: `pyinstaller`
    pub freezer: String,

    /// Language version used for marker evaluation.
    ///
    /// Default: detected from the Python interpreter on `PATH`
    pub language_version: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            pkg_name: None,
            script_path: None,
            src_dir: PathBuf::from("."),
            pkg_dir: PathBuf::from("."),
            verbose: false,
            extra_data: Vec::new(),
            work_dir: None,
            clean: false,
            name_format: DEFAULT_NAME_FORMAT.to_string(),
            sha_format: DEFAULT_SHA_FORMAT.to_string(),
            label_format: DEFAULT_LABEL_FORMAT.to_string(),
            no_file: false,
            sha: ShaMode::Info,
            with_latest: false,
            staging_dir: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            hook_template: None,
            extra_modules: Vec::new(),
            freezer: DEFAULT_FREEZER.to_string(),
            language_version: None,
        }
    }
}
