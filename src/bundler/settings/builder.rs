//! Builder for constructing the [`BuildContext`].

use super::core::ContextParts;
use super::{BuildConfig, BuildContext, Platform};
use crate::bundler::builder::tool_detection::detect_language_version;
use crate::bundler::error::{Error, ErrorExt, Result};
use crate::bundler::naming::{NameTemplate, TemplateKind};
use crate::bundler::requirements::LanguageVersion;
use crate::metadata::PackageMetadata;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing a [`BuildContext`].
///
/// Merges user options with package metadata and host facts, and performs
/// every check that must fail before a build starts: naming templates are
/// validated and the work directory must not exist yet.
///
/// # Examples
///
/// ```no_run
/// use standalone_bundler::bundler::{BuildConfig, ContextBuilder, Platform};
/// use standalone_bundler::metadata::PyProjectMetadata;
///
/// # fn example() -> standalone_bundler::bundler::Result<()> {
/// let config = BuildConfig {
///     pkg_dir: "tests/fixtures/sampleapp".into(),
///     src_dir: "src".into(),
///     ..Default::default()
/// };
/// let metadata = PyProjectMetadata::load(&config.pkg_dir)?;
/// let context = ContextBuilder::new(config)
///     .platform(Platform::from_system("Linux", "x86_64"))
///     .build(&metadata)?;
/// assert_eq!(context.standalone_name(), "sampleapp-4.2.6-standalone-linux-x86_64");
/// # Ok(())
/// # }
/// ```
pub struct ContextBuilder {
    config: BuildConfig,
    platform: Option<Platform>,
    language_version: Option<LanguageVersion>,
    virtual_env: Option<PathBuf>,
}

impl ContextBuilder {
    /// Creates a builder. The virtual environment defaults to `$VIRTUAL_ENV`.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            platform: None,
            language_version: None,
            virtual_env: std::env::var_os("VIRTUAL_ENV").map(PathBuf::from),
        }
    }

    /// Overrides host platform detection.
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Overrides language version configuration and detection.
    pub fn language_version(mut self, version: LanguageVersion) -> Self {
        self.language_version = Some(version);
        self
    }

    /// Virtual environment searched for the entry-point script.
    pub fn virtual_env(mut self, virtual_env: Option<PathBuf>) -> Self {
        self.virtual_env = virtual_env;
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// - [`Error::NamingTemplate`] for an unknown placeholder in any template
    /// - [`Error::MissingMetadata`] when version, name or console script cannot be determined
    /// - [`Error::WorkDirExists`] when the work directory already exists
    pub fn build(self, metadata: &dyn PackageMetadata) -> Result<BuildContext> {
        let config = self.config;

        let name_template = NameTemplate::parse(TemplateKind::Standalone, &config.name_format)?;
        let sha_template = NameTemplate::parse(TemplateKind::Sha, &config.sha_format)?;
        let label_template = NameTemplate::parse(TemplateKind::Label, &config.label_format)?;

        let app_version = metadata
            .get_field("version")
            .ok_or_else(|| Error::MissingMetadata("version".into()))?;
        let app_name = config
            .app_name
            .clone()
            .or_else(|| metadata.get_field("name"))
            .ok_or_else(|| Error::MissingMetadata("name".into()))?;
        let pkg_name = config
            .pkg_name
            .clone()
            .or_else(|| metadata.get_field("packages"))
            .unwrap_or_else(|| app_name.replace('-', "_"));
        let console_script = metadata
            .get_field("console_scripts")
            .or_else(|| {
                config
                    .script_path
                    .as_deref()
                    .and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .ok_or_else(|| Error::MissingMetadata("console_scripts".into()))?;

        let output_dir = absolute(&config.output_dir)?;
        let work_dir = match &config.work_dir {
            Some(dir) => absolute(dir)?,
            None => output_dir.join("build").join(random_token()),
        };
        if work_dir.exists() {
            log::error!("work_dir must not exist. It may be deleted.");
            return Err(Error::WorkDirExists(work_dir));
        }
        let staging_dir = match &config.staging_dir {
            Some(dir) => absolute(dir)?,
            None => output_dir.join("dist"),
        };

        let platform = self.platform.unwrap_or_else(Platform::current);
        let language_version = match (self.language_version, &config.language_version) {
            (Some(version), _) => version,
            (None, Some(raw)) => LanguageVersion::parse(raw)?,
            (None, None) => detect_language_version()?,
        };

        let script_path = config.script_path.clone().or_else(|| {
            find_script(self.virtual_env.as_deref(), &console_script, &pkg_name)
        });

        let extra_data = if config.extra_data.is_empty() {
            None
        } else {
            Some(config.extra_data)
        };

        let context = BuildContext::new(ContextParts {
            app_name,
            pkg_name,
            app_version,
            console_script,
            script_path,
            pkg_dir: config.pkg_dir,
            src_dir: config.src_dir,
            platform,
            language_version,
            name_template,
            sha_template,
            label_template,
            work_dir,
            staging_dir,
            output_dir,
            clean: config.clean,
            write_manifest: !config.no_file,
            with_latest: config.with_latest,
            verbose: config.verbose,
            sha_mode: config.sha,
            extra_data,
            extra_modules: config.extra_modules,
            hook_template: config.hook_template,
            freezer: config.freezer,
            install_requires: metadata.get_install_requires(),
        });
        context.log_summary();
        Ok(context)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .fs_context("resolving absolute path", path)?
        .into_owned())
}

/// 16 hex characters, unique per invocation.
pub(crate) fn random_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..16].to_string()
}

/// Searches the places an installer usually puts a console script.
///
/// Returns the first candidate that exists.
pub fn find_script(
    virtual_env: Option<&Path>,
    console_script: &str,
    pkg_name: &str,
) -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(venv) = virtual_env {
        candidates.push(venv.join("bin").join(console_script));
        candidates.push(venv.join("Scripts").join(format!("{console_script}-script.py")));
        candidates.push(venv.join("Scripts").join(format!("{console_script}.py")));
        candidates.push(venv.join("bin").join(format!("{console_script}-script.py")));
    }

    candidates.push(Path::new("bin").join(console_script));
    candidates.push(Path::new("bin").join(format!("{console_script}-script.py")));
    candidates.push(Path::new("Scripts").join(format!("{console_script}-script.py")));
    candidates.push(Path::new("Scripts").join(console_script));

    // conda environments
    if let Some(venv) = virtual_env {
        candidates.push(
            venv.join("Lib")
                .join("site-packages")
                .join(pkg_name)
                .join(format!("{console_script}.py")),
        );
    }

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::ShaMode;
    use crate::metadata::StaticMetadata;

    fn metadata() -> StaticMetadata {
        StaticMetadata::new()
            .field("name", "demoapp")
            .field("version", "4.2.6")
            .field("console_scripts", "demoapp")
            .field("packages", "demoapp")
            .requires(["click", "six"])
    }

    fn config(root: &Path) -> BuildConfig {
        BuildConfig {
            output_dir: root.join(".standalone"),
            language_version: Some("3.11".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let context = ContextBuilder::new(config(dir.path()))
            .platform(Platform::from_system("Linux", "x86_64"))
            .virtual_env(None)
            .build(&metadata())
            .unwrap();

        assert_eq!(context.app_name(), "demoapp");
        assert_eq!(context.app_version(), "4.2.6");
        assert_eq!(context.console_script(), "demoapp");
        assert_eq!(context.pkg_name(), "demoapp");
        assert_eq!(context.pkg_dir(), Path::new("."));
        assert_eq!(context.src_dir(), Path::new("."));
        assert_eq!(context.sha_mode(), ShaMode::Info);
        assert!(!context.clean());
        assert!(context.write_manifest());
        assert!(context.extra_data().is_none());
        assert_eq!(context.install_requires(), ["click", "six"]);
        assert_eq!(context.standalone_name(), "demoapp-4.2.6-standalone-linux-x86_64");
        assert_eq!(context.sha_file_name(), "demoapp-4.2.6-sha256-linux-x86_64.json");

        let build_root = dir.path().join(".standalone").join("build");
        assert!(context.work_dir().starts_with(&build_root));
        assert_eq!(context.work_dir().file_name().unwrap().len(), 16);
        assert_eq!(context.staging_dir(), dir.path().join(".standalone").join("dist"));
    }

    #[test]
    fn test_unknown_placeholder_fails_before_anything_else() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            name_format: "{an}-{version}".into(),
            ..config(dir.path())
        };
        let err = ContextBuilder::new(config)
            .build(&StaticMetadata::new())
            .unwrap_err();
        assert!(matches!(err, Error::NamingTemplate { .. }));
    }

    #[test]
    fn test_existing_work_dir_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let work = dir.path().join("work");
        std::fs::create_dir(&work).unwrap();
        let config = BuildConfig {
            work_dir: Some(work.clone()),
            ..config(dir.path())
        };
        let err = ContextBuilder::new(config).build(&metadata()).unwrap_err();
        assert!(matches!(err, Error::WorkDirExists(ref path) if *path == work));
    }

    #[test]
    fn test_missing_version_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContextBuilder::new(config(dir.path()))
            .build(&StaticMetadata::new().field("name", "x"))
            .unwrap_err();
        assert!(matches!(err, Error::MissingMetadata(ref field) if field == "version"));
    }

    #[test]
    fn test_overrides_win_over_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            app_name: Some("renamed".into()),
            pkg_name: Some("renamed_pkg".into()),
            extra_data: vec!["data".into()],
            ..config(dir.path())
        };
        let context = ContextBuilder::new(config)
            .platform(Platform::from_system("Windows", "amd64"))
            .virtual_env(None)
            .build(&metadata())
            .unwrap();
        assert_eq!(context.app_name(), "renamed");
        assert_eq!(context.pkg_name(), "renamed_pkg");
        assert_eq!(context.extra_data(), Some(&["data".to_string()][..]));
        assert_eq!(context.standalone_name(), "renamed-4.2.6-standalone-windows-amd64");
    }

    #[test]
    fn test_find_script_in_virtual_env() {
        let dir = tempfile::tempdir().unwrap();
        let venv = dir.path().join("venv");
        let scripts = venv.join("Scripts");
        std::fs::create_dir_all(&scripts).unwrap();
        std::fs::write(scripts.join("demoapp-script.py"), "print('hi')").unwrap();

        let found = find_script(Some(&venv), "demoapp", "demoapp").unwrap();
        assert_eq!(found, scripts.join("demoapp-script.py"));
        assert!(find_script(Some(&venv), "other", "other").is_none());
    }
}
