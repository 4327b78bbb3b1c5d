//! Package metadata from a single pyproject.toml

use crate::bundler::error::{Error, ErrorExt, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Read access to the metadata of the package being frozen.
///
/// Fields queried by the build: `name`, `version`, `console_scripts`
/// (first declared entry point) and `packages` (importable package name).
pub trait PackageMetadata {
    /// Returns a scalar metadata field, or `None` if the package does not declare it.
    fn get_field(&self, name: &str) -> Option<String>;

    /// Declared requirement strings, in declaration order.
    fn get_install_requires(&self) -> Vec<String>;
}

/// Metadata read from the `[project]` table of `pyproject.toml`.
#[derive(Debug, Clone, Default)]
pub struct PyProjectMetadata {
    name: Option<String>,
    version: Option<String>,
    console_script: Option<String>,
    package: Option<String>,
    dependencies: Vec<String>,
}

impl PyProjectMetadata {
    /// Loads `pyproject.toml` from `pkg_dir` (single read + parse).
    pub fn load(pkg_dir: &Path) -> Result<Self> {
        let path = pkg_dir.join("pyproject.toml");
        let contents = std::fs::read_to_string(&path).fs_context("reading package metadata", &path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses metadata from pyproject.toml contents.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let toml_value: toml::Value = toml::from_str(contents)?;

        let project = toml_value
            .get("project")
            .ok_or_else(|| Error::MissingMetadata("[project] table".to_string()))?;

        let name = project
            .get("name")
            .and_then(|v| v.as_str())
            .map(String::from);

        let version = project
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from);

        let console_script = project
            .get("scripts")
            .and_then(|v| v.as_table())
            .and_then(|scripts| scripts.keys().next())
            .map(String::from);

        let dependencies = project
            .get("dependencies")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();

        let package = toml_value
            .get("tool")
            .and_then(|t| t.get("setuptools"))
            .and_then(|s| s.get("packages"))
            .and_then(|p| p.as_array())
            .and_then(|arr| arr.first())
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| name.as_ref().map(|n| n.replace('-', "_")));

        Ok(Self {
            name,
            version,
            console_script,
            package,
            dependencies,
        })
    }
}

impl PackageMetadata for PyProjectMetadata {
    fn get_field(&self, name: &str) -> Option<String> {
        match name {
            "name" => self.name.clone(),
            "version" => self.version.clone(),
            "console_scripts" => self.console_script.clone(),
            "packages" => self.package.clone(),
            _ => None,
        }
    }

    fn get_install_requires(&self) -> Vec<String> {
        self.dependencies.clone()
    }
}

/// In-memory metadata, for callers that already know their package facts.
///
/// # Examples
///
/// ```
/// use standalone_bundler::metadata::{PackageMetadata, StaticMetadata};
///
/// let metadata = StaticMetadata::new()
///     .field("version", "1.0")
///     .requires(["click"]);
/// assert_eq!(metadata.get_field("version").as_deref(), Some("1.0"));
/// assert_eq!(metadata.get_install_requires(), ["click"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticMetadata {
    fields: BTreeMap<String, String>,
    requires: Vec<String>,
}

impl StaticMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(requires.into_iter().map(Into::into));
        self
    }
}

impl PackageMetadata for StaticMetadata {
    fn get_field(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    fn get_install_requires(&self) -> Vec<String> {
        self.requires.clone()
    }
}
