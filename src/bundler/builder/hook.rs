//! Freezer hook generation.
//!
//! The hook tells the freezer about files it cannot discover by following
//! imports: extra data directories shipped inside the package, and the
//! distribution metadata of every required dependency.

use crate::bundler::error::{ErrorExt, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::path::{Component, Path};

/// Built-in hook template. `{{app_name}}` and `{{pkg_name}}` are substituted.
pub const DEFAULT_HOOK_TEMPLATE: &str = r#"# -*- coding: utf-8 -*-
# Hook for {{app_name}}, generated by standalone_bundler.
from PyInstaller.utils.hooks import collect_data_files, copy_metadata

datas = collect_data_files('{{pkg_name}}')
datas += copy_metadata('{{app_name}}')

"#;

/// One extra data directive: bundle `source` under `dest` inside the standalone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraData {
    /// Normalized source path, forward slashes only.
    pub source: String,
    /// Destination relative to the bundle root, forward slashes only.
    pub dest: String,
}

#[derive(Serialize)]
struct HookData<'a> {
    app_name: &'a str,
    pkg_name: &'a str,
}

/// Maps extra data entries to source and destination paths.
///
/// Entries are relative to the package's import directory
/// (`pkg_dir/src_dir/pkg_name`). Returns `None` when there is nothing to
/// bundle or the import directory does not exist; extra data is best-effort
/// and never fails a build.
pub fn resolve_extra_data(
    pkg_dir: &Path,
    src_dir: &Path,
    pkg_name: &str,
    entries: Option<&[String]>,
) -> Option<Vec<ExtraData>> {
    let entries = entries.filter(|e| !e.is_empty())?;

    let mut package_root = pkg_dir.to_path_buf();
    if src_dir != Path::new(".") {
        package_root.push(src_dir);
    }
    package_root.push(pkg_name);

    if !package_root.is_dir() {
        log::warn!(
            "package directory {} not found, skipping extra data",
            package_root.display()
        );
        return None;
    }

    let root = package_root.to_string_lossy();
    let resolved = entries
        .iter()
        .map(|entry| ExtraData {
            source: normalize(&format!("{root}/{entry}")),
            dest: normalize(&format!("{pkg_name}/{entry}")),
        })
        .collect();
    Some(resolved)
}

/// Lexically normalizes a path and converts separators to forward slashes.
///
/// Backslashes would otherwise turn into escape sequences inside the
/// generated Python string literals.
fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let mut parts: Vec<String> = Vec::new();
    let mut prefix = String::new();

    for component in Path::new(&unified).components() {
        match component {
            Component::Prefix(p) => prefix = p.as_os_str().to_string_lossy().into_owned(),
            Component::RootDir => prefix.push('/'),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.last().is_some_and(|p| p != "..") {
                    parts.pop();
                } else if prefix.is_empty() {
                    parts.push("..".into());
                }
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
        }
    }

    let joined = format!("{prefix}{}", parts.join("/"));
    if joined.is_empty() { ".".into() } else { joined }
}

/// Renders the hook text.
///
/// The template receives `app_name` and `pkg_name`. Extra data directives
/// follow it, then one metadata directive per required package in input
/// order, so identical inputs always produce an identical hook.
pub fn generate_hook(
    template: &str,
    app_name: &str,
    pkg_name: &str,
    required_packages: &[String],
    extra_data: Option<&[ExtraData]>,
) -> Result<String> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    let mut hook = handlebars.render_template(template, &HookData { app_name, pkg_name })?;

    hook.push_str("# collection extra data, if any (using --extra-data option)");
    for extra in extra_data.unwrap_or_default() {
        hook.push_str(&format!(
            "\ndatas.append(('{}', '{}'))\n\n",
            extra.source, extra.dest
        ));
    }

    hook.push_str("# add dependency metadata");
    for package in required_packages {
        hook.push_str(&format!("\ndatas += copy_metadata('{package}')"));
    }
    hook.push('\n');

    Ok(hook)
}

/// Loads a custom hook template, or the built-in one.
pub async fn load_template(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .fs_context("reading hook template", path),
        None => Ok(DEFAULT_HOOK_TEMPLATE.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_template_substitution_and_metadata_order() {
        let hook = generate_hook(
            "# hook for {{app_name}} ({{pkg_name}})\n",
            "demo-app",
            "demo_app",
            &strings(&["click", "six", "pywin32"]),
            None,
        )
        .unwrap();

        assert_eq!(
            hook,
            "# hook for demo-app (demo_app)\n\
             # collection extra data, if any (using --extra-data option)\
             # add dependency metadata\n\
             datas += copy_metadata('click')\n\
             datas += copy_metadata('six')\n\
             datas += copy_metadata('pywin32')\n"
        );
    }

    #[test]
    fn test_extra_data_directives() {
        let extra = vec![ExtraData {
            source: "/src/demoapp/data".into(),
            dest: "demoapp/data".into(),
        }];
        let hook = generate_hook("", "demoapp", "demoapp", &[], Some(&extra)).unwrap();
        assert!(hook.contains("\ndatas.append(('/src/demoapp/data', 'demoapp/data'))\n\n# add dependency metadata"));
    }

    #[test]
    fn test_template_is_not_html_escaped() {
        let hook = generate_hook("{{app_name}}", "a&b<c>", "ab", &[], None).unwrap();
        assert!(hook.starts_with("a&b<c>"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let required = strings(&["b", "a", "c"]);
        let first = generate_hook(DEFAULT_HOOK_TEMPLATE, "x", "x", &required, None).unwrap();
        let second = generate_hook(DEFAULT_HOOK_TEMPLATE, "x", "x", &required, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resolve_extra_data_with_src_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src").join("demoapp").join("data")).unwrap();

        let extra = resolve_extra_data(
            dir.path(),
            Path::new("src"),
            "demoapp",
            Some(&strings(&["data", "./conf/../static"])),
        )
        .unwrap();

        let root = normalize(&dir.path().to_string_lossy());
        assert_eq!(extra[0].source, format!("{root}/src/demoapp/data"));
        assert_eq!(extra[0].dest, "demoapp/data");
        assert_eq!(extra[1].source, format!("{root}/src/demoapp/static"));
        assert_eq!(extra[1].dest, "demoapp/static");
    }

    #[test]
    fn test_missing_package_dir_omits_extra_data() {
        let dir = tempfile::tempdir().unwrap();
        let extra = resolve_extra_data(dir.path(), Path::new("."), "absent", Some(&strings(&["data"])));
        assert!(extra.is_none());
        assert!(resolve_extra_data(dir.path(), Path::new("."), "absent", None).is_none());
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./pkg/./data/"), "pkg/data");
        assert_eq!(normalize("pkg\\data\\tables"), "pkg/data/tables");
        assert_eq!(normalize("/a/b/../c"), "/a/c");
        assert_eq!(normalize("../up"), "../up");
        assert_eq!(normalize("."), ".");
    }

    #[tokio::test]
    async fn test_load_template() {
        assert_eq!(load_template(None).await.unwrap(), DEFAULT_HOOK_TEMPLATE);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hook-template");
        std::fs::write(&path, "custom {{app_name}}").unwrap();
        assert_eq!(load_template(Some(&path)).await.unwrap(), "custom {{app_name}}");
    }
}
