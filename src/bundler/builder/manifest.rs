//! Build manifest documents.
//!
//! Four outputs describe a finished build for CI tooling:
//!
//! - `standalone-info.json`: flat object of context and result fields
//! - `standalone-files.json`: one entry per staged file
//! - `standalone-environs.sh` / `.bat`: the info scalars as exported variables
//!
//! JSON is rendered with `", "` and `": "` separators and ASCII-only string
//! escapes, in declaration order, so tooling that diffs these files sees the
//! same bytes across implementations.

use crate::bundler::error::{Error, Result};
use crate::bundler::naming::NameFields;
use crate::bundler::settings::{BuildContext, ShaMode};
use crate::bundler::utils::fs;
use serde::Serialize;
use serde_json::ser::Formatter;
use std::io;
use std::path::{Path, PathBuf};

/// Info document file name.
pub const INFO_FILE: &str = "standalone-info.json";
/// Files document file name.
pub const FILES_FILE: &str = "standalone-files.json";
/// Environment-export script stem.
pub const ENVIRON_SCRIPT: &str = "standalone-environs";
/// Prefix of every exported variable.
pub const ENVIRON_PREFIX: &str = "SB_ENV_";

const MIME_EXECUTABLE: &str = "application/x-executable";
const MIME_WINDOWS_EXECUTABLE: &str = "application/vnd.microsoft.portable-executable";
const MIME_JSON: &str = "application/json";
const FILE_TYPE_STANDALONE: &str = "Standalone Executable";
const FILE_TYPE_SHA: &str = "Standalone Executable SHA256 Hash";

/// `serde_json` formatter matching Python's `json.dumps` defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct PythonFormatter;

impl Formatter for PythonFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        for ch in fragment.chars() {
            if ch.is_ascii() {
                writer.write_all(&[ch as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serializes `value` the way Python's `json.dumps` would.
pub fn to_python_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PythonFormatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| Error::GenericError(format!("manifest is not UTF-8: {e}")))
}

/// Hash manifest: `{"<standalone file name>": "<sha256>"}`.
pub fn hash_document(gen_file: &str, file_sha: &str) -> Result<String> {
    let mut document = serde_json::Map::new();
    document.insert(gen_file.to_string(), file_sha.into());
    to_python_json(&document)
}

/// Flat info document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InfoDocument {
    pub app_name: String,
    pub app_version: String,
    pub operating_system: String,
    pub machine_type: String,
    pub console_script: String,
    pub script_path: Option<String>,
    pub pkg_dir: String,
    pub src_dir: String,
    pub name_format: String,
    pub clean: bool,
    pub work_dir: String,
    pub staging_dir: String,
    pub with_latest: bool,
    pub gen_file: String,
    pub gen_file_w_path: String,
    pub file_sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha_file_w_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha_format: Option<String>,
    pub extra_data: Vec<String>,
}

/// What a finished build produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutputs {
    /// Bare file name of the standalone.
    pub gen_file: String,
    /// Staged standalone path.
    pub gen_file_w_path: PathBuf,
    pub file_sha: Option<String>,
    /// Staged hash manifest path, separate hash mode only.
    pub sha_file_w_path: Option<PathBuf>,
}

impl InfoDocument {
    pub fn new(context: &BuildContext, outputs: &BuildOutputs) -> Self {
        let separate_sha = context.sha_mode() == ShaMode::File && outputs.sha_file_w_path.is_some();
        Self {
            app_name: context.app_name().to_string(),
            app_version: context.app_version().to_string(),
            operating_system: context.platform().os.clone(),
            machine_type: context.platform().machine.clone(),
            console_script: context.console_script().to_string(),
            script_path: context.script_path().map(display),
            pkg_dir: display(context.pkg_dir()),
            src_dir: display(context.src_dir()),
            name_format: context.name_template().as_str().to_string(),
            clean: context.clean(),
            work_dir: display(context.work_dir()),
            staging_dir: display(context.staging_dir()),
            with_latest: context.with_latest(),
            gen_file: outputs.gen_file.clone(),
            gen_file_w_path: display(&outputs.gen_file_w_path),
            file_sha: outputs.file_sha.clone(),
            sha_file: separate_sha.then(|| context.sha_file_name()),
            sha_file_w_path: outputs.sha_file_w_path.as_deref().filter(|_| separate_sha).map(display),
            sha_format: separate_sha.then(|| context.sha_template().as_str().to_string()),
            extra_data: context.extra_data().map(<[String]>::to_vec).unwrap_or_default(),
        }
    }

    /// Scalar fields exported as environment variables, in document order.
    ///
    /// Naming templates, the clean flag and list-valued fields are left out.
    /// Values use Python's `str()` rendering (`True`, `False`, `None`).
    pub fn environ_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![
            ("app_name", self.app_name.clone()),
            ("app_version", self.app_version.clone()),
            ("operating_system", self.operating_system.clone()),
            ("machine_type", self.machine_type.clone()),
            ("console_script", self.console_script.clone()),
            ("script_path", python_str(self.script_path.as_deref())),
            ("pkg_dir", self.pkg_dir.clone()),
            ("src_dir", self.src_dir.clone()),
            ("work_dir", self.work_dir.clone()),
            ("staging_dir", self.staging_dir.clone()),
            ("with_latest", python_bool(self.with_latest).to_string()),
            ("gen_file", self.gen_file.clone()),
            ("gen_file_w_path", self.gen_file_w_path.clone()),
            ("file_sha", python_str(self.file_sha.as_deref())),
        ];
        if let Some(sha_file) = &self.sha_file {
            pairs.push(("sha_file", sha_file.clone()));
        }
        if let Some(sha_file_w_path) = &self.sha_file_w_path {
            pairs.push(("sha_file_w_path", sha_file_w_path.clone()));
        }

        pairs
            .into_iter()
            .map(|(key, value)| (format!("{ENVIRON_PREFIX}{}", key.to_uppercase()), value))
            .collect()
    }
}

/// One entry of the files document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FileEntry {
    pub filename: String,
    pub path: String,
    #[serde(rename = "mime-type")]
    pub mime_type: String,
    pub label: String,
}

/// Builds the files document entries: the standalone, then the hash manifest.
pub fn file_entries(context: &BuildContext, info: &InfoDocument) -> Vec<FileEntry> {
    let fields = NameFields::new(
        context.app_name(),
        context.app_version(),
        context.platform().os_title(),
        &context.platform().machine,
    );
    let label = |file_type: &str| context.label_template().render(&fields.with_file_type(file_type));

    let mime_type = if info.gen_file.ends_with(".exe") {
        MIME_WINDOWS_EXECUTABLE
    } else {
        MIME_EXECUTABLE
    };

    let mut entries = vec![FileEntry {
        filename: info.gen_file.clone(),
        path: info.gen_file_w_path.clone(),
        mime_type: mime_type.to_string(),
        label: label(FILE_TYPE_STANDALONE),
    }];

    if let (Some(filename), Some(path)) = (&info.sha_file, &info.sha_file_w_path) {
        entries.push(FileEntry {
            filename: filename.clone(),
            path: path.clone(),
            mime_type: MIME_JSON.to_string(),
            label: label(FILE_TYPE_SHA),
        });
    }
    entries
}

/// POSIX shell rendering: `export NAME="value"` per line.
pub fn posix_environ_script(info: &InfoDocument) -> String {
    info.environ_pairs()
        .into_iter()
        .map(|(key, value)| format!("export {key}=\"{value}\"\n"))
        .collect()
}

/// Windows batch rendering: `set NAME=value` per CRLF-terminated line.
pub fn batch_environ_script(info: &InfoDocument) -> String {
    info.environ_pairs()
        .into_iter()
        .map(|(key, value)| format!("set {key}={value}\r\n"))
        .collect()
}

/// Paths of the written manifest documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    pub info: PathBuf,
    pub files: PathBuf,
    pub posix_environ: PathBuf,
    pub batch_environ: PathBuf,
}

impl ManifestPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            info: dir.join(INFO_FILE),
            files: dir.join(FILES_FILE),
            posix_environ: dir.join(format!("{ENVIRON_SCRIPT}.sh")),
            batch_environ: dir.join(format!("{ENVIRON_SCRIPT}.bat")),
        }
    }
}

/// Writes all four manifest documents into the context's output directory.
pub async fn write_manifests(context: &BuildContext, outputs: &BuildOutputs) -> Result<ManifestPaths> {
    let paths = ManifestPaths::in_dir(context.output_dir());
    let info = InfoDocument::new(context, outputs);

    log::info!("Writing information file: {}", paths.info.display());
    fs::write_file(&paths.info, to_python_json(&info)?).await?;

    log::info!("Writing files file: {}", paths.files.display());
    fs::write_file(&paths.files, to_python_json(&file_entries(context, &info))?).await?;

    log::info!("Writing environ script: {}", paths.posix_environ.display());
    fs::write_file(&paths.posix_environ, posix_environ_script(&info)).await?;

    log::info!("Writing environ script: {}", paths.batch_environ.display());
    fs::write_file(&paths.batch_environ, batch_environ_script(&info)).await?;

    Ok(paths)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn python_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

fn python_str(value: Option<&str>) -> String {
    value.unwrap_or("None").to_string()
}
