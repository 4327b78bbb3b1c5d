//! End-to-end pipeline tests.
//!
//! A shell script stands in for the freezer: it records its arguments and
//! writes a fake executable named after `--name` into `--distpath`.

#![cfg(unix)]

use sha2::{Digest, Sha256};
use standalone_bundler::bundler::{
    BuildConfig, BuildContext, BuildStatus, ContextBuilder, Error, Generator, Platform, ShaMode,
    Stage,
};
use standalone_bundler::metadata::PyProjectMetadata;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const STANDALONE: &str = "sampleapp-4.2.6-standalone-linux-x86_64";
const SHA_FILE: &str = "sampleapp-4.2.6-sha256-linux-x86_64.json";

fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sampleapp")
}

/// Writes a freezer stub. `produce` is a shell snippet run with `$dist` and
/// `$name` set.
fn freezer_stub(dir: &Path, produce: &str) -> PathBuf {
    let script = format!(
        r#"#!/bin/sh
printf '%s\n' "$@" > "$(dirname "$0")/freezer-args.txt"
name=""
dist=""
while [ $# -gt 0 ]; do
    case "$1" in
        --name) name="$2"; shift 2 ;;
        --distpath) dist="$2"; shift 2 ;;
        *) shift ;;
    esac
done
mkdir -p "$dist"
{produce}
"#
    );
    let path = dir.join("fake-pyinstaller");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

const PRODUCE_ONE: &str = r#"printf 'frozen %s' "$name" > "$dist/$name""#;

fn context(root: &Path, freezer: &Path, config: BuildConfig) -> BuildContext {
    let pkg_dir = fixture_dir();
    let metadata = PyProjectMetadata::load(&pkg_dir).unwrap();
    ContextBuilder::new(BuildConfig {
        pkg_dir: pkg_dir.clone(),
        src_dir: PathBuf::from("src"),
        script_path: Some(pkg_dir.join("scripts/sampleapp.py")),
        output_dir: root.join(".standalone"),
        freezer: freezer.display().to_string(),
        language_version: Some("3.11".into()),
        ..config
    })
    .platform(Platform::from_system("Linux", "x86_64"))
    .virtual_env(None)
    .build(&metadata)
    .unwrap()
}

fn sha256_hex(path: &Path) -> String {
    hex::encode(Sha256::digest(std::fs::read(path).unwrap()))
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_build_with_separate_hash_file() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);
    let config = BuildConfig {
        sha: ShaMode::File,
        extra_data: vec!["data".into()],
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();

    let status = generator.generate().await.unwrap();
    assert_eq!(status, BuildStatus::Success);
    assert_eq!(generator.stage(), Stage::Done);

    let staging = dir.path().join(".standalone/dist");
    let version_dir = staging.join("4.2.6");
    assert_eq!(file_names(&version_dir), [SHA_FILE, STANDALONE]);
    assert!(!staging.join("latest").exists());

    let standalone = version_dir.join(STANDALONE);
    let digest = sha256_hex(&standalone);
    assert_eq!(generator.result().file_sha.as_deref(), Some(digest.as_str()));

    let hash_doc = read_json(&version_dir.join(SHA_FILE));
    assert_eq!(hash_doc[STANDALONE], digest.as_str());

    let info = read_json(&dir.path().join(".standalone/standalone-info.json"));
    assert_eq!(info["app_name"], "sampleapp");
    assert_eq!(info["app_version"], "4.2.6");
    assert_eq!(info["operating_system"], "linux");
    assert_eq!(info["machine_type"], "x86_64");
    assert_eq!(info["console_script"], "sampleapp");
    assert_eq!(info["gen_file"], STANDALONE);
    assert_eq!(info["file_sha"], digest.as_str());
    assert_eq!(info["sha_file"], SHA_FILE);
    assert_eq!(info["extra_data"], serde_json::json!(["data"]));

    let files = read_json(&dir.path().join(".standalone/standalone-files.json"));
    let files = files.as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["filename"], STANDALONE);
    assert_eq!(files[0]["mime-type"], "application/x-executable");
    assert_eq!(
        files[0]["label"],
        "Sampleapp 4.2.6 Standalone Executable for Linux [Standalone Build]"
    );
    assert_eq!(files[1]["filename"], SHA_FILE);
    assert_eq!(files[1]["mime-type"], "application/json");

    let environ = std::fs::read_to_string(dir.path().join(".standalone/standalone-environs.sh")).unwrap();
    assert!(environ.contains(&format!("export SB_ENV_FILE_SHA=\"{digest}\"\n")));
    assert!(environ.contains(&format!("export SB_ENV_SHA_FILE=\"{SHA_FILE}\"\n")));
    assert!(dir.path().join(".standalone/standalone-environs.bat").is_file());
}

#[tokio::test]
async fn test_hook_and_freezer_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);
    let config = BuildConfig {
        extra_data: vec!["data".into()],
        extra_modules: vec!["pkg_resources.py2_warn".into()],
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();
    assert!(generator.generate().await.unwrap().is_success());

    let hook_file = generator.result().hook_file.clone().unwrap();
    assert_eq!(hook_file.file_name().unwrap(), "hook-sampleapp.py");
    let hook = std::fs::read_to_string(&hook_file).unwrap();
    assert!(hook.contains("collect_data_files('sampleapp')"));
    assert!(hook.contains("/src/sampleapp/data', 'sampleapp/data'))"));
    assert!(hook.contains("datas += copy_metadata('click')"));
    assert!(hook.contains("datas += copy_metadata('typing-extensions')"));
    assert!(!hook.contains("pywin32"));
    assert!(!hook.contains("tomli"));
    let extra = hook.find("datas.append(").unwrap();
    let metadata = hook.find("# add dependency metadata").unwrap();
    assert!(extra < metadata);

    let args = std::fs::read_to_string(dir.path().join("freezer-args.txt")).unwrap();
    let args: Vec<&str> = args.lines().collect();
    assert_eq!(args[0], "--noconfirm");
    assert!(args.contains(&"--onefile"));
    assert!(!args.contains(&"--clean"));
    assert!(args.windows(2).any(|w| w == ["--name", STANDALONE]));
    assert!(args.windows(2).any(|w| w == ["--hidden-import", "sampleapp"]));
    assert!(args.windows(2).any(|w| w == ["--hidden-import", "click"]));
    assert!(args.windows(2).any(|w| w == ["--hidden-import", "pkg_resources.py2_warn"]));
    assert!(!args.iter().any(|a| *a == "pywin32"));
    assert!(args.last().unwrap().ends_with("_sampleapp.py"));

    // sha=info keeps the hash in the info document only
    let version_dir = dir.path().join(".standalone/dist/4.2.6");
    assert_eq!(file_names(&version_dir), [STANDALONE]);
    let info = read_json(&dir.path().join(".standalone/standalone-info.json"));
    assert!(info.get("sha_file").is_none());
    assert_eq!(info["file_sha"], sha256_hex(&version_dir.join(STANDALONE)).as_str());
}

#[tokio::test]
async fn test_latest_copies() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);
    let config = BuildConfig {
        sha: ShaMode::File,
        with_latest: true,
        clean: true,
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();
    assert!(generator.generate().await.unwrap().is_success());

    let staging = dir.path().join(".standalone/dist");
    assert_eq!(
        file_names(&staging.join("latest")),
        [
            "sampleapp-latest-sha256-linux-x86_64.json",
            "sampleapp-latest-standalone-linux-x86_64",
        ]
    );
    assert_eq!(
        sha256_hex(&staging.join("latest/sampleapp-latest-standalone-linux-x86_64")),
        sha256_hex(&staging.join("4.2.6").join(STANDALONE))
    );

    // the latest hash document still names the versioned file
    let latest_doc = read_json(&staging.join("latest/sampleapp-latest-sha256-linux-x86_64.json"));
    assert!(latest_doc.get(STANDALONE).is_some());

    assert!(!generator.context().work_dir().exists());
}

#[tokio::test]
async fn test_exe_artifact_keeps_suffix_when_staged() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), r#"printf 'frozen' > "$dist/$name.exe""#);
    let config = BuildConfig {
        sha: ShaMode::File,
        with_latest: true,
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();
    assert!(generator.generate().await.unwrap().is_success());

    let exe = format!("{STANDALONE}.exe");
    let staging = dir.path().join(".standalone/dist");
    assert_eq!(file_names(&staging.join("4.2.6")), [SHA_FILE.to_string(), exe.clone()]);
    assert!(staging
        .join("latest/sampleapp-latest-standalone-linux-x86_64.exe")
        .is_file());

    let hash_doc = read_json(&staging.join("4.2.6").join(SHA_FILE));
    assert!(hash_doc.get(exe.as_str()).is_some());

    let files = read_json(&dir.path().join(".standalone/standalone-files.json"));
    assert_eq!(files[0]["filename"], exe.as_str());
    assert_eq!(files[0]["mime-type"], "application/vnd.microsoft.portable-executable");
}

#[tokio::test]
async fn test_glob_metacharacters_in_project_path() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("proj[1]");
    std::fs::create_dir(&root).unwrap();
    std::fs::create_dir(dir.path().join("proj1")).unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);

    let mut generator = Generator::new(context(&root, &freezer, BuildConfig::default()))
        .await
        .unwrap();

    assert_eq!(generator.generate().await.unwrap(), BuildStatus::Success);
    assert!(root.join(".standalone/dist/4.2.6").join(STANDALONE).is_file());
}

#[tokio::test]
async fn test_no_file_skips_manifests() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);
    let config = BuildConfig {
        sha: ShaMode::File,
        no_file: true,
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();
    assert!(generator.generate().await.unwrap().is_success());
    assert!(generator.result().manifests.is_none());

    let output = dir.path().join(".standalone");
    for name in [
        "standalone-info.json",
        "standalone-files.json",
        "standalone-environs.sh",
        "standalone-environs.bat",
    ] {
        assert!(!output.join(name).exists(), "{name} should not be written");
    }
    assert_eq!(file_names(&output.join("dist/4.2.6")), [SHA_FILE, STANDALONE]);
}

#[tokio::test]
async fn test_staging_directory_is_wiped() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), PRODUCE_ONE);
    let stale = dir.path().join(".standalone/dist/1.0.0/old-build");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"stale").unwrap();

    let mut generator = Generator::new(context(dir.path(), &freezer, BuildConfig::default()))
        .await
        .unwrap();
    assert!(generator.generate().await.unwrap().is_success());

    assert_eq!(file_names(&dir.path().join(".standalone/dist")), ["4.2.6"]);
}

#[tokio::test]
async fn test_freezer_error_fails_at_frozen_and_cleans() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), "exit 3");
    let config = BuildConfig {
        clean: true,
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();

    match generator.generate().await.unwrap() {
        BuildStatus::Failed { stage, message } => {
            assert_eq!(stage, Stage::Frozen);
            assert!(message.contains('3'));
        }
        other => panic!("unexpected status: {other:?}"),
    }
    assert!(!generator.context().work_dir().exists());
    assert!(!dir.path().join(".standalone/dist").exists());
    assert!(!dir.path().join(".standalone/standalone-info.json").exists());
}

#[tokio::test]
async fn test_missing_artifact_fails_at_locate() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(dir.path(), "true");
    let mut generator = Generator::new(context(dir.path(), &freezer, BuildConfig::default()))
        .await
        .unwrap();

    let status = generator.generate().await.unwrap();
    assert!(matches!(status, BuildStatus::Failed { stage: Stage::ArtifactLocated, .. }));
    assert_eq!(generator.stage(), Stage::Frozen);
    // work directory is kept for inspection without --clean
    assert!(generator.context().work_dir().is_dir());
}

#[tokio::test]
async fn test_ambiguous_artifact_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let freezer = freezer_stub(
        dir.path(),
        r#"touch "$dist/$name" "$dist/$name.exe""#,
    );
    let config = BuildConfig {
        clean: true,
        ..Default::default()
    };
    let mut generator = Generator::new(context(dir.path(), &freezer, config))
        .await
        .unwrap();

    let err = generator.generate().await.unwrap_err();
    match err {
        Error::AmbiguousArtifact { matches, .. } => assert_eq!(matches.len(), 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!generator.context().work_dir().exists());
}

#[tokio::test]
async fn test_existing_work_dir_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().join("work");
    std::fs::create_dir(&work_dir).unwrap();

    let pkg_dir = fixture_dir();
    let metadata = PyProjectMetadata::load(&pkg_dir).unwrap();
    let err = ContextBuilder::new(BuildConfig {
        pkg_dir,
        work_dir: Some(work_dir),
        output_dir: dir.path().join(".standalone"),
        language_version: Some("3.11".into()),
        ..Default::default()
    })
    .virtual_env(None)
    .build(&metadata)
    .unwrap_err();
    assert!(matches!(err, Error::WorkDirExists(_)));
}
