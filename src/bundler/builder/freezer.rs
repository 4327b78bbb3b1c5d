//! Freezer invocation.
//!
//! The command line is modeled as an ordered list of flags plus positional
//! arguments and only flattened into an argument vector at the call site.

use crate::bundler::error::{Error, Result};
use crate::bundler::settings::BuildContext;
use std::path::{Path, PathBuf};

/// Structured freezer command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreezerCommand {
    program: PathBuf,
    flags: Vec<(String, Option<String>)>,
    positionals: Vec<String>,
}

impl FreezerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            flags: Vec::new(),
            positionals: Vec::new(),
        }
    }

    /// Adds a value-less flag such as `--onefile`.
    pub fn flag(mut self, name: &str) -> Self {
        self.flags.push((name.to_string(), None));
        self
    }

    /// Adds a flag followed by its value.
    pub fn option(mut self, name: &str, value: impl Into<String>) -> Self {
        self.flags.push((name.to_string(), Some(value.into())));
        self
    }

    pub fn positional(mut self, value: impl Into<String>) -> Self {
        self.positionals.push(value.into());
        self
    }

    /// Builds the one-file freeze command for `context`.
    ///
    /// Every output location is rooted under the work directory. Hidden
    /// imports are passed once each, first occurrence wins.
    pub fn for_context(
        context: &BuildContext,
        program: impl Into<PathBuf>,
        script: &Path,
        hidden_imports: &[String],
    ) -> Self {
        let mut command = Self::new(program).flag("--noconfirm");
        if context.clean() {
            command = command.flag("--clean");
        }
        command = command.flag("--onefile");
        if !context.platform().is_windows() {
            command = command.option("--runtime-tmpdir", ".");
        }
        command = command
            .option("--name", context.standalone_name())
            .option("--paths", display(&context.source_root()))
            .option("--additional-hooks-dir", display(&context.hooks_dir()))
            .option("--specpath", display(context.work_dir()))
            .option("--workpath", display(&context.build_dir()))
            .option("--distpath", display(&context.dist_dir()));

        let mut seen = Vec::new();
        for module in hidden_imports {
            if !seen.contains(module) {
                seen.push(module.clone());
                command = command.option("--hidden-import", module.clone());
            }
        }

        command.positional(display(script))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Flattened argument vector, without the program.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.flags.len() * 2 + self.positionals.len());
        for (name, value) in &self.flags {
            args.push(name.clone());
            if let Some(value) = value {
                args.push(value.clone());
            }
        }
        args.extend(self.positionals.iter().cloned());
        args
    }

    /// Values given for a flag, in order.
    pub fn values_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.flags
            .iter()
            .filter(move |(flag, _)| flag == name)
            .filter_map(|(_, value)| value.as_deref())
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.iter().any(|(flag, _)| flag == name)
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Runs the freezer and waits for it to exit.
///
/// Output is captured; it is logged only when `verbose` is set.
///
/// # Errors
///
/// - [`Error::CommandFailed`] if the program cannot be started
/// - [`Error::FreezerFailed`] on a non-zero exit
pub async fn run_freezer(command: &FreezerCommand, verbose: bool) -> Result<()> {
    log::info!("Running {}...", command.program().display());
    log::debug!("{} {}", command.program().display(), command.args().join(" "));

    let output = tokio::process::Command::new(command.program())
        .args(command.args())
        .output()
        .await
        .map_err(|e| Error::CommandFailed {
            command: command.program().display().to_string(),
            error: e,
        })?;

    if verbose {
        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("freezer: {}", line);
        }
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            log::debug!("freezer: {}", line);
        }
    }

    if !output.status.success() {
        log::error!("Freezer exited with error code: {:?}", output.status.code());
        return Err(Error::FreezerFailed {
            code: output.status.code(),
        });
    }

    Ok(())
}
