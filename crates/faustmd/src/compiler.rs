//! Invocation of the external `faust` compiler.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::scratch::ScratchDir;

/// Environment variable overriding the compiler executable.
pub const COMPILER_ENV: &str = "FAUST";
/// Executable used when [`COMPILER_ENV`] is unset or empty.
pub const DEFAULT_COMPILER: &str = "faust";

/// How to run the compiler for one `.dsp` file.
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Program to run, `faust` unless overridden.
    pub executable: OsString,
    /// Passed as `-I <dir>`, in order.
    pub include_dirs: Vec<PathBuf>,
    /// Passed as `-cn <name>`.
    pub class_name: Option<String>,
    /// Passed as `-pn <name>`.
    pub process_name: Option<String>,
    /// Appended verbatim before the source file.
    pub extra_args: Vec<OsString>,
    /// Directory that receives the per-run scratch directory.
    pub scratch_root: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            executable: OsString::from(DEFAULT_COMPILER),
            include_dirs: Vec::new(),
            class_name: None,
            process_name: None,
            extra_args: Vec::new(),
            scratch_root: std::env::temp_dir(),
        }
    }
}

impl CompilerConfig {
    /// Default configuration with the executable taken from `$FAUST`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            executable: resolve_executable(std::env::var_os(COMPILER_ENV)),
            ..Self::default()
        }
    }
}

fn resolve_executable(value: Option<OsString>) -> OsString {
    value
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| OsString::from(DEFAULT_COMPILER))
}

/// Files produced by a successful compiler run.
///
/// Both live inside the scratch directory and disappear with it.
#[derive(Debug, Clone)]
pub struct CompilerOutput {
    /// XML report (`<base>.xml`).
    pub report: PathBuf,
    /// Generated C++ source (`<base>.cpp`).
    pub source: PathBuf,
}

/// Compiles `dsp_file` into `scratch`, asking for an XML report and C++
/// source in double precision.
pub fn compile(
    dsp_file: &Path,
    config: &CompilerConfig,
    scratch: &mut ScratchDir,
) -> Result<CompilerOutput> {
    let base = dsp_file
        .file_name()
        .map_or_else(|| dsp_file.as_os_str().to_os_string(), OsStr::to_os_string);
    let cpp_name = with_suffix(&base, ".cpp");
    let report = scratch.track(with_suffix(&base, ".xml"));
    let source = scratch.track(&cpp_name);

    let args = compiler_args(dsp_file, config, scratch.path(), &cpp_name);
    run(&config.executable, &args)?;
    Ok(CompilerOutput { report, source })
}

/// Argument vector following the executable name.
#[must_use]
pub fn compiler_args(
    dsp_file: &Path,
    config: &CompilerConfig,
    workdir: &Path,
    cpp_name: &OsStr,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-double".into(),
        "-xml".into(),
        "-O".into(),
        workdir.into(),
        "-o".into(),
        cpp_name.into(),
    ];
    for dir in &config.include_dirs {
        args.push("-I".into());
        args.push(dir.into());
    }
    if let Some(name) = &config.class_name {
        args.push("-cn".into());
        args.push(name.into());
    }
    if let Some(name) = &config.process_name {
        args.push("-pn".into());
        args.push(name.into());
    }
    args.extend(config.extra_args.iter().cloned());
    args.push(dsp_file.into());
    args
}

/// Runs the compiler to completion. Its stdout is sent to our stderr so
/// that the header stream only carries generated code.
fn run(program: &OsStr, args: &[OsString]) -> Result<()> {
    let name = program.to_string_lossy().into_owned();
    info!(program = %name, "running compiler");
    debug!(?args, "compiler arguments");

    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(std::io::stderr())
        .status()
        .map_err(|source| Error::CompilerLaunch {
            program: name.clone(),
            source,
        })?;

    match status.code() {
        Some(0) => Ok(()),
        Some(code) => Err(Error::CompilerFailed {
            program: name,
            code,
        }),
        None => Err(Error::CompilerTerminated { program: name }),
    }
}

fn with_suffix(base: &OsStr, suffix: &str) -> OsString {
    let mut name = base.to_os_string();
    name.push(suffix);
    name
}
