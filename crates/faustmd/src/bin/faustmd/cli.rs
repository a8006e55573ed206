//! CLI definitions for faustmd.

use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "faustmd",
    version,
    about = "Generate a C++ metadata header from a Faust DSP file",
    after_help = "Examples:\n  faustmd gain.dsp > gain.meta.hpp\n  faustmd -I lib -cn Gain gain.dsp\n  FAUST=/opt/faust/bin/faust faustmd --faust-arg -vec gain.dsp"
)]
pub struct Cli {
    /// Add a directory to the compiler's import search path.
    #[arg(short = 'I', value_name = "DIR", action = ArgAction::Append)]
    pub include_dirs: Vec<PathBuf>,
    /// Class name passed to the compiler (`-cn`).
    #[arg(long = "cn", value_name = "NAME")]
    pub class_name: Option<String>,
    /// Process name passed to the compiler (`-pn`).
    #[arg(long = "pn", value_name = "NAME")]
    pub process_name: Option<String>,
    /// Extra argument forwarded to the compiler verbatim.
    #[arg(
        long = "faust-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        action = ArgAction::Append
    )]
    pub faust_args: Vec<OsString>,
    /// Suffix accessor names that would otherwise collide.
    #[arg(long)]
    pub unique_accessors: bool,
    /// Log compiler invocation and extraction details.
    #[arg(long, short)]
    pub verbose: bool,
    /// Faust source file.
    #[arg(value_name = "FILE.dsp")]
    pub dsp_file: PathBuf,
}

/// Options whose next token is their value.
const VALUE_OPTIONS: &[&str] = &["-I", "--cn", "--pn", "--faust-arg"];

/// Rewrites the single-dash `-cn`/`-pn` spellings to their long form.
///
/// Tokens after `--` and option values are left alone.
pub fn normalize_legacy_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut out = Vec::new();
    let mut passthrough = false;
    let mut value_next = false;
    for arg in args {
        if passthrough || value_next {
            value_next = false;
            out.push(arg);
            continue;
        }
        let long_form = match arg.to_str() {
            Some("-cn") => Some("--cn"),
            Some("-pn") => Some("--pn"),
            _ => None,
        };
        let arg = long_form.map_or(arg, OsString::from);
        let text = arg.to_str().unwrap_or_default();
        passthrough = text == "--";
        value_next = VALUE_OPTIONS.contains(&text);
        out.push(arg);
    }
    out
}
