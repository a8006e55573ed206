//! CLI entrypoint for faustmd.

#[path = "faustmd/cli.rs"]
mod cli;
#[path = "faustmd/style.rs"]
mod style;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::Level;

use cli::Cli;
use faustmd::{CompilerConfig, HeaderOptions};

fn main() {
    if let Err(err) = run() {
        eprintln!("{}", style::error(format!("Error: {err:#}")));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = cli::normalize_legacy_flags(std::env::args_os());
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };
    init_logging(cli.verbose);

    let config = CompilerConfig {
        include_dirs: cli.include_dirs,
        class_name: cli.class_name,
        process_name: cli.process_name,
        extra_args: cli.faust_args,
        ..CompilerConfig::from_env()
    };
    let options = HeaderOptions {
        unique_accessors: cli.unique_accessors,
    };

    let header = faustmd::generate(&cli.dsp_file, &config, options)
        .with_context(|| format!("cannot generate metadata for {}", cli.dsp_file.display()))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(header.as_bytes())
        .and_then(|()| stdout.flush())
        .context("cannot write header to stdout")?;
    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
