//! End-to-end run: compile, recover, extract, render.

use std::path::Path;

use tracing::debug;

use crate::compiler::{self, CompilerConfig};
use crate::error::Result;
use crate::header::{self, HeaderOptions};
use crate::model::Metadata;
use crate::report;
use crate::scratch::{ScratchDir, SCRATCH_PREFIX};
use crate::scrape;

/// Compiles `dsp_file` and returns the metadata header for it.
///
/// The scratch directory and the compiler outputs are removed before this
/// returns, whether it succeeds or not.
pub fn generate(
    dsp_file: &Path,
    config: &CompilerConfig,
    options: HeaderOptions,
) -> Result<String> {
    let md = collect(dsp_file, config)?;
    Ok(header::render(&md, options))
}

/// Compiles `dsp_file` and extracts its metadata model.
pub fn collect(dsp_file: &Path, config: &CompilerConfig) -> Result<Metadata> {
    let mut scratch = ScratchDir::create_in(&config.scratch_root, SCRATCH_PREFIX)?;
    let output = compiler::compile(dsp_file, config, &mut scratch)?;
    let text = report::read_report(&output.report)?;
    metadata_from_report(&text, &output.report, &output.source)
}

/// Extracts metadata from report text, scraping `source` when the report
/// carries no declarations. `report_path` is used for diagnostics only.
pub fn metadata_from_report(text: &str, report_path: &Path, source: &Path) -> Result<Metadata> {
    let document = report::parse_report(text, report_path)?;
    let recovered = scrape::recover(&document, source)?;
    debug!(recovered = recovered.len(), "merging report and recovered declarations");
    report::extract(&document, &recovered)
}
