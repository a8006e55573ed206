//! `faustmd` - C++ metadata headers for Faust DSP programs.
//!
//! A run compiles one `.dsp` file with the external `faust` compiler inside
//! a private scratch directory, reads the XML report it writes, fills in
//! declarations the report left out from the generated C++ source, and
//! renders the result as a header of constant tables and accessors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// External compiler invocation.
pub mod compiler;
/// Error types.
pub mod error;
/// Header code generation.
pub mod header;
/// C literal and identifier helpers.
pub mod literal;
/// Metadata model.
pub mod model;
/// Compile-to-header pipeline.
pub mod pipeline;
/// XML report extraction.
pub mod report;
/// Scratch directory management.
pub mod scratch;
/// Metadata recovery from generated source.
pub mod scrape;

pub use compiler::{CompilerConfig, CompilerOutput};
pub use error::{Error, Result};
pub use header::{render, HeaderOptions};
pub use model::{MetaEntry, Metadata, Range, Scale, Widget, WidgetGroup, WidgetKind};
pub use pipeline::{collect, generate, metadata_from_report};
