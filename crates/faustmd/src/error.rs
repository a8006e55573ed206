//! Errors raised while turning a Faust program into a metadata header.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors for a single `faustmd` run.
///
/// Every variant aborts the run; recoverable conditions (malformed scraped
/// literals, unknown scale keywords) are logged instead of surfacing here.
#[derive(Debug, Error)]
pub enum Error {
    /// The scratch directory could not be created for a reason other than
    /// a name collision.
    #[error("failed to create scratch directory '{path}'")]
    ScratchDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compiler executable could not be started.
    #[error("failed to launch '{program}'")]
    CompilerLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The compiler was terminated without an exit status (e.g. by a signal).
    #[error("'{program}' terminated abnormally")]
    CompilerTerminated { program: String },

    /// The compiler exited with a non-zero status.
    #[error("'{program}' exited with status {code}")]
    CompilerFailed { program: String, code: i32 },

    /// The XML report could not be read from disk.
    #[error("failed to read report '{path}'")]
    ReportRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The XML report is not well-formed.
    #[error("failed to parse report '{path}'")]
    ReportParse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    /// The report root is not a `<faust>` element.
    #[error("unexpected report root element '{0}', expected 'faust'")]
    UnexpectedRoot(String),

    /// A mandatory element or attribute is absent.
    #[error("missing required field '{0}'")]
    MissingField(String),

    /// A field that must hold a number does not.
    #[error("field '{field}' is not a valid number: '{value}'")]
    NotNumeric { field: String, value: String },

    /// A widget declares a `type` this tool does not know.
    #[error("unknown widget type '{0}'")]
    UnknownWidgetKind(String),

    /// A widget kind was found in the wrong widget group.
    #[error("widget type '{kind}' is not allowed among {group} widgets")]
    MisplacedWidget { kind: String, group: &'static str },

    /// The generated C++ source could not be read while scraping metadata.
    #[error("failed to read generated source '{path}'")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
