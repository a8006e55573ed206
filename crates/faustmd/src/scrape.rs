//! Metadata recovery from generated C++ source.
//!
//! Some `faust` releases leave `declare` statements out of the XML report
//! even though `metadata()` and `buildUserInterface()` in the generated
//! class still contain them. When the report carries no `<meta>` element at
//! all, the generated source is scanned for those calls instead.

use std::io::{BufRead, BufReader};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::literal::{self, LiteralError};
use crate::model::{MetaEntry, WidgetGroup};
use crate::report;

const STRING_LITERAL: &str = r#""(?:\\.|[^"\\])*""#;
const IDENTIFIER: &str = r"[a-zA-Z_][0-9a-zA-Z_]*";

static GLOBAL_DECLARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*m->declare\(({STRING_LITERAL}), ({STRING_LITERAL})\);$"
    ))
    .expect("global declare pattern")
});

static WIDGET_DECLARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*ui_interface->declare\(&({IDENTIFIER}), ({STRING_LITERAL}), ({STRING_LITERAL})\);$"
    ))
    .expect("widget declare pattern")
});

/// Where a recovered declaration belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaScope {
    /// Program-wide declaration.
    Global,
    /// Widget identified by its storage variable.
    Widget(String),
}

/// One declaration recovered from generated source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    /// Target of the declaration.
    pub scope: MetaScope,
    /// Decoded key and value.
    pub entry: MetaEntry,
}

/// Returns the declarations the report is missing, or nothing when the
/// report already has at least one `<meta>` element.
pub fn recover(document: &roxmltree::Document<'_>, source: &Path) -> Result<Vec<Recovered>> {
    let root = document.root_element();
    if has_meta(root) {
        debug!("report carries metadata, skipping source scrape");
        return Ok(Vec::new());
    }

    info!(source = %source.display(), "report has no metadata, scraping generated source");
    let known_vars = widget_vars(root);
    let file = std::fs::File::open(source).map_err(|err| Error::SourceRead {
        path: source.to_path_buf(),
        source: err,
    })?;
    let recovered =
        scrape_reader(BufReader::new(file), &known_vars).map_err(|err| Error::SourceRead {
            path: source.to_path_buf(),
            source: err,
        })?;
    debug!(count = recovered.len(), "recovered declarations");
    Ok(recovered)
}

/// True if any element named `meta` exists below `root`.
#[must_use]
pub fn has_meta(root: roxmltree::Node<'_, '_>) -> bool {
    root.descendants()
        .any(|node| node.is_element() && node.tag_name().name() == "meta")
}

fn widget_vars<'a>(root: roxmltree::Node<'a, '_>) -> FxHashSet<&'a str> {
    [WidgetGroup::Active, WidgetGroup::Passive]
        .into_iter()
        .flat_map(|group| report::widget_elements(root, group))
        .map(|widget| report::child_text(widget, "varname"))
        .collect()
}

/// Scans `reader` line by line. Widget declarations naming a variable that
/// is not in `known_vars` are dropped.
pub fn scrape_reader(
    mut reader: impl BufRead,
    known_vars: &FxHashSet<&str>,
) -> std::io::Result<Vec<Recovered>> {
    let mut recovered = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);
        match scrape_line(line) {
            Some(Ok(item)) => match &item.scope {
                MetaScope::Widget(var) if !known_vars.contains(var.as_str()) => {
                    debug!(var = %var, key = %item.entry.key, "declaration for unknown widget dropped");
                }
                _ => recovered.push(item),
            },
            Some(Err(err)) => {
                debug!(line = %line, error = %err, "malformed literal in declaration, line skipped");
            }
            None => {}
        }
    }
    Ok(recovered)
}

/// Matches one source line against the two declaration shapes.
fn scrape_line(line: &str) -> Option<std::result::Result<Recovered, LiteralError>> {
    if let Some(caps) = GLOBAL_DECLARE.captures(line) {
        return Some(decode_entry(&caps[1], &caps[2]).map(|entry| Recovered {
            scope: MetaScope::Global,
            entry,
        }));
    }
    let caps = WIDGET_DECLARE.captures(line)?;
    Some(decode_entry(&caps[2], &caps[3]).map(|entry| Recovered {
        scope: MetaScope::Widget(caps[1].to_string()),
        entry,
    }))
}

fn decode_entry(key: &str, value: &str) -> std::result::Result<MetaEntry, LiteralError> {
    Ok(MetaEntry::new(literal::unescape(key)?, literal::unescape(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(key: &str, value: &str) -> Recovered {
        Recovered {
            scope: MetaScope::Global,
            entry: MetaEntry::new(key, value),
        }
    }

    fn widget(var: &str, key: &str, value: &str) -> Recovered {
        Recovered {
            scope: MetaScope::Widget(var.to_string()),
            entry: MetaEntry::new(key, value),
        }
    }

    fn scrape(text: &str, vars: &[&str]) -> Vec<Recovered> {
        let known = vars.iter().copied().collect::<FxHashSet<_>>();
        scrape_reader(text.as_bytes(), &known).expect("scrape in-memory text")
    }

    #[test]
    fn recognizes_global_declarations() {
        assert_eq!(
            scrape_line(r#"        m->declare("author", "Jane Doe");"#),
            Some(Ok(global("author", "Jane Doe")))
        );
        assert_eq!(
            scrape_line(r#"m->declare("filename", "gain.dsp");"#),
            Some(Ok(global("filename", "gain.dsp")))
        );
    }

    #[test]
    fn recognizes_widget_declarations() {
        assert_eq!(
            scrape_line(r#"        ui_interface->declare(&fHslider0, "unit", "dB");"#),
            Some(Ok(widget("fHslider0", "unit", "dB")))
        );
    }

    #[test]
    fn decodes_escapes_in_operands() {
        assert_eq!(
            scrape_line(r#"m->declare("description", "say \"hi\"\tnow");"#),
            Some(Ok(global("description", "say \"hi\"\tnow")))
        );
    }

    #[test]
    fn requires_whole_line_match() {
        assert_eq!(scrape_line(r#"m->declare("a", "b"); // trailing"#), None);
        assert_eq!(scrape_line(r#"x = m->declare("a", "b");"#), None);
        assert_eq!(scrape_line(r#"m->declare("a","b");"#), None);
        assert_eq!(scrape_line(r#"ui_interface->declare(0, "unit", "dB");"#), None);
        assert_eq!(scrape_line(r#"ui_interface->declare(&fX, "unit", "dB")"#), None);
        assert_eq!(scrape_line(""), None);
    }

    #[test]
    fn scrape_keeps_line_order_and_strips_crlf() {
        let text = "class mydsp {\r\n\
                    \tm->declare(\"name\", \"Gain\");\r\n\
                    \tm->declare(\"name\", \"Again\");\r\n\
                    \tui_interface->declare(&fGain, \"unit\", \"dB\");\r\n\
                    \tui_interface->declare(&fLevel, \"scale\", \"log\");\n\
                    }";
        assert_eq!(
            scrape(text, &["fGain", "fLevel"]),
            vec![
                global("name", "Gain"),
                global("name", "Again"),
                widget("fGain", "unit", "dB"),
                widget("fLevel", "scale", "log"),
            ]
        );
    }

    #[test]
    fn unknown_widget_variables_are_dropped() {
        let text = "ui_interface->declare(&fGain, \"unit\", \"dB\");\n\
                    ui_interface->declare(&fGhost, \"unit\", \"Hz\");\n";
        assert_eq!(scrape(text, &["fGain"]), vec![widget("fGain", "unit", "dB")]);
    }

    #[test]
    fn invalid_utf8_does_not_abort_the_scan() {
        let mut bytes = b"// \xff\xfe garbage\n".to_vec();
        bytes.extend_from_slice(b"m->declare(\"author\", \"Jane Doe\");\n");
        let known = FxHashSet::default();
        let recovered = scrape_reader(bytes.as_slice(), &known).expect("scrape bytes");
        assert_eq!(recovered, vec![global("author", "Jane Doe")]);
    }

    #[test]
    fn has_meta_looks_at_every_depth() {
        let flat = roxmltree::Document::parse("<faust><name>x</name></faust>").expect("parse");
        assert!(!has_meta(flat.root_element()));
        let nested = roxmltree::Document::parse(
            "<faust><ui><activewidgets><widget><meta key=\"unit\">dB</meta></widget></activewidgets></ui></faust>",
        )
        .expect("parse");
        assert!(has_meta(nested.root_element()));
    }

    #[test]
    fn recover_skips_when_report_has_meta() {
        let doc = roxmltree::Document::parse("<faust><meta key=\"author\">A</meta></faust>")
            .expect("parse");
        let missing = Path::new("/nonexistent/faustmd/source.cpp");
        assert_eq!(recover(&doc, missing).expect("no read needed"), Vec::new());
    }

    #[test]
    fn recover_reports_unreadable_source() {
        let doc = roxmltree::Document::parse("<faust/>").expect("parse");
        let missing = Path::new("/nonexistent/faustmd/source.cpp");
        let err = recover(&doc, missing).expect_err("must fail");
        assert!(matches!(err, Error::SourceRead { .. }));
    }
}
