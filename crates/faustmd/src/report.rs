//! Extraction of [`Metadata`] from the XML report written by `faust -xml`.

use std::path::Path;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{MetaEntry, Metadata, Range, Scale, Widget, WidgetGroup, WidgetKind};
use crate::scrape::{MetaScope, Recovered};

const ROOT_ELEMENT: &str = "faust";

/// Reads the report file into memory.
pub fn read_report(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::ReportRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses report text; `path` is only used for diagnostics.
pub fn parse_report<'input>(
    text: &'input str,
    path: &Path,
) -> Result<roxmltree::Document<'input>> {
    roxmltree::Document::parse(text).map_err(|source| Error::ReportParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds the metadata model from a report plus any declarations recovered
/// from generated source.
///
/// Report-native declarations come first in document order; recovered ones
/// are appended in the order they were scraped. Sequences keep this order
/// because the generated tables are indexed by position.
pub fn extract(document: &roxmltree::Document<'_>, recovered: &[Recovered]) -> Result<Metadata> {
    let root = document.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(Error::UnexpectedRoot(root.tag_name().name().to_string()));
    }

    let mut global_recovered = Vec::new();
    let mut widget_recovered: FxHashMap<&str, Vec<&MetaEntry>> = FxHashMap::default();
    for item in recovered {
        match &item.scope {
            MetaScope::Global => global_recovered.push(&item.entry),
            MetaScope::Widget(var) => widget_recovered
                .entry(var.as_str())
                .or_default()
                .push(&item.entry),
        }
    }

    let mut md = Metadata {
        name: child_text(root, "name").to_string(),
        author: child_text(root, "author").to_string(),
        copyright: child_text(root, "copyright").to_string(),
        license: child_text(root, "license").to_string(),
        version: child_text(root, "version").to_string(),
        class_name: child_text(root, "classname").to_string(),
        inputs: required_child(root, "inputs")?,
        outputs: required_child(root, "outputs")?,
        ..Metadata::default()
    };

    md.metadata = meta_entries(root)
        .into_iter()
        .chain(global_recovered.into_iter().cloned())
        .collect();

    for group in [WidgetGroup::Active, WidgetGroup::Passive] {
        for node in widget_elements(root, group) {
            let var = child_text(node, "varname");
            let extra = widget_recovered.get(var).map(Vec::as_slice).unwrap_or_default();
            let widget = extract_widget(node, group, extra)?;
            match group {
                WidgetGroup::Active => md.active.push(widget),
                WidgetGroup::Passive => md.passive.push(widget),
            }
        }
    }

    debug!(
        class = %md.class_name,
        active = md.active.len(),
        passive = md.passive.len(),
        metadata = md.metadata.len(),
        "extracted report"
    );
    Ok(md)
}

fn extract_widget(
    node: roxmltree::Node<'_, '_>,
    group: WidgetGroup,
    recovered: &[&MetaEntry],
) -> Result<Widget> {
    let type_name = node
        .attribute("type")
        .ok_or_else(|| Error::MissingField("widget@type".to_string()))?;
    let kind =
        WidgetKind::from_name(type_name).ok_or_else(|| Error::UnknownWidgetKind(type_name.into()))?;
    if kind.group() != group {
        return Err(Error::MisplacedWidget {
            kind: type_name.to_string(),
            group: group.as_str(),
        });
    }

    let id_text = node
        .attribute("id")
        .ok_or_else(|| Error::MissingField("widget@id".to_string()))?;
    let id = parse_number::<i32>("widget@id", id_text)?;

    let mut widget = Widget::new(kind, id, child_text(node, "label"), child_text(node, "varname"));
    widget.range = match group {
        WidgetGroup::Active if kind.is_continuous() => Range {
            init: required_real(node, "init")?,
            min: required_real(node, "min")?,
            max: required_real(node, "max")?,
            step: required_real(node, "step")?,
        },
        WidgetGroup::Active => Range::TOGGLE,
        WidgetGroup::Passive => Range {
            min: required_real(node, "min")?,
            max: required_real(node, "max")?,
            ..Range::default()
        },
    };

    let entries = meta_entries(node)
        .into_iter()
        .chain(recovered.iter().map(|entry| (*entry).clone()));
    for entry in entries {
        if is_offset_key(&entry.key) && entry.value.is_empty() {
            continue;
        }
        interpret(&mut widget, &entry);
        widget.metadata.push(entry);
    }
    Ok(widget)
}

/// Applies the declarations this tool understands to the widget fields.
fn interpret(widget: &mut Widget, entry: &MetaEntry) {
    match entry.key.as_str() {
        "unit" => widget.unit.clone_from(&entry.value),
        "tooltip" => widget.tooltip.clone_from(&entry.value),
        "scale" => {
            widget.scale = Scale::from_name(&entry.value).unwrap_or_else(|| {
                warn!(
                    widget = %widget.label,
                    scale = %entry.value,
                    "unrecognized scale type, using linear"
                );
                Scale::Linear
            });
        }
        _ => {}
    }
}

/// The report generator emits ordering hints as `<meta key="N"/>`; those
/// carry no information for the header.
fn is_offset_key(key: &str) -> bool {
    let digits = key.strip_prefix('-').unwrap_or(key);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// `widget` children of `ui/activewidgets` or `ui/passivewidgets`.
pub(crate) fn widget_elements<'a, 'input>(
    root: roxmltree::Node<'a, 'input>,
    group: WidgetGroup,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    let container = match group {
        WidgetGroup::Active => "activewidgets",
        WidgetGroup::Passive => "passivewidgets",
    };
    child(root, "ui")
        .and_then(|ui| child(ui, container))
        .into_iter()
        .flat_map(|widgets| elements_named(widgets, "widget"))
}

/// Text of the first child element called `name`, or `""` when absent.
pub(crate) fn child_text<'a>(node: roxmltree::Node<'a, '_>, name: &str) -> &'a str {
    child(node, name)
        .and_then(|child| child.text())
        .unwrap_or_default()
}

fn child<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Option<roxmltree::Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
}

fn elements_named<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children()
        .filter(move |child| child.is_element() && child.tag_name().name() == name)
}

fn meta_entries(node: roxmltree::Node<'_, '_>) -> Vec<MetaEntry> {
    elements_named(node, "meta")
        .map(|meta| {
            MetaEntry::new(
                meta.attribute("key").unwrap_or_default(),
                meta.text().unwrap_or_default(),
            )
        })
        .collect()
}

fn required_child<T: FromStr>(node: roxmltree::Node<'_, '_>, name: &str) -> Result<T> {
    let text = child(node, name)
        .ok_or_else(|| Error::MissingField(name.to_string()))?
        .text()
        .unwrap_or_default();
    parse_number(name, text)
}

fn required_real(node: roxmltree::Node<'_, '_>, name: &str) -> Result<f64> {
    let value: f64 = required_child(node, name)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::NotNumeric {
            field: name.to_string(),
            value: child_text(node, name).to_string(),
        })
    }
}

fn parse_number<T: FromStr>(field: &str, text: &str) -> Result<T> {
    text.trim().parse().map_err(|_| Error::NotNumeric {
        field: field.to_string(),
        value: text.to_string(),
    })
}
