//! In-memory model of the metadata exposed by a compiled Faust program.

use std::fmt;

/// One key/value declaration, either program-wide or scoped to a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    /// Declaration key, e.g. `author` or `unit`.
    pub key: String,
    /// Declaration value, unescaped.
    pub value: String,
}

impl MetaEntry {
    /// Builds an entry from anything string-like.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Everything the header generator needs about one program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Program name (`<name>`).
    pub name: String,
    /// `<author>`, empty when absent.
    pub author: String,
    /// `<copyright>`, empty when absent.
    pub copyright: String,
    /// `<license>`, empty when absent.
    pub license: String,
    /// `<version>`, empty when absent.
    pub version: String,
    /// Name of the generated DSP class.
    pub class_name: String,
    /// Number of audio inputs.
    pub inputs: u32,
    /// Number of audio outputs.
    pub outputs: u32,
    /// Global declarations in declaration order; duplicate keys are kept.
    pub metadata: Vec<MetaEntry>,
    /// Active widgets in report order.
    pub active: Vec<Widget>,
    /// Passive widgets in report order.
    pub passive: Vec<Widget>,
}

impl Metadata {
    /// Widgets of one group.
    #[must_use]
    pub fn widgets(&self, group: WidgetGroup) -> &[Widget] {
        match group {
            WidgetGroup::Active => &self.active,
            WidgetGroup::Passive => &self.passive,
        }
    }
}

/// The two widget collections of a Faust user interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetGroup {
    /// User-settable controls.
    Active,
    /// Read-only displays.
    Passive,
}

impl WidgetGroup {
    /// Identifier prefix used in the report and the generated header.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
        }
    }
}

/// Widget type as named by the report's `type` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    /// `button`
    Button,
    /// `checkbox`
    CheckBox,
    /// `vslider`
    VSlider,
    /// `hslider`
    HSlider,
    /// `nentry`
    NEntry,
    /// `vbargraph`
    VBarGraph,
    /// `hbargraph`
    HBarGraph,
}

impl WidgetKind {
    /// Parses the `type` attribute of a report `<widget>`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "button" => Some(Self::Button),
            "checkbox" => Some(Self::CheckBox),
            "vslider" => Some(Self::VSlider),
            "hslider" => Some(Self::HSlider),
            "nentry" => Some(Self::NEntry),
            "vbargraph" => Some(Self::VBarGraph),
            "hbargraph" => Some(Self::HBarGraph),
            _ => None,
        }
    }

    /// Report and header spelling.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Button => "button",
            Self::CheckBox => "checkbox",
            Self::VSlider => "vslider",
            Self::HSlider => "hslider",
            Self::NEntry => "nentry",
            Self::VBarGraph => "vbargraph",
            Self::HBarGraph => "hbargraph",
        }
    }

    /// Group this kind must appear in.
    #[must_use]
    pub fn group(self) -> WidgetGroup {
        match self {
            Self::Button | Self::CheckBox | Self::VSlider | Self::HSlider | Self::NEntry => {
                WidgetGroup::Active
            }
            Self::VBarGraph | Self::HBarGraph => WidgetGroup::Passive,
        }
    }

    /// Sliders and numeric entries carry their own init/min/max/step.
    #[must_use]
    pub fn is_continuous(self) -> bool {
        matches!(self, Self::VSlider | Self::HSlider | Self::NEntry)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value mapping hint attached through the `scale` widget declaration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scale {
    /// Linear mapping (default).
    #[default]
    Linear,
    /// Logarithmic mapping.
    Log,
    /// Exponential mapping.
    Exp,
}

impl Scale {
    /// Parses a `scale` declaration value.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linear" => Some(Self::Linear),
            "log" => Some(Self::Log),
            "exp" => Some(Self::Exp),
            _ => None,
        }
    }

    /// Header spelling (`scale_t::...`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
            Self::Exp => "exp",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Numeric range of a widget.
///
/// Bar graphs only populate `min` and `max`; buttons and checkboxes use the
/// fixed `0/0/1/1` range. No ordering between the fields is enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Range {
    /// Initial value.
    pub init: f64,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Increment.
    pub step: f64,
}

impl Range {
    /// Range of buttons and checkboxes.
    pub const TOGGLE: Self = Self {
        init: 0.0,
        min: 0.0,
        max: 1.0,
        step: 1.0,
    };
}

/// One UI element of the program.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// Widget type.
    pub kind: WidgetKind,
    /// Compiler-assigned id; ordering hint only, not contiguous.
    pub id: i32,
    /// User-facing label.
    pub label: String,
    /// Field of the generated DSP class that stores the widget value.
    pub var: String,
    /// Value range.
    pub range: Range,
    /// Widget declarations in order, offset-style keys excluded.
    pub metadata: Vec<MetaEntry>,
    /// Last `unit` declaration, empty when none.
    pub unit: String,
    /// Last recognized `scale` declaration.
    pub scale: Scale,
    /// Last `tooltip` declaration, empty when none.
    pub tooltip: String,
}

impl Widget {
    /// Widget with a zero range and no declarations.
    pub fn new(kind: WidgetKind, id: i32, label: impl Into<String>, var: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            label: label.into(),
            var: var.into(),
            range: Range::default(),
            metadata: Vec::new(),
            unit: String::new(),
            scale: Scale::Linear,
            tooltip: String::new(),
        }
    }
}
