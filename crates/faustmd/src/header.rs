//! C++ header rendering.
//!
//! The header is self-contained apart from two macros supplied by the
//! includer: `FAUSTCLASS`, the generated DSP class, and `FAUSTFLOAT`, its
//! sample type. Field offsets are emitted as expressions over `FAUSTCLASS`
//! and resolved by the C++ compiler; nothing here knows the class layout.

use rustc_hash::FxHashSet;

use crate::literal::{cpp_string, mangle};
use crate::model::{MetaEntry, Metadata, Widget, WidgetGroup};

/// Generator switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderOptions {
    /// Suffix repeated accessor names (`get_Gain`, `get_Gain_2`, ...)
    /// instead of emitting one function per widget as-is.
    pub unique_accessors: bool,
}

/// Renders the complete header for `md`.
#[must_use]
pub fn render(md: &Metadata, options: HeaderOptions) -> String {
    let ident = format!("{}_meta", mangle(&md.class_name));
    let mut out = String::new();

    out.push_str(&format!("#ifndef __{ident}_H__\n"));
    out.push_str(&format!("#define __{ident}_H__\n"));
    out.push('\n');
    out.push_str("#include <cstddef>\n");
    out.push('\n');
    out.push_str("#ifndef FAUSTMETA\n");
    out.push_str(&format!("#define FAUSTMETA {ident}\n"));
    out.push_str("#endif\n");
    out.push('\n');
    out.push_str("#ifdef __GNUC__\n");
    out.push_str("#define FMSTATIC __attribute__((unused)) static\n");
    out.push_str("#else\n");
    out.push_str("#define FMSTATIC static\n");
    out.push_str("#endif\n");
    out.push('\n');

    out.push_str(&format!("namespace {ident} {{\n"));
    out.push_str("\tstruct metadata_t { const char *key; const char *value; };\n");
    out.push_str("\tenum class active_type_t { button, checkbox, vslider, hslider, nentry };\n");
    out.push_str("\tenum class passive_type_t { vbargraph, hbargraph };\n");
    out.push_str("\tenum class scale_t { linear, log, exp };\n");
    out.push('\n');

    for (field, value) in [
        ("name", &md.name),
        ("author", &md.author),
        ("copyright", &md.copyright),
        ("license", &md.license),
        ("version", &md.version),
        ("classname", &md.class_name),
    ] {
        out.push_str(&format!(
            "\tFMSTATIC constexpr char {field}[] = {};\n",
            cpp_string(value)
        ));
    }
    for (field, value) in [
        ("inputs", md.inputs as usize),
        ("outputs", md.outputs as usize),
        ("actives", md.active.len()),
        ("passives", md.passive.len()),
    ] {
        out.push_str(&format!("\tFMSTATIC constexpr unsigned {field} = {value};\n"));
    }
    out.push('\n');

    out.push_str(&format!(
        "\tFMSTATIC const metadata_t metadata[] = {{{}}};\n",
        meta_table(&md.metadata)
    ));
    out.push('\n');

    // Both groups emit `get_` accessors into the same namespace.
    let mut used = FxHashSet::default();
    for group in [WidgetGroup::Active, WidgetGroup::Passive] {
        let widgets = md.widgets(group);
        let stems = accessor_stems(widgets, options.unique_accessors, &mut used);
        render_widgets(&mut out, group, widgets, &stems);
        if group == WidgetGroup::Active {
            out.push('\n');
        }
    }

    out.push_str("}\n");
    out.push('\n');
    out.push_str("#undef FMSTATIC\n");
    out.push_str(&format!("#endif // __{ident}_H__\n"));
    out
}

fn render_widgets(out: &mut String, group: WidgetGroup, widgets: &[Widget], stems: &[String]) {
    let prefix = group.as_str();
    let array = |decl: &str, name: &str, item: &dyn Fn(&Widget) -> String| {
        let items = widgets.iter().map(item).collect::<Vec<_>>().join(", ");
        format!("\tFMSTATIC {decl} {prefix}_{name}[] = {{{items}}};\n")
    };

    let type_decl = format!("constexpr {prefix}_type_t");
    out.push_str(&array(&type_decl, "type", &|w| format!("{prefix}_type_t::{}", w.kind)));
    out.push_str(&array("constexpr int", "id", &|w| w.id.to_string()));
    out.push_str(&array("const char *const", "label", &|w| cpp_string(&w.label)));
    out.push_str(&array("const char *const", "symbol", &|w| cpp_string(&mangle(&w.label))));
    out.push_str(&array("const std::size_t", "offsets", &|w| {
        format!("(size_t)&((FAUSTCLASS *)0)->{}", w.var)
    }));
    out.push_str(&array("constexpr FAUSTFLOAT", "init", &|w| cpp_real(w.range.init)));
    out.push_str(&array("constexpr FAUSTFLOAT", "min", &|w| cpp_real(w.range.min)));
    out.push_str(&array("constexpr FAUSTFLOAT", "max", &|w| cpp_real(w.range.max)));
    out.push_str(&array("constexpr FAUSTFLOAT", "step", &|w| cpp_real(w.range.step)));
    out.push('\n');

    out.push_str(&array("const char *const", "unit", &|w| cpp_string(&w.unit)));
    out.push_str(&array("constexpr scale_t", "scale", &|w| format!("scale_t::{}", w.scale)));
    out.push_str(&array("const char *const", "tooltip", &|w| cpp_string(&w.tooltip)));
    out.push('\n');

    out.push_str(&array("const metadata_t *const", "metadata", &|w| {
        format!("(metadata_t[]){{{}}}", meta_table(&w.metadata))
    }));
    out.push_str(&array("constexpr std::size_t", "metadata_size", &|w| w.metadata.len().to_string()));
    out.push('\n');

    if group == WidgetGroup::Active {
        out.push_str(&format!(
            "\tFMSTATIC inline void {prefix}_set(FAUSTCLASS &x, unsigned idx, FAUSTFLOAT v) {{ *(FAUSTFLOAT *)((char *)&x + {prefix}_offsets[idx]) = v; }}\n"
        ));
    }
    out.push_str(&format!(
        "\tFMSTATIC inline FAUSTFLOAT {prefix}_get(const FAUSTCLASS &x, unsigned idx) {{ return *(const FAUSTFLOAT *)((const char *)&x + {prefix}_offsets[idx]); }}\n"
    ));
    out.push('\n');

    if group == WidgetGroup::Active {
        for (widget, stem) in widgets.iter().zip(stems) {
            out.push_str(&format!(
                "\tFMSTATIC inline void set_{stem}(FAUSTCLASS &x, FAUSTFLOAT v) {{ x.{} = v; }}\n",
                widget.var
            ));
        }
    }
    for (widget, stem) in widgets.iter().zip(stems) {
        out.push_str(&format!(
            "\tFMSTATIC inline FAUSTFLOAT get_{stem}(const FAUSTCLASS &x) {{ return x.{}; }}\n",
            widget.var
        ));
    }
}

fn meta_table(entries: &[MetaEntry]) -> String {
    entries
        .iter()
        .map(|entry| format!("{{{}, {}}}", cpp_string(&entry.key), cpp_string(&entry.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Name parts following `set_`/`get_` for each widget, in widget order.
///
/// With `unique`, names already in `used` get a numeric suffix and every
/// returned name is added to `used`.
fn accessor_stems(widgets: &[Widget], unique: bool, used: &mut FxHashSet<String>) -> Vec<String> {
    widgets
        .iter()
        .map(|widget| {
            // Mangled with the prefix in place so a leading digit survives.
            let stem = mangle(&format!("get_{}", widget.label)).split_off("get_".len());
            if !unique || used.insert(stem.clone()) {
                return stem;
            }
            let mut n = 2_usize;
            loop {
                let candidate = format!("{stem}_{n}");
                if used.insert(candidate.clone()) {
                    return candidate;
                }
                n += 1;
            }
        })
        .collect()
}

/// Formats a real as a C++ floating literal body.
fn cpp_real(value: f64) -> String {
    let magnitude = value.abs();
    if value != 0.0 && !(1e-5..1e15).contains(&magnitude) {
        format!("{value:e}")
    } else {
        format!("{value}")
    }
}
