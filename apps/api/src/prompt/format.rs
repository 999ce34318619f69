//! Format instructions: format label, sub-option guidance and one line per
//! filled (or statically instructed) extra field.

use std::collections::HashSet;

use crate::catalog::{Catalog, ExtraField, FieldKind, Format};
use crate::prompt::lookup::{
    default_prompt, default_sub_option_prompt, is_unselected, label_line, prompt_from_selection,
    sub_option_prompt, FieldScope,
};
use crate::prompt::selection::{has_user_value, FieldValue, Selection, LEGACY_COMMON_IDS};
use crate::prompt::template::{has_placeholder, render_value, Placeholder};

pub const FORMAT_FALLBACK: &str = "Формат ответа: ясный, структурированный текст.";

const YES: &str = "да";

/// Instruction lines in insertion order. Blank lines and exact repeats are
/// dropped, so the first occurrence of a line wins.
#[derive(Debug, Default)]
pub struct InstructionLines {
    lines: Vec<String>,
    seen: HashSet<String>,
}

impl InstructionLines {
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        if line.trim().is_empty() || self.seen.contains(&line) {
            return;
        }
        self.seen.insert(line.clone());
        self.lines.push(line);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

/// Builds the newline-joined instruction block for the active format.
pub fn build_format_instruction(catalog: &Catalog, selection: &Selection) -> String {
    let mut lines = InstructionLines::default();
    collect_format_instruction(catalog, selection, &mut lines);
    lines.into_lines().join("\n")
}

pub(crate) fn collect_format_instruction(
    catalog: &Catalog,
    selection: &Selection,
    lines: &mut InstructionLines,
) {
    let Some(format) = catalog.format(selection.format()) else {
        lines.push(FORMAT_FALLBACK);
        return;
    };

    lines.push(format!("Формат ответа: {}.", format.label));

    let sub_option = selection.sub_option();
    if is_unselected(sub_option) {
        lines.push(default_sub_option_prompt(catalog, &format.id));
    } else {
        lines.push(sub_option_prompt(catalog, &format.id, sub_option));
    }

    for field in &format.extra_fields {
        collect_format_field(catalog, format, field, selection.values().get(&field.id), lines);
    }

    // Values of common ids stored in the format bag by older clients.
    for id in LEGACY_COMMON_IDS {
        if let Some(field) = catalog.common_field(id) {
            collect_common_field(catalog, field, selection.values().get(id), lines);
        }
    }
}

/// A text field whose template waits for `{{value}}` has nothing to say
/// until the user types something.
fn requires_user_input(field: &ExtraField) -> bool {
    field.kind == FieldKind::Text && has_placeholder(field.template(), Placeholder::Value)
}

fn collect_format_field(
    catalog: &Catalog,
    format: &Format,
    field: &ExtraField,
    value: &FieldValue,
    lines: &mut InstructionLines,
) {
    if field.kind == FieldKind::Boolean {
        if value.is_true() {
            lines.push(render_yes(field));
        }
        return;
    }

    if !has_user_value(field.kind, value) {
        if requires_user_input(field) {
            return;
        }
        let mut default = default_prompt(catalog, &format.id, &field.id);
        if default.trim().is_empty() {
            default = default_sub_option_prompt(catalog, &format.id);
        }
        if !has_placeholder(default, Placeholder::Value) {
            lines.push(default);
        }
        return;
    }

    let value = value.as_text().unwrap_or_default();
    match field.kind {
        FieldKind::List => {
            lines.push(prompt_from_selection(
                catalog,
                FieldScope::Format(&format.id),
                &field.id,
                value,
            ));
        }
        _ => push_text_field(field, value, lines),
    }
}

/// Renders a common field. Only user-supplied values produce output; common
/// fields never inject defaults.
pub(crate) fn collect_common_field(
    catalog: &Catalog,
    field: &ExtraField,
    value: &FieldValue,
    lines: &mut InstructionLines,
) {
    if !has_user_value(field.kind, value) {
        return;
    }
    match field.kind {
        FieldKind::Boolean => lines.push(render_yes(field)),
        FieldKind::List => {
            let value = value.as_text().unwrap_or_default();
            lines.push(prompt_from_selection(
                catalog,
                FieldScope::Common,
                &field.id,
                value,
            ));
        }
        FieldKind::Text => push_text_field(field, value.as_text().unwrap_or_default(), lines),
    }
}

fn render_yes(field: &ExtraField) -> String {
    let rendered = render_value(field.template(), YES);
    if rendered.is_empty() {
        label_line(&field.label, YES)
    } else {
        rendered
    }
}

/// Text with a value: a `{{value}}` template is filled in; a static template
/// is emitted as is, followed by the value under its label.
fn push_text_field(field: &ExtraField, value: &str, lines: &mut InstructionLines) {
    let template = field.template();
    if has_placeholder(template, Placeholder::Value) {
        lines.push(render_value(template, value));
    } else if !template.trim().is_empty() {
        lines.push(template.trim());
        lines.push(label_line(&field.label, value));
    } else {
        lines.push(label_line(&field.label, value));
    }
}
