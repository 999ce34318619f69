//! Template lookups and default resolution against the catalog.

use crate::catalog::{Catalog, ExtraField, FieldKind, UNSELECTED_SENTINEL};
use crate::prompt::template::render_value;

/// Where a field id is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldScope<'a> {
    Format(&'a str),
    Common,
}

impl<'a> FieldScope<'a> {
    fn field<'c>(self, catalog: &'c Catalog, field_id: &str) -> Option<&'c ExtraField> {
        match self {
            FieldScope::Format(format_id) => catalog
                .format(format_id)
                .and_then(|f| f.extra_field(field_id)),
            FieldScope::Common => catalog.common_field(field_id),
        }
    }
}

/// True for the empty string and the "nothing selected" sentinel.
pub fn is_unselected(value: &str) -> bool {
    value.trim().is_empty() || value == UNSELECTED_SENTINEL
}

/// Default template of a field left empty by the user: the common field's
/// template for the same id wins, then the format field's own template.
pub fn default_prompt<'c>(catalog: &'c Catalog, format_id: &str, field_id: &str) -> &'c str {
    [FieldScope::Common, FieldScope::Format(format_id)]
        .into_iter()
        .filter_map(|scope| scope.field(catalog, field_id))
        .map(ExtraField::template)
        .find(|t| !t.is_empty())
        .unwrap_or("")
}

/// Format-level template used when no sub-option is selected.
pub fn default_sub_option_prompt<'c>(catalog: &'c Catalog, format_id: &str) -> &'c str {
    catalog
        .format(format_id)
        .and_then(|f| f.default_sub_option_prompt.as_deref())
        .unwrap_or("")
}

/// Template of the selected sub-option, or `""`.
pub fn sub_option_prompt<'c>(catalog: &'c Catalog, format_id: &str, label: &str) -> &'c str {
    if is_unselected(label) {
        return "";
    }
    catalog
        .format(format_id)
        .and_then(|f| f.sub_option(label))
        .and_then(|s| s.prompt_template.as_deref())
        .unwrap_or("")
}

/// Renders a selected value of a field.
///
/// For list fields: the matching item's template, then the field template
/// with `{{value}}` bound, then `<label>: <value>.` For any other field the
/// default template is rendered with the value, falling back to the same
/// label form. An unselected value resolves to the raw default template.
pub fn prompt_from_selection(
    catalog: &Catalog,
    scope: FieldScope<'_>,
    field_id: &str,
    value: &str,
) -> String {
    let format_id = match scope {
        FieldScope::Format(id) => id,
        FieldScope::Common => "",
    };
    if is_unselected(value) {
        return default_prompt(catalog, format_id, field_id).to_string();
    }

    let field = scope.field(catalog, field_id);
    match field {
        Some(field) if field.kind == FieldKind::List => {
            let item_template = field
                .item(value)
                .and_then(|item| item.prompt_template.as_deref())
                .filter(|t| !t.trim().is_empty());
            if let Some(template) = item_template {
                return template.to_string();
            }
            let rendered = render_value(field.template(), value);
            if rendered.is_empty() {
                label_line(&field.label, value)
            } else {
                rendered
            }
        }
        _ => {
            let default = default_prompt(catalog, format_id, field_id);
            if default.is_empty() {
                let label = field.map(|f| f.label.as_str()).unwrap_or(field_id);
                label_line(label, value)
            } else {
                render_value(default, value)
            }
        }
    }
}

/// `<label>: <value>.`, the rendering of last resort.
pub fn label_line(label: &str, value: &str) -> String {
    format!("{label}: {value}.")
}
