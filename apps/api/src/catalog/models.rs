use serde::{Deserialize, Serialize};

/// Id of the format that bypasses the generic assembly pipeline.
pub const STAFFING_FORMAT_ID: &str = "staffing";

/// Placeholder value shown by list widgets before the user picks anything.
pub const UNSELECTED_SENTINEL: &str = "Выберите вариант";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expert {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Industry {
    pub name: String,
    /// May reference `{{industry}}` and `{{experts}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default)]
    pub experts: Vec<Expert>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    List,
    Text,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraFieldItem {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtraField {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ExtraFieldItem>,
}

impl ExtraField {
    /// The field template, or `""` when none is configured.
    pub fn template(&self) -> &str {
        self.prompt_template.as_deref().unwrap_or("")
    }

    pub fn item(&self, value: &str) -> Option<&ExtraFieldItem> {
        self.items.iter().find(|item| item.value == value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    /// Per-sub-option inputs (staffing only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<ExtraField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_options_label: Option<String>,
    #[serde(default)]
    pub sub_options: Vec<SubOption>,
    #[serde(default)]
    pub extra_fields: Vec<ExtraField>,
    /// Emitted when no sub-option is selected. Empty in shipped catalogs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sub_option_prompt: Option<String>,
}

impl Format {
    pub fn sub_option(&self, label: &str) -> Option<&SubOption> {
        self.sub_options.iter().find(|s| s.label == label)
    }

    pub fn extra_field(&self, id: &str) -> Option<&ExtraField> {
        self.extra_fields.iter().find(|f| f.id == id)
    }

    /// Looks a field up among the sub-option fields of every sub-option.
    pub fn sub_option_field(&self, id: &str) -> Option<&ExtraField> {
        self.sub_options
            .iter()
            .flat_map(|s| s.fields.iter())
            .find(|f| f.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommonFields {
    #[serde(default)]
    pub fields: Vec<ExtraField>,
}

/// The declarative configuration every prompt is assembled from.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Catalog {
    pub industries: Vec<Industry>,
    pub formats: Vec<Format>,
    #[serde(default)]
    pub common: CommonFields,
}

impl Catalog {
    pub fn industry(&self, name: &str) -> Option<&Industry> {
        if name.is_empty() {
            return None;
        }
        self.industries.iter().find(|i| i.name == name)
    }

    pub fn format(&self, id: &str) -> Option<&Format> {
        self.formats.iter().find(|f| f.id == id)
    }

    pub fn common_field(&self, id: &str) -> Option<&ExtraField> {
        self.common.fields.iter().find(|f| f.id == id)
    }

    /// The format a fresh selection starts with.
    pub fn default_format_id(&self) -> &str {
        self.formats.first().map(|f| f.id.as_str()).unwrap_or("text")
    }

    /// Resolves a field id visible while `format_id` is active: format extra
    /// fields first, then sub-option fields, then common fields.
    pub fn field_for(&self, format_id: &str, field_id: &str) -> Option<&ExtraField> {
        self.format(format_id)
            .and_then(|f| f.extra_field(field_id).or_else(|| f.sub_option_field(field_id)))
            .or_else(|| self.common_field(field_id))
    }
}
