//! Selection state: everything the user has picked so far.
//!
//! Field values are tagged by the declared field type and stored per format:
//! switching formats parks the outgoing value bag in a snapshot map and
//! restores the incoming one, so coming back to a format brings back what was
//! typed there.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::catalog::{Catalog, FieldKind, UNSELECTED_SENTINEL};

/// Weight assumed for any expert without an explicit weight.
pub const DEFAULT_EXPERT_WEIGHT: u8 = 100;

/// Ids historically stored in the format value bag although they belong to
/// the common block. Accepted by [`Selection::set_value`] for every format.
pub const LEGACY_COMMON_IDS: [&str; 3] = ["goal", "context", "example"];

#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("Expert '{expert}' is not available for industry '{industry}'")]
    UnknownExpert { expert: String, industry: String },

    #[error("Field '{field}' is not defined for format '{format}'")]
    UnknownField { field: String, format: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(String),
    Bool(bool),
    #[default]
    Unset,
}

impl FieldValue {
    /// Untyped JSON input as sent by clients. Numbers are kept as text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Bool(b) => FieldValue::Bool(*b),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => FieldValue::Text(n.to_string()),
            _ => FieldValue::Unset,
        }
    }

    /// Re-tags the value according to the field's declared type.
    pub fn coerce(self, kind: FieldKind) -> Self {
        match (kind, self) {
            (_, FieldValue::Unset) => FieldValue::Unset,
            (FieldKind::Boolean, FieldValue::Bool(b)) => FieldValue::Bool(b),
            (FieldKind::Boolean, FieldValue::Text(s) | FieldValue::List(s)) => {
                FieldValue::Bool(s.trim().eq_ignore_ascii_case("true"))
            }
            (FieldKind::List, FieldValue::Text(s) | FieldValue::List(s)) => FieldValue::List(s),
            (FieldKind::Text, FieldValue::Text(s) | FieldValue::List(s)) => FieldValue::Text(s),
            (FieldKind::List | FieldKind::Text, FieldValue::Bool(b)) => {
                FieldValue::Text(if b { "да".to_string() } else { String::new() })
            }
        }
    }

    /// Raw text of a text or list value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) | FieldValue::List(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, FieldValue::Bool(true))
    }
}

/// Type-specific emptiness: booleans count only when `true`, list values must
/// be non-blank and not the "nothing selected" sentinel, text must be
/// non-blank.
pub fn has_user_value(kind: FieldKind, value: &FieldValue) -> bool {
    match kind {
        FieldKind::Boolean => value.is_true(),
        FieldKind::List => value
            .as_text()
            .map(|s| !s.trim().is_empty() && s != UNSELECTED_SENTINEL)
            .unwrap_or(false),
        FieldKind::Text => value.as_text().map(|s| !s.trim().is_empty()).unwrap_or(false),
    }
}

static UNSET: FieldValue = FieldValue::Unset;

/// Values entered for one format, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues(HashMap<String, FieldValue>);

impl FieldValues {
    pub fn get(&self, field_id: &str) -> &FieldValue {
        self.0.get(field_id).unwrap_or(&UNSET)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|v| *v == FieldValue::Unset)
    }

    fn set(&mut self, field_id: &str, value: FieldValue) {
        self.0.insert(field_id.to_string(), value);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    industry: String,
    experts: Vec<String>,
    expert_weights: HashMap<String, u8>,
    format: String,
    sub_option: String,
    values: FieldValues,
    snapshots: HashMap<String, FieldValues>,
    exclusions: Vec<String>,
    user_task: String,
    refine: String,
}

impl Selection {
    /// Fresh state: nothing selected, first configured format active.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            industry: String::new(),
            experts: Vec::new(),
            expert_weights: HashMap::new(),
            format: catalog.default_format_id().to_string(),
            sub_option: String::new(),
            values: FieldValues::default(),
            snapshots: HashMap::new(),
            exclusions: Vec::new(),
            user_task: String::new(),
            refine: String::new(),
        }
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn experts(&self) -> &[String] {
        &self.experts
    }

    pub fn has_expert(&self, name: &str) -> bool {
        self.experts.iter().any(|e| e == name)
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn sub_option(&self) -> &str {
        &self.sub_option
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn user_task(&self) -> &str {
        &self.user_task
    }

    pub fn refine(&self) -> &str {
        &self.refine
    }

    /// Changing the industry drops the expert selection, which is only
    /// meaningful within one industry.
    pub fn set_industry(&mut self, name: &str) {
        if self.industry != name {
            self.industry = name.to_string();
            self.experts.clear();
        }
    }

    /// Adds an expert of the current industry. Without a resolvable industry
    /// any expert declared somewhere in the catalog is accepted.
    pub fn add_expert(&mut self, catalog: &Catalog, name: &str) -> Result<(), SelectionError> {
        let known = match catalog.industry(&self.industry) {
            Some(industry) => industry.experts.iter().any(|e| e.name == name),
            None => catalog
                .industries
                .iter()
                .flat_map(|i| i.experts.iter())
                .any(|e| e.name == name),
        };
        if !known {
            return Err(SelectionError::UnknownExpert {
                expert: name.to_string(),
                industry: self.industry.clone(),
            });
        }
        if !self.has_expert(name) {
            self.experts.push(name.to_string());
        }
        Ok(())
    }

    pub fn remove_expert(&mut self, name: &str) {
        self.experts.retain(|e| e != name);
    }

    /// Stores a weight, clamped to 0..=100.
    pub fn set_expert_weight(&mut self, name: &str, weight: i64) {
        let clamped = weight.clamp(0, i64::from(DEFAULT_EXPERT_WEIGHT)) as u8;
        self.expert_weights.insert(name.to_string(), clamped);
    }

    pub fn weight(&self, name: &str) -> u8 {
        self.expert_weights
            .get(name)
            .copied()
            .unwrap_or(DEFAULT_EXPERT_WEIGHT)
    }

    /// Switches format: the current values are saved under the outgoing
    /// format, the incoming format's saved values (or nothing) are restored
    /// and the sub-option is cleared.
    pub fn set_format(&mut self, format_id: &str) {
        if self.format == format_id {
            return;
        }
        let outgoing = std::mem::take(&mut self.values);
        self.snapshots.insert(self.format.clone(), outgoing);
        self.values = self.snapshots.remove(format_id).unwrap_or_default();
        self.format = format_id.to_string();
        self.sub_option.clear();
    }

    pub fn set_sub_option(&mut self, label: &str) {
        self.sub_option = label.to_string();
    }

    /// Sets a field of the active format. The id must be known to the catalog
    /// for this format (or be one of [`LEGACY_COMMON_IDS`]); the value is
    /// re-tagged to match the field's declared type.
    pub fn set_value(
        &mut self,
        catalog: &Catalog,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), SelectionError> {
        let kind = match catalog.field_for(&self.format, field_id) {
            Some(field) => field.kind,
            None if LEGACY_COMMON_IDS.contains(&field_id) => FieldKind::Text,
            None => {
                return Err(SelectionError::UnknownField {
                    field: field_id.to_string(),
                    format: self.format.clone(),
                })
            }
        };
        self.values.set(field_id, value.coerce(kind));
        Ok(())
    }

    /// Appends a trimmed exclusion unless it is blank or already present.
    pub fn add_exclusion(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.exclusions.iter().any(|e| e == text) {
            return false;
        }
        self.exclusions.push(text.to_string());
        true
    }

    pub fn remove_exclusion(&mut self, index: usize) -> Option<String> {
        (index < self.exclusions.len()).then(|| self.exclusions.remove(index))
    }

    pub fn set_user_task(&mut self, task: &str) {
        self.user_task = task.to_string();
    }

    pub fn set_refine(&mut self, refine: &str) {
        self.refine = refine.to_string();
    }
}
