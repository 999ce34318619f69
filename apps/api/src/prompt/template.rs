//! Placeholder substitution shared by every template site.
//!
//! Templates reference a closed set of named tokens (`{{value}}`,
//! `{{expert}}`, `{{weight}}`, `{{industry}}`, `{{experts}}`). Inner
//! whitespace is tolerated and names are case-insensitive. Tokens that are not
//! bound by the caller, and unknown names, are left in place untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_]+)\s*\}\}").expect("placeholder regex is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Value,
    Expert,
    Weight,
    Industry,
    Experts,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "value" => Some(Self::Value),
            "expert" => Some(Self::Expert),
            "weight" => Some(Self::Weight),
            "industry" => Some(Self::Industry),
            "experts" => Some(Self::Experts),
            _ => None,
        }
    }
}

/// Returns true when `template` references `placeholder` at least once.
pub fn has_placeholder(template: &str, placeholder: Placeholder) -> bool {
    PLACEHOLDER
        .captures_iter(template)
        .any(|c| Placeholder::from_name(&c[1]) == Some(placeholder))
}

/// Substitutes every bound placeholder in `template`. The result is trimmed.
pub fn render(template: &str, bindings: &[(Placeholder, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            Placeholder::from_name(&caps[1])
                .and_then(|p| bindings.iter().find(|(bound, _)| *bound == p))
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .trim()
        .to_string()
}

/// Shorthand for the `{{value}}`-only templates used by extra fields.
pub fn render_value(template: &str, value: &str) -> String {
    render(template, &[(Placeholder::Value, value)])
}
