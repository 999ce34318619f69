//! Prompt export as a downloadable Markdown or HTML file.

pub mod handlers;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Markdown,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

/// A rendered export ready to be sent as an attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

pub fn render_export(prompt: &str, format: ExportFormat, now: DateTime<Utc>) -> ExportFile {
    let body = match format {
        ExportFormat::Markdown => prompt.to_string(),
        ExportFormat::Html => render_html(prompt),
    };
    ExportFile {
        filename: export_filename(format, now),
        content_type: format.content_type(),
        body,
    }
}

/// `prompt-2025-01-01T10-00-00-000Z.md`
pub fn export_filename(format: ExportFormat, now: DateTime<Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("prompt-{stamp}.{}", format.extension())
}

fn render_html(prompt: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"ru\">\n<head>\n  <meta charset=\"UTF-8\" />\n  \
         <title>Prompt export</title>\n</head>\n<body>\n  <pre>{}</pre>\n</body>\n</html>",
        escape_html(prompt)
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_filename_replaces_colons_and_dots() {
        assert_eq!(
            export_filename(ExportFormat::Markdown, fixed_now()),
            "prompt-2025-01-01T10-00-00-000Z.md"
        );
        assert!(export_filename(ExportFormat::Html, fixed_now()).ends_with(".html"));
    }

    #[test]
    fn test_markdown_is_raw_text() {
        let file = render_export("# <Заголовок>", ExportFormat::Markdown, fixed_now());
        assert_eq!(file.body, "# <Заголовок>");
        assert_eq!(file.content_type, "text/markdown; charset=utf-8");
    }

    #[test]
    fn test_html_escapes_markup() {
        let file = render_export("a < b && c > d", ExportFormat::Html, fixed_now());
        assert!(file.body.starts_with("<!DOCTYPE html>"));
        assert!(file.body.contains("<pre>a &lt; b &amp;&amp; c &gt; d</pre>"));
        assert_eq!(file.content_type, "text/html; charset=utf-8");
    }
}
