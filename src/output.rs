//! CLI output formatting.
//!
//! # Output Format
//!
//! Store commands print the result envelope as pretty JSON. Inline images
//! are shortened to their media type and size so a listing stays readable:
//!
//! ```text
//! {
//!   "success": true,
//!   "data": {
//!     "imagem": "data:image/jpeg;base64,… (48213 bytes)",
//!     "titulo": "Semana Acadêmica"
//!   },
//!   "message": "Documento encontrado"
//! }
//! ```
//!
//! The dashboard is a plain-text summary:
//!
//! ```text
//! Content
//!     noticias: 5
//!     eventos: 3
//!     ...
//!
//! Recent activity
//! 001 Semana Acadêmica (evento)
//!     Author: Sistema
//!     Link: /eventos/-Nx4...
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::dashboard::Summary;
use crate::imaging::InlineImage;
use crate::store::Response;
use serde_json::Value;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Replace inline image strings with a short `mime + size` placeholder.
fn elide_inline_images(value: Value) -> Value {
    match value {
        Value::String(s) if s.starts_with("data:") => match InlineImage::parse(&s) {
            Ok(img) => Value::String(format!(
                "data:{};base64,\u{2026} ({} bytes)",
                img.mime,
                img.bytes.len()
            )),
            Err(_) => Value::String(s),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(elide_inline_images).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, elide_inline_images(v)))
                .collect(),
        ),
        other => other,
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Format a result envelope as pretty JSON lines.
///
/// With `full_images` unset, inline images are shortened.
pub fn format_response(response: &Response, full_images: bool) -> Vec<String> {
    let mut response = response.clone();
    if !full_images {
        response.data = response.data.map(elide_inline_images);
    }
    let json = serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
        format!("{{\"success\": false, \"message\": \"unprintable response: {e}\"}}")
    });
    json.lines().map(String::from).collect()
}

/// Print a result envelope to stdout.
pub fn print_response(response: &Response, full_images: bool) {
    for line in format_response(response, full_images) {
        println!("{}", line);
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Format the dashboard summary: counts first, then the activity feed.
pub fn format_dashboard(summary: &Summary) -> Vec<String> {
    let counts = &summary.counts;
    let mut lines = vec!["Content".to_string()];
    for (name, count) in [
        ("noticias", counts.noticias),
        ("eventos", counts.eventos),
        ("avisos", counts.avisos),
        ("galeria", counts.galeria),
        ("destaques", counts.destaques),
    ] {
        let failed = summary.failed.iter().any(|f| f == name);
        if failed {
            lines.push(format!("{}{}: unavailable", indent(1), name));
        } else {
            lines.push(format!("{}{}: {}", indent(1), name, count));
        }
    }

    lines.push(String::new());
    lines.push("Recent activity".to_string());
    if summary.recent.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (i, activity) in summary.recent.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            truncate_desc(&activity.titulo, 60),
            activity.tipo
        ));
        lines.push(format!("{}Author: {}", indent(1), activity.autor));
        lines.push(format!("{}Link: {}", indent(1), activity.link));
    }
    lines
}

/// Print the dashboard summary to stdout.
pub fn print_dashboard(summary: &Summary) {
    for line in format_dashboard(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Images
// ============================================================================

/// One-line description of an encoded image, for stderr.
///
/// ```text
/// photo.png → image/jpeg, 48213 bytes (64304 chars)
/// ```
pub fn format_image_summary(name: &str, data_uri: &str) -> String {
    match InlineImage::parse(data_uri) {
        Ok(img) => format!(
            "{} \u{2192} {}, {} bytes ({} chars)",
            name,
            img.mime,
            img.bytes.len(),
            data_uri.len()
        ),
        Err(e) => format!("{} \u{2192} unreadable data URI: {}", name, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{Activity, Counts};
    use serde_json::json;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn truncate_desc_short_text_unchanged() {
        assert_eq!(truncate_desc("Semana", 10), "Semana");
    }

    #[test]
    fn truncate_desc_counts_characters() {
        assert_eq!(truncate_desc("Inscrições abertas", 10), "Inscrições...");
    }

    #[test]
    fn elide_replaces_nested_data_uris() {
        let value = json!({
            "imagem": InlineImage::new("image/png", vec![0; 10]).to_data_uri(),
            "lista": [{"imagem": "data:image/gif;base64,R0lG"}],
            "link": "data: not really"
        });
        let out = elide_inline_images(value);
        assert_eq!(out["imagem"], "data:image/png;base64,\u{2026} (10 bytes)");
        assert_eq!(out["lista"][0]["imagem"], "data:image/gif;base64,\u{2026} (3 bytes)");
        assert_eq!(out["link"], "data: not really");
    }

    // =========================================================================
    // Responses
    // =========================================================================

    #[test]
    fn format_response_pretty_prints() {
        let response = Response {
            success: false,
            id: None,
            data: None,
            count: None,
            error: None,
            message: "Documento não encontrado".into(),
        };
        assert_eq!(
            format_response(&response, false),
            vec![
                "{",
                "  \"success\": false,",
                "  \"message\": \"Documento não encontrado\"",
                "}"
            ]
        );
    }

    #[test]
    fn format_response_full_images_keeps_payload() {
        let uri = InlineImage::new("image/png", b"hi".to_vec()).to_data_uri();
        let response = Response {
            success: true,
            id: None,
            data: Some(json!({"imagem": uri})),
            count: None,
            error: None,
            message: "Documento encontrado".into(),
        };
        let full = format_response(&response, true).join("\n");
        assert!(full.contains("aGk="));
        let short = format_response(&response, false).join("\n");
        assert!(!short.contains("aGk="));
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    #[test]
    fn format_dashboard_lists_counts_and_activity() {
        let summary = Summary {
            counts: Counts {
                noticias: 2,
                ..Counts::default()
            },
            recent: vec![Activity {
                id: "noticia_a".into(),
                tipo: "noticia",
                titulo: "Semana".into(),
                autor: "Sistema".into(),
                created_at: 1,
                acao: "criou",
                link: "/noticias/a".into(),
            }],
            failed: vec!["galeria".into()],
        };
        let lines = format_dashboard(&summary);
        assert_eq!(lines[0], "Content");
        assert_eq!(lines[1], "    noticias: 2");
        assert_eq!(lines[4], "    galeria: unavailable");
        assert_eq!(lines[7], "Recent activity");
        assert_eq!(lines[8], "001 Semana (noticia)");
        assert_eq!(lines[9], "    Author: Sistema");
        assert_eq!(lines[10], "    Link: /noticias/a");
    }

    #[test]
    fn format_dashboard_empty_feed() {
        let lines = format_dashboard(&Summary::default());
        assert_eq!(lines.last().unwrap(), "    (none)");
    }

    #[test]
    fn image_summary_line() {
        let uri = InlineImage::new("image/jpeg", vec![1, 2, 3]).to_data_uri();
        assert_eq!(
            format_image_summary("foto.png", &uri),
            format!("foto.png \u{2192} image/jpeg, 3 bytes ({} chars)", uri.len())
        );
    }
}
