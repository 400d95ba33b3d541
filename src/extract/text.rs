//! Plain-text rendering of filing documents

use scraper::Html;

use crate::models::DocumentKind;

/// Text suitable for pattern scanning.
///
/// Markup and XML are parsed and their text nodes joined. Plain text is kept
/// as-is unless it embeds markup, which full submission `.txt` files do.
pub fn to_text(content: &str, kind: DocumentKind) -> String {
    match kind {
        DocumentKind::Markup | DocumentKind::StructuredMarkup => extract_text_from_html(content),
        DocumentKind::PlainText if looks_like_markup(content) => extract_text_from_html(content),
        DocumentKind::PlainText => collapse_whitespace(content),
    }
}

/// Extract text content from HTML using scraper, skipping script and style bodies
pub fn extract_text_from_html(html_content: &str) -> String {
    let document = Html::parse_document(html_content);
    let mut text_content = String::with_capacity(html_content.len() / 2);

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_script = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| matches!(element.name(), "script" | "style"))
            .unwrap_or(false);
        if !in_script {
            text_content.push_str(text);
            text_content.push(' ');
        }
    }

    collapse_whitespace(&text_content)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn looks_like_markup(content: &str) -> bool {
    let head: String = content.chars().take(4096).collect::<String>().to_ascii_lowercase();
    head.contains("<html") || head.contains("<document>") || head.contains("<sec-document>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text() {
        let html = r#"<html><head><style>p { color: red; }</style></head>
            <body><p>Item&nbsp;2.02 Results of
            Operations</p><script>var x = 1;</script><td>$1,000</td></body></html>"#;
        let text = to_text(html, DocumentKind::Markup);
        assert_eq!(text, "Item 2.02 Results of Operations $1,000");
    }

    #[test]
    fn test_plain_text_is_collapsed() {
        let text = to_text("ITEM 5.02\n\n   Departure of Directors", DocumentKind::PlainText);
        assert_eq!(text, "ITEM 5.02 Departure of Directors");
    }

    #[test]
    fn test_submission_text_with_embedded_markup() {
        let content = "<SEC-DOCUMENT>0001-24-1.txt\n<DOCUMENT>\n<TEXT>\n<html><body><b>Item 1.01</b></body></html>";
        let text = to_text(content, DocumentKind::PlainText);
        assert!(text.contains("Item 1.01"));
        assert!(!text.contains("<b>"));
    }
}
