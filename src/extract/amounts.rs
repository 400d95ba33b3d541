//! Largest dollar amount in offering documents

use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::text;
use crate::models::{DocumentKind, Signals};

/// Form D elements holding offering amounts, stated as bare dollar figures
const OFFERING_AMOUNT_TAGS: &[&str] = &["totalOfferingAmount", "totalAmountSold"];

static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<dollar>\$\s*)?(?P<whole>\d{1,3}(?:,\d{3})+|\d+)(?:\.(?P<frac>\d+))?(?:\s*(?P<unit>billion|million|bn|m)\b)?",
    )
    .expect("amount pattern compiles")
});

/// Every amount in `text` normalized to dollars.
///
/// A number counts only when it carries a `$` or a scale suffix; bare numbers
/// in filings are mostly years, share counts and page references.
pub fn amounts(text: &str) -> Vec<f64> {
    AMOUNT_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let unit = caps.name("unit").map(|u| u.as_str().to_ascii_lowercase());
            if caps.name("dollar").is_none() && unit.is_none() {
                return None;
            }

            let whole = caps["whole"].replace(',', "");
            let number = match caps.name("frac") {
                Some(frac) => format!("{}.{}", whole, frac.as_str()),
                None => whole,
            };
            let value: f64 = number.parse().ok()?;

            let scale = match unit.as_deref() {
                Some("billion") | Some("bn") => 1e9,
                Some("million") | Some("m") => 1e6,
                _ => 1.0,
            };
            Some(value * scale)
        })
        .collect()
}

pub fn largest_amount(text: &str) -> Option<f64> {
    amounts(text).into_iter().reduce(f64::max)
}

pub fn extract_amount(text: &str) -> Option<Signals> {
    largest_amount(text).map(|amount| Signals {
        largest_amount: Some(amount),
        ..Default::default()
    })
}

/// Values of the Form D amount elements. Non-numeric values such as
/// `Indefinite` are skipped.
pub fn structured_amounts(content: &str) -> Vec<f64> {
    let start = content.find("<edgarSubmission").unwrap_or(0);
    let mut reader = Reader::from_str(&content[start..]);
    reader.trim_text(true);
    reader.check_end_names(false);

    let mut current: Option<String> = None;
    let mut found = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(t)) => {
                let Some(tag) = current.as_deref() else {
                    continue;
                };
                if !OFFERING_AMOUNT_TAGS.contains(&tag) {
                    continue;
                }
                let raw = String::from_utf8_lossy(&t).into_owned();
                let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '$') && !c.is_whitespace()).collect();
                match cleaned.parse::<f64>() {
                    Ok(value) => found.push(value),
                    Err(_) => debug!("Skipping non-numeric {} value '{}'", tag, raw.trim()),
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("Stopping offering parse at byte {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => {}
        }
    }
    found
}

/// Largest offering amount in a document.
///
/// Structured documents (Form D, or a submission text embedding one) are read
/// element by element; anything else, or a structured document without amount
/// elements, is scanned as text.
pub fn extract_offering(content: &str, kind: DocumentKind) -> Option<Signals> {
    let structured = match kind {
        DocumentKind::StructuredMarkup => true,
        DocumentKind::PlainText => content.contains("<edgarSubmission"),
        DocumentKind::Markup => false,
    };
    if structured {
        if let Some(amount) = structured_amounts(content).into_iter().reduce(f64::max) {
            return Some(Signals {
                largest_amount: Some(amount),
                ..Default::default()
            });
        }
    }
    extract_amount(&text::to_text(content, kind))
}
