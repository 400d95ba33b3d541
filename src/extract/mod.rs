//! Signal extraction from filing documents
//!
//! Each form family has its own extractor; `extract` picks one from the form
//! code. Extraction is best-effort and never fails: no match means no signal.

pub mod amounts;
pub mod items;
pub mod ownership;
pub mod text;

use serde::Serialize;

use crate::models::{DocumentKind, Signals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FormFamily {
    /// 8-K style event reports carrying item codes
    CurrentReport,
    /// Registration statements, prospectuses and exempt offering notices
    Offering,
    /// Insider ownership forms 3, 4 and 5
    Ownership,
    Other,
}

impl FormFamily {
    pub fn of(form_type: &str) -> Self {
        let upper = form_type.trim().to_ascii_uppercase();
        let base = upper.strip_suffix("/A").unwrap_or(&upper);

        match base {
            "3" | "4" | "5" => FormFamily::Ownership,
            "S-1" | "S-3" | "F-1" | "F-3" | "S-1MEF" | "S-3ASR" | "D" => FormFamily::Offering,
            b if b.starts_with("424B") => FormFamily::Offering,
            b if b.starts_with("8-K") || b == "6-K" => FormFamily::CurrentReport,
            _ => FormFamily::Other,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FormFamily::CurrentReport => "current-report",
            FormFamily::Offering => "offering",
            FormFamily::Ownership => "ownership",
            FormFamily::Other => "other",
        }
    }

    pub fn is_minable(&self) -> bool {
        !matches!(self, FormFamily::Other)
    }
}

/// Mine `content` according to the family of `form_type`
pub fn extract(content: &str, kind: DocumentKind, form_type: &str) -> Option<Signals> {
    match FormFamily::of(form_type) {
        FormFamily::CurrentReport => items::extract_items(&text::to_text(content, kind)),
        FormFamily::Offering => amounts::extract_offering(content, kind),
        FormFamily::Ownership => ownership::extract_owners(content),
        FormFamily::Other => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_families() {
        assert_eq!(FormFamily::of("8-K"), FormFamily::CurrentReport);
        assert_eq!(FormFamily::of("8-K/A"), FormFamily::CurrentReport);
        assert_eq!(FormFamily::of("424B5"), FormFamily::Offering);
        assert_eq!(FormFamily::of("s-1/a"), FormFamily::Offering);
        assert_eq!(FormFamily::of("4"), FormFamily::Ownership);
        assert_eq!(FormFamily::of("4/A"), FormFamily::Ownership);
        assert_eq!(FormFamily::of("40-F"), FormFamily::Other);
        assert_eq!(FormFamily::of("10-K"), FormFamily::Other);
    }

    #[test]
    fn test_dispatch_by_family() {
        let html = "<html><body><p>Item 1.01 Entry into a Material Definitive Agreement for $3 million</p></body></html>";

        let current = extract(html, DocumentKind::Markup, "8-K").unwrap();
        assert_eq!(current.item_codes, vec!["1.01"]);
        assert_eq!(current.largest_amount, None);

        let offering = extract(html, DocumentKind::Markup, "424B3").unwrap();
        assert_eq!(offering.largest_amount, Some(3_000_000.0));
        assert!(offering.item_codes.is_empty());

        assert!(extract(html, DocumentKind::Markup, "10-Q").is_none());
    }

    #[test]
    fn test_form_d_dispatches_to_structured_amounts() {
        let xml = "<edgarSubmission><offeringData><offeringSalesAmounts>\
                   <totalOfferingAmount>5000000</totalOfferingAmount>\
                   </offeringSalesAmounts></offeringData></edgarSubmission>";
        let signals = extract(xml, DocumentKind::StructuredMarkup, "D").unwrap();
        assert_eq!(signals.largest_amount, Some(5_000_000.0));
    }
}
