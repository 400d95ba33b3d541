use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{FilingError, Result};

/// One entry of the entity directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub display_name: String,
    /// Ten-digit, zero-padded registry ID
    pub registry_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub identifier: IdentifierRecord,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<IdentifierRecord>,
    pub candidates: Vec<MatchCandidate>,
}

impl Resolution {
    pub fn is_ambiguous(&self) -> bool {
        self.exact.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingRecord {
    pub registry_id: String,
    pub form_type: String,
    pub filed_date: NaiveDate,
    /// Dashed canonical form, e.g. `0000320193-23-000077`
    pub accession_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_document_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_doc_description: Option<String>,
}

impl FilingRecord {
    /// Accession without separators; the de-duplication key
    pub fn accession_compact(&self) -> String {
        compact_accession(&self.accession_id)
    }
}

/// Signals mined from a filing document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub item_codes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub highlight_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub largest_amount: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub owner_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub owner_roles: Vec<String>,
}

impl Signals {
    pub fn is_empty(&self) -> bool {
        self.item_codes.is_empty()
            && self.largest_amount.is_none()
            && self.owner_names.is_empty()
            && self.owner_roles.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedFiling {
    #[serde(flatten)]
    pub filing: FilingRecord,
    #[serde(flatten)]
    pub signals: Option<Signals>,
}

impl From<FilingRecord> for EnrichedFiling {
    fn from(filing: FilingRecord) -> Self {
        EnrichedFiling {
            filing,
            signals: None,
        }
    }
}

/// One page of filings returned to consumers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingPage {
    pub items: Vec<EnrichedFiling>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    /// Mining stopped early (deadline or scan cap)
    pub partial: bool,
    /// Filings whose document could not be fetched or mined
    pub unminable: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Markup,
    StructuredMarkup,
    PlainText,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".xml") {
            DocumentKind::StructuredMarkup
        } else if lower.ends_with(".htm") || lower.ends_with(".html") {
            DocumentKind::Markup
        } else {
            DocumentKind::PlainText
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DocumentKind::Markup => "markup",
            DocumentKind::StructuredMarkup => "structured-markup",
            DocumentKind::PlainText => "plain-text",
        }
    }
}

/// Normalize a CIK given as 1-10 digits into its zero-padded form
pub fn normalize_registry_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("CIK")
        .or_else(|| trimmed.strip_prefix("cik"))
        .unwrap_or(trimmed);

    if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FilingError::InvalidIdentifier(format!(
            "registry ID must be 1-10 digits, got '{}'",
            raw
        )));
    }
    Ok(format!("{:0>10}", digits))
}

pub fn compact_accession(accession: &str) -> String {
    accession.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Dashed `##########-##-######` form; inputs of other shapes are returned trimmed
pub fn dashed_accession(accession: &str) -> String {
    let compact = compact_accession(accession);
    if compact.len() == 18 && compact.bytes().all(|b| b.is_ascii_digit()) {
        format!("{}-{}-{}", &compact[..10], &compact[10..12], &compact[12..])
    } else {
        accession.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_registry_id() {
        assert_eq!(normalize_registry_id("320193").unwrap(), "0000320193");
        assert_eq!(normalize_registry_id("CIK0001045810").unwrap(), "0001045810");
        assert!(normalize_registry_id("").is_err());
        assert!(normalize_registry_id("12345678901").is_err());
        assert!(normalize_registry_id("12a4").is_err());
    }

    #[test]
    fn test_accession_forms() {
        assert_eq!(compact_accession("0000320193-23-000077"), "000032019323000077");
        assert_eq!(dashed_accession("000032019323000077"), "0000320193-23-000077");
        assert_eq!(dashed_accession("0000320193-23-000077"), "0000320193-23-000077");
    }

    #[test]
    fn test_document_kind_from_suffix() {
        assert_eq!(DocumentKind::from_name("wf-form4_1.xml"), DocumentKind::StructuredMarkup);
        assert_eq!(DocumentKind::from_name("nvda-8k.HTM"), DocumentKind::Markup);
        assert_eq!(DocumentKind::from_name("0001-23-000001.txt"), DocumentKind::PlainText);
    }

    #[test]
    fn test_unenriched_filing_serializes_without_signals() {
        let filing = FilingRecord {
            registry_id: "0001045810".to_string(),
            form_type: "8-K".to_string(),
            filed_date: NaiveDate::from_ymd_opt(2024, 2, 21).unwrap(),
            accession_id: "0001045810-24-000029".to_string(),
            primary_document_ref: Some("nvda-20240221.htm".to_string()),
            report_date: None,
            primary_doc_description: None,
        };
        let json = serde_json::to_value(EnrichedFiling::from(filing)).unwrap();
        assert_eq!(json["formType"], "8-K");
        assert_eq!(json["filedDate"], "2024-02-21");
        assert!(json.get("itemCodes").is_none());
    }
}
