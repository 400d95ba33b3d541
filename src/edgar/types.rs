//! Upstream EDGAR document shapes and endpoint construction

use serde::Deserialize;

use crate::config::Endpoints;

/// One entry of `company_tickers.json`:
/// `{"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}`
#[derive(Debug, Deserialize)]
pub struct CompanyTickerEntry {
    pub cik_str: u64,
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub title: String,
}

/// `submissions/CIK##########.json`
#[derive(Debug, Deserialize)]
pub struct SubmissionsDocument {
    #[serde(default)]
    pub cik: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub filings: FilingsBlock,
}

#[derive(Debug, Deserialize)]
pub struct FilingsBlock {
    pub recent: FilingColumns,
    /// Manifest of historical-year index documents
    #[serde(default)]
    pub files: Vec<HistoricalFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalFile {
    pub name: String,
    #[serde(default)]
    pub filing_count: Option<u64>,
    #[serde(default)]
    pub filing_from: Option<String>,
    #[serde(default)]
    pub filing_to: Option<String>,
}

/// Column-oriented filing list; one array per field, rows share an index.
/// Historical-year documents have this shape at their top level.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilingColumns {
    pub accession_number: Vec<String>,
    pub filing_date: Vec<String>,
    pub form: Vec<String>,
    #[serde(default)]
    pub primary_document: Vec<String>,
    #[serde(default)]
    pub report_date: Vec<String>,
    #[serde(default)]
    pub primary_doc_description: Vec<String>,
}

/// URL builder for the registry hosts
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    www_base: String,
    data_base: String,
}

impl EdgarUrls {
    pub const DIRECTORY_PATH: &'static str = "/files/company_tickers.json";
    pub const SUBMISSIONS_PATH: &'static str = "/submissions";
    pub const ARCHIVES_PATH: &'static str = "/Archives/edgar/data";

    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            www_base: endpoints.www_base.trim_end_matches('/').to_string(),
            data_base: endpoints.data_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn directory(&self) -> String {
        format!("{}{}", self.www_base, Self::DIRECTORY_PATH)
    }

    /// `registry_id` must already be zero-padded
    pub fn recent_index(&self, registry_id: &str) -> String {
        format!("{}{}/CIK{}.json", self.data_base, Self::SUBMISSIONS_PATH, registry_id)
    }

    pub fn historical_index(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.data_base, Self::SUBMISSIONS_PATH, file_name)
    }

    /// Archive paths use the CIK without leading zeros and the accession without dashes
    pub fn archive_document(&self, registry_id: &str, accession_compact: &str, name: &str) -> String {
        let cik = registry_id.trim_start_matches('0');
        let cik = if cik.is_empty() { "0" } else { cik };
        format!(
            "{}{}/{}/{}/{}",
            self.www_base,
            Self::ARCHIVES_PATH,
            cik,
            accession_compact,
            name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let urls = EdgarUrls::new(&Endpoints::default());
        assert_eq!(urls.directory(), "https://www.sec.gov/files/company_tickers.json");
        assert_eq!(
            urls.recent_index("0001045810"),
            "https://data.sec.gov/submissions/CIK0001045810.json"
        );
        assert_eq!(
            urls.historical_index("CIK0001045810-submissions-001.json"),
            "https://data.sec.gov/submissions/CIK0001045810-submissions-001.json"
        );
        assert_eq!(
            urls.archive_document("0001045810", "000104581024000029", "nvda-20240221.htm"),
            "https://www.sec.gov/Archives/edgar/data/1045810/000104581024000029/nvda-20240221.htm"
        );
    }

    #[test]
    fn test_submissions_tolerates_unknown_fields() {
        let json = r#"{
            "cik": "1045810",
            "name": "NVIDIA CORP",
            "sicDescription": "Semiconductors",
            "filings": {
                "recent": {
                    "accessionNumber": ["0001045810-24-000029"],
                    "filingDate": ["2024-02-21"],
                    "form": ["8-K"],
                    "isXBRL": [1]
                },
                "files": []
            }
        }"#;
        let doc: SubmissionsDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.filings.recent.form, vec!["8-K"]);
        assert!(doc.filings.recent.primary_document.is_empty());
    }

    #[test]
    fn test_submissions_missing_required_column_fails() {
        let json = r#"{"filings": {"recent": {"accessionNumber": [], "form": []}}}"#;
        assert!(serde_json::from_str::<SubmissionsDocument>(json).is_err());
    }
}
