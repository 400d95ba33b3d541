//! Filing history aggregation across the recent index and historical-year files

use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::edgar::client::Fetch;
use crate::edgar::types::{EdgarUrls, FilingColumns, SubmissionsDocument};
use crate::errors::{FilingError, Result};
use crate::models::{dashed_accession, normalize_registry_id, FilingRecord};

pub struct FilingIndex {
    fetch: Arc<dyn Fetch>,
    urls: EdgarUrls,
}

impl FilingIndex {
    pub fn new(fetch: Arc<dyn Fetch>, urls: EdgarUrls) -> Self {
        Self { fetch, urls }
    }

    /// Every filing for the entity, newest first, one entry per accession
    pub async fn list_all(&self, registry_id: &str) -> Result<Vec<FilingRecord>> {
        let registry_id = normalize_registry_id(registry_id)?;

        let url = self.urls.recent_index(&registry_id);
        let body = self.fetch.get_text(&url).await?;
        let submissions: SubmissionsDocument = serde_json::from_str(&body).map_err(|e| {
            FilingError::UpstreamUnavailable(format!("malformed submissions index {}: {}", url, e))
        })?;

        let mut sources = vec![transpose(&registry_id, &submissions.filings.recent)?];
        debug!(
            "Recent index for {} lists {} filings and {} historical files",
            registry_id,
            sources[0].len(),
            submissions.filings.files.len()
        );

        for file in &submissions.filings.files {
            match self.fetch_historical(&registry_id, &file.name).await {
                Ok(records) => {
                    debug!("Historical file {} contributed {} filings", file.name, records.len());
                    sources.push(records);
                }
                Err(e) => {
                    warn!("Skipping historical index {}: {}", file.name, e);
                }
            }
        }

        let merged = merge_sources(sources);
        info!("Aggregated {} filings for registry ID {}", merged.len(), registry_id);
        Ok(merged)
    }

    async fn fetch_historical(&self, registry_id: &str, file_name: &str) -> Result<Vec<FilingRecord>> {
        let url = self.urls.historical_index(file_name);
        let body = self.fetch.get_text(&url).await?;
        let columns: FilingColumns = serde_json::from_str(&body)?;
        transpose(registry_id, &columns)
    }
}

/// Turn parallel arrays into row records.
///
/// The three required columns must have equal length; optional columns may be
/// shorter. Rows with an unparseable filing date are dropped.
pub fn transpose(registry_id: &str, columns: &FilingColumns) -> Result<Vec<FilingRecord>> {
    let rows = columns.accession_number.len();
    if columns.filing_date.len() != rows || columns.form.len() != rows {
        return Err(FilingError::UpstreamUnavailable(format!(
            "filing columns disagree in length (accessionNumber={}, filingDate={}, form={})",
            rows,
            columns.filing_date.len(),
            columns.form.len()
        )));
    }

    let mut records = Vec::with_capacity(rows);
    for i in 0..rows {
        let filed_date = match NaiveDate::parse_from_str(columns.filing_date[i].trim(), "%Y-%m-%d") {
            Ok(date) => date,
            Err(e) => {
                warn!(
                    "Dropping filing {} with bad date '{}': {}",
                    columns.accession_number[i], columns.filing_date[i], e
                );
                continue;
            }
        };

        records.push(FilingRecord {
            registry_id: registry_id.to_string(),
            form_type: columns.form[i].trim().to_string(),
            filed_date,
            accession_id: dashed_accession(&columns.accession_number[i]),
            primary_document_ref: non_empty(columns.primary_document.get(i)),
            report_date: columns
                .report_date
                .get(i)
                .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
            primary_doc_description: non_empty(columns.primary_doc_description.get(i)),
        });
    }
    Ok(records)
}

/// Concatenate sources in priority order, drop repeated accessions (first
/// occurrence wins) and stable-sort newest first so same-day ties keep
/// source order.
pub fn merge_sources(sources: Vec<Vec<FilingRecord>>) -> Vec<FilingRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<FilingRecord> = sources
        .into_iter()
        .flatten()
        .filter(|record| seen.insert(record.accession_compact()))
        .collect();
    merged.sort_by(|a, b| b.filed_date.cmp(&a.filed_date));
    merged
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
