//! Filing document retrieval

use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::edgar::client::Fetch;
use crate::edgar::types::EdgarUrls;
use crate::errors::{FilingError, Result};
use crate::models::{compact_accession, dashed_accession, DocumentKind, FilingRecord};
use crate::rate_limiter::RateLimiter;

/// Location of one filing's documents in the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub registry_id: String,
    pub accession_id: String,
    /// Primary document name as listed by the filing index
    pub name: Option<String>,
}

impl DocumentRef {
    pub fn for_filing(filing: &FilingRecord) -> Self {
        Self {
            registry_id: filing.registry_id.clone(),
            accession_id: filing.accession_id.clone(),
            name: filing.primary_document_ref.clone(),
        }
    }

    /// Primary document name with any `xsl…/` rendering directory removed.
    ///
    /// Ownership forms are listed as `xslF345X05/form4.xml`, which serves an
    /// HTML rendering; the raw XML lives at `form4.xml`.
    pub fn raw_name(&self) -> Option<&str> {
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        match name.split_once('/') {
            Some((dir, rest)) if dir.to_ascii_lowercase().starts_with("xsl") && !rest.is_empty() => {
                Some(rest)
            }
            _ => Some(name),
        }
    }

    /// Complete submission text file, present for every filing
    pub fn submission_text_name(&self) -> String {
        format!("{}.txt", dashed_accession(&self.accession_id))
    }

    /// Names to try, in order
    pub fn candidates(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(2);
        if let Some(raw) = self.raw_name() {
            names.push(raw.to_string());
        }
        let full_text = self.submission_text_name();
        if !names.contains(&full_text) {
            names.push(full_text);
        }
        names
    }
}

#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub kind: DocumentKind,
    pub content: String,
    pub url: String,
}

pub struct DocumentFetcher {
    fetch: Arc<dyn Fetch>,
    urls: EdgarUrls,
    limiter: Arc<RateLimiter>,
    timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(fetch: Arc<dyn Fetch>, urls: EdgarUrls, limiter: Arc<RateLimiter>, timeout: Duration) -> Self {
        Self {
            fetch,
            urls,
            limiter,
            timeout,
        }
    }

    /// Fetch the first available candidate document.
    ///
    /// Every attempt waits on the shared rate limiter and is bounded by the
    /// per-document timeout. The last attempt's error is returned when all fail.
    pub async fn fetch(&self, document: &DocumentRef) -> Result<FetchedDocument> {
        let accession = compact_accession(&document.accession_id);
        if accession.is_empty() {
            return Err(FilingError::InvalidIdentifier(format!(
                "document reference without accession for {}",
                document.registry_id
            )));
        }

        let mut last_error = None;
        for name in document.candidates() {
            let url = self.urls.archive_document(&document.registry_id, &accession, &name);

            self.limiter.throttle().await;
            let outcome = tokio::time::timeout(self.timeout, self.fetch.get_text(&url)).await;

            match outcome {
                Ok(Ok(content)) => {
                    let kind = DocumentKind::from_name(&name);
                    debug!("Fetched {} ({} bytes of {})", url, content.len(), kind.as_str());
                    return Ok(FetchedDocument {
                        kind,
                        content,
                        url,
                    });
                }
                Ok(Err(e)) => {
                    debug!("Document attempt failed for {}: {}", url, e);
                    last_error = Some(e);
                }
                Err(_) => {
                    debug!("Document attempt timed out after {:?}: {}", self.timeout, url);
                    last_error = Some(FilingError::Timeout(url));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FilingError::NotFound(document.accession_id.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::edgar::client::testing::StaticFetch;

    const BASE: &str = "https://www.sec.gov/Archives/edgar/data/1045810/000104581024000031";

    fn form4_ref() -> DocumentRef {
        DocumentRef {
            registry_id: "0001045810".to_string(),
            accession_id: "0001045810-24-000031".to_string(),
            name: Some("xslF345X05/wk-form4_1708560000.xml".to_string()),
        }
    }

    fn fetcher(fetch: Arc<StaticFetch>, timeout: Duration) -> DocumentFetcher {
        DocumentFetcher::new(
            fetch,
            EdgarUrls::new(&Endpoints::default()),
            Arc::new(RateLimiter::new(Duration::from_millis(100))),
            timeout,
        )
    }

    #[test]
    fn test_candidates_strip_rendering_prefix() {
        assert_eq!(
            form4_ref().candidates(),
            vec!["wk-form4_1708560000.xml", "0001045810-24-000031.txt"]
        );

        let no_primary = DocumentRef {
            name: None,
            ..form4_ref()
        };
        assert_eq!(no_primary.candidates(), vec!["0001045810-24-000031.txt"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_primary_document() {
        let fetch = Arc::new(
            StaticFetch::new().with(format!("{}/wk-form4_1708560000.xml", BASE), "<ownershipDocument/>"),
        );
        let document = fetcher(fetch, Duration::from_secs(5)).fetch(&form4_ref()).await.unwrap();
        assert_eq!(document.kind, DocumentKind::StructuredMarkup);
        assert_eq!(document.content, "<ownershipDocument/>");
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_submission_text() {
        let fetch = Arc::new(
            StaticFetch::new().with(format!("{}/0001045810-24-000031.txt", BASE), "<SEC-DOCUMENT>"),
        );
        let document = fetcher(Arc::clone(&fetch), Duration::from_secs(5))
            .fetch(&form4_ref())
            .await
            .unwrap();

        assert_eq!(document.kind, DocumentKind::PlainText);
        assert_eq!(fetch.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_everywhere_is_not_found() {
        let fetch = Arc::new(StaticFetch::new());
        let err = fetcher(fetch, Duration::from_secs(5)).fetch(&form4_ref()).await.unwrap_err();
        assert!(matches!(err, FilingError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_document_times_out() {
        let text_url = format!("{}/0001045810-24-000031.txt", BASE);
        let fetch = Arc::new(
            StaticFetch::new()
                .with(text_url.clone(), "late")
                .with_delay(text_url, Duration::from_secs(30)),
        );
        let err = fetcher(fetch, Duration::from_secs(2)).fetch(&form4_ref()).await.unwrap_err();
        assert!(matches!(err, FilingError::Timeout(_)));
    }
}
