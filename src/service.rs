//! Request orchestration: resolution, filing listing and document mining

use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::edgar::{DocumentFetcher, DocumentRef, EdgarClient, EdgarUrls, Fetch, FilingIndex, IdentifierIndex};
use crate::errors::{FilingError, Result};
use crate::extract::{self, text, FormFamily};
use crate::filters::{self, FilingFilter, PageRequest, Window};
use crate::models::{EnrichedFiling, FilingPage, FilingRecord, Resolution, Signals};
use crate::name_match;
use crate::rate_limiter::RateLimiter;
use crate::resolver::{parse_query, ParsedQuery, Resolver};

/// Form filter applied to person searches that name no form type
const DEFAULT_PERSON_FORMS: &str = "OWNERSHIP";

/// Outcome of mining a batch of filings
#[derive(Debug, Default)]
struct MinedBatch {
    items: Vec<EnrichedFiling>,
    partial: bool,
    unminable: usize,
}

pub struct FilingService {
    config: Config,
    index: IdentifierIndex,
    resolver: Resolver,
    filings: FilingIndex,
    documents: DocumentFetcher,
}

impl FilingService {
    /// Service talking to the live registry
    pub fn new(config: Config) -> Result<Self> {
        let client = EdgarClient::new(&config)?;
        Ok(Self::with_fetch(config, Arc::new(client)))
    }

    /// Service over any transport
    pub fn with_fetch(config: Config, fetch: Arc<dyn Fetch>) -> Self {
        let urls = EdgarUrls::new(&config.endpoints);
        let limiter = Arc::new(RateLimiter::new(config.document_delay()));

        Self {
            index: IdentifierIndex::new(Arc::clone(&fetch), urls.directory(), config.directory_ttl()),
            resolver: Resolver::new(config.resolver.clone()),
            filings: FilingIndex::new(Arc::clone(&fetch), urls.clone()),
            documents: DocumentFetcher::new(fetch, urls, limiter, config.document_timeout()),
            config,
        }
    }

    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        match parse_query(query)? {
            ParsedQuery::RegistryId(registry_id) => {
                // The directory only decorates a numeric query; it is never required
                let snapshot = match self.index.snapshot().await {
                    Ok(snapshot) => Some(snapshot),
                    Err(e) => {
                        warn!("Entity directory unavailable, resolving {} without it: {}", registry_id, e);
                        None
                    }
                };
                let known = snapshot.as_ref().and_then(|s| s.lookup(&registry_id));
                Ok(self.resolver.resolve_registry_id(&registry_id, known))
            }
            ParsedQuery::Text(text) => {
                let snapshot = self.index.snapshot().await?;
                let resolution = self.resolver.rank(&text, snapshot.records())?;
                debug!(
                    "Resolved '{}' to {} candidates (exact: {})",
                    text,
                    resolution.candidates.len(),
                    resolution.exact.is_some()
                );
                Ok(resolution)
            }
        }
    }

    /// Registry ID for `query`, or `AmbiguousIdentifier` listing the candidates
    pub async fn resolve_exact(&self, query: &str) -> Result<String> {
        let resolution = self.resolve(query).await?;
        match resolution.exact {
            Some(record) => Ok(record.registry_id),
            None => Err(FilingError::AmbiguousIdentifier {
                query: query.trim().to_string(),
                candidates: resolution.candidates,
            }),
        }
    }

    /// One page of the entity's filings, optionally mined for signals
    pub async fn list_filings(
        &self,
        registry_id: &str,
        filter: &FilingFilter,
        request: PageRequest,
        enrich: bool,
    ) -> Result<FilingPage> {
        let all = self.filings.list_all(registry_id).await?;
        let window = filters::apply(all, filter, request, self.config.max_page_size);
        info!(
            "Listing page {} ({} of {} filings) for {}",
            window.page,
            window.items.len(),
            window.total,
            registry_id
        );

        let (records, window) = take_items(window);
        let batch = if enrich {
            self.mine(records).await
        } else {
            MinedBatch {
                items: records.into_iter().map(EnrichedFiling::from).collect(),
                ..Default::default()
            }
        };

        Ok(page_from(window, batch))
    }

    /// Filings whose documents mention `person`.
    ///
    /// Without a form filter only ownership forms are searched. At most
    /// `person_scan_limit` filings (newest first) are inspected; the page is
    /// then cut from the matches.
    pub async fn search_by_person(
        &self,
        registry_id: &str,
        person: &str,
        filter: &FilingFilter,
        request: PageRequest,
    ) -> Result<FilingPage> {
        if name_match::normalize(person).is_empty() {
            return Err(FilingError::InvalidIdentifier("empty person name".to_string()));
        }

        let mut effective = filter.clone();
        if effective.form_types.is_empty() {
            effective.form_types.push(DEFAULT_PERSON_FORMS.to_string());
        }

        let mut candidates = filters::filter(self.filings.list_all(registry_id).await?, &effective);
        let limit = self.config.mining.person_scan_limit;
        let capped = candidates.len() > limit;
        if capped {
            info!("Person search for {} capped at {} of {} filings", registry_id, limit, candidates.len());
            candidates.truncate(limit);
        }

        let deadline = Instant::now() + self.config.mining_deadline();
        let mut matched = Vec::new();
        let mut partial = capped;
        let mut unminable = 0;

        for filing in candidates {
            match timeout_at(deadline, self.inspect_for_person(&filing, person)).await {
                Ok(Ok(Some(signals))) => matched.push(EnrichedFiling {
                    filing,
                    signals: Some(signals).filter(|s| !s.is_empty()),
                }),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    warn!("Could not inspect {} for '{}': {}", filing.accession_id, person, e);
                    unminable += 1;
                }
                Err(_) => {
                    warn!("Person search deadline reached after {} matches", matched.len());
                    partial = true;
                    break;
                }
            }
        }

        info!("Person search for '{}' matched {} filings of {}", person, matched.len(), registry_id);
        let window = filters::paginate(matched, request, self.config.max_page_size);
        let (items, window) = take_items(window);

        Ok(page_from(
            window,
            MinedBatch {
                items,
                partial,
                unminable,
            },
        ))
    }

    /// Fetch and mine each filing in order under the batch deadline. Filings
    /// left over when the deadline passes are returned without signals.
    async fn mine(&self, filings: Vec<FilingRecord>) -> MinedBatch {
        let deadline = Instant::now() + self.config.mining_deadline();
        let mut batch = MinedBatch {
            items: Vec::with_capacity(filings.len()),
            ..Default::default()
        };

        let mut pending = filings.into_iter();
        while let Some(filing) = pending.next() {
            let family = FormFamily::of(&filing.form_type);
            if !family.is_minable() {
                batch.items.push(filing.into());
                continue;
            }
            debug!("Mining {} as {}", filing.accession_id, family.as_str());

            match timeout_at(deadline, self.mine_one(&filing)).await {
                Ok(Ok(signals)) => batch.items.push(EnrichedFiling { filing, signals }),
                Ok(Err(e)) => {
                    warn!("No signals for {}: {}", filing.accession_id, e);
                    batch.unminable += 1;
                    batch.items.push(filing.into());
                }
                Err(_) => {
                    warn!(
                        "Mining deadline of {:?} reached, returning {} filings unmined",
                        self.config.mining_deadline(),
                        pending.len() + 1
                    );
                    batch.partial = true;
                    batch.items.push(filing.into());
                    batch.items.extend(pending.map(EnrichedFiling::from));
                    break;
                }
            }
        }

        batch
    }

    async fn mine_one(&self, filing: &FilingRecord) -> Result<Option<Signals>> {
        let document = self.documents.fetch(&DocumentRef::for_filing(filing)).await?;
        Ok(extract::extract(&document.content, document.kind, &filing.form_type))
    }

    /// `Some(signals)` when the filing's document mentions `person`
    async fn inspect_for_person(&self, filing: &FilingRecord, person: &str) -> Result<Option<Signals>> {
        let document = self.documents.fetch(&DocumentRef::for_filing(filing)).await?;
        let signals = extract::extract(&document.content, document.kind, &filing.form_type).unwrap_or_default();

        let owner_match = signals
            .owner_names
            .iter()
            .any(|owner| name_match::matches_owner_name(owner, person));
        if owner_match || name_match::matches(&text::to_text(&document.content, document.kind), person) {
            Ok(Some(signals))
        } else {
            Ok(None)
        }
    }
}

fn take_items<T>(window: Window<T>) -> (Vec<T>, Window<()>) {
    let Window {
        items,
        total,
        page,
        page_size,
        has_more,
    } = window;
    (
        items,
        Window {
            items: Vec::new(),
            total,
            page,
            page_size,
            has_more,
        },
    )
}

fn page_from(window: Window<()>, batch: MinedBatch) -> FilingPage {
    FilingPage {
        items: batch.items,
        total: window.total,
        page: window.page,
        page_size: window.page_size,
        has_more: window.has_more,
        partial: batch.partial,
        unminable: batch.unminable,
    }
}
