use std::sync::Arc;
use tracing::{info, warn};
use url::form_urlencoded;

use crate::matcher::MatchExtractor;
use crate::models::{MatchResult, query_of};
use crate::session::{PageFetcher, SessionState};

pub const NOT_OPERATIONAL: &str = "scraper not operational";

/// Runs one query end to end: session check, search page fetch, match extraction.
pub struct PriceLookup {
    fetcher: Arc<dyn PageFetcher>,
    extractor: MatchExtractor,
    search_page_url: String,
}

impl PriceLookup {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: MatchExtractor,
        search_page_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            search_page_url: search_page_url.into(),
        }
    }

    /// Search URL for `query`, form-encoded (`+` for spaces) and appended to
    /// the configured prefix.
    pub fn search_url(&self, query: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
        format!("{}{}", self.search_page_url, encoded)
    }

    pub async fn lookup(&self, query: &str) -> MatchResult {
        if !self.fetcher.ensure_session().await {
            warn!(query = %query, "Lookup refused, session is not operational");
            return MatchResult::failed(Some(query.to_string()), NOT_OPERATIONAL);
        }

        let url = self.search_url(query);
        info!(query = %query, url = %url, "Searching product");

        let html = match self.fetcher.fetch_page(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(query = %query, url = %url, "Search failed: {}", e);
                return MatchResult::failed(Some(query.to_string()), format!("search failed: {}", e));
            }
        };

        // Error results keep every field but the query and the error null.
        let result = self.extractor.extract(query, &html);
        if result.is_match() {
            result.with_url(url)
        } else {
            result
        }
    }

    /// Looks up each `products` entry in order. Entries without a usable query
    /// get a "missing query" result and are not sent to the browser.
    pub async fn lookup_items(&self, items: &[serde_json::Value]) -> Vec<MatchResult> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let result = match query_of(item) {
                Some(query) => self.lookup(query).await,
                None => MatchResult::missing_query(),
            };
            results.push(result);
        }
        results
    }

    pub async fn session_state(&self) -> SessionState {
        self.fetcher.state().await
    }

    pub fn threshold(&self) -> u8 {
        self.extractor.threshold()
    }
}
