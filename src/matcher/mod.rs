//! Picks the product card that best matches a free-text query.

use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::models::{MatchResult, ProductCandidate};
use crate::site::SiteAdapter;

pub mod price;
pub mod similarity;

pub use price::parse_price;
pub use similarity::ratio;

pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 65;

pub struct MatchExtractor {
    site: Arc<dyn SiteAdapter>,
    threshold: u8,
}

/// Highest-scoring candidate seen so far.
#[derive(Debug, Clone, PartialEq)]
pub struct BestMatch {
    pub candidate: ProductCandidate,
    pub score: u8,
}

impl MatchExtractor {
    pub fn new(site: Arc<dyn SiteAdapter>, threshold: u8) -> Self {
        Self { site, threshold }
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Scores every card on a results page against `query` and returns the best
    /// match at or above the confidence threshold, or an error result.
    pub fn extract(&self, query: &str, results_html: &str) -> MatchResult {
        let document = Html::parse_document(results_html);
        let cards = self.site.product_cards(&document);

        if cards.is_empty() {
            debug!(query = %query, "No product containers on results page");
            return MatchResult::failed(Some(query.to_string()), "no product containers found");
        }

        let candidates: Vec<ProductCandidate> = cards
            .into_iter()
            .filter_map(|card| self.site.candidate(card))
            .collect();
        trace!("Parsed {} named candidates", candidates.len());

        let best = best_match(query, candidates);

        match best {
            Some(best) if best.score >= self.threshold => {
                let price = parse_price(&best.candidate.price_text);
                info!(
                    query = %query,
                    found = %best.candidate.name,
                    score = best.score,
                    price = %price,
                    in_stock = best.candidate.stock_present,
                    "Product matched"
                );
                MatchResult::matched(query, best.candidate, price, best.score, None)
            }
            best => {
                let mut message = format!(
                    "no result with minimum confidence of {}% found",
                    self.threshold
                );
                if let Some(best) = best {
                    message.push_str(&format!(
                        ". Best attempt was '{}' with score {}.",
                        best.candidate.name, best.score
                    ));
                }
                debug!(query = %query, "{}", message);
                MatchResult::failed(Some(query.to_string()), message)
            }
        }
    }
}

/// Case-insensitive best match. Only a strictly greater score replaces the
/// current best, so the first card in document order wins ties, and a
/// candidate scoring 0 is never selected.
pub fn best_match(query: &str, candidates: Vec<ProductCandidate>) -> Option<BestMatch> {
    let query = query.to_lowercase();
    let mut best: Option<BestMatch> = None;
    let mut highest = 0u8;

    for candidate in candidates {
        let score = ratio(&query, &candidate.name.to_lowercase());
        trace!(name = %candidate.name, score, "Scored candidate");
        if score > highest {
            highest = score;
            best = Some(BestMatch { candidate, score });
        }
    }

    best
}
