use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const STOCK_IN: &str = "in stock";
pub const STOCK_OUT: &str = "out of stock";

/// One listing parsed from a results page. Lives only while scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCandidate {
    pub name: String,
    pub price_text: String,
    pub stock_present: bool,
}

/// Outcome of a single lookup. Either the match fields or `error` is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub original_query: Option<String>,
    pub found_name: Option<String>,
    pub price: Option<Decimal>,
    pub stock_text: Option<String>,
    pub stock_available: Option<bool>,
    pub url_searched: Option<String>,
    pub match_score: Option<u8>,
    pub error: Option<String>,
}

impl MatchResult {
    pub fn matched(
        query: impl Into<String>,
        candidate: ProductCandidate,
        price: Decimal,
        score: u8,
        url_searched: Option<String>,
    ) -> Self {
        let stock_text = if candidate.stock_present { STOCK_IN } else { STOCK_OUT };
        Self {
            original_query: Some(query.into()),
            found_name: Some(candidate.name),
            price: Some(price),
            stock_text: Some(stock_text.to_string()),
            stock_available: Some(candidate.stock_present),
            url_searched,
            match_score: Some(score),
            error: None,
        }
    }

    pub fn failed(query: Option<String>, error: impl Into<String>) -> Self {
        Self {
            original_query: query,
            found_name: None,
            price: None,
            stock_text: None,
            stock_available: None,
            url_searched: None,
            match_score: None,
            error: Some(error.into()),
        }
    }

    pub fn missing_query() -> Self {
        Self::failed(None, "missing query")
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url_searched = Some(url.into());
        self
    }

    pub fn is_match(&self) -> bool {
        self.error.is_none()
    }
}

/// Body of `POST /get_prices` once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRequest {
    pub products: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResponse {
    pub results: Vec<MatchResult>,
}

/// Pulls a usable query out of one `products` entry.
///
/// Anything other than an object with a non-empty string `query` counts as missing.
pub fn query_of(item: &serde_json::Value) -> Option<&str> {
    item.get("query")
        .and_then(|q| q.as_str())
        .filter(|q| !q.is_empty())
}
