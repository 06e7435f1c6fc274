pub mod browser;
pub mod config;
pub mod matcher;
pub mod models;
pub mod price_lookup;
pub mod session;
pub mod site;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use matcher::MatchExtractor;
pub use models::{MatchResult, ProductCandidate};
pub use price_lookup::PriceLookup;
pub use session::{PageFetcher, SessionManager, SessionState};
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
