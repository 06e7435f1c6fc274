use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Timed out after {}s waiting for {locator}", timeout.as_secs())]
    WaitTimeout { locator: String, timeout: Duration },

    #[error("Login failed: {message}")]
    Login {
        message: String,
        snapshot: Option<PathBuf>,
    },

    #[error("Scraper not operational")]
    SessionUnavailable,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Path of the page snapshot captured when this error was raised, if any.
    pub fn snapshot(&self) -> Option<&PathBuf> {
        match self {
            AppError::Login { snapshot, .. } => snapshot.as_ref(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
