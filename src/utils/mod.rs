pub mod diagnostics;
pub mod error;

pub use error::{AppError, Result};
