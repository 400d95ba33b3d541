//! Resolve companies to SEC registry IDs, aggregate their EDGAR filing
//! history and mine individual filings for signals.

pub mod config;
pub mod edgar;
pub mod errors;
pub mod extract;
pub mod filters;
pub mod models;
pub mod name_match;
pub mod rate_limiter;
pub mod resolver;
pub mod service;

pub use errors::{ErrorPayload, FilingError};
pub use service::FilingService;
