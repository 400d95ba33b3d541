//! SEC EDGAR upstream access
//!
//! Entity directory, submissions indexes and archive documents. Everything
//! coming off the wire is parsed into strict types here; the rest of the crate
//! only sees `IdentifierRecord` and `FilingRecord`.

pub mod client;
pub mod directory;
pub mod documents;
pub mod submissions;
pub mod types;

pub use client::{EdgarClient, Fetch};
pub use directory::{IdentifierIndex, Snapshot};
pub use documents::{DocumentFetcher, DocumentRef, FetchedDocument};
pub use submissions::FilingIndex;
pub use types::EdgarUrls;
