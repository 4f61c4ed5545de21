//! Crawler module
//!
//! This module contains the traversal engine and its collaborators:
//! - HTTP fetching with bounded fixed-delay retry
//! - Anchor href extraction from page text
//! - The depth-bounded, resumable traversal itself

mod engine;
mod fetcher;
mod parser;

pub use engine::{Crawler, CrawlerOptions};
pub use fetcher::{build_http_client, fetch_html, FetchError, RetryPolicy};
pub use parser::extract_hrefs;
