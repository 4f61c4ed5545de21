//! URL handling module for gleaner
//!
//! This module provides scheme defaulting, the scheme-insensitive URL
//! comparator, relative-href resolution, registrable-domain extraction,
//! and the URL hash used for identity everywhere in the crawler.

mod domain;
mod hash;
mod normalize;

pub use domain::registrable_domain;
pub use hash::url_hash;
pub use normalize::{ensure_default_scheme, resolve_href, same_url};
