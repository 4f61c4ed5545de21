//! Traversal engine
//!
//! The engine owns all per-crawl state: the compiled filter rule sets, the
//! visited set of URL hashes, the HTTP client, and (when resumability is
//! enabled) the durable pending-entry store. One instance is constructed per
//! crawl and torn down when the run ends or the consumer cancels.
//!
//! Expansion is depth-bounded and uses an explicit work-stack of
//! `(url, remaining_depth)` pairs instead of recursion, pushing each page's
//! accepted children in reverse so the expansion order matches a recursive
//! walk: a page's subtree is fully explored, in document order, before its
//! next sibling.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_html, RetryPolicy};
use crate::crawler::parser::extract_hrefs;
use crate::filter::FilterRules;
use crate::storage::{SqliteStateStore, StateStore};
use crate::url::{ensure_default_scheme, registrable_domain, resolve_href, same_url, url_hash};
use crate::{GleanerError, Result, UrlError};
use reqwest::Client;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Everything needed to construct a [`Crawler`]
#[derive(Debug, Default)]
pub struct CrawlerOptions {
    /// The seed URL; a missing scheme gets `default_scheme` prepended
    pub seed_url: String,

    /// Scheme prepended to schemeless URLs ("http" if empty)
    pub default_scheme: String,

    /// Rule set gating which URLs may be followed (recursed into)
    pub entry_filter: Option<FilterRules>,

    /// Rule set gating which URLs may be reported to the caller
    pub yield_filter: Option<FilterRules>,

    /// External identifier for this crawler instance; generated when absent
    pub identifier: Option<String>,

    /// User-agent header sent with every request
    pub user_agent: String,

    /// Retry policy for transient fetch failures
    pub retry: RetryPolicy,

    /// Path to the state database; `Some` enables resumability
    pub state_db: Option<PathBuf>,
}

/// A single-site, depth-bounded crawler
pub struct Crawler {
    seed_url: String,
    domain: String,
    identifier: String,
    entry_filter: Option<FilterRules>,
    yield_filter: Option<FilterRules>,
    visited: HashSet<String>,
    state: Option<SqliteStateStore>,
    client: Client,
    retry: RetryPolicy,
}

impl Crawler {
    /// Constructs a crawler from options
    ///
    /// Derives the crawl's registrable domain and its storage identity (the
    /// hash of the scheme-ensured seed URL) once; both are immutable for the
    /// crawler's lifetime.
    pub fn new(options: CrawlerOptions) -> Result<Self> {
        let default_scheme = if options.default_scheme.is_empty() {
            "http"
        } else {
            &options.default_scheme
        };
        let seed_url = ensure_default_scheme(&options.seed_url, default_scheme);

        let domain = registrable_domain(&seed_url)
            .ok_or_else(|| UrlError::MissingHost(seed_url.clone()))?;

        let identifier = options
            .identifier
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        // The crawl identity namespaces durable state per seed site
        let state = match options.state_db {
            Some(path) => Some(SqliteStateStore::open(&path, &url_hash(&seed_url))?),
            None => None,
        };

        let user_agent = if options.user_agent.is_empty() {
            concat!("gleaner/", env!("CARGO_PKG_VERSION")).to_string()
        } else {
            options.user_agent
        };
        let client = build_http_client(&user_agent)?;

        Ok(Self {
            seed_url,
            domain,
            identifier,
            entry_filter: options.entry_filter,
            yield_filter: options.yield_filter,
            visited: HashSet::new(),
            state,
            client,
            retry: options.retry,
        })
    }

    /// Constructs a crawler from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let entry_filter = config
            .entry_filter
            .as_ref()
            .map(|f| FilterRules::new(f.mode, &f.patterns))
            .transpose()?;
        let yield_filter = config
            .yield_filter
            .as_ref()
            .map(|f| FilterRules::new(f.mode, &f.patterns))
            .transpose()?;

        Self::new(CrawlerOptions {
            seed_url: config.crawler.seed_url.clone(),
            default_scheme: config.crawler.default_scheme.clone(),
            entry_filter,
            yield_filter,
            identifier: config.crawler.identifier.clone(),
            user_agent: config.crawler.user_agent.clone(),
            retry: config.retry.policy(),
            state_db: config
                .storage
                .as_ref()
                .map(|s| PathBuf::from(&s.database_path)),
        })
    }

    /// The external identifier of this crawler instance
    pub fn id(&self) -> &str {
        &self.identifier
    }

    /// The scheme-ensured seed URL
    pub fn seed_url(&self) -> &str {
        &self.seed_url
    }

    /// The registrable domain the crawl is confined to
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Discards all persisted pending records for this crawl identity
    pub fn clear_state(&mut self) -> Result<()> {
        if let Some(state) = &mut self.state {
            state.clear()?;
        }
        Ok(())
    }

    /// Starts the traversal, returning the output and error channels
    ///
    /// The traversal runs as a spawned task producing into a bounded channel,
    /// so expansion is driven by the consumer pulling URLs. Dropping the URL
    /// receiver cancels the crawl cooperatively: the in-flight fetch finishes
    /// and no further expansion begins. Per-page failures arrive on the error
    /// channel and never interrupt the URL stream.
    pub fn start(
        self,
        max_depth: u32,
    ) -> (
        mpsc::Receiver<String>,
        mpsc::UnboundedReceiver<GleanerError>,
    ) {
        let (tx, rx) = mpsc::channel(32);
        let (err_tx, err_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            self.run(max_depth, tx, err_tx).await;
        });

        (rx, err_rx)
    }

    /// Runs the traversal to completion
    ///
    /// With resumability enabled and pending records present from a prior
    /// run, the work-stack is seeded with every pending URL at the full
    /// `max_depth` budget (remaining depth is not preserved across runs) and
    /// the seed URL itself is not expanded. Otherwise the stack starts with
    /// the seed alone.
    async fn run(
        mut self,
        max_depth: u32,
        tx: mpsc::Sender<String>,
        err_tx: mpsc::UnboundedSender<GleanerError>,
    ) {
        let mut initial: Vec<String> = Vec::new();

        if let Some(state) = &self.state {
            match state.exists().and_then(|has| {
                if has {
                    state.list_all()
                } else {
                    Ok(Vec::new())
                }
            }) {
                Ok(pending) if !pending.is_empty() => {
                    tracing::info!("Resuming crawl from {} pending entries", pending.len());
                    initial = pending;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Failed to load pending entries: {}", e);
                    let _ = err_tx.send(e.into());
                }
            }
        }

        if initial.is_empty() {
            initial.push(self.seed_url.clone());
        }

        // Reversed so the first entry is expanded first
        let mut stack: Vec<(String, u32)> = initial
            .into_iter()
            .rev()
            .map(|url| (url, max_depth))
            .collect();

        while let Some((entry_url, remaining)) = stack.pop() {
            // Consumer stopped pulling: finish nothing further
            if tx.is_closed() {
                tracing::debug!("Output receiver dropped, stopping traversal");
                return;
            }

            // Depth budget exhaustion is silent, not an error
            if remaining == 0 {
                continue;
            }

            if self.visited.contains(&url_hash(&entry_url)) {
                continue;
            }

            if !self
                .expand(&entry_url, remaining, &mut stack, &tx, &err_tx)
                .await
            {
                return;
            }
        }
    }

    /// Expands one page: fetch, classify links, update state
    ///
    /// Returns false when the consumer has gone away and the traversal
    /// should stop.
    async fn expand(
        &mut self,
        entry_url: &str,
        remaining: u32,
        stack: &mut Vec<(String, u32)>,
        tx: &mpsc::Sender<String>,
        err_tx: &mpsc::UnboundedSender<GleanerError>,
    ) -> bool {
        tracing::debug!("Expanding {} (remaining depth {})", entry_url, remaining);

        let body = match fetch_html(&self.client, entry_url, &self.retry).await {
            Ok(body) => body,
            Err(e) => {
                // Branch abandoned: not marked visited, so a still-pending
                // durable record lets a future run retry this page
                tracing::warn!("Abandoning {}: {}", entry_url, e);
                let _ = err_tx.send(e.into());
                return true;
            }
        };

        let mut next_entries: Vec<String> = Vec::new();

        for href in extract_hrefs(&body) {
            let candidate = match resolve_href(entry_url, &href) {
                Some(url) => url,
                None => continue,
            };

            if !self.global_filter(entry_url, &candidate) {
                continue;
            }

            if self.yield_allowed(&candidate) && tx.send(candidate.clone()).await.is_err() {
                return false;
            }

            if self.entry_allowed(&candidate) {
                next_entries.push(candidate);
            }
        }

        // Only a successfully expanded page counts as visited
        self.visited.insert(url_hash(entry_url));

        if let Some(state) = &mut self.state {
            if let Err(e) = state.remove_many(&[entry_url.to_string()]) {
                tracing::warn!("Failed to remove pending entry {}: {}", entry_url, e);
            }
        }

        // Stop one level early: these children were discovered and
        // classified but will not themselves be expanded
        if remaining <= 1 {
            return true;
        }

        // Persist the batch before descending so an interrupted run resumes
        // from durable records instead of losing discovered work
        if let Some(state) = &mut self.state {
            if let Err(e) = state.add_many(&next_entries) {
                tracing::warn!("Failed to persist pending entries: {}", e);
            }
        }

        for next in next_entries.into_iter().rev() {
            if !self.visited.contains(&url_hash(&next)) {
                stack.push((next, remaining - 1));
            }
        }

        true
    }

    /// Global filter applied to every resolved candidate
    ///
    /// Rejects candidates outside the crawl's registrable domain, candidates
    /// equal to the seed URL, and candidates equal to the page currently
    /// being expanded.
    fn global_filter(&self, entry_url: &str, candidate: &str) -> bool {
        match registrable_domain(candidate) {
            Some(domain) if domain == self.domain => {}
            _ => return false,
        }

        if same_url(candidate, &self.seed_url) {
            return false;
        }

        if same_url(candidate, entry_url) {
            return false;
        }

        true
    }

    fn entry_allowed(&self, url: &str) -> bool {
        self.entry_filter.as_ref().map_or(true, |f| f.passes(url))
    }

    fn yield_allowed(&self, url: &str) -> bool {
        self.yield_filter.as_ref().map_or(true, |f| f.passes(url))
    }
}
