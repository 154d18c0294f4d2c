//! Per-partition QSO enrichment against the contact lookup service.
//!
//! Each partition opens one lookup client (and with it one connection
//! pool), fans its `(key, id)` pairs out with at most `max_concurrency`
//! requests in flight, and gathers completions as they arrive. A request
//! that fails, times out, returns a non-2xx status or an undecodable body
//! costs only its own key; the rest of the partition still comes back.
//!
//! ```text
//! pairs ──▶ connect ──▶ submit (≤ C in flight) ──▶ collect ──▶ results
//!              │                                              │
//!              └──────────── client dropped on exit ◀─────────┘
//! ```

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures_util::{StreamExt, stream};
use indicatif::ProgressBar;
use rustc_hash::FxHashSet;

use hamlog_core::{
    Counter, FetchError, Partitions, SHARED_RUNTIME, SharedCounters, build_client, shutdown_flag,
};

use crate::qso::{EnrichedResult, Qso, decode_qsos};

pub const DEFAULT_MAX_CONCURRENCY: usize = 10;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BASE_URL: &str = "http://new73s.herokuapp.com/qsos";

/// `(key, lookup id)`; the key names the result, the id goes in the URL
pub type LookupPair = (String, String);

/// Lookup service settings shared by every partition
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichConfig {
    /// Requests go to `<base_url>/<id>.json`
    pub base_url: String,
    /// Most requests in flight per partition
    pub max_concurrency: usize,
    /// Budget per request; exceeded requests are abandoned, not retried
    pub timeout: Duration,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// One partition's handle to the lookup service.
///
/// Dropping the client releases its connections.
pub trait LookupClient: Send + Sync {
    /// Raw response body for `id`
    fn fetch(&self, id: &str) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Opens a [`LookupClient`] per partition
pub trait Connector: Sync {
    type Client: LookupClient;

    fn connect(&self, partition: usize) -> Result<Self::Client, FetchError>;
}

/// Connector backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpConnector {
    config: EnrichConfig,
}

impl HttpConnector {
    pub fn new(config: EnrichConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    type Client = HttpLookupClient;

    fn connect(&self, partition: usize) -> Result<HttpLookupClient, FetchError> {
        let client = build_client(self.config.max_concurrency, self.config.timeout)?;
        log::debug!("partition {partition}: opened HTTP client");
        Ok(HttpLookupClient {
            client,
            base_url: self.config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// `GET <base>/<id>.json` over a pooled reqwest client
#[derive(Debug)]
pub struct HttpLookupClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLookupClient {
    pub fn url_for(&self, id: &str) -> String {
        format!("{}/{id}.json", self.base_url)
    }
}

impl LookupClient for HttpLookupClient {
    async fn fetch(&self, id: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.url_for(id))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FetchError::from_reqwest(&e))?;
        response.text().await.map_err(|e| FetchError::from_reqwest(&e))
    }
}

enum Outcome {
    Found(Vec<Qso>),
    Failed(FetchError),
    Skipped,
}

/// First pair per key wins; later duplicates are dropped
fn unique_pairs(partition: usize, pairs: &[LookupPair]) -> Vec<(&str, &str)> {
    let mut seen = FxHashSet::default();
    pairs
        .iter()
        .filter_map(|(key, id)| {
            if seen.insert(key.as_str()) {
                Some((key.as_str(), id.as_str()))
            } else {
                log::debug!("partition {partition}: duplicate key {key} skipped");
                None
            }
        })
        .collect()
}

/// Runs the enrichment stage one partition at a time
pub struct PartitionEnricher<C> {
    connector: C,
    config: EnrichConfig,
    counters: SharedCounters,
    stop: &'static AtomicBool,
}

impl<C: Connector> PartitionEnricher<C> {
    pub fn new(connector: C, config: EnrichConfig, counters: SharedCounters) -> Self {
        Self {
            connector,
            config,
            counters,
            stop: shutdown_flag(),
        }
    }

    /// Use `stop` instead of the process shutdown flag
    pub fn with_stop_flag(mut self, stop: &'static AtomicBool) -> Self {
        self.stop = stop;
        self
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Whether new lookups are currently being skipped
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Enrich one partition.
    ///
    /// Never fails: lost lookups are counted under `FailedLookups`, pairs not
    /// submitted because of shutdown under `SkippedLookups`.
    pub async fn enrich_partition(
        &self,
        partition: usize,
        pairs: &[LookupPair],
    ) -> Vec<EnrichedResult> {
        let start = Instant::now();
        let unique = unique_pairs(partition, pairs);
        let submitted = unique.len();

        let client = match self.connector.connect(partition) {
            Ok(client) => client,
            Err(e) => {
                log::warn!("partition {partition}: cannot open lookup client: {e}");
                self.counters
                    .add(Counter::FailedLookups, submitted as u64);
                return Vec::new();
            }
        };

        let timeout = self.config.timeout;
        let stop = self.stop;
        let client = &client;

        let mut completions = stream::iter(unique)
            .map(move |(key, id)| async move {
                if stop.load(Ordering::Relaxed) {
                    return (key, Outcome::Skipped);
                }
                let outcome = match tokio::time::timeout(timeout, client.fetch(id)).await {
                    Ok(Ok(body)) => match decode_qsos(&body) {
                        Ok(qsos) => Outcome::Found(qsos),
                        Err(e) => Outcome::Failed(e),
                    },
                    Ok(Err(e)) => Outcome::Failed(e),
                    Err(_) => Outcome::Failed(FetchError::Timeout(timeout)),
                };
                (key, outcome)
            })
            .buffer_unordered(self.config.max_concurrency.max(1));

        let mut results = Vec::with_capacity(submitted);
        let (mut failed, mut skipped) = (0u64, 0u64);
        while let Some((key, outcome)) = completions.next().await {
            match outcome {
                Outcome::Found(qsos) => results.push(EnrichedResult {
                    key: key.to_string(),
                    qsos,
                }),
                Outcome::Failed(e) => {
                    failed += 1;
                    log::debug!("partition {partition}: {key}: {} failure: {e}", e.kind());
                }
                Outcome::Skipped => skipped += 1,
            }
        }

        self.counters
            .add(Counter::EnrichedKeys, results.len() as u64);
        self.counters.add(Counter::FailedLookups, failed);
        self.counters.add(Counter::SkippedLookups, skipped);
        log::debug!(
            "partition {partition}: {}/{submitted} keys enriched, {failed} failed, {skipped} skipped [{:.1}s]",
            results.len(),
            start.elapsed().as_secs_f64()
        );
        results
    }

    /// [`enrich_partition`](Self::enrich_partition) from a synchronous
    /// (rayon) thread, driven on the shared runtime
    pub fn enrich_blocking(&self, partition: usize, pairs: &[LookupPair]) -> Vec<EnrichedResult> {
        SHARED_RUNTIME
            .handle()
            .block_on(self.enrich_partition(partition, pairs))
    }

    /// Enrich every partition on the current rayon pool
    pub fn enrich_all(
        &self,
        parts: &Partitions<LookupPair>,
        pb: &ProgressBar,
    ) -> Partitions<EnrichedResult> {
        parts.flat_map_partitions(|idx, pairs| {
            let results = self.enrich_blocking(idx, pairs);
            pb.inc(1);
            results
        })
    }
}
