//! Table-based text matcher.
//!
//! A [`Matcher`] is built once from a [`MatcherDef`] (usually decoded from
//! a MessagePack blob) and is immutable afterwards: every query operation
//! is read-only, so one handle can serve any number of threads with no
//! locking. Repeated `is_match` queries are served from a thread-local
//! LRU cache. Each thread owns its cache, so there is no contention and
//! no shared mutable state.

use std::cell::RefCell;
use std::hash::BuildHasherDefault;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use lru::LruCache;
use rustc_hash::FxHasher;

use crate::error::Result;
use crate::registry::{mask_spans, MatchHit, Registry};
use crate::schema::{decode_matcher_def, MaskPolicy, MatcherDef};

/// Common query surface shared by [`Matcher`] and
/// [`crate::SimpleMatcher`], for callers generic over the two.
pub trait TextScreen {
    /// True iff the text matches.
    fn is_match(&self, text: &str) -> bool;

    /// The text with matches redacted, or `None` when nothing was
    /// replaced.
    fn process(&self, text: &str) -> Option<String>;

    /// Process a batch of texts; one result per input, in order.
    fn batch_process(&self, texts: &[&str]) -> Vec<Option<String>> {
        texts.iter().map(|&text| self.process(text)).collect()
    }
}

/// Default per-thread LRU capacity for `is_match` results.
const DEFAULT_QUERY_CACHE_SIZE: usize = 10_000;

/// Monotonic id source so that distinct matcher handles sharing one
/// thread's cache can never read each other's entries.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

type QueryCache = LruCache<(u64, String), bool, BuildHasherDefault<FxHasher>>;

thread_local! {
    // One cache per thread, shared by all matcher instances on that
    // thread; keys carry the instance id.
    static QUERY_CACHE: RefCell<Option<QueryCache>> = const { RefCell::new(None) };
}

/// Query statistics, aggregated across all threads with atomic counters.
#[derive(Debug, Default)]
pub struct MatcherStats {
    /// Total number of queries executed
    pub total_queries: AtomicU64,
    /// Queries that found a match
    pub queries_with_match: AtomicU64,
    /// Queries that found no match
    pub queries_without_match: AtomicU64,
    /// `is_match` queries served from the thread-local cache
    pub cache_hits: AtomicU64,
    /// `is_match` queries that required evaluation
    pub cache_misses: AtomicU64,
}

impl MatcherStats {
    /// Take a snapshot of current statistics
    pub fn snapshot(&self) -> MatcherStatsSnapshot {
        MatcherStatsSnapshot {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            queries_with_match: self.queries_with_match.load(Ordering::Relaxed),
            queries_without_match: self.queries_without_match.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of matcher statistics at a point in time
#[derive(Debug, Clone, Copy, Default)]
pub struct MatcherStatsSnapshot {
    /// Total number of queries executed
    pub total_queries: u64,
    /// Queries that found a match
    pub queries_with_match: u64,
    /// Queries that found no match
    pub queries_without_match: u64,
    /// `is_match` queries served from the thread-local cache
    pub cache_hits: u64,
    /// `is_match` queries that required evaluation
    pub cache_misses: u64,
}

impl MatcherStatsSnapshot {
    /// Cache hit rate over `is_match` queries (0.0 to 1.0)
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    /// Fraction of queries that matched (0.0 to 1.0)
    pub fn match_rate(&self) -> f64 {
        if self.total_queries == 0 {
            0.0
        } else {
            self.queries_with_match as f64 / self.total_queries as f64
        }
    }
}

/// Table-based text matcher.
///
/// Immutable after construction; `Send + Sync` and safe for concurrent
/// queries on one handle.
///
/// # Examples
///
/// ```
/// use textsieve::{Matcher, MatcherDef, TableDef, WordListDef};
/// use textsieve::{CombinePolicy, MatchKind, MaskPolicy, NormFlags};
///
/// let def = MatcherDef {
///     mask: MaskPolicy::default(),
///     tables: vec![TableDef {
///         match_id: "demo".to_string(),
///         table_id: 1,
///         policy: CombinePolicy::Any,
///         word_lists: vec![WordListDef {
///             list_id: 1,
///             kind: MatchKind::Exact,
///             normalization: NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
///             words: vec!["secret".to_string()],
///         }],
///         exemption: None,
///     }],
/// };
///
/// let matcher = Matcher::new(&def)?;
/// assert!(matcher.is_match("the S-E-C-R-E-T plan"));
/// assert_eq!(matcher.word_match("no such thing"), None);
/// # Ok::<(), textsieve::SieveError>(())
/// ```
#[derive(Debug)]
pub struct Matcher {
    registry: Registry,
    mask: MaskPolicy,
    instance: u64,
    stats: Arc<MatcherStats>,
}

impl Matcher {
    /// Compile a matcher from a definition.
    ///
    /// # Errors
    ///
    /// Fails when the definition yields no searchable patterns, or when an
    /// AND-table is missing a required word list. No partial matcher is
    /// ever returned.
    pub fn new(def: &MatcherDef) -> Result<Matcher> {
        let registry = Registry::compile(def)?;
        Ok(Matcher {
            registry,
            mask: def.mask.clone(),
            instance: NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed),
            stats: Arc::new(MatcherStats::default()),
        })
    }

    /// Decode a MessagePack [`MatcherDef`] blob and compile it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Matcher> {
        let def = decode_matcher_def(bytes)?;
        Matcher::new(&def)
    }

    /// True iff any table yields a match for `text`.
    ///
    /// Tables are evaluated in ascending table-id order and evaluation
    /// short-circuits on the first qualifying table. Results are cached
    /// per thread.
    pub fn is_match(&self, text: &str) -> bool {
        self.stats.total_queries.fetch_add(1, Ordering::Relaxed);

        if text.is_empty() {
            self.stats
                .queries_without_match
                .fetch_add(1, Ordering::Relaxed);
            return false;
        }

        if let Some(cached) = self.cache_get(text) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            self.record_outcome(cached);
            return cached;
        }
        self.stats.cache_misses.fetch_add(1, Ordering::Relaxed);

        let hits = self.registry.collect_hits(text);
        let matched = self.registry.any_table_matches(&hits);
        self.cache_put(text, matched);
        self.record_outcome(matched);
        matched
    }

    /// The matched word of the first qualifying table, or `None`.
    ///
    /// Agrees with [`Matcher::is_match`] for every input: the result is
    /// `Some` exactly when `is_match` returns true.
    pub fn word_match(&self, text: &str) -> Option<&str> {
        self.stats.total_queries.fetch_add(1, Ordering::Relaxed);
        if text.is_empty() {
            self.stats
                .queries_without_match
                .fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let hits = self.registry.collect_hits(text);
        let word = self.registry.first_match_word(&hits);
        self.record_outcome(word.is_some());
        word
    }

    /// Every qualifying hit across all tables, with byte offsets into the
    /// caller's original text.
    pub fn hits(&self, text: &str) -> Vec<MatchHit<'_>> {
        if text.is_empty() {
            return Vec::new();
        }
        let raw = self.registry.collect_hits(text);
        self.registry.all_hits(&raw)
    }

    /// Redact every qualifying span across all tables.
    ///
    /// Spans are applied in one left-to-right pass, earliest first; a span
    /// overlapping an already-applied replacement is discarded. Returns
    /// `None` when no replacement was made, leaving the caller's text
    /// untouched.
    pub fn process(&self, text: &str) -> Option<String> {
        self.stats.total_queries.fetch_add(1, Ordering::Relaxed);
        if text.is_empty() {
            self.stats
                .queries_without_match
                .fetch_add(1, Ordering::Relaxed);
            return None;
        }
        let hits = self.registry.collect_hits(text);
        let spans = self.registry.all_spans(&hits);
        let masked = mask_spans(text, spans, &self.mask);
        self.record_outcome(masked.is_some());
        masked
    }

    /// Get matcher statistics snapshot, aggregated across all threads.
    pub fn stats(&self) -> MatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Clear this thread's query cache (all instances).
    pub fn clear_cache(&self) {
        QUERY_CACHE.with(|cache| {
            if let Some(c) = cache.borrow_mut().as_mut() {
                c.clear();
            }
        });
    }

    /// Number of entries currently in this thread's query cache.
    pub fn cache_size(&self) -> usize {
        QUERY_CACHE.with(|cache| cache.borrow().as_ref().map_or(0, |c| c.len()))
    }

    fn record_outcome(&self, matched: bool) {
        if matched {
            self.stats
                .queries_with_match
                .fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats
                .queries_without_match
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    fn cache_get(&self, text: &str) -> Option<bool> {
        QUERY_CACHE.with(|cache| {
            let mut borrow = cache.borrow_mut();
            let cache = borrow.as_mut()?;
            cache.get(&(self.instance, text.to_string())).copied()
        })
    }

    fn cache_put(&self, text: &str, matched: bool) {
        QUERY_CACHE.with(|cache| {
            let mut borrow = cache.borrow_mut();
            let cache = borrow.get_or_insert_with(|| {
                LruCache::with_hasher(
                    NonZeroUsize::new(DEFAULT_QUERY_CACHE_SIZE).unwrap(),
                    BuildHasherDefault::<FxHasher>::default(),
                )
            });
            cache.put((self.instance, text.to_string()), matched);
        })
    }
}

impl TextScreen for Matcher {
    fn is_match(&self, text: &str) -> bool {
        Matcher::is_match(self, text)
    }

    fn process(&self, text: &str) -> Option<String> {
        Matcher::process(self, text)
    }
}
