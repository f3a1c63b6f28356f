//! Flat weighted wordlist matcher.
//!
//! A [`SimpleMatcher`] is the lighter sibling of [`crate::Matcher`]: one
//! flat word list, no tables, no AND/OR rules, no exemptions. Each word
//! carries a numeric weight, and match decisions can be graduated
//! (a configured minimum total weight must be reached) instead of binary.
//! Used when only presence/severity detection is needed, not categorized
//! rule groups.

use log::warn;
use rustc_hash::FxHashMap;
use textsieve_ac::Automaton;
use textsieve_normalize::{normalize, NormFlags};

use crate::error::{Result, SieveError};
use crate::matcher::TextScreen;
use crate::registry::mask_spans;
use crate::schema::{decode_simple_def, MaskPolicy, SimpleDef};

/// A matched word reported by [`SimpleMatcher::hits`].
///
/// Offsets are byte positions in the caller's original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleHit<'a> {
    /// Caller-assigned id of the matched word.
    pub word_id: u32,
    /// The word as written in the definition.
    pub word: &'a str,
    /// The word's configured weight.
    pub weight: u64,
    /// Byte offset of the earliest occurrence.
    pub start: usize,
    /// Byte offset one past the end of the earliest occurrence.
    pub end: usize,
}

#[derive(Debug)]
struct EntryInfo {
    word_id: u32,
    word: String,
    weight: u64,
}

/// Flat weighted wordlist matcher.
///
/// Immutable after construction; `Send + Sync` and safe for concurrent
/// queries on one handle.
///
/// # Examples
///
/// ```
/// use textsieve::{SimpleDef, SimpleEntry, SimpleMatcher};
/// use textsieve::{MaskPolicy, NormFlags};
///
/// let def = SimpleDef {
///     normalization: NormFlags::CASE_FOLD,
///     min_weight: Some(2),
///     mask: MaskPolicy::default(),
///     words: vec![
///         SimpleEntry { word_id: 1, word: "mild".to_string(), weight: 1 },
///         SimpleEntry { word_id: 2, word: "harsh".to_string(), weight: 2 },
///     ],
/// };
///
/// let matcher = SimpleMatcher::new(&def)?;
/// assert!(!matcher.is_match("a mild remark"));      // weight 1 < 2
/// assert!(matcher.is_match("a harsh remark"));      // weight 2
/// assert_eq!(matcher.score("mild and harsh"), 3);
/// # Ok::<(), textsieve::SieveError>(())
/// ```
#[derive(Debug)]
pub struct SimpleMatcher {
    automaton: Automaton,
    flags: NormFlags,
    /// Entry indices per automaton pattern id (duplicate canonical forms
    /// share one pattern).
    dedup_entries: Vec<Vec<u32>>,
    entries: Vec<EntryInfo>,
    min_weight: Option<u64>,
    mask: MaskPolicy,
}

impl SimpleMatcher {
    /// Compile a simple matcher from a definition.
    ///
    /// # Errors
    ///
    /// Fails when the word list is empty or every word normalizes to the
    /// empty string. No partial matcher is ever returned.
    pub fn new(def: &SimpleDef) -> Result<SimpleMatcher> {
        let mut dedup_words: Vec<String> = Vec::new();
        let mut dedup_ids: FxHashMap<String, u32> = FxHashMap::default();
        let mut dedup_entries: Vec<Vec<u32>> = Vec::new();
        let mut entries: Vec<EntryInfo> = Vec::new();

        for entry in &def.words {
            let canonical = normalize(&entry.word, def.normalization)
                .as_str()
                .to_owned();
            if canonical.is_empty() {
                warn!(
                    "word {:?} (id {}) normalizes to nothing and was dropped",
                    entry.word, entry.word_id
                );
                continue;
            }

            let entry_idx = entries.len() as u32;
            entries.push(EntryInfo {
                word_id: entry.word_id,
                word: entry.word.clone(),
                weight: entry.weight,
            });

            match dedup_ids.get(canonical.as_str()) {
                Some(&pattern_id) => dedup_entries[pattern_id as usize].push(entry_idx),
                None => {
                    dedup_ids.insert(canonical.clone(), dedup_words.len() as u32);
                    dedup_words.push(canonical);
                    dedup_entries.push(vec![entry_idx]);
                }
            }
        }

        if dedup_words.is_empty() {
            return Err(SieveError::EmptyPatternSet(
                "simple wordlist contains no usable words".to_string(),
            ));
        }

        let automaton = Automaton::build(&dedup_words)?;

        Ok(SimpleMatcher {
            automaton,
            flags: def.normalization,
            dedup_entries,
            entries,
            min_weight: def.min_weight,
            mask: def.mask.clone(),
        })
    }

    /// Decode a MessagePack [`SimpleDef`] blob and compile it.
    pub fn from_bytes(bytes: &[u8]) -> Result<SimpleMatcher> {
        let def = decode_simple_def(bytes)?;
        SimpleMatcher::new(&def)
    }

    /// True iff the summed weight of distinct matched words reaches the
    /// configured minimum, or, with no minimum configured, iff any word
    /// matches at all.
    pub fn is_match(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.min_weight {
            Some(min) => self.score(text) >= min,
            None => {
                let norm = normalize(text, self.flags);
                self.automaton.scan(norm.as_str()).next().is_some()
            }
        }
    }

    /// Total weight of distinct matched words. Repeated occurrences of
    /// one word count once.
    pub fn score(&self, text: &str) -> u64 {
        if text.is_empty() {
            return 0;
        }
        self.collect(text)
            .keys()
            .map(|&entry| self.entries[entry as usize].weight)
            .sum()
    }

    /// Every distinct matched word, with its earliest occurrence span,
    /// ordered by (start, word id).
    pub fn hits(&self, text: &str) -> Vec<SimpleHit<'_>> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut out: Vec<SimpleHit<'_>> = self
            .collect(text)
            .into_iter()
            .map(|(entry, spans)| {
                let info = &self.entries[entry as usize];
                let (start, end) = spans[0];
                SimpleHit {
                    word_id: info.word_id,
                    word: &info.word,
                    weight: info.weight,
                    start,
                    end,
                }
            })
            .collect();
        out.sort_unstable_by_key(|h| (h.start, h.word_id));
        out
    }

    /// Redact every occurrence of every matched word.
    ///
    /// Same pass discipline as [`crate::Matcher::process`]; returns `None`
    /// when no replacement was made.
    pub fn process(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }
        let spans: Vec<(usize, usize)> = self
            .collect(text)
            .into_values()
            .flatten()
            .collect();
        mask_spans(text, spans, &self.mask)
    }

    /// Scan once and group original-text spans by entry, each entry's
    /// spans sorted ascending.
    fn collect(&self, text: &str) -> FxHashMap<u32, Vec<(usize, usize)>> {
        let norm = normalize(text, self.flags);
        let mut per_entry: FxHashMap<u32, Vec<(usize, usize)>> = FxHashMap::default();
        if norm.as_str().is_empty() {
            return per_entry;
        }
        for m in self.automaton.scan(norm.as_str()) {
            let span = norm.original_span(m.start, m.end);
            for &entry in &self.dedup_entries[m.pattern as usize] {
                per_entry.entry(entry).or_default().push(span);
            }
        }
        for spans in per_entry.values_mut() {
            spans.sort_unstable();
        }
        per_entry
    }
}

impl TextScreen for SimpleMatcher {
    fn is_match(&self, text: &str) -> bool {
        SimpleMatcher::is_match(self, text)
    }

    fn process(&self, text: &str) -> Option<String> {
        SimpleMatcher::process(self, text)
    }
}
