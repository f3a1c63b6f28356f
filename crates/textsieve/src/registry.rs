//! Compiled match-table registry.
//!
//! Turns a [`MatcherDef`](crate::schema::MatcherDef) into the immutable
//! query structures: one shared automaton over the union of every word
//! list (exemptions included), the per-pattern ownership records needed to
//! route raw automaton hits back to their lists, and the table rules that
//! decide whether a set of hits qualifies.
//!
//! Canonical pattern strings are deduplicated across lists: each automaton
//! pattern id maps to the list of (list, word, segment) configurations it
//! serves, so a single scan of each normalized text variant feeds every
//! table at once.

use log::{debug, warn};
use rustc_hash::FxHashMap;
use textsieve_ac::Automaton;
use textsieve_normalize::{normalize, NormFlags};

use crate::error::{Result, SieveError};
use crate::schema::{CombinePolicy, MaskPolicy, MatchKind, MatcherDef, WordListDef};

/// A qualifying match produced by [`crate::Matcher::hits`].
///
/// Offsets are byte positions in the caller's original text, not in any
/// internal canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchHit<'a> {
    /// Name of the rule group the matching table belongs to.
    pub match_id: &'a str,
    /// Numeric key of the matching table.
    pub table_id: u32,
    /// Id of the word list that produced the hit.
    pub list_id: u32,
    /// The dictionary word that matched, as written in the definition.
    pub word: &'a str,
    /// Byte offset of the first matched byte in the original text.
    pub start: usize,
    /// Byte offset one past the last matched byte in the original text.
    pub end: usize,
}

/// Compiled word-list configuration.
#[derive(Debug)]
struct ListConf {
    list_id: u32,
    flags: NormFlags,
    /// `Some` for fuzzy lists; the required matched-character ratio.
    threshold: Option<f32>,
    /// Number of usable words the list contributed.
    word_count: u32,
}

/// One dictionary word: the original text plus the canonical character
/// total used as the fuzzy-ratio denominator.
#[derive(Debug)]
struct WordInfo {
    text: String,
    total_chars: u32,
}

/// Ownership record for one automaton pattern: which list and word it
/// belongs to, and which segment of that word it is.
#[derive(Debug, Clone, Copy)]
struct PatternConf {
    list: u32,
    word: u32,
    seg: u16,
    seg_chars: u32,
}

#[derive(Debug)]
struct CompiledTable {
    match_id: String,
    table_id: u32,
    policy: CombinePolicy,
    /// List indices in ascending `list_id` order (the OR qualification order).
    required: Vec<u32>,
    exemption: Option<u32>,
}

/// A raw automaton hit routed to a list, in original-text coordinates.
#[derive(Debug, Clone, Copy)]
struct SegHit {
    word: u32,
    seg: u16,
    seg_chars: u32,
    start: usize,
    end: usize,
}

/// Hits for one query, bucketed by list index.
pub(crate) struct RawHits {
    per_list: FxHashMap<u32, Vec<SegHit>>,
}

/// A word occurrence that passed its list's match discipline.
#[derive(Debug, Clone)]
struct Qualified {
    word: u32,
    start: usize,
    end: usize,
    /// Every matched span contributing to qualification (for fuzzy words,
    /// one per matched segment). Used by the redaction pass.
    spans: Vec<(usize, usize)>,
}

/// Evaluation outcome of one table against one query.
struct TableMatch {
    /// The reported hit: (list index, qualified occurrence).
    rep: (u32, Qualified),
    /// Every qualifying occurrence across the table's lists.
    results: Vec<(u32, Qualified)>,
}

/// Immutable compiled registry shared by every query.
#[derive(Debug)]
pub(crate) struct Registry {
    tables: Vec<CompiledTable>,
    lists: Vec<ListConf>,
    words: Vec<WordInfo>,
    /// Indexed by automaton pattern id.
    dedup_confs: Vec<Vec<PatternConf>>,
    automaton: Automaton,
    /// Distinct normalization classes across all lists, each scanned once
    /// per query.
    variants: Vec<NormFlags>,
}

impl Registry {
    /// Compile a matcher definition. All structural validation happens
    /// here; queries against the resulting registry cannot fail.
    pub(crate) fn compile(def: &MatcherDef) -> Result<Registry> {
        let mut lists: Vec<ListConf> = Vec::new();
        let mut words: Vec<WordInfo> = Vec::new();
        let mut dedup_words: Vec<String> = Vec::new();
        let mut dedup_ids: FxHashMap<String, u32> = FxHashMap::default();
        let mut dedup_confs: Vec<Vec<PatternConf>> = Vec::new();
        let mut tables: Vec<CompiledTable> = Vec::new();

        let mut table_defs: Vec<_> = def.tables.iter().collect();
        table_defs.sort_by_key(|t| t.table_id);

        for tdef in table_defs {
            let mut list_defs: Vec<_> = tdef.word_lists.iter().collect();
            list_defs.sort_by_key(|l| l.list_id);

            if tdef.policy == CombinePolicy::All && list_defs.is_empty() {
                return Err(SieveError::Table(format!(
                    "table {} ({:?}) requires all word lists but has none",
                    tdef.table_id, tdef.match_id
                )));
            }

            let mut required = Vec::with_capacity(list_defs.len());
            for ldef in list_defs {
                let idx = compile_list(
                    ldef,
                    &mut lists,
                    &mut words,
                    &mut dedup_words,
                    &mut dedup_ids,
                    &mut dedup_confs,
                );
                if tdef.policy == CombinePolicy::All && lists[idx as usize].word_count == 0 {
                    return Err(SieveError::Table(format!(
                        "table {} ({:?}) requires word list {} but it has no usable words",
                        tdef.table_id, tdef.match_id, ldef.list_id
                    )));
                }
                required.push(idx);
            }

            let exemption = tdef.exemption.as_ref().map(|edef| {
                compile_list(
                    edef,
                    &mut lists,
                    &mut words,
                    &mut dedup_words,
                    &mut dedup_ids,
                    &mut dedup_confs,
                )
            });

            tables.push(CompiledTable {
                match_id: tdef.match_id.clone(),
                table_id: tdef.table_id,
                policy: tdef.policy,
                required,
                exemption,
            });
        }

        if dedup_words.is_empty() {
            return Err(SieveError::EmptyPatternSet(
                "matcher definition contains no usable words".to_string(),
            ));
        }

        let automaton = Automaton::build(&dedup_words)?;

        let mut variants: Vec<NormFlags> = lists.iter().map(|l| l.flags).collect();
        variants.sort_unstable();
        variants.dedup();

        debug!(
            "compiled registry: {} tables, {} lists, {} words, {} patterns, {} text variants",
            tables.len(),
            lists.len(),
            words.len(),
            dedup_words.len(),
            variants.len()
        );

        Ok(Registry {
            tables,
            lists,
            words,
            dedup_confs,
            automaton,
            variants,
        })
    }

    /// Scan every normalized variant of `text` once and bucket the raw
    /// hits by owning list. A hit only counts for a list when it was found
    /// on the variant produced with exactly that list's flags.
    pub(crate) fn collect_hits(&self, text: &str) -> RawHits {
        let mut per_list: FxHashMap<u32, Vec<SegHit>> = FxHashMap::default();

        for &flags in &self.variants {
            let norm = normalize(text, flags);
            if norm.as_str().is_empty() {
                continue;
            }
            for m in self.automaton.scan(norm.as_str()) {
                for conf in &self.dedup_confs[m.pattern as usize] {
                    if self.lists[conf.list as usize].flags != flags {
                        continue;
                    }
                    let (start, end) = norm.original_span(m.start, m.end);
                    per_list.entry(conf.list).or_default().push(SegHit {
                        word: conf.word,
                        seg: conf.seg,
                        seg_chars: conf.seg_chars,
                        start,
                        end,
                    });
                }
            }
        }

        RawHits { per_list }
    }

    /// True if any table qualifies; tables are checked in ascending
    /// `table_id` order and evaluation short-circuits.
    pub(crate) fn any_table_matches(&self, hits: &RawHits) -> bool {
        self.tables.iter().any(|t| self.evaluate(t, hits).is_some())
    }

    /// The reported word of the first qualifying table, if any.
    pub(crate) fn first_match_word(&self, hits: &RawHits) -> Option<&str> {
        self.tables.iter().find_map(|t| {
            self.evaluate(t, hits)
                .map(|m| self.words[m.rep.1.word as usize].text.as_str())
        })
    }

    /// Every qualifying occurrence across all tables.
    pub(crate) fn all_hits(&self, hits: &RawHits) -> Vec<MatchHit<'_>> {
        let mut out = Vec::new();
        for table in &self.tables {
            if let Some(m) = self.evaluate(table, hits) {
                for (list_idx, q) in m.results {
                    out.push(MatchHit {
                        match_id: &table.match_id,
                        table_id: table.table_id,
                        list_id: self.lists[list_idx as usize].list_id,
                        word: &self.words[q.word as usize].text,
                        start: q.start,
                        end: q.end,
                    });
                }
            }
        }
        out
    }

    /// Every span to redact across all tables, unsorted and possibly
    /// overlapping; the masking pass resolves overlaps.
    pub(crate) fn all_spans(&self, hits: &RawHits) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        for table in &self.tables {
            if let Some(m) = self.evaluate(table, hits) {
                for (_, q) in m.results {
                    spans.extend(q.spans.iter().copied());
                }
            }
        }
        spans
    }

    /// Apply one table's rules to the query's hits.
    fn evaluate(&self, table: &CompiledTable, hits: &RawHits) -> Option<TableMatch> {
        let outcome = match table.policy {
            CombinePolicy::Any => self.evaluate_any(table, hits),
            CombinePolicy::All => self.evaluate_all(table, hits),
        }?;

        // Exemptions override positive matches, never the reverse.
        if let Some(ex) = table.exemption {
            if !self.qualify_list(ex, hits).is_empty() {
                return None;
            }
        }
        Some(outcome)
    }

    /// OR: the first qualifying list (ascending list id) supplies the
    /// reported hit; every qualifying occurrence is retained for
    /// redaction.
    fn evaluate_any(&self, table: &CompiledTable, hits: &RawHits) -> Option<TableMatch> {
        let mut rep: Option<(u32, Qualified)> = None;
        let mut results = Vec::new();

        for &list_idx in &table.required {
            let qualified = self.qualify_list(list_idx, hits);
            if rep.is_none() {
                if let Some(first) = qualified.first() {
                    rep = Some((list_idx, first.clone()));
                }
            }
            results.extend(qualified.into_iter().map(|q| (list_idx, q)));
        }

        rep.map(|rep| TableMatch { rep, results })
    }

    /// AND: every required list must qualify; the reported hit is the
    /// earliest-span selection among the per-list picks.
    fn evaluate_all(&self, table: &CompiledTable, hits: &RawHits) -> Option<TableMatch> {
        let mut picks: Vec<(u32, Qualified)> = Vec::with_capacity(table.required.len());
        let mut results = Vec::new();

        for &list_idx in &table.required {
            let qualified = self.qualify_list(list_idx, hits);
            let first = qualified.first()?.clone();
            picks.push((list_idx, first));
            results.extend(qualified.into_iter().map(|q| (list_idx, q)));
        }

        let rep = picks
            .into_iter()
            .min_by_key(|(_, q)| (q.start, q.end))?;
        Some(TableMatch { rep, results })
    }

    /// Apply a list's match discipline to its raw hits, producing
    /// qualifying occurrences ordered by (start, end, word).
    fn qualify_list(&self, list_idx: u32, hits: &RawHits) -> Vec<Qualified> {
        let conf = &self.lists[list_idx as usize];
        let Some(list_hits) = hits.per_list.get(&list_idx) else {
            return Vec::new();
        };

        let mut qualified = match conf.threshold {
            // Exact discipline: every raw hit counts.
            None => list_hits
                .iter()
                .map(|h| Qualified {
                    word: h.word,
                    start: h.start,
                    end: h.end,
                    spans: vec![(h.start, h.end)],
                })
                .collect::<Vec<_>>(),

            // Fuzzy discipline: distinct matched segments must cover at
            // least `threshold` of the word's canonical character length.
            Some(threshold) => {
                let mut per_word: FxHashMap<u32, (u64, u32, Vec<(usize, usize)>)> =
                    FxHashMap::default();
                for h in list_hits {
                    let entry = per_word.entry(h.word).or_insert((0, 0, Vec::new()));
                    let seg_bit = 1u64 << (h.seg % 64);
                    if entry.0 & seg_bit == 0 {
                        entry.0 |= seg_bit;
                        entry.1 += h.seg_chars;
                    }
                    entry.2.push((h.start, h.end));
                }

                per_word
                    .into_iter()
                    .filter_map(|(word, (_, matched_chars, mut spans))| {
                        let total = self.words[word as usize].total_chars;
                        let ratio = matched_chars as f32 / total as f32;
                        (ratio + f32::EPSILON >= threshold).then(|| {
                            spans.sort_unstable();
                            let (start, end) = spans[0];
                            Qualified {
                                word,
                                start,
                                end,
                                spans,
                            }
                        })
                    })
                    .collect()
            }
        };

        qualified.sort_by_key(|q| (q.start, q.end, q.word));
        qualified
    }
}

/// Compile one word list into the shared pattern tables, returning its
/// list index.
fn compile_list(
    def: &WordListDef,
    lists: &mut Vec<ListConf>,
    words: &mut Vec<WordInfo>,
    dedup_words: &mut Vec<String>,
    dedup_ids: &mut FxHashMap<String, u32>,
    dedup_confs: &mut Vec<Vec<PatternConf>>,
) -> u32 {
    let list_idx = lists.len() as u32;
    let (fuzzy, threshold) = match def.kind {
        MatchKind::Exact => (false, None),
        MatchKind::Fuzzy { threshold } => (true, Some(threshold.clamp(0.0, 1.0))),
    };

    let mut word_count = 0u32;
    for raw in &def.words {
        let segments: Vec<&str> = if fuzzy {
            raw.split('&').collect()
        } else {
            vec![raw.as_str()]
        };

        let mut canonical_segs: Vec<String> = Vec::with_capacity(segments.len());
        for seg in segments {
            let canonical = normalize(seg, def.normalization).as_str().to_owned();
            if !canonical.is_empty() {
                canonical_segs.push(canonical);
            }
        }
        if canonical_segs.is_empty() {
            warn!(
                "word {:?} in list {} normalizes to nothing and was dropped",
                raw, def.list_id
            );
            continue;
        }

        let total_chars: u32 = canonical_segs
            .iter()
            .map(|c| c.chars().count() as u32)
            .sum();
        let word_idx = words.len() as u32;
        words.push(WordInfo {
            text: raw.clone(),
            total_chars,
        });

        for (seg_idx, canonical) in canonical_segs.iter().enumerate() {
            let seg_chars = canonical.chars().count() as u32;
            let pattern_id = match dedup_ids.get(canonical.as_str()) {
                Some(&id) => id,
                None => {
                    let id = dedup_words.len() as u32;
                    dedup_ids.insert(canonical.clone(), id);
                    dedup_words.push(canonical.clone());
                    dedup_confs.push(Vec::new());
                    id
                }
            };
            dedup_confs[pattern_id as usize].push(PatternConf {
                list: list_idx,
                word: word_idx,
                seg: seg_idx as u16,
                seg_chars,
            });
        }
        word_count += 1;
    }

    lists.push(ListConf {
        list_id: def.list_id,
        flags: def.normalization,
        threshold,
        word_count,
    });
    list_idx
}

/// Redact `spans` in `text` in one left-to-right pass.
///
/// Earliest-starting spans win; at equal starts the longest wins; spans
/// overlapping an already-applied replacement are discarded. Returns
/// `None` when nothing was replaced.
pub(crate) fn mask_spans(
    text: &str,
    mut spans: Vec<(usize, usize)>,
    mask: &MaskPolicy,
) -> Option<String> {
    if spans.is_empty() {
        return None;
    }
    spans.sort_unstable_by_key(|&(start, end)| (start, std::cmp::Reverse(end)));
    spans.dedup();

    let mut out = String::with_capacity(text.len());
    let mut last_end = 0;
    for (start, end) in spans {
        if start < last_end {
            continue;
        }
        out.push_str(&text[last_end..start]);
        match mask {
            MaskPolicy::Replace(token) => out.push_str(token),
            MaskPolicy::Remove => {}
        }
        last_end = end;
    }
    out.push_str(&text[last_end..]);
    Some(out)
}
