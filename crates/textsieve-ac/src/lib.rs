//! Multi-pattern Aho-Corasick automaton.
//!
//! This crate implements the single shared search structure behind the
//! textsieve engine: given the full pattern set up front, [`Automaton::build`]
//! constructs a byte-level Aho-Corasick automaton once, and [`Automaton::scan`]
//! finds every occurrence of every pattern in a single left-to-right pass,
//! O(text length + matches) regardless of how many patterns were loaded.
//!
//! # Design
//!
//! Construction follows the classic goto/failure formulation: a trie of
//! byte transitions, failure links computed breadth-first, and pattern-id
//! output lists propagated along failure links at build time so that scan
//! never has to walk failure chains to report suffix matches.
//!
//! The automaton is immutable after construction. There is no incremental
//! insertion; a build is all-or-nothing, and rebuilding is the only way
//! to change the pattern set.
//!
//! # Semantics
//!
//! - Matching is case-sensitive over exactly the bytes given. Callers that
//!   want case- or homoglyph-insensitivity normalize both patterns and
//!   text first (see `textsieve-normalize`).
//! - All overlapping matches are reported; a span may be claimed by more
//!   than one pattern.
//! - `scan` output is ordered by match start position, ties broken by
//!   pattern id ascending, so results are deterministic.
//! - UTF-8 safety: a pattern that is valid UTF-8 can only match at char
//!   boundaries of valid UTF-8 text, because lead bytes never occur as
//!   continuation bytes.

use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Error type for automaton construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcError {
    /// The pattern set was empty; a no-op automaton is disallowed.
    EmptyPatternSet,
    /// A pattern was rejected (currently only the empty string).
    InvalidPattern(String),
}

impl fmt::Display for AcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcError::EmptyPatternSet => write!(f, "cannot build automaton from empty pattern set"),
            AcError::InvalidPattern(msg) => write!(f, "invalid pattern: {}", msg),
        }
    }
}

impl std::error::Error for AcError {}

/// A single pattern occurrence reported by [`Automaton::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcMatch {
    /// Id of the matched pattern: its index in the build input.
    pub pattern: u32,
    /// Byte offset of the first matched byte.
    pub start: usize,
    /// Byte offset one past the last matched byte.
    pub end: usize,
}

/// Automaton state during and after construction.
///
/// Transition maps stay sparse `HashMap`s: wordlist automatons rarely
/// exceed a few hundred thousand states, and the per-state fan-out is
/// small outside the root.
#[derive(Debug, Clone, PartialEq, Eq)]
struct State {
    transitions: HashMap<u8, u32>,
    failure: u32,
    /// Pattern ids terminating at this state, including those inherited
    /// from the failure chain.
    outputs: Vec<u32>,
}

impl State {
    fn new() -> Self {
        Self {
            transitions: HashMap::new(),
            failure: 0,
            outputs: Vec::new(),
        }
    }
}

/// Immutable multi-pattern search automaton.
///
/// Build once from the union of all patterns, then share freely: all scan
/// state lives on the caller's stack, so one automaton serves any number
/// of concurrent scans without locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: Vec<State>,
    /// Byte length per pattern id, used to recover match start offsets.
    pattern_lens: Vec<u32>,
}

impl Automaton {
    /// Build an automaton from the complete pattern set.
    ///
    /// Pattern ids are assigned by input order, starting at 0. Duplicate
    /// pattern strings are legal and produce one id each.
    ///
    /// # Errors
    ///
    /// Fails with [`AcError::EmptyPatternSet`] when no patterns are given
    /// and [`AcError::InvalidPattern`] for an empty pattern string (which
    /// would otherwise match at every position).
    pub fn build<I, P>(patterns: I) -> Result<Automaton, AcError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut states = vec![State::new()];
        let mut pattern_lens = Vec::new();

        // Phase 1: trie of byte transitions.
        for (id, pattern) in patterns.into_iter().enumerate() {
            let bytes = pattern.as_ref().as_bytes();
            if bytes.is_empty() {
                return Err(AcError::InvalidPattern(format!(
                    "pattern {} is empty",
                    id
                )));
            }
            let mut current = 0u32;
            for &b in bytes {
                current = match states[current as usize].transitions.get(&b) {
                    Some(&next) => next,
                    None => {
                        let next = states.len() as u32;
                        states.push(State::new());
                        states[current as usize].transitions.insert(b, next);
                        next
                    }
                };
            }
            states[current as usize].outputs.push(id as u32);
            pattern_lens.push(bytes.len() as u32);
        }

        if pattern_lens.is_empty() {
            return Err(AcError::EmptyPatternSet);
        }

        // Phase 2: failure links, breadth-first, with output propagation.
        let mut queue = VecDeque::new();
        let root_children: Vec<u32> = states[0].transitions.values().copied().collect();
        for child in root_children {
            states[child as usize].failure = 0;
            queue.push_back(child);
        }

        while let Some(current) = queue.pop_front() {
            let edges: Vec<(u8, u32)> = states[current as usize]
                .transitions
                .iter()
                .map(|(&b, &t)| (b, t))
                .collect();

            for (byte, target) in edges {
                // Walk the failure chain of `current` for a state with a
                // `byte` transition; the root always terminates the walk.
                let mut fail = states[current as usize].failure;
                let fail_target = loop {
                    if let Some(&next) = states[fail as usize].transitions.get(&byte) {
                        break next;
                    }
                    if fail == 0 {
                        break 0;
                    }
                    fail = states[fail as usize].failure;
                };
                // A root self-transition must not become a failure link.
                let fail_target = if fail_target == target { 0 } else { fail_target };

                states[target as usize].failure = fail_target;
                let inherited = states[fail_target as usize].outputs.clone();
                states[target as usize].outputs.extend(inherited);
                queue.push_back(target);
            }
        }

        Ok(Automaton {
            states,
            pattern_lens,
        })
    }

    /// Number of patterns the automaton was built from.
    pub fn pattern_count(&self) -> usize {
        self.pattern_lens.len()
    }

    /// Number of automaton states (diagnostics).
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Byte length of a pattern by id.
    pub fn pattern_len(&self, pattern: u32) -> usize {
        self.pattern_lens[pattern as usize] as usize
    }

    /// Find every pattern occurrence in `text`, overlapping included.
    ///
    /// Returns a fresh, finite iterator ordered by match start position,
    /// ties broken by pattern id ascending. Scanning never fails.
    ///
    /// Ordering by start position cannot be emitted directly by the
    /// automaton walk (which discovers matches by end position), so the
    /// matches are collected and sorted before the iterator is returned.
    pub fn scan(&self, text: &str) -> Scan {
        let mut matches = Vec::new();
        let mut current = 0u32;

        for (pos, b) in text.bytes().enumerate() {
            current = self.next_state(current, b);

            for &pattern in &self.states[current as usize].outputs {
                let end = pos + 1;
                let start = end - self.pattern_lens[pattern as usize] as usize;
                matches.push(AcMatch {
                    pattern,
                    start,
                    end,
                });
            }
        }

        matches.sort_unstable_by_key(|m| (m.start, m.pattern));
        Scan {
            inner: matches.into_iter(),
        }
    }

    #[inline]
    fn next_state(&self, mut current: u32, byte: u8) -> u32 {
        loop {
            if let Some(&next) = self.states[current as usize].transitions.get(&byte) {
                return next;
            }
            if current == 0 {
                return 0;
            }
            current = self.states[current as usize].failure;
        }
    }
}

/// Iterator over the matches of one [`Automaton::scan`] call.
///
/// Finite and not restartable; every `scan` call produces a new one.
#[derive(Debug)]
pub struct Scan {
    inner: std::vec::IntoIter<AcMatch>,
}

impl Iterator for Scan {
    type Item = AcMatch;

    fn next(&mut self) -> Option<AcMatch> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Scan {}
