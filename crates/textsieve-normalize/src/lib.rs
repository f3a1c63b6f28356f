//! Text canonicalization for the textsieve matching engine.
//!
//! Adversarial text evades literal matching with spacing (`w o r d`),
//! punctuation (`w.o.r.d`), case tricks, look-alike characters (`w0rd`,
//! full-width forms, Cyrillic/Greek homoglyphs) and script variants.
//! This crate folds a text span into a canonical form so that a single
//! case-sensitive automaton scan catches all of those variants, and keeps
//! an offset map so every match can be reported as a byte range in the
//! *caller's* original text rather than the canonical form.
//!
//! # Offset mapping
//!
//! Every byte of the canonical string remembers the byte span of the
//! source character that produced it. Characters elided by
//! [`NormFlags::DELETE_SEPARATORS`] produce no canonical bytes; a match
//! spanning them maps back to a range that covers the separators too,
//! which is exactly what a redaction pass wants to mask.
//!
//! Normalization never fails: characters with no folding entry pass
//! through unchanged and remain literally searchable.

use std::borrow::Cow;

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod tables;

pub use tables::{fold_similar, is_separator, transliterate};

bitflags! {
    /// Normalization classes, composable per word list.
    ///
    /// Flag values are part of the serialized definition format and are
    /// stable: definitions written by other-language producers encode the
    /// set as a raw integer.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct NormFlags: u32 {
        /// Unicode lowercase folding.
        const CASE_FOLD = 1 << 0;
        /// Visually-similar character folding: full-width and enclosed
        /// forms, mathematical styled letters, common homoglyphs, and
        /// digit/symbol-for-letter substitutions.
        const FOLD_SIMILAR = 1 << 1;
        /// Elision of whitespace, zero-width characters, and ASCII/CJK
        /// punctuation. Defeats spacing and interleaving evasion.
        const DELETE_SEPARATORS = 1 << 2;
        /// Script-specific folding: traditional to simplified Chinese.
        const TRANSLITERATE = 1 << 3;
    }
}

impl Default for NormFlags {
    fn default() -> Self {
        NormFlags::empty()
    }
}

// Serialized as the raw bit value so non-Rust producers of definition
// blobs do not need to know flag names. Unknown bits are dropped on read.
impl Serialize for NormFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.bits().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NormFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bits = u32::deserialize(deserializer)?;
        Ok(NormFlags::from_bits_truncate(bits))
    }
}

/// A canonicalized text span plus the map from canonical byte positions
/// back to original byte spans.
///
/// When no flag changes the text, the canonical form borrows the input
/// and the map is the identity (no allocation).
#[derive(Debug)]
pub struct Normalized<'a> {
    text: Cow<'a, str>,
    /// Original byte offset of the source character for each canonical byte.
    /// Empty when the canonical form is the unmodified input.
    starts: Vec<u32>,
    /// Exclusive original end offset of the source character for each
    /// canonical byte. Parallel to `starts`.
    ends: Vec<u32>,
}

impl<'a> Normalized<'a> {
    /// The canonical string.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when normalization left the input byte-for-byte unchanged.
    pub fn is_identity(&self) -> bool {
        self.starts.is_empty()
    }

    /// Map a byte range in the canonical string back to a byte range in
    /// the original text.
    ///
    /// The range must be non-empty and within the canonical string; this
    /// holds for every match an automaton reports over [`Self::as_str`].
    pub fn original_span(&self, start: usize, end: usize) -> (usize, usize) {
        debug_assert!(start < end && end <= self.text.len());
        if self.is_identity() {
            (start, end)
        } else {
            (self.starts[start] as usize, self.ends[end - 1] as usize)
        }
    }
}

/// Canonicalize `text` under the requested normalization classes.
///
/// Applied per character: separators are elided first (checked against the
/// *original* character, so a separator is never rescued by a later fold),
/// then transliteration, then similar-character folding, then case
/// folding. Empty input yields empty output with an empty map.
pub fn normalize(text: &str, flags: NormFlags) -> Normalized<'_> {
    if flags.is_empty() || text.is_empty() {
        return Normalized {
            text: Cow::Borrowed(text),
            starts: Vec::new(),
            ends: Vec::new(),
        };
    }

    let mut out = String::with_capacity(text.len());
    let mut starts: Vec<u32> = Vec::with_capacity(text.len());
    let mut ends: Vec<u32> = Vec::with_capacity(text.len());
    let mut changed = false;

    for (pos, ch) in text.char_indices() {
        let span_start = pos as u32;
        let span_end = (pos + ch.len_utf8()) as u32;

        if flags.contains(NormFlags::DELETE_SEPARATORS) && is_separator(ch) {
            changed = true;
            continue;
        }

        let mut folded = ch;
        if flags.contains(NormFlags::TRANSLITERATE) {
            if let Some(t) = transliterate(folded) {
                folded = t;
                changed = true;
            }
        }
        if flags.contains(NormFlags::FOLD_SIMILAR) {
            // Iterate to the fixpoint: enclosed digit -> digit -> letter.
            while let Some(f) = fold_similar(folded) {
                folded = f;
                changed = true;
            }
        }

        if flags.contains(NormFlags::CASE_FOLD) {
            for lower in folded.to_lowercase() {
                if lower != folded {
                    changed = true;
                }
                push_char(&mut out, &mut starts, &mut ends, lower, span_start, span_end);
            }
        } else {
            push_char(&mut out, &mut starts, &mut ends, folded, span_start, span_end);
        }
    }

    if changed {
        Normalized {
            text: Cow::Owned(out),
            starts,
            ends,
        }
    } else {
        Normalized {
            text: Cow::Borrowed(text),
            starts: Vec::new(),
            ends: Vec::new(),
        }
    }
}

fn push_char(
    out: &mut String,
    starts: &mut Vec<u32>,
    ends: &mut Vec<u32>,
    ch: char,
    span_start: u32,
    span_end: u32,
) {
    let before = out.len();
    out.push(ch);
    for _ in before..out.len() {
        starts.push(span_start);
        ends.push(span_end);
    }
}
