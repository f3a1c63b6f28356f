//! Serialized definition schema for matcher construction.
//!
//! A `Matcher` is built from a serialized [`MatcherDef`], a `SimpleMatcher`
//! from a serialized [`SimpleDef`]. Both travel across the boundary as
//! MessagePack byte blobs; the types here are plain serde derives, so any
//! language with a MessagePack encoder can produce definitions.
//!
//! The schema is self-describing and owned by this repository (field
//! names, defaults, and flag bit values are the contract); see DESIGN.md
//! for the rationale.

use serde::{Deserialize, Serialize};
use textsieve_normalize::NormFlags;

use crate::error::Result;

/// How a table combines its word lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinePolicy {
    /// OR: any word list hit qualifies the table.
    #[default]
    Any,
    /// AND: every word list must produce a qualifying hit in the same text.
    All,
}

/// Match discipline of a word list.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Any automaton hit for a word counts.
    #[default]
    Exact,
    /// Words are `&`-separated segment lists; a word qualifies only when
    /// the distinct matched segments cover at least `threshold` of its
    /// total character length.
    Fuzzy {
        /// Required matched-character ratio, `0.0 ..= 1.0`.
        threshold: f32,
    },
}

/// What `process` does to a matched span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskPolicy {
    /// Replace each masked span with this token.
    Replace(String),
    /// Delete each masked span.
    Remove,
}

impl Default for MaskPolicy {
    fn default() -> Self {
        MaskPolicy::Replace("*".to_string())
    }
}

/// One word list: a set of words sharing a match discipline and a
/// normalization class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordListDef {
    /// List identifier, unique within its table; OR-tables qualify lists
    /// in ascending id order.
    pub list_id: u32,
    /// Match discipline for every word in the list.
    #[serde(default)]
    pub kind: MatchKind,
    /// Normalization applied to both the words and, at query time, the
    /// text variant this list is matched against. A list carrying
    /// `DELETE_SEPARATORS` therefore only ever counts post-elision hits.
    #[serde(default)]
    pub normalization: NormFlags,
    /// The words themselves. Words that normalize to the empty string are
    /// dropped (with a warning) at build time.
    pub words: Vec<String>,
}

/// One logical match table: word lists under a combination policy, with
/// an optional exemption list that suppresses otherwise-true matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDef {
    /// Caller-facing name of the rule group this table belongs to.
    pub match_id: String,
    /// Numeric table key; tables are evaluated in ascending order.
    pub table_id: u32,
    /// OR / AND combination of `word_lists`.
    #[serde(default)]
    pub policy: CombinePolicy,
    /// Required word lists. A table with none never matches (and is
    /// rejected outright under [`CombinePolicy::All`]).
    pub word_lists: Vec<WordListDef>,
    /// Optional exemption list: a hit here suppresses the whole table
    /// for the query. Exemptions override positive matches, never the
    /// reverse.
    #[serde(default)]
    pub exemption: Option<WordListDef>,
}

/// Complete definition of a [`crate::Matcher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherDef {
    /// Redaction behavior of `process`.
    #[serde(default)]
    pub mask: MaskPolicy,
    /// The match tables.
    pub tables: Vec<TableDef>,
}

fn default_weight() -> u64 {
    1
}

/// One weighted word of a [`SimpleDef`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleEntry {
    /// Caller-assigned word identifier, reported back in hits.
    pub word_id: u32,
    /// The word.
    pub word: String,
    /// Weight contributed when this word matches (default 1).
    #[serde(default = "default_weight")]
    pub weight: u64,
}

/// Complete definition of a [`crate::SimpleMatcher`]: one flat weighted
/// word list with no table layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleDef {
    /// Normalization applied to the words and the query text.
    #[serde(default)]
    pub normalization: NormFlags,
    /// Minimum summed weight of distinct matched words for `is_match`.
    /// Unset means any single hit matches.
    #[serde(default)]
    pub min_weight: Option<u64>,
    /// Redaction behavior of `process`.
    #[serde(default)]
    pub mask: MaskPolicy,
    /// The weighted words.
    pub words: Vec<SimpleEntry>,
}

/// Decode a MessagePack [`MatcherDef`] blob.
pub fn decode_matcher_def(bytes: &[u8]) -> Result<MatcherDef> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Decode a MessagePack [`SimpleDef`] blob.
pub fn decode_simple_def(bytes: &[u8]) -> Result<SimpleDef> {
    Ok(rmp_serde::from_slice(bytes)?)
}

/// Encode a [`MatcherDef`] to MessagePack, field names included.
///
/// The named representation is what non-Rust producers emit; decode
/// accepts both named and positional encodings.
pub fn encode_matcher_def(def: &MatcherDef) -> Vec<u8> {
    rmp_serde::to_vec_named(def).expect("MatcherDef serialization is infallible")
}

/// Encode a [`SimpleDef`] to MessagePack, field names included.
pub fn encode_simple_def(def: &SimpleDef) -> Vec<u8> {
    rmp_serde::to_vec_named(def).expect("SimpleDef serialization is infallible")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matcher_def_round_trip() {
        let def = MatcherDef {
            mask: MaskPolicy::Remove,
            tables: vec![TableDef {
                match_id: "profanity".to_string(),
                table_id: 1,
                policy: CombinePolicy::All,
                word_lists: vec![WordListDef {
                    list_id: 1,
                    kind: MatchKind::Fuzzy { threshold: 0.8 },
                    normalization: NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
                    words: vec!["example".to_string()],
                }],
                exemption: Some(WordListDef {
                    list_id: 100,
                    kind: MatchKind::Exact,
                    normalization: NormFlags::CASE_FOLD,
                    words: vec!["for example".to_string()],
                }),
            }],
        };

        let bytes = encode_matcher_def(&def);
        let back = decode_matcher_def(&bytes).unwrap();
        assert_eq!(back.mask, MaskPolicy::Remove);
        assert_eq!(back.tables.len(), 1);
        assert_eq!(back.tables[0].policy, CombinePolicy::All);
        assert_eq!(
            back.tables[0].word_lists[0].kind,
            MatchKind::Fuzzy { threshold: 0.8 }
        );
        assert!(back.tables[0].exemption.is_some());
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        // A producer may omit kind, normalization, policy, and mask.
        let def = MatcherDef {
            mask: MaskPolicy::default(),
            tables: vec![TableDef {
                match_id: "t".to_string(),
                table_id: 0,
                policy: CombinePolicy::default(),
                word_lists: vec![],
                exemption: None,
            }],
        };
        let bytes = encode_matcher_def(&def);
        let back = decode_matcher_def(&bytes).unwrap();
        assert_eq!(back.mask, MaskPolicy::Replace("*".to_string()));
        assert_eq!(back.tables[0].policy, CombinePolicy::Any);
    }

    #[test]
    fn simple_def_round_trip_with_default_weight() {
        let def = SimpleDef {
            normalization: NormFlags::CASE_FOLD,
            min_weight: Some(2),
            mask: MaskPolicy::default(),
            words: vec![SimpleEntry {
                word_id: 7,
                word: "spam".to_string(),
                weight: 1,
            }],
        };
        let bytes = encode_simple_def(&def);
        let back = decode_simple_def(&bytes).unwrap();
        assert_eq!(back.min_weight, Some(2));
        assert_eq!(back.words[0].word_id, 7);
        assert_eq!(back.words[0].weight, 1);
    }

    #[test]
    fn malformed_blob_is_a_decode_error() {
        assert!(decode_matcher_def(b"").is_err());
        assert!(decode_matcher_def(b"\xc1garbage").is_err());
        assert!(decode_simple_def(b"\x00\x01\x02").is_err());
    }
}
