//! Textsieve - Multi-Pattern Text Screening Engine
//!
//! Textsieve decides, for arbitrary input text, whether it contains any
//! member of large word/phrase collections, which member matched, and
//! (optionally) produces a transformed copy with matches redacted. It is
//! built for adversarial input: spacing and punctuation evasion, case
//! tricks, look-alike characters, and script variants are defeated by a
//! normalization layer rather than by pattern explosion.
//!
//! # Quick Start
//!
//! ```rust
//! use textsieve::{
//!     CombinePolicy, MaskPolicy, MatchKind, Matcher, MatcherDef, NormFlags,
//!     TableDef, WordListDef,
//! };
//!
//! let def = MatcherDef {
//!     mask: MaskPolicy::Replace("***".to_string()),
//!     tables: vec![TableDef {
//!         match_id: "contraband".to_string(),
//!         table_id: 1,
//!         policy: CombinePolicy::Any,
//!         word_lists: vec![WordListDef {
//!             list_id: 1,
//!             kind: MatchKind::Exact,
//!             normalization: NormFlags::CASE_FOLD | NormFlags::DELETE_SEPARATORS,
//!             words: vec!["forbidden".to_string()],
//!         }],
//!         exemption: None,
//!     }],
//! };
//!
//! let matcher = Matcher::new(&def)?;
//!
//! assert!(matcher.is_match("this is F.O.R.B.I.D.D.E.N text"));
//! assert_eq!(matcher.word_match("nothing here"), None);
//! assert_eq!(
//!     matcher.process("a forbidden word").as_deref(),
//!     Some("a *** word"),
//! );
//! # Ok::<(), textsieve::SieveError>(())
//! ```
//!
//! # Key Features
//!
//! - **One scan, many tables**: all word lists share a single automaton;
//!   a query costs one pass per normalization variant, not per table.
//! - **Obfuscation-hardened**: case folding, separator elision,
//!   similar-character folding, and script transliteration, composable
//!   per word list.
//! - **Rule layer**: tables combine word lists with OR/AND policies and
//!   exemption lists that suppress otherwise-true matches.
//! - **Weighted screening**: [`SimpleMatcher`] scores a flat wordlist for
//!   graduated severity decisions.
//! - **Immutable handles**: build once from a definition blob, then query
//!   concurrently from any number of threads with no locking.
//! - **C API**: stable FFI with opaque handles for any language.
//!
//! # Architecture
//!
//! ```text
//! definition blob (MessagePack)
//!         │ decode + compile (once, at init)
//!         ▼
//! ┌────────────────────────────────────────┐
//! │ Registry                               │
//! │   tables / word lists / exemptions     │
//! │   shared Aho-Corasick automaton        │
//! └────────────────────────────────────────┘
//!         │ per query (read-only)
//!         ▼
//! normalize per variant → scan → route hits → table rules → result
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules (documented API)

/// Unified error type for construction failures
pub mod error;
/// Table-based matcher and its statistics types
pub mod matcher;
/// Compiled registry result types
pub mod registry;
/// Serialized definition schema (MessagePack blob contract)
pub mod schema;
/// Flat weighted wordlist matcher
pub mod simple_matcher;

// Public C API
pub mod c_api;

// Re-exports for Rust consumers

pub use crate::error::{Result, SieveError};
pub use crate::matcher::{Matcher, MatcherStats, MatcherStatsSnapshot, TextScreen};
pub use crate::registry::MatchHit;
pub use crate::schema::{
    decode_matcher_def, decode_simple_def, encode_matcher_def, encode_simple_def, CombinePolicy,
    MaskPolicy, MatchKind, MatcherDef, SimpleDef, SimpleEntry, TableDef, WordListDef,
};
pub use crate::simple_matcher::{SimpleHit, SimpleMatcher};

/// Normalization flag set, re-exported from the normalize crate
pub use textsieve_normalize::NormFlags;

/// Automaton building blocks, re-exported for advanced users
pub use textsieve_ac::{AcError, AcMatch, Automaton, Scan};

// Version information
/// Library version string
pub const TEXTSIEVE_VERSION: &str = env!("CARGO_PKG_VERSION");
