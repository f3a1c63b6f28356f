//! C API for textsieve
//!
//! Provides stable C FFI bindings for building and querying matchers from
//! C/C++ and other languages. The API uses opaque handles and plain
//! boolean/pointer returns for maximum compatibility across language
//! boundaries.
//!
//! # Safety Guarantees
//!
//! All C functions follow these safety rules:
//! - Null pointer checks on all inputs
//! - Panic catching at FFI boundaries
//! - Opaque handles for resource management
//! - Malformed input yields a null handle, never an unwind
//! - Memory ownership clearly documented
//!
//! # Basic Usage Pattern
//!
//! **Note**: Matchers are **immutable** once built. To change the word
//! tables, rebuild the handle from a new definition blob.
//!
//! ```c
//! #include <textsieve.h>
//!
//! // 1. Build a matcher from a MessagePack definition blob
//! textsieve_matcher_t *m = init_matcher(def_bytes, def_len);
//! if (m == NULL) { /* malformed definition */ }
//!
//! // 2. Query
//! if (matcher_is_match(m, "some text")) {
//!     char *word = matcher_word_match(m, "some text");
//!     if (word != NULL) {
//!         printf("matched: %s\n", word);
//!         drop_string(word);
//!     }
//!     char *masked = matcher_process(m, "some text");
//!     if (masked != NULL) {
//!         printf("redacted: %s\n", masked);
//!         drop_string(masked);
//!     }
//! }
//!
//! // 3. Release the handle
//! drop_matcher(m);
//! ```
//!
//! The `init_simple_matcher` / `simple_matcher_is_match` /
//! `simple_matcher_process` / `drop_simple_matcher` set mirrors the same
//! pattern over a flat weighted wordlist blob.
//!
//! # Memory Management
//!
//! - **Handles**: call `drop_matcher()` / `drop_simple_matcher()` exactly
//!   once per handle; double-free and use-after-drop are caller
//!   responsibilities, not engine-detected.
//! - **Strings**: every non-null `char *` returned by a query function is
//!   newly allocated and owned by the caller; call `drop_string()` exactly
//!   once per returned string, and never on caller-owned input strings.
//!
//! # Thread Safety
//!
//! - **Matcher handles**: safe for concurrent queries from multiple
//!   threads with no external locking.
//! - **Destruction**: must not run concurrently with in-flight queries on
//!   the same handle; ensure query quiescence first.
//!
//! # Error Handling
//!
//! Construction failures (malformed or empty definition blobs, an
//! AND-table missing a required word list) return a null handle; no
//! partial handle is ever produced. Query-time "no match" is `false` or a
//! null string, never an error.

mod handles;

pub use handles::*;
