//! Opaque-handle FFI functions.
//!
//! Every function here upholds the contract documented in [`crate::c_api`]:
//! null checks on all inputs, panics caught before they cross the
//! boundary, ownership transferred with `Box::into_raw`/`Box::from_raw`
//! and `CString::into_raw`/`CString::from_raw` pairs.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::matcher::Matcher;
use crate::simple_matcher::SimpleMatcher;

/// Hand a Rust string to the caller as an owned, NUL-terminated C string.
/// Returns null if the string contains an interior NUL byte.
fn into_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Read a caller-owned C string as UTF-8. `None` on invalid UTF-8, which
/// query functions resolve to "no match" rather than undefined behavior.
///
/// # Safety
///
/// `text` must be a valid, NUL-terminated C string.
unsafe fn text_arg<'a>(text: *const c_char) -> Option<&'a str> {
    CStr::from_ptr(text).to_str().ok()
}

/// Build a matcher handle from a MessagePack `MatcherDef` blob.
///
/// Returns null on a null/malformed/empty definition; never panics across
/// the boundary. The returned handle is owned by the caller and must be
/// released with [`drop_matcher`] exactly once.
///
/// # Safety
///
/// `bytes` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn init_matcher(bytes: *const u8, len: usize) -> *mut Matcher {
    if bytes.is_null() {
        return ptr::null_mut();
    }
    let result = catch_unwind(AssertUnwindSafe(|| {
        let blob = slice::from_raw_parts(bytes, len);
        Matcher::from_bytes(blob).ok().map(Box::new)
    }));
    match result {
        Ok(Some(matcher)) => Box::into_raw(matcher),
        _ => ptr::null_mut(),
    }
}

/// True iff `text` matches any table of the matcher.
///
/// Returns false on a null handle, null text, or invalid UTF-8.
///
/// # Safety
///
/// `matcher` must be a live handle from [`init_matcher`]; `text` must be a
/// valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn matcher_is_match(matcher: *const Matcher, text: *const c_char) -> bool {
    if matcher.is_null() || text.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let matcher = &*matcher;
        text_arg(text).is_some_and(|t| matcher.is_match(t))
    }))
    .unwrap_or(false)
}

/// The matched word of the first qualifying table, as an owned C string,
/// or null when nothing matches.
///
/// A non-null result must be released with [`drop_string`] exactly once.
///
/// # Safety
///
/// Same contract as [`matcher_is_match`].
#[no_mangle]
pub unsafe extern "C" fn matcher_word_match(
    matcher: *const Matcher,
    text: *const c_char,
) -> *mut c_char {
    if matcher.is_null() || text.is_null() {
        return ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let matcher = &*matcher;
        match text_arg(text).and_then(|t| matcher.word_match(t)) {
            Some(word) => into_c_string(word.to_string()),
            None => ptr::null_mut(),
        }
    }))
    .unwrap_or(ptr::null_mut())
}

/// The text with every qualifying match redacted, as an owned C string,
/// or null when no replacement was made.
///
/// A non-null result must be released with [`drop_string`] exactly once.
///
/// # Safety
///
/// Same contract as [`matcher_is_match`].
#[no_mangle]
pub unsafe extern "C" fn matcher_process(
    matcher: *const Matcher,
    text: *const c_char,
) -> *mut c_char {
    if matcher.is_null() || text.is_null() {
        return ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let matcher = &*matcher;
        match text_arg(text).and_then(|t| matcher.process(t)) {
            Some(masked) => into_c_string(masked),
            None => ptr::null_mut(),
        }
    }))
    .unwrap_or(ptr::null_mut())
}

/// Release a matcher handle.
///
/// # Safety
///
/// `matcher` must be a handle from [`init_matcher`] that has not been
/// dropped, with no query in flight on it. Passing null is a no-op.
#[no_mangle]
pub unsafe extern "C" fn drop_matcher(matcher: *mut Matcher) {
    if !matcher.is_null() {
        drop(Box::from_raw(matcher));
    }
}

/// Build a simple-matcher handle from a MessagePack `SimpleDef` blob.
///
/// Returns null on a null/malformed/empty definition. The returned handle
/// must be released with [`drop_simple_matcher`] exactly once.
///
/// # Safety
///
/// `bytes` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn init_simple_matcher(bytes: *const u8, len: usize) -> *mut SimpleMatcher {
    if bytes.is_null() {
        return ptr::null_mut();
    }
    let result = catch_unwind(AssertUnwindSafe(|| {
        let blob = slice::from_raw_parts(bytes, len);
        SimpleMatcher::from_bytes(blob).ok().map(Box::new)
    }));
    match result {
        Ok(Some(matcher)) => Box::into_raw(matcher),
        _ => ptr::null_mut(),
    }
}

/// True iff `text` reaches the simple matcher's weight threshold (or hits
/// any word when no threshold is configured).
///
/// # Safety
///
/// `simple_matcher` must be a live handle from [`init_simple_matcher`];
/// `text` must be a valid NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn simple_matcher_is_match(
    simple_matcher: *const SimpleMatcher,
    text: *const c_char,
) -> bool {
    if simple_matcher.is_null() || text.is_null() {
        return false;
    }
    catch_unwind(AssertUnwindSafe(|| {
        let matcher = &*simple_matcher;
        text_arg(text).is_some_and(|t| matcher.is_match(t))
    }))
    .unwrap_or(false)
}

/// The text with every matched word redacted, as an owned C string, or
/// null when no replacement was made.
///
/// A non-null result must be released with [`drop_string`] exactly once.
///
/// # Safety
///
/// Same contract as [`simple_matcher_is_match`].
#[no_mangle]
pub unsafe extern "C" fn simple_matcher_process(
    simple_matcher: *const SimpleMatcher,
    text: *const c_char,
) -> *mut c_char {
    if simple_matcher.is_null() || text.is_null() {
        return ptr::null_mut();
    }
    catch_unwind(AssertUnwindSafe(|| {
        let matcher = &*simple_matcher;
        match text_arg(text).and_then(|t| matcher.process(t)) {
            Some(masked) => into_c_string(masked),
            None => ptr::null_mut(),
        }
    }))
    .unwrap_or(ptr::null_mut())
}

/// Release a simple-matcher handle.
///
/// # Safety
///
/// `simple_matcher` must be a handle from [`init_simple_matcher`] that has
/// not been dropped, with no query in flight on it. Passing null is a
/// no-op.
#[no_mangle]
pub unsafe extern "C" fn drop_simple_matcher(simple_matcher: *mut SimpleMatcher) {
    if !simple_matcher.is_null() {
        drop(Box::from_raw(simple_matcher));
    }
}

/// Release a string previously returned by a query function.
///
/// # Safety
///
/// `ptr` must have been returned by a textsieve query function and not yet
/// released; never pass caller-owned input strings. Passing null is a
/// no-op.
#[no_mangle]
pub unsafe extern "C" fn drop_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}
