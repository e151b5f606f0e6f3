//! Cleanup of engine output before it reaches the store.
//!
//! Engines are external programs; their artifacts are treated as
//! untrusted bytes. Two things have bitten real deployments and are
//! handled here for both engine strategies:
//!
//! - invalid UTF-8 sequences, decoded lossily so a stray byte cannot
//!   fail an otherwise successful conversion
//! - embedded NUL characters, which some text-storage backends reject
//!   outright, stripped before the body is persisted or returned

/// Decode raw engine bytes, replacing invalid UTF-8 sequences with
/// U+FFFD instead of failing.
pub fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Remove embedded NUL characters.
pub fn strip_nul(text: &str) -> String {
    if text.contains('\0') {
        text.replace('\0', "")
    } else {
        text.to_string()
    }
}

/// Full cleanup applied to every artifact body: lossy decode, then NUL
/// removal. The result is always safe to hand to any document store.
pub fn clean_body(bytes: &[u8]) -> String {
    let decoded = decode_lossy(bytes);
    if decoded.contains('\0') {
        decoded.replace('\0', "")
    } else {
        decoded
    }
}

// ─────────────────────────────── Tests ──────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_passes_through() {
        assert_eq!(clean_body("héllo <b>world</b>".as_bytes()), "héllo <b>world</b>");
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let bytes = b"ok \xff\xfe still ok";
        let cleaned = clean_body(bytes);
        assert!(cleaned.starts_with("ok "));
        assert!(cleaned.ends_with(" still ok"));
        assert!(cleaned.contains('\u{FFFD}'));
    }

    #[test]
    fn nul_characters_are_stripped() {
        assert_eq!(clean_body(b"a\x00b\x00c"), "abc");
        assert_eq!(strip_nul("\0\0"), "");
        assert_eq!(strip_nul("clean"), "clean");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_body(b""), "");
    }

    #[test]
    fn decode_then_strip_composes() {
        // A NUL surrounded by an invalid sequence: both cleanups apply.
        let bytes = b"x\xc3\x28\x00y";
        let cleaned = clean_body(bytes);
        assert!(!cleaned.contains('\0'));
        assert!(cleaned.contains('\u{FFFD}'));
        assert!(cleaned.starts_with('x') && cleaned.ends_with('y'));
    }
}
