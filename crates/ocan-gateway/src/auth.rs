// SPDX-License-Identifier: MIT OR Apache-2.0
//! Bearer-subprotocol token extraction (§6).
//!
//! The WebSocket handshake carries no `Authorization` header, so the
//! client instead lists `<prefix><token>` among its offered
//! `Sec-WebSocket-Protocol` values. This module only locates that
//! substring; it never decodes or verifies the token — that remains an
//! out-of-scope auth collaborator's job.

/// An opaque bearer token pulled out of a `Sec-WebSocket-Protocol` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(pub String);

/// Search `header_value` — the full, comma-separated
/// `Sec-WebSocket-Protocol` header — for an entry starting with `prefix`
/// and return everything after it.
pub fn extract_auth_token(header_value: &str, prefix: &str) -> Option<AuthToken> {
    header_value
        .split(',')
        .map(str::trim)
        .find_map(|candidate| candidate.strip_prefix(prefix))
        .filter(|token| !token.is_empty())
        .map(|token| AuthToken(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_token_after_the_configured_prefix() {
        let header = "ocan-proxy-v1, ocan-auth.eyJhbGciOiJIUzI1NiJ9";
        let token = extract_auth_token(header, "ocan-auth.").unwrap();
        assert_eq!(token.0, "eyJhbGciOiJIUzI1NiJ9");
    }

    #[test]
    fn returns_none_when_no_entry_matches_the_prefix() {
        assert!(extract_auth_token("ocan-proxy-v1", "ocan-auth.").is_none());
    }

    #[test]
    fn returns_none_for_a_bare_prefix_with_no_token() {
        assert!(extract_auth_token("ocan-auth.", "ocan-auth.").is_none());
    }
}
