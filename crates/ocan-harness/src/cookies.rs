// SPDX-License-Identifier: MIT OR Apache-2.0
//! A minimal cookie jar for [`crate::Scenario::fetch`] (§4.F): tracks
//! whatever a handler sets via `Set-Cookie` and replays it on subsequent
//! requests via `Cookie`, the way a browser's jar would for a
//! refresh-token boundary — without implementing the auth actor itself.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderValue};

/// Cookies captured from responses, keyed by name.
#[derive(Debug, Default, Clone)]
pub struct CookieJar {
    entries: HashMap<String, String>,
}

impl CookieJar {
    /// An empty jar.
    pub fn new() -> Self {
        Self::default()
    }

    /// The value stored for `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Set `name` to `value` directly, as if a prior response had done so.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Parse every `Set-Cookie` header in `headers` and fold the
    /// `name=value` pairs into the jar.
    pub fn absorb(&mut self, headers: &HeaderMap) {
        for value in headers.get_all(axum::http::header::SET_COOKIE) {
            if let Ok(text) = value.to_str() {
                if let Some((name, value)) = parse_set_cookie(text) {
                    self.entries.insert(name, value);
                }
            }
        }
    }

    /// Render the jar's contents as a `Cookie` request header value, or
    /// `None` if the jar is empty.
    pub fn to_header(&self) -> Option<HeaderValue> {
        if self.entries.is_empty() {
            return None;
        }
        let rendered = self
            .entries
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&rendered).ok()
    }
}

/// Extract the `name=value` pair from the front of a `Set-Cookie` header,
/// ignoring any trailing attributes (`Path=`, `HttpOnly`, ...).
fn parse_set_cookie(text: &str) -> Option<(String, String)> {
    let pair = text.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbs_a_set_cookie_header_and_renders_it_back() {
        let mut headers = HeaderMap::new();
        headers.append(
            axum::http::header::SET_COOKIE,
            HeaderValue::from_static("session=abc123; Path=/; HttpOnly"),
        );
        let mut jar = CookieJar::new();
        jar.absorb(&headers);
        assert_eq!(jar.get("session"), Some("abc123"));
        assert_eq!(jar.to_header().unwrap().to_str().unwrap(), "session=abc123");
    }

    #[test]
    fn empty_jar_has_no_header() {
        assert!(CookieJar::new().to_header().is_none());
    }

    #[test]
    fn multiple_set_cookie_headers_all_land_in_the_jar() {
        let mut headers = HeaderMap::new();
        headers.append(axum::http::header::SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(axum::http::header::SET_COOKIE, HeaderValue::from_static("b=2"));
        let mut jar = CookieJar::new();
        jar.absorb(&headers);
        assert_eq!(jar.get("a"), Some("1"));
        assert_eq!(jar.get("b"), Some("2"));
    }
}
