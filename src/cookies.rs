// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cookie relaying helpers.
//!
//! Hub cookies are opaque to this service: they are read from incoming
//! `Cookie` headers, forwarded to the hub API, and re-issued to the browser
//! after an admin-access grant. Nothing here interprets their contents.

use axum::http::{header::COOKIE, HeaderMap};

/// Cookie granting access to another user's notebook server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotebookCookie {
    pub name: String,
    pub value: String,
    /// Scope of the cookie, always `/user/{user}`
    pub path: String,
}

impl NotebookCookie {
    /// Render as a `Set-Cookie` header value.
    ///
    /// Values that are not plain cookie octets are sent as a quoted string
    /// with `"`, `\`, `;`, `,` and non-printable bytes escaped, so the
    /// header stays valid and the value is not cut short.
    pub fn to_set_cookie(&self) -> String {
        format!(
            "{}={}; Path={}",
            self.name,
            quote_cookie_value(&self.value),
            self.path
        )
    }
}

/// RFC 6265 `cookie-octet`.
fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn quote_cookie_value(value: &str) -> String {
    if value.bytes().all(is_cookie_octet) {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for byte in value.bytes() {
        match byte {
            b'"' | b'\\' => {
                quoted.push('\\');
                quoted.push(byte as char);
            }
            b' ' => quoted.push(' '),
            b if is_cookie_octet(b) => quoted.push(b as char),
            b => quoted.push_str(&format!("\\{b:03o}")),
        }
    }
    quoted.push('"');
    quoted
}

/// Find the value of cookie `name` in the request's `Cookie` headers.
pub fn request_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .find_map(|pair| match pair.trim().split_once('=') {
            Some((key, value)) if key.trim() == name => Some(value.trim().to_string()),
            _ => None,
        })
}

/// Extract the value of cookie `name` from a single `Set-Cookie` header.
///
/// Attributes after the first `;` are ignored.
pub fn set_cookie_value(set_cookie: &str, name: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?;
    let (key, value) = pair.split_once('=')?;
    (key.trim() == name).then(|| value.trim().to_string())
}

/// Undo the quoting the hub applies to admin-access cookie values.
///
/// The hub wraps the value in double quotes and percent-encodes its body.
pub fn unquote_cookie_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(raw);
    match urlencoding::decode(inner) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => inner.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn request_cookie_finds_named_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; jupyter-hub-token=abc123; other=1"),
        );
        assert_eq!(
            request_cookie(&headers, "jupyter-hub-token").as_deref(),
            Some("abc123")
        );
        assert_eq!(request_cookie(&headers, "missing"), None);
    }

    #[test]
    fn request_cookie_searches_every_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("jupyter-hub-token=xyz"));
        assert_eq!(
            request_cookie(&headers, "jupyter-hub-token").as_deref(),
            Some("xyz")
        );
    }

    #[test]
    fn request_cookie_does_not_match_name_prefixes() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("jupyter-hub-token-bob=zzz"),
        );
        assert_eq!(request_cookie(&headers, "jupyter-hub-token"), None);
    }

    #[test]
    fn set_cookie_value_ignores_attributes() {
        let header = r#"jupyter-hub-token-bob="a%2Bb"; HttpOnly; Path=/user/bob"#;
        assert_eq!(
            set_cookie_value(header, "jupyter-hub-token-bob").as_deref(),
            Some(r#""a%2Bb""#)
        );
        assert_eq!(set_cookie_value(header, "jupyter-hub-token"), None);
    }

    #[test]
    fn unquote_strips_quotes_and_decodes() {
        assert_eq!(unquote_cookie_value(r#""a%2Bb%3D""#), "a+b=");
        assert_eq!(unquote_cookie_value("plain"), "plain");
    }

    #[test]
    fn unsafe_cookie_values_are_quoted() {
        let cookie = NotebookCookie {
            name: "jupyter-hub-token-bob".to_string(),
            value: r#"a;b, c"d"#.to_string(),
            path: "/user/bob".to_string(),
        };
        let rendered = cookie.to_set_cookie();
        assert_eq!(
            rendered,
            r#"jupyter-hub-token-bob="a\073b\054 c\"d"; Path=/user/bob"#
        );
        assert!(HeaderValue::from_str(&rendered).is_ok());
        assert_eq!(
            set_cookie_value(&rendered, "jupyter-hub-token-bob").as_deref(),
            Some(r#""a\073b\054 c\"d""#)
        );
    }

    #[test]
    fn notebook_cookie_renders_path() {
        let cookie = NotebookCookie {
            name: "jupyter-hub-token-bob".to_string(),
            value: "secret".to_string(),
            path: "/user/bob".to_string(),
        };
        assert_eq!(
            cookie.to_set_cookie(),
            "jupyter-hub-token-bob=secret; Path=/user/bob"
        );
    }
}
