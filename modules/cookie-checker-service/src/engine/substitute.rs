//! Variable substitution for templated block fields.
//!
//! Three placeholder syntaxes, applied in order, one pass each:
//! `<COOKIE:name>`, `<COOKIES_RAW>`, then `<name>` for every capture.
//! Replacement text is never re-scanned.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static COOKIE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<COOKIE:([^>]+)>").expect("cookie placeholder regex"));

static CAPTURE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<([^<>]+)>").expect("capture placeholder regex"));

const COOKIES_RAW: &str = "<COOKIES_RAW>";

/// Rewrite `text`, resolving placeholders against the cookie and capture maps.
///
/// Unknown cookie names expand to the empty string; unknown capture names are
/// left literal. Each syntax is a single pass over the text, so a replacement
/// result is never re-scanned.
pub fn replace_variables(
    text: &str,
    cookies: Option<&HashMap<String, String>>,
    captures: &HashMap<String, String>,
) -> String {
    let mut result = COOKIE_PLACEHOLDER
        .replace_all(text, |caps: &regex::Captures| {
            cookies
                .and_then(|c| c.get(&caps[1]))
                .cloned()
                .unwrap_or_default()
        })
        .into_owned();

    if result.contains(COOKIES_RAW) {
        let raw = cookies.map(build_cookie_string).unwrap_or_default();
        result = result.replace(COOKIES_RAW, &raw);
    }

    if !captures.is_empty() {
        result = CAPTURE_PLACEHOLDER
            .replace_all(&result, |caps: &regex::Captures| {
                match captures.get(&caps[1]) {
                    Some(value) => value.clone(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned();
    }

    result
}

/// Render the cookie map as a `Cookie:` header value. Iteration order is
/// unspecified; callers must not rely on it.
pub fn build_cookie_string(cookies: &HashMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_cookie_placeholder() {
        let cookies = map(&[("sid", "abc")]);
        let out = replace_variables("id=<COOKIE:sid>!", Some(&cookies), &HashMap::new());
        assert_eq!(out, "id=abc!");
    }

    #[test]
    fn test_missing_cookie_expands_to_empty() {
        let cookies = map(&[("sid", "abc")]);
        let out = replace_variables("<COOKIE:nope>", Some(&cookies), &HashMap::new());
        assert_eq!(out, "");
    }

    #[test]
    fn test_cookies_raw_is_unordered_kv_set() {
        let cookies = map(&[("a", "1"), ("b", "2")]);
        let out = replace_variables(COOKIES_RAW, Some(&cookies), &HashMap::new());
        let parts: HashSet<&str> = out.split("; ").collect();
        assert_eq!(parts, HashSet::from(["a=1", "b=2"]));
    }

    #[test]
    fn test_capture_placeholder() {
        let captures = map(&[("token", "t0k")]);
        let out = replace_variables("bearer <token>", None, &captures);
        assert_eq!(out, "bearer t0k");
    }

    #[test]
    fn test_unknown_capture_left_literal() {
        let captures = map(&[("token", "t0k")]);
        let out = replace_variables("<token> <other>", None, &captures);
        assert_eq!(out, "t0k <other>");
    }

    #[test]
    fn test_substitution_does_not_recurse() {
        // X expands to "<Y>" and stays that way: replacements are not re-scanned.
        let captures = map(&[("X", "<Y>"), ("Y", "Z")]);
        let out = replace_variables("<X>", None, &captures);
        assert_eq!(out, "<Y>");
    }

    #[test]
    fn test_no_cookies_map() {
        let out = replace_variables("<COOKIE:sid>|<COOKIES_RAW>", None, &HashMap::new());
        assert_eq!(out, "|");
    }
}
