//! Cookie payload parsing: normalises a raw payload into a name → value map.
//!
//! Three wire formats are supported: a JSON object, a Netscape cookies.txt
//! export, and a `Cookie:` header string. When the config does not declare a
//! format, the parser autodetects.

use super::config::CookieFormat;
use std::collections::HashMap;

/// Parse a raw cookie payload in the given format.
///
/// Malformed lines are skipped rather than failing the check; the one hard
/// error is a payload *declared* as json that is not valid JSON, which the
/// executor surfaces as an ERROR status.
pub fn parse_cookies(
    content: &str,
    format: CookieFormat,
) -> Result<HashMap<String, String>, String> {
    match format {
        CookieFormat::Json => parse_json(content),
        CookieFormat::Netscape => Ok(parse_netscape(content)),
        CookieFormat::Header => Ok(parse_header(content)),
        // Autodetected json is best-effort: a payload that merely looks like
        // json degrades to an empty map instead of failing the check.
        CookieFormat::Unspecified => match detect_format(content) {
            CookieFormat::Json => Ok(parse_json(content).unwrap_or_default()),
            other => parse_cookies(content, other),
        },
    }
}

/// Guess the wire format: leading `{` is json, any TAB is netscape,
/// everything else is a header string.
fn detect_format(content: &str) -> CookieFormat {
    if content.trim_start().starts_with('{') {
        CookieFormat::Json
    } else if content.contains('\t') {
        CookieFormat::Netscape
    } else {
        CookieFormat::Header
    }
}

fn parse_json(content: &str) -> Result<HashMap<String, String>, String> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid json cookies: {}", e))?;

    let object = value
        .as_object()
        .ok_or_else(|| "json cookies must be an object".to_string())?;

    Ok(object
        .iter()
        .map(|(k, v)| (k.clone(), json_value_string(v)))
        .collect())
}

/// Cookie values in json payloads are occasionally numbers or booleans;
/// coerce everything to its plain string form.
fn json_value_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_netscape(content: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for line in content.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() >= 7 {
            cookies.insert(fields[5].to_string(), fields[6].to_string());
        }
    }
    cookies
}

fn parse_header(content: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for pair in content.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_format() {
        let cookies =
            parse_cookies(r#"{"sid": "abc", "count": 3, "flag": true}"#, CookieFormat::Json)
                .unwrap();
        assert_eq!(cookies["sid"], "abc");
        assert_eq!(cookies["count"], "3");
        assert_eq!(cookies["flag"], "true");
    }

    #[test]
    fn test_declared_json_malformed_is_an_error() {
        assert!(parse_cookies("not json at all", CookieFormat::Json).is_err());
        assert!(parse_cookies("[1, 2, 3]", CookieFormat::Json).is_err());
    }

    #[test]
    fn test_netscape_format() {
        let content = "# Netscape HTTP Cookie File\n\
                       \n\
                       .example.com\tTRUE\t/\tTRUE\t1999999999\tsid\tabc123\n\
                       short\tline\n\
                       .example.com\tTRUE\t/\tFALSE\t1999999999\ttoken\txyz\n";
        let cookies = parse_cookies(content, CookieFormat::Netscape).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["sid"], "abc123");
        assert_eq!(cookies["token"], "xyz");
    }

    #[test]
    fn test_header_format() {
        let cookies =
            parse_cookies("sid=abc; token=x=y; plain", CookieFormat::Header).unwrap();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies["sid"], "abc");
        // Split on the first '=' only.
        assert_eq!(cookies["token"], "x=y");
    }

    #[test]
    fn test_autodetect() {
        let cookies =
            parse_cookies(r#"  {"sid": "j"}"#, CookieFormat::Unspecified).unwrap();
        assert_eq!(cookies["sid"], "j");

        let cookies = parse_cookies(
            ".e.com\tTRUE\t/\tTRUE\t0\tsid\tn",
            CookieFormat::Unspecified,
        )
        .unwrap();
        assert_eq!(cookies["sid"], "n");

        let cookies = parse_cookies("sid=h", CookieFormat::Unspecified).unwrap();
        assert_eq!(cookies["sid"], "h");
    }

    #[test]
    fn test_autodetected_json_malformed_is_empty_not_error() {
        let cookies = parse_cookies("{broken", CookieFormat::Unspecified).unwrap();
        assert!(cookies.is_empty());
    }
}
