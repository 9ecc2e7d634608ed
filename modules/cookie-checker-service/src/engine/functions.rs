//! The function library: named pure transforms applied by FUNCTION blocks.
//!
//! Every entry has the signature `(input, param1, param2) -> Result<String>`.
//! Entries either succeed on all inputs or fail with a reason; none have side
//! effects. Dispatch is a registry keyed by function name, so adding a
//! function is a one-line registration.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use md5::Md5;
use once_cell::sync::Lazy;
use rand::Rng;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::collections::HashMap;

type HmacSha256 = Hmac<Sha256>;

type FunctionHandler = fn(&str, &str, &str) -> Result<String, String>;

static REGISTRY: Lazy<HashMap<&'static str, FunctionHandler>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, FunctionHandler> = HashMap::new();

    // Hashes: lowercase hex digest of the UTF-8 bytes of the input.
    m.insert("Hash-MD5", |input, _, _| {
        Ok(hex::encode(Md5::digest(input.as_bytes())))
    });
    m.insert("Hash-SHA1", |input, _, _| {
        Ok(hex::encode(Sha1::digest(input.as_bytes())))
    });
    m.insert("Hash-SHA256", |input, _, _| {
        Ok(hex::encode(Sha256::digest(input.as_bytes())))
    });
    m.insert("Hash-SHA384", |input, _, _| {
        Ok(hex::encode(Sha384::digest(input.as_bytes())))
    });
    m.insert("Hash-SHA512", |input, _, _| {
        Ok(hex::encode(Sha512::digest(input.as_bytes())))
    });
    m.insert("HMAC", hmac_sha256);

    // Encodings
    m.insert("Base64-Encode", |input, _, _| Ok(BASE64.encode(input)));
    m.insert("Base64-Decode", base64_decode);
    m.insert("URLEncode", |input, _, _| {
        Ok(urlencoding::encode(input).into_owned())
    });
    m.insert("URLDecode", url_decode);
    m.insert("HTMLEntityEncode", |input, _, _| Ok(html_entity_encode(input)));
    m.insert("HTMLEntityDecode", |input, _, _| Ok(html_entity_decode(input)));

    // String manipulation
    m.insert("Replace", |input, from, to| Ok(input.replace(from, to)));
    m.insert("Substring", substring);
    m.insert("CharAt", |input, index, _| char_at(input, index));
    m.insert("CountOccurrences", |input, needle, _| {
        Ok(input.matches(needle).count().to_string())
    });
    m.insert("Length", |input, _, _| Ok(input.len().to_string()));
    m.insert("Uppercase", |input, _, _| Ok(input.to_uppercase()));
    m.insert("Lowercase", |input, _, _| Ok(input.to_lowercase()));
    m.insert("Reverse", |input, _, _| Ok(input.chars().rev().collect()));
    m.insert("Trim", |input, _, _| Ok(input.trim().to_string()));

    // Random
    m.insert("RandomNum", random_num);
    m.insert("RandomString", random_string);

    // Time
    m.insert("CurrentUnixTime", |_, _, _| {
        Ok(Utc::now().timestamp().to_string())
    });
    m.insert("UnixTimeToDate", unix_time_to_date);
    m.insert("DateToUnixTime", date_to_unix_time);

    m
});

/// Look up and apply a library function.
pub fn execute_function(
    name: &str,
    input: &str,
    param1: &str,
    param2: &str,
) -> Result<String, String> {
    match REGISTRY.get(name) {
        Some(handler) => handler(input, param1, param2),
        None => Err(format!("unknown function: {}", name)),
    }
}

fn hmac_sha256(input: &str, key: &str, _: &str) -> Result<String, String> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| format!("hmac key error: {}", e))?;
    mac.update(input.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn base64_decode(input: &str, _: &str, _: &str) -> Result<String, String> {
    let bytes = BASE64
        .decode(input)
        .map_err(|e| format!("base64 decode error: {}", e))?;
    String::from_utf8(bytes).map_err(|_| "decoded bytes are not valid utf-8".to_string())
}

fn url_decode(input: &str, _: &str, _: &str) -> Result<String, String> {
    urlencoding::decode(input)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| format!("url decode error: {}", e))
}

/// Escape the five characters significant in HTML text and attributes.
/// The entity choices match what browsers and the services' own pages emit.
fn html_entity_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve named and numeric entities. Unrecognised or malformed entities are
/// left literal, so the function is total.
fn html_entity_decode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';') {
            Some(semi) => {
                let entity = &tail[1..semi];
                match decode_entity(entity) {
                    Some(c) => out.push_str(&c),
                    None => out.push_str(&tail[..=semi]),
                }
                rest = &tail[semi + 1..];
            }
            None => {
                out.push_str(tail);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<String> {
    match entity {
        "amp" => return Some("&".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "quot" => return Some("\"".to_string()),
        "apos" => return Some("'".to_string()),
        _ => {}
    }
    let digits = entity.strip_prefix('#')?;
    let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex_digits) => u32::from_str_radix(hex_digits, 16).ok()?,
        None => digits.parse::<u32>().ok()?,
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Byte-indexed substring. `start` is required; an empty `length` means the
/// suffix from `start`; `start + length` past the end clamps to the end.
fn substring(input: &str, start: &str, length: &str) -> Result<String, String> {
    let start: usize = start
        .parse()
        .map_err(|_| format!("invalid start index: {:?}", start))?;

    let bytes = input.as_bytes();
    if start >= bytes.len() {
        return Err("start index out of range".to_string());
    }

    let end = if length.is_empty() {
        bytes.len()
    } else {
        let length: usize = length
            .parse()
            .map_err(|_| format!("invalid length: {:?}", length))?;
        (start + length).min(bytes.len())
    };

    Ok(String::from_utf8_lossy(&bytes[start..end]).into_owned())
}

/// The single byte at `index`, as a character. Byte-indexed, not
/// codepoint-indexed.
fn char_at(input: &str, index: &str) -> Result<String, String> {
    let index: usize = index
        .parse()
        .map_err(|_| format!("invalid index: {:?}", index))?;

    match input.as_bytes().get(index) {
        Some(&b) => Ok((b as char).to_string()),
        None => Err("index out of range".to_string()),
    }
}

/// Inclusive integer in `[min, max]`; bounds are swapped when reversed.
fn random_num(_: &str, min: &str, max: &str) -> Result<String, String> {
    let min: i64 = min
        .parse()
        .map_err(|_| format!("invalid minimum: {:?}", min))?;
    let max: i64 = max
        .parse()
        .map_err(|_| format!("invalid maximum: {:?}", max))?;

    let (min, max) = if min > max { (max, min) } else { (min, max) };
    Ok(rand::thread_rng().gen_range(min..=max).to_string())
}

const ALNUM: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn random_string(_: &str, length: &str, _: &str) -> Result<String, String> {
    let length: usize = length
        .parse()
        .map_err(|_| format!("invalid length: {:?}", length))?;

    let mut rng = rand::thread_rng();
    Ok((0..length)
        .map(|_| ALNUM[rng.gen_range(0..ALNUM.len())] as char)
        .collect())
}

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn unix_time_to_date(input: &str, _: &str, _: &str) -> Result<String, String> {
    let ts: i64 = input
        .parse()
        .map_err(|_| format!("invalid unix timestamp: {:?}", input))?;

    let datetime = Utc
        .timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| format!("timestamp out of range: {}", ts))?;
    Ok(datetime.format(DATE_TIME_FORMAT).to_string())
}

/// Parse a date in one of the accepted formats and return Unix seconds.
/// Naive formats are interpreted as UTC.
fn date_to_unix_time(input: &str, _: &str, _: &str) -> Result<String, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, DATE_TIME_FORMAT) {
        return Ok(dt.and_utc().timestamp().to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp().to_string());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%m/%d/%Y") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp().to_string());
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.timestamp().to_string());
    }
    Err(format!("unable to parse date: {}", input))
}
