//! Service configuration types: the DSL a service workflow is written in.
//!
//! Configs are JSON documents. Each block carries only the fields of its
//! `type` tag; a block missing a required field is refused at load time.
//! Open string fields (cookie format, comparer names) stay tolerant: an
//! unrecognised value degrades rather than failing the load.

use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

/// A loaded service definition, immutable for the lifetime of a check.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    /// Default request target. Informational; blocks carry their own URLs.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    /// Declared cookie wire format; see [`ServiceConfig::cookie_format`].
    #[serde(default)]
    pub cookie_format: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Keyword lists for integrations; the executor does not consume them.
    #[serde(default)]
    pub success_keywords: Vec<String>,
    #[serde(default)]
    pub failure_keywords: Vec<String>,
    #[serde(default)]
    pub retry_keywords: Vec<String>,
    /// Requires the external browser-driven checker.
    #[serde(default)]
    pub needs_stealth: bool,
    #[serde(default)]
    pub use_selenium: bool,
    #[serde(default)]
    pub browser_mode: String,
    #[serde(default)]
    pub use_proxy: bool,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    30
}

impl ServiceConfig {
    /// The declared cookie format; anything unrecognised autodetects.
    pub fn cookie_format(&self) -> CookieFormat {
        match self.cookie_format.as_str() {
            "json" => CookieFormat::Json,
            "netscape" => CookieFormat::Netscape,
            "header" => CookieFormat::Header,
            _ => CookieFormat::Unspecified,
        }
    }

    /// Whether this config delegates to the external browser-driven checker.
    pub fn wants_browser(&self) -> bool {
        self.needs_stealth || self.use_selenium || !self.browser_mode.is_empty()
    }
}

/// Wire format of the raw cookie payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CookieFormat {
    Json,
    Netscape,
    Header,
    /// Not declared; the parser autodetects.
    #[default]
    Unspecified,
}

/// One step of a service workflow, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    /// Dispatch an HTTP request; optionally store the body under `save_response`.
    #[serde(rename = "REQUEST")]
    Request {
        url: String,
        method: String,
        #[serde(default)]
        headers: HashMap<String, String>,
        #[serde(default)]
        body: String,
        #[serde(default)]
        save_response: String,
    },

    /// Extract values from a stored response into the capture map.
    #[serde(rename = "PARSE")]
    Parse {
        /// Name of a response stored by an earlier REQUEST block.
        #[serde(default)]
        source: String,
        parse_type: ParseType,
        /// json/regex modes: capture name → path or pattern.
        #[serde(default)]
        captures: HashMap<String, String>,
        // lr mode fields
        #[serde(default)]
        left: String,
        #[serde(default)]
        right: String,
        #[serde(default)]
        capture_name: String,
        /// lr mode: extract every occurrence, joined by newline.
        #[serde(default)]
        recursive: bool,
        #[serde(default)]
        case_sensitive: bool,
    },

    /// Terminal predicate deciding the check outcome.
    #[serde(rename = "KEYCHECK", alias = "KEY CHECK")]
    KeyCheck {
        #[serde(default)]
        conditions: Vec<Condition>,
        #[serde(default)]
        logic: KeyCheckLogic,
        #[serde(default = "default_success")]
        success: String,
        #[serde(default = "default_failure")]
        failure: String,
    },

    /// Apply a function-library transform; bind the result under `save_as`.
    #[serde(rename = "FUNCTION")]
    Function {
        function: String,
        #[serde(default)]
        input: String,
        #[serde(default)]
        param1: String,
        #[serde(default)]
        param2: String,
        save_as: String,
    },
}

fn default_success() -> String {
    "HIT".to_string()
}

fn default_failure() -> String {
    "FAIL".to_string()
}

/// Extraction mode of a PARSE block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseType {
    Json,
    Regex,
    Lr,
}

/// Boolean combinator for a KEYCHECK block's conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum KeyCheckLogic {
    #[default]
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

/// One comparator clause of a KEYCHECK block.
///
/// Older configs name the comparer field `condition`; both spellings
/// deserialize and [`Condition::comparer`] normalises to one enum.
#[derive(Debug, Clone, Deserialize)]
pub struct Condition {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub comparer: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub right: String,
}

impl Condition {
    /// The effective comparer, preferring `comparer` over the legacy
    /// `condition` field. Absent, empty, or unrecognised names never match.
    pub fn comparer(&self) -> Comparer {
        nonempty(&self.comparer)
            .or_else(|| nonempty(&self.condition))
            .and_then(|name| Comparer::from_str(name).ok())
            .unwrap_or(Comparer::Unknown)
    }
}

fn nonempty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

/// Comparator vocabulary. Each accepts a camelCase and an UPPER_SNAKE
/// spelling on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparer {
    /// Left is non-empty and not the `<nil>` marker.
    Exists,
    DoesNotExist,
    /// Byte equality.
    EqualTo,
    NotEqualTo,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    /// Integer comparison; false when either side is not an integer.
    GreaterThan,
    LessThan,
    /// Right side compiled as a regex and matched against the left.
    MatchesRegex,
    /// Byte-length comparison: `len(left) >= len(right)`.
    Length,
    /// Tolerated on input; evaluates to false.
    Unknown,
}

impl FromStr for Comparer {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Exists" | "EXISTS" => Comparer::Exists,
            "DoesNotExist" | "NOT_EXISTS" => Comparer::DoesNotExist,
            "EqualTo" | "EQUALS" => Comparer::EqualTo,
            "NotEqualTo" | "NOT_EQUALS" => Comparer::NotEqualTo,
            "Contains" | "CONTAINS" => Comparer::Contains,
            "NotContains" | "NOT_CONTAINS" => Comparer::NotContains,
            "StartsWith" | "STARTS_WITH" => Comparer::StartsWith,
            "EndsWith" | "ENDS_WITH" => Comparer::EndsWith,
            "GreaterThan" | "GREATER_THAN" => Comparer::GreaterThan,
            "LessThan" | "LESS_THAN" => Comparer::LessThan,
            "MatchesRegex" | "REGEX" => Comparer::MatchesRegex,
            "LENGTH" => Comparer::Length,
            _ => return Err(()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_config() {
        let config: ServiceConfig = serde_json::from_value(json!({
            "name": "ExampleShop",
            "author": "config-author",
            "version": "1.2",
            "url": "https://shop.example",
            "method": "GET",
            "cookie_format": "header",
            "timeout": 15,
            "success_keywords": ["welcome"],
            "blocks": [
                {
                    "type": "REQUEST",
                    "url": "https://shop.example/account",
                    "method": "GET",
                    "headers": {"Cookie": "<COOKIES_RAW>"},
                    "save_response": "account"
                },
                {
                    "type": "PARSE",
                    "source": "account",
                    "parse_type": "json",
                    "captures": {"email": "$.user.email"}
                },
                {
                    "type": "FUNCTION",
                    "function": "Hash-SHA256",
                    "input": "<email>",
                    "save_as": "email_hash"
                },
                {
                    "type": "KEYCHECK",
                    "logic": "AND",
                    "conditions": [
                        {"left": "<email>", "comparer": "Exists", "right": ""}
                    ],
                    "success": "HIT",
                    "failure": "FAIL"
                }
            ]
        }))
        .unwrap();

        assert_eq!(config.name, "ExampleShop");
        assert_eq!(config.cookie_format(), CookieFormat::Header);
        assert_eq!(config.timeout, 15);
        assert_eq!(config.blocks.len(), 4);
        assert!(!config.wants_browser());

        match &config.blocks[0] {
            Block::Request { url, headers, .. } => {
                assert_eq!(url, "https://shop.example/account");
                assert_eq!(headers["Cookie"], "<COOKIES_RAW>");
            }
            other => panic!("expected REQUEST, got {:?}", other),
        }
        match &config.blocks[1] {
            Block::Parse { parse_type, captures, .. } => {
                assert_eq!(*parse_type, ParseType::Json);
                assert_eq!(captures["email"], "$.user.email");
            }
            other => panic!("expected PARSE, got {:?}", other),
        }
    }

    #[test]
    fn test_defaults() {
        let config: ServiceConfig =
            serde_json::from_value(json!({"name": "Minimal"})).unwrap();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.cookie_format(), CookieFormat::Unspecified);
        assert!(config.blocks.is_empty());
    }

    #[test]
    fn test_unrecognised_cookie_format_autodetects() {
        let config: ServiceConfig =
            serde_json::from_value(json!({"name": "X", "cookie_format": "JSON"})).unwrap();
        assert_eq!(config.cookie_format(), CookieFormat::Unspecified);
    }

    #[test]
    fn test_key_check_space_alias() {
        let block: Block = serde_json::from_value(json!({
            "type": "KEY CHECK",
            "conditions": []
        }))
        .unwrap();
        match block {
            Block::KeyCheck { logic, success, failure, .. } => {
                assert_eq!(logic, KeyCheckLogic::And);
                assert_eq!(success, "HIT");
                assert_eq!(failure, "FAIL");
            }
            other => panic!("expected KEYCHECK, got {:?}", other),
        }
    }

    #[test]
    fn test_request_missing_url_is_refused() {
        let result: Result<Block, _> = serde_json::from_value(json!({
            "type": "REQUEST",
            "method": "GET"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_comparer_aliases() {
        assert_eq!(Comparer::from_str("EQUALS"), Ok(Comparer::EqualTo));
        assert_eq!(Comparer::from_str("EqualTo"), Ok(Comparer::EqualTo));
        assert_eq!(Comparer::from_str("LENGTH"), Ok(Comparer::Length));
        assert_eq!(Comparer::from_str("NOT_CONTAINS"), Ok(Comparer::NotContains));
        assert!(Comparer::from_str("FuzzyMatch").is_err());
    }

    #[test]
    fn test_unknown_comparer_tolerated() {
        let cond: Condition = serde_json::from_value(json!({
            "left": "a",
            "comparer": "FuzzyMatch",
            "right": "b"
        }))
        .unwrap();
        assert_eq!(cond.comparer(), Comparer::Unknown);

        let cond: Condition =
            serde_json::from_value(json!({"left": "a", "right": "b"})).unwrap();
        assert_eq!(cond.comparer(), Comparer::Unknown);
    }

    #[test]
    fn test_legacy_condition_field() {
        let cond: Condition = serde_json::from_value(json!({
            "left": "a",
            "condition": "CONTAINS",
            "right": "b"
        }))
        .unwrap();
        assert_eq!(cond.comparer(), Comparer::Contains);

        // The new field wins when both are present.
        let cond: Condition = serde_json::from_value(json!({
            "left": "a",
            "condition": "CONTAINS",
            "comparer": "EQUALS",
            "right": "b"
        }))
        .unwrap();
        assert_eq!(cond.comparer(), Comparer::EqualTo);

        // An empty comparer string falls back to the legacy field.
        let cond: Condition = serde_json::from_value(json!({
            "left": "a",
            "condition": "CONTAINS",
            "comparer": "",
            "right": "b"
        }))
        .unwrap();
        assert_eq!(cond.comparer(), Comparer::Contains);
    }

    #[test]
    fn test_browser_configs_delegate() {
        let config: ServiceConfig =
            serde_json::from_value(json!({"name": "A", "needs_stealth": true})).unwrap();
        assert!(config.wants_browser());
        let config: ServiceConfig =
            serde_json::from_value(json!({"name": "B", "browser_mode": "chromium"})).unwrap();
        assert!(config.wants_browser());
    }
}
