//! KEYCHECK evaluation: the terminal predicate deciding a check's outcome.

use super::config::{Comparer, Condition, KeyCheckLogic};
use super::parse::NIL;
use super::substitute::replace_variables;
use regex::Regex;
use std::collections::HashMap;

/// Evaluate the conditions under the given logic and return the block's
/// success or failure label.
///
/// Evaluation short-circuits: AND returns the failure label at the first
/// false condition, OR returns the success label at the first true one.
/// An empty condition list is vacuously true under AND and false under OR.
pub fn evaluate_key_check(
    conditions: &[Condition],
    logic: KeyCheckLogic,
    success: &str,
    failure: &str,
    captures: &HashMap<String, String>,
) -> String {
    for condition in conditions {
        let left = replace_variables(&condition.left, None, captures);
        let right = replace_variables(&condition.right, None, captures);
        let passed = condition.comparer().evaluate(&left, &right);

        match logic {
            KeyCheckLogic::And => {
                if !passed {
                    return failure.to_string();
                }
            }
            KeyCheckLogic::Or => {
                if passed {
                    return success.to_string();
                }
            }
        }
    }

    match logic {
        KeyCheckLogic::And => success.to_string(),
        KeyCheckLogic::Or => failure.to_string(),
    }
}

impl Comparer {
    /// Apply this comparer to already-substituted operands.
    pub fn evaluate(&self, left: &str, right: &str) -> bool {
        match self {
            Comparer::Exists => !left.is_empty() && left != NIL,
            Comparer::DoesNotExist => left.is_empty() || left == NIL,
            Comparer::EqualTo => left == right,
            Comparer::NotEqualTo => left != right,
            Comparer::Contains => left.contains(right),
            Comparer::NotContains => !left.contains(right),
            Comparer::StartsWith => left.starts_with(right),
            Comparer::EndsWith => left.ends_with(right),
            Comparer::GreaterThan => match (left.parse::<i64>(), right.parse::<i64>()) {
                (Ok(l), Ok(r)) => l > r,
                _ => false,
            },
            Comparer::LessThan => match (left.parse::<i64>(), right.parse::<i64>()) {
                (Ok(l), Ok(r)) => l < r,
                _ => false,
            },
            // A pattern that fails to compile is a non-match, not a fatal error.
            Comparer::MatchesRegex => Regex::new(right)
                .map(|re| re.is_match(left))
                .unwrap_or(false),
            Comparer::Length => left.len() >= right.len(),
            Comparer::Unknown => false,
        }
    }
}
