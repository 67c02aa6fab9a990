//! Lenient decoding of the evaluator's JSON reply.
//!
//! Models wrap JSON in markdown fences and prose despite instructions, so the
//! reply is first cut down to the outermost object candidate. Individual
//! finding items that fail to decode are dropped with a warning rather than
//! failing the whole audit; only a reply with no decodable JSON at all is an
//! error.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use super::report::{CompliantRule, Issue};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to parse AI evaluation response")]
    MalformedEvaluation,
}

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").unwrap());

/// Structured findings recovered from a raw model reply. Field content is
/// whatever the model produced; corpus validation happens later.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvaluation {
    pub project_name: String,
    pub issues: Vec<Issue>,
    pub compliant_rules: Vec<CompliantRule>,
    pub summary: String,
}

/// Decode a model reply into findings.
pub fn parse_evaluation(raw: &str) -> Result<ParsedEvaluation, ParseError> {
    let candidate = isolate_object(raw);
    let mut root: Value = serde_json::from_str(candidate).map_err(|err| {
        let head: String = raw.chars().take(500).collect();
        tracing::error!(error = %err, reply_head = %head, "Evaluation reply is not decodable JSON");
        ParseError::MalformedEvaluation
    })?;

    let issues = decode_items(take_array(&mut root, "issues"), "issues");
    let compliant_rules = decode_items(take_array(&mut root, "compliantRules"), "compliantRules");

    Ok(ParsedEvaluation {
        project_name: take_string(&mut root, "projectName"),
        issues,
        compliant_rules,
        summary: take_string(&mut root, "summary"),
    })
}

/// Cut the reply down to the outermost JSON object candidate: prefer fenced
/// content, then slice from the first `{` to the last `}` when both exist.
fn isolate_object(raw: &str) -> &str {
    let candidate = match FENCE_RE.captures(raw) {
        Some(caps) => caps.get(1).map_or(raw, |m| m.as_str()),
        None => raw,
    };
    match (candidate.find('{'), candidate.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &candidate[start..=end],
        _ => candidate,
    }
}

fn take_string(root: &mut Value, field: &str) -> String {
    match root.get_mut(field).map(Value::take) {
        Some(Value::String(text)) => text,
        _ => String::new(),
    }
}

fn take_array(root: &mut Value, field: &str) -> Vec<Value> {
    match root.get_mut(field).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Decode array items one by one, dropping whatever does not fit the target
/// shape.
fn decode_items<T: DeserializeOwned>(items: Vec<Value>, field: &'static str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    let dropped = total - decoded.len();
    if dropped > 0 {
        tracing::warn!(
            field,
            dropped,
            kept = decoded.len(),
            "Dropped evaluation items that did not decode"
        );
    }
    decoded
}
