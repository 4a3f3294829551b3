//! Continuation strategy implementations
//!
//! Each strategy handles one response shape.

use super::types::{Continuation, ContinuationShape, ContinuationStrategy};
use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, LINK};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Build the strategy for a configured shape
pub fn strategy_for(shape: &ContinuationShape) -> Arc<dyn ContinuationStrategy> {
    match shape {
        ContinuationShape::LinkHeader { rel } => Arc::new(LinkHeaderStrategy::new(rel.clone())),
        ContinuationShape::BodyField { results, next_link } => {
            Arc::new(BodyFieldStrategy::new(results.clone(), next_link.clone()))
        }
    }
}

/// Resolve a raw reference against the URL of the response carrying it
fn resolve(base: &Url, raw: &str) -> Result<Continuation> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::protocol(base.as_str(), "continuation reference is empty"));
    }
    base.join(raw).map(Continuation::Token).map_err(|e| {
        Error::protocol(
            base.as_str(),
            format!("continuation reference '{raw}' is not a usable URL: {e}"),
        )
    })
}

// ============================================================================
// Link Header
// ============================================================================

/// Link header continuation
///
/// Accepts the bare form `https://svc/tables/person?$skip=10; rel=next` as
/// well as RFC 8288 lists such as `<...?page=2>; rel="next", <...>; rel="prev"`.
/// The relation annotation is stripped. A link naming the relation wins;
/// otherwise the first entry without any `rel` counts as the continuation.
#[derive(Debug, Clone)]
pub struct LinkHeaderStrategy {
    /// Relation to follow
    pub rel: String,
}

impl Default for LinkHeaderStrategy {
    fn default() -> Self {
        Self {
            rel: "next".to_string(),
        }
    }
}

impl LinkHeaderStrategy {
    /// Create a link header strategy following `rel`
    pub fn new(rel: impl Into<String>) -> Self {
        Self { rel: rel.into() }
    }
}

impl ContinuationStrategy for LinkHeaderStrategy {
    fn continuation(&self, url: &Url, headers: &HeaderMap, _body: &Value) -> Result<Continuation> {
        let values = headers
            .get_all(LINK)
            .iter()
            .map(|value| value.to_str())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::protocol(url.as_str(), "Link header is not valid visible ASCII"))?;

        let target = select_link(values, &self.rel)
            .map_err(|message| Error::protocol(url.as_str(), message))?;
        match target {
            Some(target) => resolve(url, target),
            None => Ok(Continuation::NoMore),
        }
    }

    fn items(&self, url: &Url, body: Value) -> Result<Vec<Value>> {
        match body {
            Value::Array(items) => Ok(items),
            other => Err(Error::protocol(
                url.as_str(),
                format!("expected a JSON array of items, got {}", type_name(&other)),
            )),
        }
    }
}

/// Find the URI to follow in one Link header value
///
/// Returns `Ok(None)` when every link names a different relation.
pub(crate) fn parse_link_header<'a>(
    header: &'a str,
    target_rel: &str,
) -> std::result::Result<Option<&'a str>, String> {
    select_link([header], target_rel)
}

/// Pick the link whose `rel` matches across all header values, falling back
/// to the first entry that has no `rel` at all
fn select_link<'a>(
    values: impl IntoIterator<Item = &'a str>,
    target_rel: &str,
) -> std::result::Result<Option<&'a str>, String> {
    let mut unlabeled = None;

    for value in values {
        for entry in split_links(value) {
            let (target, params) = split_target(entry)?;

            let mut rels = params
                .split(';')
                .filter_map(|param| {
                    let (key, value) = param.split_once('=')?;
                    key.trim()
                        .eq_ignore_ascii_case("rel")
                        .then(|| value.trim().trim_matches('"').trim_matches('\''))
                })
                .peekable();

            if rels.peek().is_none() {
                unlabeled.get_or_insert(target);
                continue;
            }

            if rels.any(|rel| {
                rel.split_ascii_whitespace()
                    .any(|r| r.eq_ignore_ascii_case(target_rel))
            }) {
                return Ok(Some(target));
            }
        }
    }

    Ok(unlabeled)
}

/// Split a header into link entries
///
/// Bracketed lists split on commas outside `<...>`. A bare URI is a single
/// entry, since its query may legitimately contain commas.
fn split_links(header: &str) -> Vec<&str> {
    let trimmed = header.trim();
    if !trimmed.starts_with('<') {
        return vec![trimmed];
    }

    let mut entries = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in trimmed.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(trimmed[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(trimmed[start..].trim());
    entries.retain(|e| !e.is_empty());
    entries
}

/// Separate the URI of an entry from its parameters
fn split_target(entry: &str) -> std::result::Result<(&str, &str), String> {
    if let Some(rest) = entry.strip_prefix('<') {
        let close = rest
            .find('>')
            .ok_or_else(|| format!("unterminated '<' in Link header entry '{entry}'"))?;
        return Ok((&rest[..close], &rest[close + 1..]));
    }

    match entry.find(';') {
        Some(i) => Ok((&entry[..i], &entry[i..])),
        None => Ok((entry, "")),
    }
}

// ============================================================================
// Body Field
// ============================================================================

/// Wrapped body continuation
///
/// The body is an object holding the items array under `results` and the
/// next request target under `next_link`. A missing or `null` link ends the
/// collection.
#[derive(Debug, Clone)]
pub struct BodyFieldStrategy {
    /// Field holding the items array
    pub results: String,
    /// Field holding the next request target
    pub next_link: String,
}

impl BodyFieldStrategy {
    /// Create a body field strategy
    pub fn new(results: impl Into<String>, next_link: impl Into<String>) -> Self {
        Self {
            results: results.into(),
            next_link: next_link.into(),
        }
    }
}

impl ContinuationStrategy for BodyFieldStrategy {
    fn continuation(&self, url: &Url, _headers: &HeaderMap, body: &Value) -> Result<Continuation> {
        let Value::Object(map) = body else {
            return Err(Error::protocol(
                url.as_str(),
                format!("expected a JSON object, got {}", type_name(body)),
            ));
        };

        match map.get(&self.next_link) {
            None | Some(Value::Null) => Ok(Continuation::NoMore),
            Some(Value::String(link)) => resolve(url, link),
            Some(other) => Err(Error::protocol(
                url.as_str(),
                format!(
                    "field '{}' must be a string, got {}",
                    self.next_link,
                    type_name(other)
                ),
            )),
        }
    }

    fn items(&self, url: &Url, body: Value) -> Result<Vec<Value>> {
        let Value::Object(mut map) = body else {
            return Err(Error::protocol(url.as_str(), "expected a wrapped JSON object"));
        };

        match map.remove(&self.results) {
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(Error::protocol(
                url.as_str(),
                format!(
                    "field '{}' must be an array, got {}",
                    self.results,
                    type_name(&other)
                ),
            )),
            None => Err(Error::protocol(
                url.as_str(),
                format!("missing '{}' array", self.results),
            )),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
