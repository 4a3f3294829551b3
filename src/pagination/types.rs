//! Pagination types and traits
//!
//! Defines the page and continuation abstractions shared by the reader and
//! every continuation strategy.

use crate::error::Result;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// Default query parameter carrying the page-size hint
pub const DEFAULT_PAGE_SIZE_PARAM: &str = "$top";

/// Where the server left the way to the next page
///
/// The token is opaque: it is never rebuilt from its parts. It is held as
/// a parsed [`Url`], so characters a URL may not carry raw (spaces, `'` or
/// `"` in a `$skiptoken`) are percent-encoded once when the reference is
/// taken in. Already-encoded references pass through byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Continuation {
    /// The collection is exhausted
    #[default]
    NoMore,
    /// Request target of the next page
    Token(Url),
}

impl Continuation {
    /// Check if another page can be requested
    pub fn has_more(&self) -> bool {
        matches!(self, Self::Token(_))
    }

    /// Borrow the next request target, if any
    pub fn token(&self) -> Option<&Url> {
        match self {
            Self::Token(url) => Some(url),
            Self::NoMore => None,
        }
    }
}

/// One response unit: items in server order plus the way forward
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items of this page, in server order
    pub items: Vec<T>,
    /// Continuation extracted from the response
    pub continuation: Continuation,
}

impl<T> Page<T> {
    /// Create a page
    pub fn new(items: Vec<T>, continuation: Continuation) -> Self {
        Self {
            items,
            continuation,
        }
    }

    /// The well-formed empty last page
    pub fn terminal() -> Self {
        Self::new(Vec::new(), Continuation::NoMore)
    }

    /// Number of items in the page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the page has no items
    ///
    /// An empty page may still carry a continuation.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Check if this is the last page of the collection
    pub fn is_last(&self) -> bool {
        !self.continuation.has_more()
    }
}

/// Which response shape carries the continuation
///
/// A reader is bound to exactly one shape; the two are never mixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContinuationShape {
    /// `Link` response header, body is a bare JSON array of items
    LinkHeader {
        /// Relation to follow
        #[serde(default = "default_rel")]
        rel: String,
    },
    /// Field in a wrapped JSON body: `{"results": [...], "nextLink": "..."}`
    BodyField {
        /// Field holding the items array
        #[serde(default = "default_results_field")]
        results: String,
        /// Field holding the next request target
        #[serde(default = "default_next_link_field")]
        next_link: String,
    },
}

impl Default for ContinuationShape {
    fn default() -> Self {
        Self::link_header()
    }
}

impl ContinuationShape {
    /// Link header shape following `rel=next`
    pub fn link_header() -> Self {
        Self::LinkHeader { rel: default_rel() }
    }

    /// Wrapped body shape with `results` and `nextLink`
    pub fn body_field() -> Self {
        Self::BodyField {
            results: default_results_field(),
            next_link: default_next_link_field(),
        }
    }
}

fn default_rel() -> String {
    "next".to_string()
}

fn default_results_field() -> String {
    "results".to_string()
}

fn default_next_link_field() -> String {
    "nextLink".to_string()
}

/// What the server is assumed to do when a continuation it already
/// considers exhausted is followed again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaleReferencePolicy {
    /// Server answers 2xx with an empty page; any other status is an error
    #[default]
    ExpectEmptyPage,
    /// 404 or 410 on a continuation request reads as the empty last page
    NotFoundIsEmpty,
}

impl StaleReferencePolicy {
    /// Check if a continuation request failing with `status` ends the cursor
    pub fn treats_as_exhausted(self, status: u16) -> bool {
        match self {
            Self::ExpectEmptyPage => false,
            Self::NotFoundIsEmpty => matches!(status, 404 | 410),
        }
    }
}

/// Splits a decoded response into items and continuation
pub trait ContinuationStrategy: Send + Sync + std::fmt::Debug {
    /// Extract the continuation from a response received from `url`
    ///
    /// Relative references resolve against `url`.
    fn continuation(&self, url: &Url, headers: &HeaderMap, body: &Value) -> Result<Continuation>;

    /// Extract the items array from a collection response body
    fn items(&self, url: &Url, body: Value) -> Result<Vec<Value>>;
}
