//! Cursor-paginated collection reader
//!
//! `PageReader::open` issues the first bounded request, `Cursor::next`
//! follows continuations one page at a time, and `PageReader::drain`
//! flattens the whole walk into a single-pass item stream.

use super::strategies::strategy_for;
use super::types::{
    Continuation, ContinuationShape, ContinuationStrategy, Page, StaleReferencePolicy,
    DEFAULT_PAGE_SIZE_PARAM,
};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Reads paginated collections through one continuation shape
#[derive(Debug, Clone)]
pub struct PageReader {
    http: HttpClient,
    strategy: Arc<dyn ContinuationStrategy>,
    page_size_param: String,
    stale_policy: StaleReferencePolicy,
}

impl PageReader {
    /// Create a reader for the given continuation shape
    pub fn new(http: HttpClient, shape: &ContinuationShape) -> Self {
        Self::with_strategy(http, strategy_for(shape))
    }

    /// Create a reader with a custom continuation strategy
    pub fn with_strategy(http: HttpClient, strategy: Arc<dyn ContinuationStrategy>) -> Self {
        Self {
            http,
            strategy,
            page_size_param: DEFAULT_PAGE_SIZE_PARAM.to_string(),
            stale_policy: StaleReferencePolicy::default(),
        }
    }

    /// Set the query parameter carrying the page-size hint
    #[must_use]
    pub fn page_size_param(mut self, param: impl Into<String>) -> Self {
        self.page_size_param = param.into();
        self
    }

    /// Set the assumption about stale continuation references
    #[must_use]
    pub fn stale_policy(mut self, policy: StaleReferencePolicy) -> Self {
        self.stale_policy = policy;
        self
    }

    /// The underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Request the first page of `endpoint` and return a cursor over it
    ///
    /// The hint is advisory; the server picks the actual page size.
    pub async fn open<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page_size_hint: u32,
    ) -> Result<Cursor<T>> {
        let request =
            RequestConfig::new().query(&self.page_size_param, page_size_hint.to_string());
        let response = self.http.get_with_config(endpoint, request).await?;
        let page = self.decode_page::<T>(response).await?;

        debug!(
            "Opened cursor on {}: {} items, more={}",
            endpoint,
            page.len(),
            page.continuation.has_more()
        );

        Ok(Cursor {
            reader: self.clone(),
            continuation: page.continuation.clone(),
            pending: Some(page),
            round_trips: 1,
            items_received: 0,
            poisoned: None,
        })
    }

    /// Pick up a walk from a continuation saved earlier
    ///
    /// No request is made until `next` is called.
    pub fn resume<T>(&self, token: Url) -> Cursor<T> {
        Cursor {
            reader: self.clone(),
            continuation: Continuation::Token(token),
            pending: None,
            round_trips: 0,
            items_received: 0,
            poisoned: None,
        }
    }

    /// Stream every item of `endpoint` in server order
    ///
    /// Nothing is requested until the stream is first polled. The stream is
    /// single-pass; dropping it abandons the walk.
    pub fn drain<T>(&self, endpoint: &str, page_size_hint: u32) -> impl Stream<Item = Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let reader = self.clone();
        let endpoint = endpoint.to_string();
        stream::once(async move { reader.open::<T>(&endpoint, page_size_hint).await })
            .map_ok(Cursor::into_items)
            .try_flatten()
    }

    /// Fetch one resource that must not be paginated
    pub async fn lookup<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.http.get(url).await?;
        let (url, headers, body) = read_json(response).await?;

        if let Continuation::Token(next) = self.strategy.continuation(&url, &headers, &body)? {
            return Err(Error::protocol(
                url.as_str(),
                format!("point lookup returned a continuation to {next}"),
            ));
        }
        if !body.is_object() {
            return Err(Error::protocol(
                url.as_str(),
                "point lookup must return a single JSON object",
            ));
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Follow a continuation reference exactly as supplied
    async fn follow<T: DeserializeOwned>(&self, target: &Url) -> Result<Page<T>> {
        match self.http.get(target.as_str()).await {
            Ok(response) => self.decode_page(response).await,
            Err(Error::Transport { status, .. })
                if self.stale_policy.treats_as_exhausted(status) =>
            {
                debug!("Continuation {} answered {}, treating as exhausted", target, status);
                Ok(Page::terminal())
            }
            Err(e) => Err(e),
        }
    }

    async fn decode_page<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<Page<T>> {
        let (url, headers, body) = read_json(response).await?;
        let continuation = self.strategy.continuation(&url, &headers, &body)?;
        let items = self
            .strategy
            .items(&url, body)?
            .into_iter()
            .enumerate()
            .map(|(i, item)| {
                serde_json::from_value(item).map_err(|e| {
                    Error::protocol(
                        url.as_str(),
                        format!("item {i} has an unexpected shape: {e}"),
                    )
                })
            })
            .collect::<Result<Vec<T>>>()?;

        Ok(Page::new(items, continuation))
    }
}

/// Read a response body as JSON, keeping the final URL and headers
async fn read_json(response: reqwest::Response) -> Result<(Url, HeaderMap, Value)> {
    let url = response.url().clone();
    let headers = response.headers().clone();
    let text = response.text().await?;
    let body = serde_json::from_str(&text)
        .map_err(|e| Error::protocol(url.as_str(), format!("response body is not JSON: {e}")))?;
    Ok((url, headers, body))
}

/// Position in a paginated collection
///
/// Owns its continuation exclusively. Pages are requested strictly one
/// after another, each from the continuation of the previous response.
#[derive(Debug)]
pub struct Cursor<T> {
    reader: PageReader,
    continuation: Continuation,
    pending: Option<Page<T>>,
    round_trips: u32,
    items_received: u64,
    poisoned: Option<String>,
}

impl<T: DeserializeOwned> Cursor<T> {
    /// Return the next page, or `None` once the collection is exhausted
    ///
    /// A page with zero items but a continuation is returned as-is and the
    /// walk goes on. A page with no continuation is the last one, even if
    /// it is empty. On a transport error the continuation is kept, so
    /// calling `next` again retries the same page.
    pub async fn next(&mut self) -> Result<Option<Page<T>>> {
        if let Some(url) = &self.poisoned {
            return Err(Error::protocol(
                url.as_str(),
                "cursor is unusable after a malformed continuation",
            ));
        }

        if let Some(page) = self.pending.take() {
            self.items_received += page.len() as u64;
            return Ok(Some(page));
        }

        let Some(target) = self.continuation.token().cloned() else {
            return Ok(None);
        };

        self.round_trips += 1;
        let page = match self.reader.follow::<T>(&target).await {
            Ok(page) => page,
            Err(e) => {
                if e.is_protocol() {
                    self.poisoned = Some(target.to_string());
                    self.continuation = Continuation::NoMore;
                }
                return Err(e);
            }
        };

        debug!(
            "Page {} from {}: {} items, more={}",
            self.round_trips,
            target,
            page.len(),
            page.continuation.has_more()
        );

        self.continuation = page.continuation.clone();
        self.items_received += page.len() as u64;
        Ok(Some(page))
    }

    /// Flatten the remaining pages into an item stream
    pub fn into_items(self) -> impl Stream<Item = Result<T>>
    where
        T: Send + 'static,
    {
        stream::try_unfold(self, |mut cursor| async move {
            let page = cursor.next().await?;
            Ok::<_, Error>(page.map(|page| (page, cursor)))
        })
        .map_ok(|page| stream::iter(page.items.into_iter().map(Ok::<T, Error>)))
        .try_flatten()
    }
}

impl<T> Cursor<T> {
    /// Requests issued so far, including the one made by `open`
    pub fn round_trips(&self) -> u32 {
        self.round_trips
    }

    /// Items handed out so far
    pub fn items_received(&self) -> u64 {
        self.items_received
    }

    /// The continuation that the next request will follow
    pub fn continuation(&self) -> &Continuation {
        &self.continuation
    }

    /// Check if no further page will be returned
    pub fn is_exhausted(&self) -> bool {
        self.pending.is_none() && !self.continuation.has_more()
    }
}
