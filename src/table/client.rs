//! Table client built on the page reader

use crate::error::{Error, Result, ResultExt};
use crate::pagination::{Cursor, PageReader};
use futures::Stream;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

/// Client for a single table of a service
#[derive(Debug, Clone)]
pub struct TableClient {
    reader: PageReader,
    endpoint: Url,
}

impl TableClient {
    /// Create a client for `<service_url>/tables/<table>`
    pub fn new(reader: PageReader, service_url: &str, table: &str) -> Result<Self> {
        if table.trim().is_empty() {
            return Err(Error::config("table name must not be empty"));
        }

        let mut endpoint = Url::parse(service_url)?;
        endpoint
            .path_segments_mut()
            .map_err(|()| Error::config(format!("service URL '{service_url}' cannot be a base")))?
            .pop_if_empty()
            .push("tables")
            .push(table);

        Ok(Self { reader, endpoint })
    }

    /// Collection endpoint of the table
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL of a single item; the id is encoded as one path segment
    pub fn item_url(&self, id: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(id);
        }
        url
    }

    /// Open a cursor on the first page
    pub async fn pages<T: DeserializeOwned>(&self, page_size: u32) -> Result<Cursor<T>> {
        self.reader.open(self.endpoint.as_str(), page_size).await
    }

    /// Stream every item of the table in server order
    pub fn read<T>(&self, page_size: u32) -> impl Stream<Item = Result<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.reader.drain(self.endpoint.as_str(), page_size)
    }

    /// Fetch one item by id
    pub async fn lookup<T: DeserializeOwned>(&self, id: &str) -> Result<T> {
        self.reader.lookup(self.item_url(id).as_str()).await
    }

    /// Insert an item, returning the record the service stored
    pub async fn insert<I: Serialize>(&self, item: &I) -> Result<Value> {
        let body = serde_json::to_value(item)?;
        let response = self
            .reader
            .http()
            .post(self.endpoint.as_str(), body)
            .await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text)
            .with_context(|| format!("insert into {} returned invalid JSON", self.endpoint))
    }

    /// Delete an item by id
    pub async fn delete(&self, id: &str) -> Result<()> {
        let url = self.item_url(id);
        self.reader.http().delete(url.as_str()).await?;
        debug!("Deleted {}", url);
        Ok(())
    }

    /// Delete every item, returning how many were removed
    ///
    /// Rereads from the start after each batch, since deletions shift the
    /// remaining items forward. Items must carry a string `id`.
    pub async fn clear(&self, page_size: u32) -> Result<usize> {
        let mut deleted = 0;

        loop {
            let mut cursor = self.pages::<Value>(page_size).await?;
            let mut batch = None;
            while let Some(page) = cursor.next().await? {
                if !page.is_empty() {
                    batch = Some(page);
                    break;
                }
            }

            let Some(page) = batch else { break };

            for item in &page.items {
                let id = item.get("id").and_then(Value::as_str).ok_or_else(|| {
                    Error::protocol(
                        self.endpoint.as_str(),
                        format!("item {item} has no string 'id'"),
                    )
                })?;
                self.delete(id).await?;
                deleted += 1;
            }

            if page.is_last() {
                break;
            }
        }

        info!("Cleared {} items from {}", deleted, self.endpoint);
        Ok(deleted)
    }
}
