//! In-memory table service for integration tests
//!
//! Serves `/tables/person` the way a mobile-backend table does: `$top` and
//! `$skip` paging, continuation links in a `Link` header or a wrapped body,
//! point lookups by id, inserts and deletes.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use table_pager::http::{HttpClient, HttpClientConfig, APP_KEY_HEADER};
use table_pager::pagination::{ContinuationShape, PageReader};
use table_pager::TableClient;
use wiremock::matchers::path_regex;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub const APP_KEY: &str = "bNmUnQlSgxtzFGFnDRUljypFfHbLLa98";
pub const ROW_NUMBER_OFFSET: usize = 1000;
const COLLECTION: &str = "/tables/person";

/// How the fake service advertises the next page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    /// `Link: <uri>; rel=next` header over a bare array
    Link,
    /// `{"results": [...], "nextLink": ...}`
    Body,
}

impl Wire {
    pub fn shape(self) -> ContinuationShape {
        match self {
            Wire::Link => ContinuationShape::link_header(),
            Wire::Body => ContinuationShape::body_field(),
        }
    }
}

/// Deterministic person records
pub fn people(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            json!({
                "id": format!("partition,row{}", ROW_NUMBER_OFFSET + i),
                "name": format!("person {i}"),
                "age": 18 + (i * 37) % 62,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct MemoryTable {
    items: Arc<Mutex<Vec<Value>>>,
    wire: Wire,
    /// Advertise a next link whenever a page comes back full, even if it
    /// was the last one
    eager_links: bool,
}

impl MemoryTable {
    pub fn new(items: Vec<Value>, wire: Wire) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
            wire,
            eager_links: false,
        }
    }

    #[must_use]
    pub fn eager_links(mut self) -> Self {
        self.eager_links = true;
        self
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub async fn start(self) -> (MockServer, Self) {
        let server = MockServer::start().await;
        Mock::given(path_regex(r"^/tables/person(/.*)?$"))
            .respond_with(self.clone())
            .mount(&server)
            .await;
        (server, self)
    }

    fn list(&self, request: &Request) -> ResponseTemplate {
        let tops: Vec<usize> = query_values(request, "$top");
        if tops.len() > 1 {
            return ResponseTemplate::new(400).set_body_string("duplicate $top");
        }
        let top = tops.first().copied().unwrap_or(50);
        let skip = query_values(request, "$skip").first().copied().unwrap_or(0);

        let items = self.items.lock().unwrap();
        let start = skip.min(items.len());
        let end = skip.saturating_add(top).min(items.len());
        let page: Vec<Value> = items[start..end].to_vec();

        let has_more = if self.eager_links {
            top > 0 && page.len() == top
        } else {
            top > 0 && skip + top < items.len()
        };
        let next = has_more.then(|| {
            request
                .url
                .join(&format!("{COLLECTION}?$top={top}&$skip={}", skip + top))
                .unwrap()
                .to_string()
        });

        match self.wire {
            Wire::Link => {
                let mut response = ResponseTemplate::new(200).set_body_json(&page);
                if let Some(next) = next {
                    response =
                        response.insert_header("Link", format!("{next}; rel=next").as_str());
                }
                response
            }
            Wire::Body => ResponseTemplate::new(200).set_body_json(json!({
                "results": page,
                "nextLink": next,
            })),
        }
    }

    fn lookup(&self, id: &str) -> ResponseTemplate {
        let items = self.items.lock().unwrap();
        match items.iter().find(|item| item["id"] == id) {
            Some(item) => ResponseTemplate::new(200).set_body_json(item),
            None => ResponseTemplate::new(404).set_body_string("not found"),
        }
    }

    fn insert(&self, request: &Request) -> ResponseTemplate {
        let Ok(item) = serde_json::from_slice::<Value>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        self.items.lock().unwrap().push(item.clone());
        ResponseTemplate::new(201).set_body_json(item)
    }

    fn delete(&self, id: &str) -> ResponseTemplate {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item["id"] != id);
        if items.len() == before {
            ResponseTemplate::new(404)
        } else {
            ResponseTemplate::new(204)
        }
    }
}

impl Respond for MemoryTable {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let key = request
            .headers
            .get(APP_KEY_HEADER)
            .and_then(|v| v.to_str().ok());
        if key != Some(APP_KEY) {
            return ResponseTemplate::new(401).set_body_string("missing application key");
        }

        let id = request
            .url
            .path()
            .strip_prefix(COLLECTION)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(str::to_string);

        match (request.method.as_str(), id) {
            ("GET", None) => self.list(request),
            ("GET", Some(id)) => self.lookup(&id),
            ("POST", None) => self.insert(request),
            ("DELETE", Some(id)) => self.delete(&id),
            _ => ResponseTemplate::new(405),
        }
    }
}

fn query_values(request: &Request, key: &str) -> Vec<usize> {
    request
        .url
        .query_pairs()
        .filter(|(k, _)| k == key)
        .filter_map(|(_, v)| v.parse().ok())
        .collect()
}

/// Collection GETs the server has seen
pub async fn collection_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == "GET" && r.url.path() == COLLECTION)
        .count()
}

pub fn http_client(app_key: Option<&str>) -> HttpClient {
    let mut builder = HttpClientConfig::builder().max_retries(0).no_rate_limit();
    if let Some(key) = app_key {
        builder = builder.app_key(key);
    }
    HttpClient::with_config(builder.build()).unwrap()
}

pub fn reader(wire: Wire) -> PageReader {
    PageReader::new(http_client(Some(APP_KEY)), &wire.shape())
}

pub fn table(server: &MockServer, wire: Wire) -> TableClient {
    TableClient::new(reader(wire), &server.uri(), "person").unwrap()
}

pub fn endpoint(server: &MockServer) -> String {
    format!("{}{COLLECTION}", server.uri())
}
