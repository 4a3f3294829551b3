//! # table-pager
//!
//! A client for REST table endpoints that paginate with continuation
//! links, in the style of mobile-backend services
//! (`GET /tables/person?$top=10`).
//!
//! ## Features
//!
//! - **Continuation Following**: `Link` header or wrapped `nextLink` body
//! - **Lazy Draining**: single-pass item streams over any number of pages
//! - **Point Lookups**: fetch by id, guaranteed non-paginated
//! - **Table Operations**: insert, delete and clear
//! - **Aggregates**: count, sum and mean over received items
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use table_pager::{ReaderConfig, Result, Summary};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ReaderConfig::load("table-pager.yaml")?;
//!     let table = config.build_table(Some("person"))?;
//!
//!     // Walk page by page
//!     let mut cursor = table.pages::<serde_json::Value>(10).await?;
//!     while let Some(page) = cursor.next().await? {
//!         println!("{} items", page.len());
//!     }
//!
//!     // Or aggregate the whole table
//!     let ages = Summary::collect(table.read(10), "age").await?;
//!     println!("average age {:?}", ages.mean());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  TableClient: read · pages · lookup · insert · clear   │
//! └───────────────────────────┬────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴────────────────────────────┐
//! │  PageReader: open → Cursor::next → … → drain (Stream)  │
//! ├──────────────────────────┬─────────────────────────────┤
//! │  LinkHeaderStrategy      │  BodyFieldStrategy          │
//! └──────────────────────────┴─────────────────────────────┘
//!                             │
//! ┌───────────────────────────┴────────────────────────────┐
//! │  HttpClient: app key · retry/backoff · rate limit      │
//! └────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// HTTP client with retry and rate limiting
pub mod http;

/// Continuation-link pagination
pub mod pagination;

/// Table operations
pub mod table;

/// Aggregates over drained items
pub mod summary;

/// YAML configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::ReaderConfig;
pub use error::{Error, Result};
pub use pagination::{Continuation, ContinuationShape, Cursor, Page, PageReader};
pub use summary::Summary;
pub use table::TableClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
