//! Table client module
//!
//! Operations on one `tables/<name>` resource of a mobile-backend service.
//!
//! # Overview
//!
//! The table module provides:
//! - `TableClient` - paged reads, point lookups, inserts and deletes
//! - `clear` - empties a table page by page, as fixture setup does

mod client;

pub use client::TableClient;
