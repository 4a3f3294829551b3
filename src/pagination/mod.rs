//! Pagination module
//!
//! Reads a REST collection that hands out continuation references.
//!
//! # Overview
//!
//! The first request carries a page-size hint (`$top`). Every response may
//! name where the next page lives, either in a `Link` header or in a field
//! of a wrapped body. The reader follows that reference verbatim until a
//! response names none.

mod reader;
mod strategies;
mod types;

pub use reader::{Cursor, PageReader};
pub use strategies::{strategy_for, BodyFieldStrategy, LinkHeaderStrategy};
pub use types::{
    Continuation, ContinuationShape, ContinuationStrategy, Page, StaleReferencePolicy,
    DEFAULT_PAGE_SIZE_PARAM,
};
