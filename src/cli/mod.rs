//! CLI module
//!
//! Command-line interface for reading tables.
//!
//! # Commands
//!
//! - `read` - Print every item, following continuations
//! - `pages` - Print page sizes and continuations
//! - `lookup` - Fetch one item by id
//! - `summary` - Aggregate a numeric field
//! - `clear` - Delete every item

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, ShapeArg};
pub use runner::Runner;
