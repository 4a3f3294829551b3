//! Aggregates over drained collections
//!
//! Totals are computed from the items actually received, never from the
//! page-size hint that was requested.

use crate::error::{Error, Result};
use futures::{Stream, TryStreamExt};
use serde::Serialize;
use serde_json::Value;

/// Count, sum and mean of a numeric field
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Summary {
    /// Number of items folded in
    pub count: u64,
    /// Sum of the field over all items
    pub sum: f64,
}

impl Summary {
    /// Fold one value in
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    /// Arithmetic mean, `None` for an empty collection
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Summarize a numeric JSON `field` over an item stream
    ///
    /// An item without a numeric `field` is an error. On any error the
    /// partial totals are dropped.
    pub async fn collect<S>(items: S, field: &str) -> Result<Self>
    where
        S: Stream<Item = Result<Value>>,
    {
        Self::collect_by(items, |item: &Value| {
            item.get(field).and_then(Value::as_f64).ok_or_else(|| {
                Error::Other(format!("item {item} has no numeric field '{field}'"))
            })
        })
        .await
    }

    /// Summarize typed items with an extractor
    pub async fn collect_by<S, T, F>(items: S, mut extract: F) -> Result<Self>
    where
        S: Stream<Item = Result<T>>,
        F: FnMut(&T) -> Result<f64>,
    {
        items
            .try_fold(Self::default(), |mut summary, item| {
                let value = extract(&item);
                async move {
                    summary.add(value?);
                    Ok(summary)
                }
            })
            .await
    }
}
