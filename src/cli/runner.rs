//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, ShapeArg};
use crate::config::ReaderConfig;
use crate::error::{Error, Result};
use crate::pagination::ContinuationShape;
use crate::summary::Summary;
use crate::table::TableClient;
use futures::{StreamExt, TryStreamExt};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.build_config()?;
        let table = config.build_table(None)?;

        match &self.cli.command {
            Commands::Read { max_items } => {
                self.read(&table, config.page_size, *max_items).await
            }
            Commands::Pages => self.pages(&table, config.page_size).await,
            Commands::Lookup { id } => {
                let item: Value = table.lookup(id).await?;
                self.emit(&item)
            }
            Commands::Summary { field } => self.summary(&table, config.page_size, field).await,
            Commands::Clear => {
                let deleted = table.clear(config.page_size).await?;
                self.emit(&json!({ "deleted": deleted }))
            }
        }
    }

    /// Merge the config file with command-line overrides
    pub fn build_config(&self) -> Result<ReaderConfig> {
        let mut config = match (&self.cli.config, &self.cli.service_url) {
            (Some(path), _) => ReaderConfig::load(path)?,
            (None, Some(url)) => ReaderConfig::new(url.clone()),
            (None, None) => {
                return Err(Error::config(
                    "no service configured (use -C <file> or --service-url)",
                ))
            }
        };

        if let Some(url) = &self.cli.service_url {
            config.service_url.clone_from(url);
        }
        if let Some(key) = &self.cli.app_key {
            config.app_key = Some(key.clone());
        }
        if let Some(table) = &self.cli.table {
            config.table = Some(table.clone());
        }
        if let Some(page_size) = self.cli.page_size {
            config.page_size = page_size;
        }
        if let Some(shape) = self.cli.shape {
            config.continuation = match shape {
                ShapeArg::Link => ContinuationShape::link_header(),
                ShapeArg::Body => ContinuationShape::body_field(),
            };
        }

        config.validate()?;
        Ok(config)
    }

    async fn read(
        &self,
        table: &TableClient,
        page_size: u32,
        max_items: Option<usize>,
    ) -> Result<()> {
        let start = Instant::now();
        let items = table
            .read::<Value>(page_size)
            .take(max_items.unwrap_or(usize::MAX));
        futures::pin_mut!(items);

        let mut count = 0usize;
        while let Some(item) = items.try_next().await? {
            self.emit(&item)?;
            count += 1;
        }

        info!(
            "Read {} items from {} in {:?}",
            count,
            table.endpoint(),
            start.elapsed()
        );
        Ok(())
    }

    async fn pages(&self, table: &TableClient, page_size: u32) -> Result<()> {
        let mut cursor = table.pages::<Value>(page_size).await?;
        let mut number = 0u32;

        while let Some(page) = cursor.next().await? {
            number += 1;
            self.emit(&json!({
                "page": number,
                "items": page.len(),
                "next": page.continuation.token().map(url::Url::as_str),
            }))?;
        }

        info!(
            "{} pages, {} items, {} round trips",
            number,
            cursor.items_received(),
            cursor.round_trips()
        );
        Ok(())
    }

    async fn summary(&self, table: &TableClient, page_size: u32, field: &str) -> Result<()> {
        let summary = Summary::collect(table.read::<Value>(page_size), field).await?;
        self.emit(&json!({
            "field": field,
            "count": summary.count,
            "sum": summary.sum,
            "mean": summary.mean(),
        }))
    }

    fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(value)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(value)?,
        };
        println!("{line}");
        Ok(())
    }
}
