use crate::sql::base::query::filter::SqlFilter;
use async_trait::async_trait;
use model::{
    pagination::cursor::PageCursor,
    period::{ReportWindow, query_layout},
};
use std::{io, path::PathBuf};

const COUNT_TOKEN: &str = "{{COUNT}}";
const OFFSET_TOKEN: &str = "{{FROM}}";
const DATE_FROM_TOKEN: &str = "{{DATE_FROM}}";
const DATE_TO_TOKEN: &str = "{{DATE_TO}}";
const FILTER_TOKEN: &str = "{{FILTER}}";

/// Supplies the query template text. Called once per extraction, so edits to
/// the template take effect without a restart.
#[async_trait]
pub trait QueryTemplateProvider: Send + Sync {
    async fn template(&self) -> Result<String, io::Error>;
}

/// Reads the template from disk on every call.
pub struct FileTemplateProvider {
    path: PathBuf,
}

impl FileTemplateProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTemplateProvider { path: path.into() }
    }
}

#[async_trait]
impl QueryTemplateProvider for FileTemplateProvider {
    async fn template(&self) -> Result<String, io::Error> {
        tokio::fs::read_to_string(&self.path).await
    }
}

/// A template held in memory.
pub struct StaticTemplateProvider(String);

impl StaticTemplateProvider {
    pub fn new(text: &str) -> Self {
        StaticTemplateProvider(text.to_string())
    }
}

#[async_trait]
impl QueryTemplateProvider for StaticTemplateProvider {
    async fn template(&self) -> Result<String, io::Error> {
        Ok(self.0.clone())
    }
}

/// Substitutes the first occurrence of each placeholder token.
/// Tokens missing from the template are simply not substituted.
pub fn render_query(
    template: &str,
    window: &ReportWindow,
    cursor: PageCursor,
    filter: &SqlFilter,
) -> String {
    let date_from = format!("'{}'", query_layout(&window.from));
    let date_to = format!("'{}'", query_layout(&window.to));

    template
        .replacen(COUNT_TOKEN, &cursor.page_size.to_string(), 1)
        .replacen(OFFSET_TOKEN, &cursor.offset.to_string(), 1)
        .replacen(DATE_FROM_TOKEN, &date_from, 1)
        .replacen(DATE_TO_TOKEN, &date_to, 1)
        .replacen(FILTER_TOKEN, &filter.as_condition(), 1)
}
