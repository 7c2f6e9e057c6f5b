use crate::server::ServerState;
use axum::{
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use connectors::error::ExtractError;
use model::{
    pagination::cursor::PageCursor,
    period::{ReportWindow, parse_instant},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

const DEFAULT_FROM: usize = 0;
const DEFAULT_COUNT: usize = 100;

/// Query string of `GET /query`, before validation.
#[derive(Debug, Default, Deserialize)]
pub struct QueryParams {
    pub from: Option<String>,
    pub count: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub window: ReportWindow,
    pub cursor: PageCursor,
}

impl PageRequest {
    pub fn parse(params: &QueryParams) -> Result<Self, QueryError> {
        let from = match params.from.as_deref() {
            None => DEFAULT_FROM,
            Some(text) => text
                .trim()
                .parse::<usize>()
                .map_err(|_| QueryError::invalid("from", "a non-negative integer"))?,
        };

        let count = match params.count.as_deref() {
            None => DEFAULT_COUNT,
            Some(text) => text
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or_else(|| QueryError::invalid("count", "a positive integer"))?,
        };

        let date_from = required_instant(params.date_from.as_deref(), "date_from")?;
        let date_to = required_instant(params.date_to.as_deref(), "date_to")?;

        Ok(PageRequest {
            window: ReportWindow::new(date_from, date_to),
            cursor: PageCursor::new(from, count),
        })
    }
}

fn required_instant(
    value: Option<&str>,
    name: &'static str,
) -> Result<chrono::NaiveDateTime, QueryError> {
    let text = value
        .filter(|v| !v.trim().is_empty())
        .ok_or(QueryError::Missing(name))?;
    parse_instant(text).map_err(|_| QueryError::invalid(name, "a date or date-time"))
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("missing parameter {0}")]
    Missing(&'static str),

    #[error("parameter {name} must be {expected}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
    },

    #[error("malformed query string")]
    Malformed(#[from] QueryRejection),

    #[error("extraction failed")]
    Extract(#[from] ExtractError),

    #[error("failed to encode records")]
    Encode(#[from] serde_json::Error),
}

impl QueryError {
    fn invalid(name: &'static str, expected: &'static str) -> Self {
        QueryError::Invalid { name, expected }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        match self {
            QueryError::Missing(_) | QueryError::Invalid { .. } | QueryError::Malformed(_) => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            QueryError::Extract(ref err) => {
                error!(error = %err, "Extraction failed");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
            QueryError::Encode(ref err) => {
                error!(error = %err, "Failed to encode records");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

/// One page of records for the requested window, as a bare JSON array.
/// Each request connects to the source on its own and is not retried.
pub async fn handle_query(
    State(state): State<ServerState>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> Result<Response, QueryError> {
    let Query(params) = params?;
    let request = PageRequest::parse(&params)?;

    let batch = state
        .extractor
        .extract(&request.window, request.cursor)
        .await?;
    let body = batch.to_json()?;

    info!(
        window = %request.window,
        offset = request.cursor.offset,
        records = batch.len(),
        "Served query"
    );
    Ok(([(CONTENT_TYPE, "application/json")], body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(from: Option<&str>, count: Option<&str>) -> QueryParams {
        QueryParams {
            from: from.map(str::to_string),
            count: count.map(str::to_string),
            date_from: Some("2024-07-01T00:00:00".into()),
            date_to: Some("2024-07-02".into()),
        }
    }

    #[test]
    fn defaults_apply() {
        let request = PageRequest::parse(&params(None, None)).unwrap();
        assert_eq!(request.cursor, PageCursor::new(0, 100));
    }

    #[test]
    fn explicit_paging() {
        let request = PageRequest::parse(&params(Some("200"), Some("50"))).unwrap();
        assert_eq!(request.cursor, PageCursor::new(200, 50));
    }

    #[test]
    fn rejects_bad_numbers() {
        for (from, count) in [(Some("-1"), None), (None, Some("0")), (Some("x"), None)] {
            assert!(matches!(
                PageRequest::parse(&params(from, count)),
                Err(QueryError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn dates_are_required() {
        let mut missing = params(None, None);
        missing.date_to = None;
        assert!(matches!(
            PageRequest::parse(&missing),
            Err(QueryError::Missing("date_to"))
        ));

        let mut bad = params(None, None);
        bad.date_from = Some("yesterday".into());
        assert!(matches!(
            PageRequest::parse(&bad),
            Err(QueryError::Invalid { name: "date_from", .. })
        ));
    }
}
