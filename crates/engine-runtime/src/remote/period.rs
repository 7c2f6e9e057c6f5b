use crate::{
    error::PeriodError,
    remote::client::{CollectorClient, body_excerpt},
};
use chrono::{NaiveDate, NaiveDateTime};
use engine_core::{
    activation::local_now,
    retry::{RetryDisposition, RetryError, RetryPolicy},
};
use model::period::{ReportWindow, parse_instant};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::{debug, info};

/// Asks the collector which range of sales it expects next.
///
/// Two response shapes are understood:
/// `{"dateFrom": .., "dateTo": ..}` and `{"last_sale_date": .. | null}`.
/// In both the window closes at the end of a day, whatever time of day the
/// collector sent.
pub struct PeriodResolver {
    client: Arc<CollectorClient>,
    url: String,
    retry: RetryPolicy,
    clock: fn() -> NaiveDateTime,
}

impl PeriodResolver {
    pub fn new(client: Arc<CollectorClient>, url: impl Into<String>, retry: RetryPolicy) -> Self {
        PeriodResolver {
            client,
            url: url.into(),
            retry,
            clock: local_now,
        }
    }

    /// Replaces the wall clock that decides what "today" is.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resolves the window. A `last_sale_date` response is closed at the end
    /// of the local day the successful attempt started on. Every failure,
    /// including a malformed body, is retried.
    pub async fn resolve(&self) -> Result<ReportWindow, RetryError<PeriodError>> {
        let window = self
            .retry
            .run(|| self.fetch(), |_| RetryDisposition::Retry)
            .await?;

        info!(%window, "Report period resolved");
        Ok(window)
    }

    async fn fetch(&self) -> Result<ReportWindow, PeriodError> {
        let today = (self.clock)().date();
        debug!(url = %self.url, %today, "Requesting report period");

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(PeriodError::Status {
                status,
                body: body_excerpt(&body),
            });
        }

        parse_period(&body, today)
    }
}

/// Builds the report window from a period response body.
pub fn parse_period(body: &[u8], today: NaiveDate) -> Result<ReportWindow, PeriodError> {
    let json: Json =
        serde_json::from_slice(body).map_err(|e| PeriodError::Malformed(e.to_string()))?;

    if let (Some(from), Some(to)) = (json.get("dateFrom"), json.get("dateTo")) {
        let from = day_of(from, "dateFrom")?;
        let to = day_of(to, "dateTo")?;
        return Ok(ReportWindow::through_end_of_day(from, to));
    }

    match json.get("last_sale_date") {
        Some(Json::Null) => Ok(ReportWindow::through_end_of_day(beginning_of_time(), today)),
        Some(last_sale) => Ok(ReportWindow::through_end_of_day(
            day_of(last_sale, "last_sale_date")?,
            today,
        )),
        None => Err(PeriodError::Malformed(format!(
            "expected dateFrom/dateTo or last_sale_date, got {}",
            body_excerpt(body)
        ))),
    }
}

/// `0001-01-01`, the start of a window when nothing was sold yet.
fn beginning_of_time() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn day_of(value: &Json, field: &str) -> Result<NaiveDate, PeriodError> {
    let text = value
        .as_str()
        .ok_or_else(|| PeriodError::Malformed(format!("{field} is not a string")))?;
    parse_instant(text)
        .map(|instant| instant.date())
        .map_err(|e| PeriodError::Malformed(format!("{field}: {e}")))
}
