use crate::{
    error::SyncError,
    remote::{delivery::Forwarder, period::PeriodResolver},
};
use connectors::{error::ExtractError, extract::Extractor};
use engine_core::retry::{RetryDisposition, RetryPolicy};
use model::{pagination::cursor::PageCursor, period::ReportWindow};
use std::sync::Arc;
use tracing::{debug, info};

/// What one push cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    pub window: ReportWindow,
    /// Non-empty batches delivered.
    pub pages: usize,
    pub records: usize,
}

impl CycleReport {
    fn new(window: ReportWindow) -> Self {
        CycleReport {
            window,
            pages: 0,
            records: 0,
        }
    }
}

/// One pass of the push mode: resolve the window, then extract and deliver
/// page after page until an empty page comes back.
pub struct PushCycle {
    resolver: PeriodResolver,
    extractor: Arc<Extractor>,
    forwarder: Forwarder,
    retry: RetryPolicy,
    page_size: usize,
}

impl PushCycle {
    pub fn new(
        resolver: PeriodResolver,
        extractor: Arc<Extractor>,
        forwarder: Forwarder,
        retry: RetryPolicy,
        page_size: usize,
    ) -> Self {
        PushCycle {
            resolver,
            extractor,
            forwarder,
            retry,
            page_size,
        }
    }

    pub async fn run(&self) -> Result<CycleReport, SyncError> {
        let window = self.resolver.resolve().await?;
        self.run_window(window).await
    }

    /// Paginates over `window`. Offsets only move forward, so a finite
    /// result set always ends with an empty page.
    pub async fn run_window(&self, window: ReportWindow) -> Result<CycleReport, SyncError> {
        let mut report = CycleReport::new(window);
        let mut cursor = PageCursor::first(self.page_size);

        loop {
            let batch = self
                .retry
                .run(|| self.extractor.extract(&window, cursor), classify_extract)
                .await?;

            if batch.is_empty() {
                debug!(offset = cursor.offset, "Empty page, window exhausted");
                break;
            }

            self.forwarder.forward(&batch).await?;
            report.pages += 1;
            report.records += batch.len();
            info!(
                offset = cursor.offset,
                records = batch.len(),
                "Page forwarded"
            );

            cursor = cursor.next();
        }

        info!(
            %window,
            pages = report.pages,
            records = report.records,
            "Sync cycle complete"
        );
        Ok(report)
    }
}

/// Only driver-level failures that may clear up on their own are retried.
/// A row that does not fit its column type will not fit on the next try.
fn classify_extract(err: &ExtractError) -> RetryDisposition {
    if err.is_transient() {
        RetryDisposition::Retry
    } else {
        RetryDisposition::Stop
    }
}
