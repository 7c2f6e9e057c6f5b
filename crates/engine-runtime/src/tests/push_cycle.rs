use crate::{
    error::{DeliveryError, PeriodError, SyncError},
    remote::{client::CollectorClient, delivery::Forwarder, period::PeriodResolver},
    sync::{
        cycle::PushCycle,
        scheduler::{SyncLoop, settle_cycle},
    },
    tests::support::{BrokenSource, SalesTable, extractor},
};
use connectors::{error::ExtractError, sql::base::source::RowSource};
use engine_core::{
    activation::ActivationTime,
    retry::{RetryError, RetryPolicy},
};
use model::period::query_layout;
use serde_json::{Value as Json, json};
use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

const API_KEY: &str = "secret";

fn quick_retry(attempts: usize) -> RetryPolicy {
    RetryPolicy::new(attempts, Duration::ZERO)
}

fn client(query_param: Option<&str>) -> Arc<CollectorClient> {
    Arc::new(
        CollectorClient::new(
            Duration::from_secs(5),
            API_KEY,
            "api-token",
            query_param.map(str::to_string),
        )
        .unwrap(),
    )
}

fn cycle(server: &MockServer, source: Arc<dyn RowSource>, retry: RetryPolicy) -> PushCycle {
    let client = client(None);
    PushCycle::new(
        PeriodResolver::new(
            client.clone(),
            format!("{}/period/", server.uri()),
            retry.clone(),
        ),
        extractor(source),
        Forwarder::new(client, format!("{}/data/", server.uri()), retry.clone()),
        retry,
        100,
    )
}

async fn mount_period(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/period/"))
        .and(header("api-token", API_KEY))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"dateFrom": "2024-07-01", "dateTo": "2024-07-01"})),
        )
        .mount(server)
        .await;
}

async fn delivered_batches(server: &MockServer) -> Vec<Json> {
    server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/data/")
        .map(|request| serde_json::from_slice(&request.body).unwrap())
        .collect()
}

#[tokio::test]
async fn pages_until_empty_batch() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .and(path("/data/"))
        .and(header("api-token", API_KEY))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(150));
    let report = cycle(&server, table.clone(), quick_retry(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.records, 150);
    assert_eq!(table.offsets(), vec![0, 100, 200]);

    let batches = delivered_batches(&server).await;
    assert_eq!(batches[0]["data"].as_array().unwrap().len(), 100);
    assert_eq!(batches[1]["data"].as_array().unwrap().len(), 50);
    assert_eq!(batches[1]["data"][0], json!({"VisitId": 100, "OrderSum": 12.5}));
}

#[tokio::test]
async fn empty_window_delivers_nothing() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(0));
    let report = cycle(&server, table.clone(), quick_retry(5))
        .run()
        .await
        .unwrap();

    assert_eq!((report.pages, report.records), (0, 0));
    assert_eq!(table.offsets(), vec![0]);
}

#[tokio::test]
async fn rejected_delivery_is_retried() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .and(path("/data/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/data/"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let report = cycle(&server, Arc::new(SalesTable::new(10)), quick_retry(3))
        .run()
        .await
        .unwrap();

    assert_eq!(report.pages, 1);
}

#[tokio::test]
async fn delivery_gives_up_after_attempts() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .and(path("/data/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let err = cycle(&server, Arc::new(SalesTable::new(10)), quick_retry(3))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Delivery(RetryError::AttemptsExceeded(DeliveryError::Status { status, .. }))
            if status.as_u16() == 500
    ));
}

#[tokio::test]
async fn period_failure_is_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/period/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(4)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(10));
    let err = cycle(&server, table.clone(), quick_retry(4))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Period(RetryError::AttemptsExceeded(PeriodError::Status { .. }))
    ));
    assert!(table.offsets().is_empty());
}

#[tokio::test]
async fn malformed_period_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/period/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(2)
        .mount(&server)
        .await;

    let err = cycle(&server, Arc::new(SalesTable::new(1)), quick_retry(2))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Period(RetryError::AttemptsExceeded(PeriodError::Malformed(_)))
    ));
}

#[tokio::test]
async fn transient_extraction_failure_is_retried() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(20).failing_first(2));
    let report = cycle(&server, table.clone(), quick_retry(5))
        .run()
        .await
        .unwrap();

    assert_eq!(report.records, 20);
    assert_eq!(table.offsets(), vec![0, 0, 0, 100]);
}

#[tokio::test]
async fn bad_row_stops_without_retry() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(5).with_order_sum("12,50"));
    let err = cycle(&server, table.clone(), quick_retry(5))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SyncError::Extract(RetryError::Fatal(ExtractError::Mapping(_)))
    ));
    assert_eq!(table.offsets(), vec![0]);
}

#[tokio::test]
async fn broken_source_stops_without_retry() {
    let server = MockServer::start().await;
    mount_period(&server).await;

    let err = cycle(&server, Arc::new(BrokenSource), quick_retry(5))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Extract(RetryError::Fatal(_))));
}

#[tokio::test]
async fn api_key_can_travel_as_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/period/"))
        .and(query_param("token", API_KEY))
        .and(header("api-token", API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"last_sale_date": null})))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = PeriodResolver::new(
        client(Some("token")),
        format!("{}/period/", server.uri()),
        quick_retry(1),
    );
    let window = resolver.resolve().await.unwrap();

    assert_eq!(window.from.to_string(), "0001-01-01 00:00:00");
}

#[tokio::test]
async fn retried_period_uses_the_day_of_the_last_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"last_sale_date": "2024-06-30"})),
        )
        .mount(&server)
        .await;

    // The first attempt runs just before midnight, the retry just after.
    let resolver = PeriodResolver::new(
        client(None),
        format!("{}/period/", server.uri()),
        quick_retry(2),
    )
    .with_clock(|| {
        static READINGS: AtomicUsize = AtomicUsize::new(0);
        let first = READINGS.fetch_add(1, Ordering::SeqCst) == 0;
        let (day, hour) = if first { (1, 23) } else { (2, 0) };
        chrono::NaiveDate::from_ymd_opt(2024, 7, day)
            .unwrap()
            .and_hms_opt(hour, 59, 59)
            .unwrap()
    });
    let window = resolver.resolve().await.unwrap();

    assert_eq!(query_layout(&window.from), "2024-06-30T00:00:00");
    assert_eq!(query_layout(&window.to), "2024-07-02T23:59:59.999");
}

#[tokio::test]
async fn first_cycle_failure_ends_the_loop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sync = SyncLoop::new(
        cycle(&server, Arc::new(SalesTable::new(1)), quick_retry(2)),
        ActivationTime::new(3, 0).unwrap(),
    );

    let result = sync.run(CancellationToken::new()).await;
    assert!(matches!(result, Err(SyncError::Period(_))));
}

#[tokio::test]
async fn loop_waits_for_activation_after_first_cycle() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let table = Arc::new(SalesTable::new(30));
    let sync = SyncLoop::new(
        cycle(&server, table.clone(), quick_retry(1)),
        ActivationTime::new(3, 0).unwrap(),
    )
    .with_clock(|| {
        chrono::NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(3, 0, 0)
            .unwrap()
    });

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { sync.run(cancel).await }
    });

    for _ in 0..200 {
        if table.offsets().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    // The second cycle is a day away.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(table.offsets(), vec![0, 100]);

    cancel.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn loop_survives_a_failed_later_cycle() {
    let server = MockServer::start().await;
    mount_period(&server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    // Cycle one reads calls 0 and 1, cycle two fails on call 2, cycle three
    // reads calls 3 and 4.
    let table = Arc::new(SalesTable::new(30).failing_call(2));
    let sync = SyncLoop::new(
        cycle(&server, table.clone(), quick_retry(1)),
        ActivationTime::new(3, 0).unwrap(),
    )
    .with_clock(|| {
        // Two activations 50ms away, then the next one a day away.
        static READINGS: AtomicUsize = AtomicUsize::new(0);
        let day = chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        if READINGS.fetch_add(1, Ordering::SeqCst) < 2 {
            day.and_hms_milli_opt(2, 59, 59, 950).unwrap()
        } else {
            day.and_hms_opt(3, 0, 0).unwrap()
        }
    });

    let cancel = CancellationToken::new();
    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move { sync.run(cancel).await }
    });

    for _ in 0..500 {
        if table.offsets().len() == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(table.offsets(), vec![0, 100, 0, 0, 100]);
    assert!(!handle.is_finished());

    cancel.cancel();
    handle.await.unwrap().unwrap();

    let periods = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|request| request.url.path() == "/period/")
        .count();
    assert_eq!(periods, 3);
    assert_eq!(delivered_batches(&server).await.len(), 2);
}

#[tokio::test]
async fn cancelled_loop_stops_before_any_request() {
    let server = MockServer::start().await;
    let table = Arc::new(SalesTable::new(1));
    let sync = SyncLoop::new(
        cycle(&server, table.clone(), quick_retry(1)),
        ActivationTime::new(3, 0).unwrap(),
    );

    let cancel = CancellationToken::new();
    cancel.cancel();
    sync.run(cancel).await.unwrap();

    assert!(table.offsets().is_empty());
}

#[traced_test]
#[test]
fn later_cycle_failure_is_logged_and_skipped() {
    let failure = || {
        Err(SyncError::Period(RetryError::AttemptsExceeded(
            PeriodError::Malformed("empty body".into()),
        )))
    };

    assert!(settle_cycle(failure(), true).is_err());
    assert!(settle_cycle(failure(), false).unwrap().is_none());
    assert!(logs_contain("skipping until next activation"));
}
