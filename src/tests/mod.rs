use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::api::{FetchError, MockCall, MockClientApi};
use crate::coordinator::{DetailBody, ViewCoordinator, ViewOptions, ViewUpdate};
use crate::fetcher::{DetailOutcome, DetailState, PredictionExplainabilityFetcher};
use crate::format::{FieldFormatter, Locale};
use crate::history::{HistoryStore, MemoryBackend};
use crate::model::{ClientRecord, PredictionResult};
use crate::pagination::{ListOutcome, ListPage, LoadError, PaginationController, ShapeError};
use crate::shap::FactorSign;

fn roster_page() -> serde_json::Value {
    json!({
        "content": [
            {"id": "0000007", "name": "Olga", "age": 41, "region": "Tatarstan", "income": 80000},
            {"id": 12, "displayName": "Ivan", "age": 35}
        ],
        "totalPages": 3
    })
}

fn approve(id: &str) -> serde_json::Value {
    json!({"id": id, "approvalProbability": 0.72, "decision": "APPROVE", "avg_turnover": 1000})
}

fn coordinator(api: MockClientApi) -> ViewCoordinator {
    ViewCoordinator::new(
        Arc::new(api),
        HistoryStore::load(Box::new(MemoryBackend::new(None))),
        FieldFormatter::new(Locale::Ru, Default::default()),
        ViewOptions::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn content_page_yields_records_and_server_total() {
    let api = MockClientApi::new().with_page(
        0,
        json!({"content": [{"id": 7, "age": 30, "region": "X", "income": 50000}], "totalPages": 5}),
    );
    let mut pager = PaginationController::new(Arc::new(api), 20);
    let loaded = pager.load_page(0).await.unwrap();
    assert_eq!(loaded.records, 1);

    let record = &pager.records()[0];
    assert_eq!(record.id, "7");
    assert_eq!(record.age, Some(30.0));
    assert_eq!(record.region.as_deref(), Some("X"));
    assert_eq!(record.income, Some(50000.0));

    let state = pager.state();
    assert_eq!(state.total_pages, 5);
    assert!(state.has_more);
}

#[tokio::test]
async fn empty_page_keeps_last_good_state() {
    let api = MockClientApi::new()
        .with_page(2, json!({"content": [{"id": 1}], "totalPages": 4}))
        .with_page(3, json!([]));
    let mut pager = PaginationController::new(Arc::new(api), 20);
    pager.load_page(2).await.unwrap();

    let err = pager.load_page(3).await.unwrap_err();
    assert!(matches!(err, LoadError::Empty { page: 3 }));
    assert_eq!(err.to_string(), "no data on page 4");

    let state = pager.state();
    assert_eq!(state.total_pages, 4);
    assert_eq!(state.page, 2);
    assert!(!state.has_more);
    assert_eq!(pager.records().len(), 1);
}

#[tokio::test]
async fn failed_page_keeps_records_and_reload_recovers() {
    let api = Arc::new(
        MockClientApi::new()
            .with_page(0, roster_page())
            .with_page_status(1, 503),
    );
    let mut pager = PaginationController::new(api.clone(), 20);
    pager.load_page(0).await.unwrap();

    let err = pager.load_page(1).await.unwrap_err();
    assert!(matches!(err, LoadError::Fetch { page: 1, .. }));
    assert_eq!(pager.records().len(), 2);
    assert!(pager.next_page().is_none());

    pager.reload();
    pager.settle().await.unwrap();
    assert!(pager.state().has_more);
    assert_eq!(
        api.calls(),
        vec![
            MockCall::List { page: 0, size: 20 },
            MockCall::List { page: 1, size: 20 },
            MockCall::List { page: 0, size: 20 },
        ]
    );
}

#[tokio::test]
async fn malformed_list_body_is_a_load_error() {
    let api = MockClientApi::new().with_page(0, json!({"items": []}));
    let mut pager = PaginationController::new(Arc::new(api), 20);
    let err = pager.load_page(0).await.unwrap_err();
    assert!(err.to_string().contains("unexpected response"));
    match &err {
        LoadError::Fetch {
            source: FetchError::Shape { source, .. },
            ..
        } => assert_eq!(
            source,
            &ShapeError::UnexpectedBody("an object without a content/clients array")
        ),
        other => panic!("unexpected error {other:?}"),
    }
    let shape = err
        .source()
        .and_then(|fetch| fetch.source())
        .map(|shape| shape.to_string());
    assert_eq!(
        shape.as_deref(),
        Some("expected an array or an object with content/clients, got an object without a content/clients array")
    );
    assert!(pager.records().is_empty());
    assert_eq!(pager.state().total_pages, 1);
}

#[tokio::test]
async fn superseded_page_request_is_discarded() {
    let api = Arc::new(
        MockClientApi::new()
            .with_page(1, json!([{"id": "slow"}]))
            .with_page(2, json!([{"id": "fast"}])),
    );
    let gate = api.hold("page:1");
    let mut pager = PaginationController::new(api.clone(), 20);

    let first = pager.request_page(1);
    tokio::task::yield_now().await;
    pager.request_page(2);
    gate.notify_one();
    pager.settle().await.unwrap();
    assert_eq!(pager.records()[0].id, "fast");

    // a late outcome for the first request changes nothing
    let late = ListOutcome {
        generation: first,
        page: 1,
        result: Ok(ListPage {
            records: vec![ClientRecord::new("slow")],
            total_pages: 9,
        }),
    };
    assert!(pager.apply(late).is_none());
    assert_eq!(pager.records()[0].id, "fast");
    assert_eq!(pager.state().page, 2);
}

#[tokio::test]
async fn newer_selection_wins_over_pending_fetch() {
    let api = Arc::new(
        MockClientApi::new()
            .with_prediction("A", approve("A"))
            .with_attribution("A", json!({"shapValues": {"a": 1}}))
            .with_prediction("B", approve("B"))
            .with_attribution("B", json!({"shapValues": {"b": 1}})),
    );
    let gate = api.hold("predict:A");
    let mut fetcher = PredictionExplainabilityFetcher::new(api.clone());

    let first = fetcher.fetch_for(&ClientRecord::new("A"));
    tokio::task::yield_now().await;
    fetcher.fetch_for(&ClientRecord::new("B"));
    gate.notify_one();

    match fetcher.settle().await {
        DetailState::Ready { id, factors, .. } => {
            assert_eq!(id, "B");
            assert_eq!(factors[0].feature_key, "b");
        }
        other => panic!("unexpected state {other:?}"),
    }

    let late = DetailOutcome {
        generation: first,
        id: "A".to_string(),
        result: Ok((PredictionResult::default(), Vec::new())),
    };
    assert!(!fetcher.apply(late));
    assert!(matches!(fetcher.state(), DetailState::Ready { id, .. } if id == "B"));
}

#[tokio::test]
async fn attribution_failure_degrades_to_no_factors() {
    let api = MockClientApi::new()
        .with_prediction("7", approve("7"))
        .with_attribution_status("7", 500);
    let mut fetcher = PredictionExplainabilityFetcher::new(Arc::new(api));
    fetcher.fetch_for(&ClientRecord::new("7"));

    match fetcher.settle().await {
        DetailState::Ready {
            prediction,
            factors,
            ..
        } => {
            assert_eq!(prediction.decision().as_deref(), Some("APPROVE"));
            assert!(factors.is_empty());
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn prediction_failure_is_an_error_state() {
    let api = MockClientApi::new()
        .with_prediction_status("7", 500)
        .with_attribution("7", json!({"shapValues": {"salary": 0.5}}));
    let mut fetcher = PredictionExplainabilityFetcher::new(Arc::new(api));
    fetcher.fetch_for(&ClientRecord::new("7"));

    match fetcher.settle().await {
        DetailState::Error { id, message } => {
            assert_eq!(id, "7");
            assert!(message.contains("HTTP 500"));
        }
        other => panic!("unexpected state {other:?}"),
    }
}

#[tokio::test]
async fn coordinator_selects_records_history_and_explains() {
    let api = MockClientApi::new()
        .with_page(0, roster_page())
        .with_prediction("0000007", approve("0000007"))
        .with_attribution(
            "0000007",
            json!({"shapValues": {"region": 0.05, "salary": 0.5, "age": -0.3}}),
        );
    let mut view = coordinator(api);
    view.start();
    assert!(matches!(view.next_update().await, ViewUpdate::List(Ok(_))));
    assert_eq!(view.visible_records().len(), 2);

    view.set_query("07");
    assert_eq!(view.visible_records().len(), 1);
    assert!(view.select_visible(0));
    assert_eq!(view.history()[0].id, "0000007");
    assert!(matches!(
        view.detail_view().map(|d| d.body),
        Some(DetailBody::Loading)
    ));

    assert!(matches!(view.next_update().await, ViewUpdate::Detail));
    let detail = view.detail_view().unwrap();
    assert_eq!(detail.profile.initial, 'O');
    match detail.body {
        DetailBody::Ready {
            score,
            factors,
            fields,
        } => {
            assert_eq!(score.percent, 72);
            let keys: Vec<_> = factors.iter().map(|f| f.feature_key.as_str()).collect();
            assert_eq!(keys, vec!["salary", "age", "region"]);
            let widths: Vec<_> = factors.iter().map(|f| f.width_percent.round()).collect();
            assert_eq!(widths, vec![100.0, 60.0, 10.0]);
            assert_eq!(factors[1].sign, FactorSign::Negative);
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0].value, "1\u{a0}000\u{a0}₽");
        }
        other => panic!("unexpected body {other:?}"),
    }

    view.back();
    assert!(view.selected().is_none());
    assert_eq!(view.detail_state(), &DetailState::Idle);

    assert!(view.select_history(0));
    assert_eq!(view.selected().map(|r| r.id.as_str()), Some("0000007"));
    assert!(!view.select_history(5));
}

#[tokio::test]
async fn coordinator_surfaces_list_failure_as_status() {
    let api = MockClientApi::new().with_page_status(0, 502);
    let mut view = coordinator(api);
    view.start();
    assert!(matches!(
        view.next_update().await,
        ViewUpdate::List(Err(LoadError::Fetch { page: 0, .. }))
    ));
    assert!(view.status().is_some_and(|s| s.contains("HTTP 502")));
    assert!(view.visible_records().is_empty());
}

#[tokio::test]
async fn teardown_detaches_pending_work() {
    let api = Arc::new(MockClientApi::new().with_page(0, roster_page()));
    let gate = api.hold("page:0");
    let mut view = ViewCoordinator::new(
        api.clone(),
        HistoryStore::load(Box::new(MemoryBackend::new(None))),
        FieldFormatter::default(),
        ViewOptions::default(),
    )
    .unwrap();
    view.start();
    tokio::task::yield_now().await;
    view.teardown();
    gate.notify_one();

    assert!(!view.is_list_loading());
    let update = tokio::time::timeout(Duration::from_millis(50), view.next_update()).await;
    assert!(update.is_err());
    assert!(view.visible_records().is_empty());
}

#[test]
fn zero_page_size_is_rejected() {
    let result = ViewCoordinator::new(
        Arc::new(MockClientApi::new()),
        HistoryStore::load(Box::new(MemoryBackend::new(None))),
        FieldFormatter::default(),
        ViewOptions { page_size: 0 },
    );
    assert!(result.is_err());
}

#[tokio::test]
async fn coordinator_skips_queued_outcome_of_replaced_selection() {
    let api = MockClientApi::new()
        .with_page(0, roster_page())
        .with_prediction("0000007", approve("0000007"))
        .with_attribution("0000007", json!({"shapValues": {"age": 0.4}}))
        .with_prediction("12", approve("12"))
        .with_attribution("12", json!({"shapValues": {"salary": 0.2}}));
    let mut view = coordinator(api);
    view.start();
    assert!(matches!(view.next_update().await, ViewUpdate::List(Ok(_))));

    assert!(view.select_id("0000007"));
    // let the first fetch finish so its outcome sits in the channel
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(view.select_id("12"));

    assert!(matches!(view.next_update().await, ViewUpdate::Detail));
    match view.detail_state() {
        DetailState::Ready { id, factors, .. } => {
            assert_eq!(id, "12");
            assert_eq!(factors[0].feature_key, "salary");
        }
        other => panic!("unexpected state {other:?}"),
    }
    let history: Vec<_> = view.history().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(history, vec!["12", "0000007"]);
    assert_eq!(view.detail_view().map(|d| d.profile.id), Some("12".to_string()));
}
