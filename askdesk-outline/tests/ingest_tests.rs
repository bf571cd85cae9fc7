//! Ingestion tests against an in-process stand-in for the knowledge-base API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde_json::{Value, json};

use askdesk_outline::{OutlineClient, fetch_all};

/// Counts requests per endpoint so tests can pin exact call counts.
#[derive(Clone, Default)]
struct ApiState {
    list_calls: Arc<AtomicUsize>,
    info_calls: Arc<AtomicUsize>,
    /// Documents served on the first listing page.
    page_one: Arc<Vec<Value>>,
    /// Status returned by `documents.list` instead of data, when set.
    list_status: Option<u16>,
}

async fn collections_list() -> Json<Value> {
    Json(json!({"data": [{"id": "col1", "name": "Handbook"}]}))
}

async fn documents_list(State(state): State<ApiState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.list_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = state.list_status {
        return StatusCode::from_u16(status).unwrap().into_response();
    }
    let offset = body["offset"].as_u64().unwrap_or(0);
    let page: &[Value] = if offset == 0 { &state.page_one } else { &[] };
    Json(json!({"data": page})).into_response()
}

async fn documents_info(State(state): State<ApiState>, Json(body): Json<Value>) -> Json<Value> {
    state.info_calls.fetch_add(1, Ordering::SeqCst);
    let id = body["id"].as_str().unwrap_or_default();
    Json(json!({"data": {"id": id, "text": "Exported body text for the handbook."}}))
}

fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/collections.list", post(collections_list))
        .route("/documents.list", post(documents_list))
        .route("/documents.info", post(documents_info))
        .with_state(state)
}

async fn spawn_api(state: ApiState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn doc(id: &str, text: Option<&str>, archived: bool) -> Value {
    let mut value = json!({
        "id": id,
        "title": format!("Title {id}"),
        "url": format!("https://kb.example.com/doc/{id}"),
        "archived": archived,
    });
    if let Some(text) = text {
        value["text"] = json!(text);
    }
    value
}

#[tokio::test]
async fn pagination_stops_after_one_empty_page() {
    let state = ApiState {
        page_one: Arc::new(vec![
            doc("a", Some("First document body."), false),
            doc("b", Some("Second document body."), false),
        ]),
        ..ApiState::default()
    };
    let list_calls = state.list_calls.clone();
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(2);
    let report = fetch_all(&client, None).await.unwrap();

    assert_eq!(report.documents.len(), 2);
    assert_eq!(report.skipped, 0);
    // One full page, then exactly one empty-page probe. No extra requests.
    assert_eq!(list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn archived_and_empty_documents_are_filtered() {
    let state = ApiState {
        page_one: Arc::new(vec![
            doc("keep", Some("A perfectly normal document."), false),
            doc("archived", Some("Old content."), true),
            doc("blank", Some("   "), false),
        ]),
        ..ApiState::default()
    };
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, None).await.unwrap();

    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].id, "keep");
    assert_eq!(report.skipped, 2);
}

#[tokio::test]
async fn listing_without_inline_text_falls_back_to_document_fetch() {
    let state = ApiState {
        page_one: Arc::new(vec![doc("export-me", None, false)]),
        ..ApiState::default()
    };
    let info_calls = state.info_calls.clone();
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, None).await.unwrap();

    assert_eq!(info_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.documents.len(), 1);
    assert_eq!(report.documents[0].text, "Exported body text for the handbook.");
}

#[tokio::test]
async fn ingested_documents_carry_source_metadata() {
    let state = ApiState {
        page_one: Arc::new(vec![doc("a", Some("Body text."), false)]),
        ..ApiState::default()
    };
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, None).await.unwrap();

    let document = &report.documents[0];
    assert_eq!(document.metadata.get("title").map(String::as_str), Some("Title a"));
    assert_eq!(
        document.metadata.get("url").map(String::as_str),
        Some("https://kb.example.com/doc/a")
    );
    assert_eq!(document.metadata.get("collection").map(String::as_str), Some("Handbook"));
}

#[tokio::test]
async fn collection_filter_excludes_other_collections() {
    let state = ApiState {
        page_one: Arc::new(vec![doc("a", Some("Body text."), false)]),
        ..ApiState::default()
    };
    let list_calls = state.list_calls.clone();
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, Some("no-such-collection")).await.unwrap();

    assert!(report.documents.is_empty());
    assert_eq!(list_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn server_errors_are_retried_then_skipped() {
    let state = ApiState { list_status: Some(500), ..ApiState::default() };
    let list_calls = state.list_calls.clone();
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, None).await.unwrap();

    // The run completes with partial (here: no) results rather than failing.
    assert!(report.documents.is_empty());
    // 5xx is retried exactly once before the collection is skipped.
    assert_eq!(list_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let state = ApiState { list_status: Some(403), ..ApiState::default() };
    let list_calls = state.list_calls.clone();
    let base = spawn_api(state).await;

    let client = OutlineClient::new(&base, "token").unwrap().with_page_size(10);
    let report = fetch_all(&client, None).await.unwrap();

    assert!(report.documents.is_empty());
    assert_eq!(list_calls.load(Ordering::SeqCst), 1);
}
