// Integration test for GristClient against a fake Grist upstream.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use toolcrib::store::grist::GristClient;
use toolcrib::store::record::RecordUpdate;
use toolcrib::store::traits::{filter_by_id, RecordStore};

const API_KEY: &str = "test-key";

/// What the fake upstream saw, for assertions.
#[derive(Default)]
struct Captured {
    filter: Option<String>,
    sql: Option<String>,
    patch_body: Option<Value>,
}

type Shared = Arc<Mutex<Captured>>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", API_KEY))
}

async fn records_get(
    State(captured): State<Shared>,
    Path((_doc, table)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})));
    }
    captured.lock().unwrap().filter = params.get("filter").cloned();

    let records = if table == "Equipment" {
        json!({"records": [
            {"id": 7, "fields": {"Status": "Available", "Location": "Shelf A"}},
        ]})
    } else {
        json!({"records": []})
    };
    (StatusCode::OK, Json(records))
}

async fn records_patch(
    State(captured): State<Shared>,
    Path((_doc, _table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !authorized(&headers) {
        return (StatusCode::FORBIDDEN, Json(json!({"error": "forbidden"})));
    }
    captured.lock().unwrap().patch_body = Some(body);
    (StatusCode::OK, Json(json!(null)))
}

async fn sql_get(
    State(captured): State<Shared>,
    Path(_doc): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    captured.lock().unwrap().sql = params.get("q").cloned();
    Json(json!({
        "statement": params.get("q"),
        "records": [{"fields": {"id": 5}}],
    }))
}

async fn start_upstream(captured: Shared) -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/docs/{doc}/tables/{table}/records",
            get(records_get).patch(records_patch),
        )
        .route("/api/docs/{doc}/sql", get(sql_get))
        .with_state(captured);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

fn test_client(addr: SocketAddr, api_key: &str) -> GristClient {
    GristClient::new(
        format!("http://{}", addr),
        "doc123".to_string(),
        api_key.to_string(),
    )
}

#[tokio::test]
async fn test_fetch_table_with_filter() {
    let captured: Shared = Arc::default();
    let addr = start_upstream(captured.clone()).await;
    let client = test_client(addr, API_KEY);

    let records = client
        .fetch_table("Equipment", Some(&filter_by_id(7)))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 7);
    assert_eq!(records[0].fields["Status"], json!("Available"));

    // The filter went over the wire as the JSON the records API expects.
    let filter = captured.lock().unwrap().filter.clone().unwrap();
    assert_eq!(
        serde_json::from_str::<Value>(&filter).unwrap(),
        json!({"id": [7]})
    );
}

#[tokio::test]
async fn test_fetch_table_without_filter() {
    let captured: Shared = Arc::default();
    let addr = start_upstream(captured.clone()).await;
    let client = test_client(addr, API_KEY);

    client.fetch_table("Equipment", None).await.unwrap();
    assert!(captured.lock().unwrap().filter.is_none());
}

#[tokio::test]
async fn test_update_records_patch_body() {
    let captured: Shared = Arc::default();
    let addr = start_upstream(captured.clone()).await;
    let client = test_client(addr, API_KEY);

    let update = RecordUpdate::new(7)
        .set("Status", "In Use")
        .set("Location", "Stage B");
    client.update_records("Equipment", &[update]).await.unwrap();

    let body = captured.lock().unwrap().patch_body.clone().unwrap();
    assert_eq!(
        body,
        json!({"records": [
            {"id": 7, "fields": {"Status": "In Use", "Location": "Stage B"}},
        ]})
    );
}

#[tokio::test]
async fn test_run_sql() {
    let captured: Shared = Arc::default();
    let addr = start_upstream(captured.clone()).await;
    let client = test_client(addr, API_KEY);

    let statement = "select id from Deliveries where lower(Tracking_Number) = 'ab12'";
    let rows = client.run_sql(statement).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], json!(5));
    assert_eq!(captured.lock().unwrap().sql.as_deref(), Some(statement));
}

#[tokio::test]
async fn test_auth_rejected() {
    let captured: Shared = Arc::default();
    let addr = start_upstream(captured).await;
    let client = test_client(addr, "wrong-key");

    let err = client.fetch_table("Equipment", None).await.unwrap_err();
    assert!(err.to_string().contains("auth_rejected"));
}
