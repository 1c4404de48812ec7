// Axum request handlers — translate staff HTTP requests into store reads and writes.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Form, Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{debug, error};

use super::pages;
use crate::config::{DELIVERIES_TABLE, EQUIPMENT_TABLE, MAX_LOCATION_LEN};
use crate::metrics;
use crate::store::record::{Delivery, DeliveryStatus, RecordUpdate, Tool, ToolAction};
use crate::store::traits::{filter_by_id, RecordStore};

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn RecordStore>,
}

pub struct WebServer {
    port: u16,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl WebServer {
    /// Bind `addr` and start serving, returning a handle.
    pub async fn start(store: Arc<dyn RecordStore>, addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let app = build_router(AppState { store });

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        Ok(Self {
            port,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Shutdown the server gracefully.
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/{tool_id}/", get(tool_view).post(tool_update))
        .route("/t/{tool_id}/", get(tool_view).post(tool_update))
        .route("/d/", get(delivery_lookup))
        .route("/d/{delivery_id}/", get(delivery_view).post(delivery_update))
        .route("/metrics", get(metrics_handler))
        .route("/metrics/", get(metrics_handler))
        .with_state(state)
}

/// Row ids come from scanned labels; accept plain decimal digits only,
/// anything else is an unknown URL.
fn parse_row_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn validate_location(location: &str) -> Result<String, &'static str> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err("Location is required.");
    }
    if trimmed.chars().count() > MAX_LOCATION_LEN {
        return Err("Location is too long (200 characters max).");
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum TrackingCode {
    Empty,
    Invalid,
    Valid(String),
}

/// Case-fold a submitted tracking code and restrict it to `[a-z0-9]`.
///
/// The accepted value is interpolated into a SQL statement, so the
/// allow-list is what keeps that interpolation safe.
fn parse_tracking(raw: &str) -> TrackingCode {
    let code = raw.trim().to_lowercase();
    if code.is_empty() {
        return TrackingCode::Empty;
    }
    if code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        TrackingCode::Valid(code)
    } else {
        TrackingCode::Invalid
    }
}

fn internal_error(err: &anyhow::Error) -> Response {
    error!("store request failed: {:#}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(pages::not_found(what))).into_response()
}

async fn fetch_tool(store: &dyn RecordStore, id: i64) -> Result<Option<Tool>> {
    let records = store
        .fetch_table(EQUIPMENT_TABLE, Some(&filter_by_id(id)))
        .await?;
    Ok(records.first().map(Tool::from_record))
}

async fn fetch_delivery(store: &dyn RecordStore, id: i64) -> Result<Option<Delivery>> {
    let records = store
        .fetch_table(DELIVERIES_TABLE, Some(&filter_by_id(id)))
        .await?;
    Ok(records.first().map(Delivery::from_record))
}

/// GET / — top-level index page, just a nice pointer to the real entry points.
async fn index_handler() -> Html<String> {
    Html(pages::index())
}

/// GET /{tool_id}/ and /t/{tool_id}/ — show a tool's status and the update form.
async fn tool_view(State(state): State<AppState>, Path(tool_id): Path<String>) -> Response {
    let Some(id) = parse_row_id(&tool_id) else {
        return not_found("No matching tool.");
    };

    match fetch_tool(state.store.as_ref(), id).await {
        Ok(Some(tool)) => Html(pages::tool(&tool, None)).into_response(),
        Ok(None) => not_found("No matching tool."),
        Err(e) => internal_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct ToolForm {
    #[serde(default)]
    action: String,
    #[serde(default)]
    location: String,
}

/// POST /{tool_id}/ — check a tool in or out and record where it went.
async fn tool_update(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    uri: Uri,
    Form(form): Form<ToolForm>,
) -> Response {
    let Some(id) = parse_row_id(&tool_id) else {
        return not_found("No matching tool.");
    };

    let tool = match fetch_tool(state.store.as_ref(), id).await {
        Ok(Some(tool)) => tool,
        Ok(None) => return not_found("No matching tool."),
        Err(e) => return internal_error(&e),
    };

    let location = match validate_location(&form.location) {
        Ok(location) => location,
        Err(msg) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(pages::tool(&tool, Some(msg))),
            )
                .into_response();
        }
    };

    let action = ToolAction::from_form(&form.action);
    let update = RecordUpdate::new(id)
        .set("Status", action.status())
        .set("Location", location);

    debug!("tool {} update action={:?}", id, action);
    match state.store.update_records(EQUIPMENT_TABLE, &[update]).await {
        // Reload the page the form was posted to.
        Ok(()) => Redirect::to(uri.path()).into_response(),
        Err(e) => internal_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct LookupQuery {
    tracking: Option<String>,
}

/// GET /d/ — tracking-number search; a match redirects to the delivery's page.
async fn delivery_lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let raw = query.tracking.unwrap_or_default();

    let code = match parse_tracking(&raw) {
        TrackingCode::Empty => return Html(pages::delivery_lookup(None)).into_response(),
        TrackingCode::Invalid => {
            return (
                StatusCode::BAD_REQUEST,
                Html(pages::bad_request(
                    "Tracking numbers may only contain letters and digits.",
                )),
            )
                .into_response();
        }
        TrackingCode::Valid(code) => code,
    };

    let statement = format!(
        "select id from {} where lower(Tracking_Number) = '{}'",
        DELIVERIES_TABLE, code
    );

    let rows = match state.store.run_sql(&statement).await {
        Ok(rows) => rows,
        Err(e) => return internal_error(&e),
    };

    match rows
        .first()
        .and_then(|row| row.get("id"))
        .and_then(|v| v.as_i64())
    {
        Some(id) => Redirect::to(&format!("/d/{}/", id)).into_response(),
        None => Html(pages::delivery_lookup(Some(
            "No delivery found for that tracking number.",
        )))
        .into_response(),
    }
}

/// GET /d/{delivery_id}/ — show a delivery and the status form.
async fn delivery_view(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
) -> Response {
    let Some(id) = parse_row_id(&delivery_id) else {
        return not_found("No matching delivery.");
    };

    match fetch_delivery(state.store.as_ref(), id).await {
        Ok(Some(delivery)) => Html(pages::delivery(&delivery, None)).into_response(),
        Ok(None) => not_found("No matching delivery."),
        Err(e) => internal_error(&e),
    }
}

#[derive(Debug, Deserialize)]
struct DeliveryForm {
    #[serde(default)]
    status: String,
    #[serde(default)]
    location: String,
}

/// POST /d/{delivery_id}/ — set a delivery's status, clearing the location
/// once it has been collected.
async fn delivery_update(
    State(state): State<AppState>,
    Path(delivery_id): Path<String>,
    uri: Uri,
    Form(form): Form<DeliveryForm>,
) -> Response {
    let Some(id) = parse_row_id(&delivery_id) else {
        return not_found("No matching delivery.");
    };

    let delivery = match fetch_delivery(state.store.as_ref(), id).await {
        Ok(Some(delivery)) => delivery,
        Ok(None) => return not_found("No matching delivery."),
        Err(e) => return internal_error(&e),
    };

    let Some(status) = DeliveryStatus::from_form(&form.status) else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(pages::delivery(&delivery, Some("Unknown delivery status."))),
        )
            .into_response();
    };

    let location = if status.keeps_location() {
        let trimmed = form.location.trim();
        if trimmed.chars().count() > MAX_LOCATION_LEN {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(pages::delivery(
                    &delivery,
                    Some("Location is too long (200 characters max)."),
                )),
            )
                .into_response();
        }
        trimmed.to_string()
    } else {
        // Collected shipments have left the site.
        String::new()
    };

    let update = RecordUpdate::new(id)
        .set("Status", status.as_str())
        .set("Location", location);

    debug!("delivery {} update status={}", id, status.as_str());
    match state.store.update_records(DELIVERIES_TABLE, &[update]).await {
        Ok(()) => Redirect::to(uri.path()).into_response(),
        Err(e) => internal_error(&e),
    }
}

/// GET /metrics — equipment status counts in Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    let records = match state.store.fetch_table(EQUIPMENT_TABLE, None).await {
        Ok(records) => records,
        Err(e) => return internal_error(&e),
    };

    let counts = metrics::count_statuses(&records);
    let body = metrics::render_exposition(&counts, metrics::epoch_ms());

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, metrics::EXPOSITION_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
