//! In-memory stand-in for the ShipStation REST API.
//!
//! # Design
//! Every request passes through `gate`, which rejects anything without the
//! expected Basic `Authorization` header and stamps the configured
//! `X-Rate-Limit-*` headers on the response. Behind it sit a small orders
//! store, shipments derived from shipped orders, and a fallback that echoes
//! any other request back as JSON so tests can assert on the wire format.
//! Unrouted paths and unsupported methods on routed paths both reach the echo.
//! A `padding=N` query parameter makes the echo reply carry N filler bytes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Credentials the server accepts and the rate-limit headers it reports.
#[derive(Clone, Debug)]
pub struct MockConfig {
    pub api_key: String,
    pub api_secret: String,
    pub rate_limit_limit: u32,
    pub rate_limit_remaining: u32,
    pub rate_limit_reset: u32,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            api_key: "test-key".to_string(),
            api_secret: "test-secret".to_string(),
            rate_limit_limit: 40,
            rate_limit_remaining: 39,
            rate_limit_reset: 30,
        }
    }
}

impl MockConfig {
    pub fn expected_authorization(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.api_key, self.api_secret));
        format!("Basic {token}")
    }
}

pub type Db = Arc<RwLock<BTreeMap<u64, Value>>>;

#[derive(Clone)]
struct AppState {
    config: Arc<MockConfig>,
    authorization: Arc<str>,
    orders: Db,
    next_id: Arc<AtomicU64>,
}

pub fn app() -> Router {
    app_with(MockConfig::default())
}

pub fn app_with(config: MockConfig) -> Router {
    let state = AppState {
        authorization: config.expected_authorization().into(),
        config: Arc::new(config),
        orders: Arc::new(RwLock::new(BTreeMap::new())),
        next_id: Arc::new(AtomicU64::new(1)),
    };
    Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/createorder", post(create_order))
        .route("/orders/{id}", get(get_order).delete(delete_order))
        .route("/shipments", get(list_shipments))
        .fallback(echo)
        .method_not_allowed_fallback(echo)
        .layer(middleware::from_fn_with_state(state.clone(), gate))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, MockConfig::default()).await
}

pub async fn run_with(listener: TcpListener, config: MockConfig) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(config)).await
}

async fn gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(&*state.authorization);

    let mut response = if authorized {
        next.run(request).await
    } else {
        tracing::debug!(uri = %request.uri(), "rejecting unauthenticated request");
        (StatusCode::UNAUTHORIZED, "401 Unauthorized").into_response()
    };

    let headers = response.headers_mut();
    headers.insert("x-rate-limit-limit", HeaderValue::from(state.config.rate_limit_limit));
    headers.insert(
        "x-rate-limit-remaining",
        HeaderValue::from(state.config.rate_limit_remaining),
    );
    headers.insert("x-rate-limit-reset", HeaderValue::from(state.config.rate_limit_reset));
    response
}

fn page(field: &str, items: Vec<Value>) -> Json<Value> {
    let total = items.len();
    Json(json!({
        field: items,
        "total": total,
        "page": 1,
        "pages": if total == 0 { 0 } else { 1 },
    }))
}

fn str_field<'a>(order: &'a Value, field: &str) -> Option<&'a str> {
    order.get(field).and_then(Value::as_str)
}

async fn list_orders(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let orders = state.orders.read().await;
    let matching = orders
        .values()
        .filter(|order| match params.get("orderNumber") {
            Some(number) => {
                str_field(order, "orderNumber").is_some_and(|n| n.starts_with(number.as_str()))
            }
            None => true,
        })
        .filter(|order| match params.get("orderStatus") {
            Some(status) => str_field(order, "orderStatus") == Some(status.as_str()),
            None => true,
        })
        .cloned()
        .collect();
    page("orders", matching)
}

async fn create_order(
    State(state): State<AppState>,
    Json(input): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Value::Object(mut order) = input else {
        return Err(bad_request("order must be a JSON object"));
    };
    if !order.get("orderNumber").is_some_and(Value::is_string) {
        return Err(bad_request("orderNumber is required"));
    }

    let mut orders = state.orders.write().await;
    let existing = str_field_map(&order, "orderKey").and_then(|key| {
        orders
            .iter()
            .find(|(_, stored)| str_field(stored, "orderKey") == Some(key))
            .map(|(id, _)| *id)
    });
    let id = existing.unwrap_or_else(|| state.next_id.fetch_add(1, Ordering::SeqCst));

    order.insert("orderId".to_string(), json!(id));
    order
        .entry("orderKey")
        .or_insert_with(|| json!(Uuid::new_v4().simple().to_string()));
    order
        .entry("orderStatus")
        .or_insert_with(|| json!("awaiting_payment"));

    let order = Value::Object(order);
    orders.insert(id, order.clone());
    Ok(Json(order))
}

fn str_field_map<'a>(order: &'a Map<String, Value>, field: &str) -> Option<&'a str> {
    order.get(field).and_then(Value::as_str)
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "Message": "The request is invalid.", "ExceptionMessage": message })),
    )
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let orders = state.orders.read().await;
    orders.get(&id).cloned().map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, StatusCode> {
    let mut orders = state.orders.write().await;
    orders
        .remove(&id)
        .map(|_| {
            Json(json!({
                "success": true,
                "message": "The requested order has been deleted."
            }))
        })
        .ok_or(StatusCode::NOT_FOUND)
}

async fn list_shipments(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let orders = state.orders.read().await;
    let shipments = orders
        .iter()
        .filter(|(_, order)| str_field(order, "orderStatus") == Some("shipped"))
        .filter(|(_, order)| match params.get("orderNumber") {
            Some(number) => str_field(order, "orderNumber") == Some(number.as_str()),
            None => true,
        })
        .map(|(id, order)| {
            json!({
                "shipmentId": id * 100,
                "orderId": id,
                "orderNumber": order.get("orderNumber"),
                "trackingNumber": order.get("trackingNumber").cloned().unwrap_or(Value::Null),
            })
        })
        .collect();
    page("shipments", shipments)
}

async fn echo(
    method: Method,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Json<Value> {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let padding = params
        .get("padding")
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);
    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "contentType": header_value(header::CONTENT_TYPE),
        "authorization": header_value(header::AUTHORIZATION),
        "body": body,
        "padding": "x".repeat(padding),
    }))
}
