use crate::{
    api::{
        error::ApiError,
        response::{created, with_total_count, ApiResponse},
    },
    models::{AddAddressRequest, AddressWithBalance, Balance, TransactionsQuery},
    service::{SyncReport, SyncSummary},
    state::AppState,
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, Method},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

// Create router with all routes
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/addresses", get(list_addresses).post(add_address))
        .route(
            "/addresses/{address}",
            get(get_address).delete(remove_address),
        )
        .route("/addresses/{address}/balance", get(get_balance))
        .route("/addresses/{address}/transactions", get(get_transactions))
        .route("/addresses/{address}/sync", post(sync_address))
        .route("/sync", post(sync_all))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn health_check() -> ApiResponse<Value> {
    ApiResponse::data(json!({
        "status": "healthy",
        "service": "address-tracker-service",
    }))
}

// GET /addresses
async fn list_addresses(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<Vec<AddressWithBalance>>, ApiError> {
    let addresses = state.addresses.list_with_balances().await?;
    Ok(ApiResponse::data(addresses))
}

// POST /addresses
async fn add_address(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddAddressRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    info!("Processing track request for address: {}", request.address);

    let tracked = state
        .addresses
        .track(&request.address, request.label.as_deref())
        .await?;

    Ok(created(tracked))
}

// GET /addresses/{address}
async fn get_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<AddressWithBalance>, ApiError> {
    let details = state.addresses.get_with_balance(&address).await?;
    Ok(ApiResponse::data(details))
}

// DELETE /addresses/{address}
async fn remove_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    state.addresses.remove(&address).await?;
    Ok(ApiResponse::message("Address removed successfully"))
}

// GET /addresses/{address}/balance
async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<Balance>, ApiError> {
    let balance = state.addresses.balance(&address).await?;
    Ok(ApiResponse::data(balance))
}

// GET /addresses/{address}/transactions?limit&offset
async fn get_transactions(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    query: Result<Query<TransactionsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query?;

    let (transactions, total_count) = state
        .addresses
        .transactions(&address, params.limit, params.offset)
        .await?;

    // Return response with total count header
    Ok(with_total_count(transactions, total_count))
}

// POST /addresses/{address}/sync
async fn sync_address(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<ApiResponse<SyncReport>, ApiError> {
    info!("Manual sync requested for {}", address);
    let report = state.synchronizer.sync_one(&address).await?;
    Ok(ApiResponse::data(report))
}

// POST /sync
async fn sync_all(
    State(state): State<Arc<AppState>>,
) -> Result<ApiResponse<SyncSummary>, ApiError> {
    info!("Manual sync requested for all addresses");
    let summary = state.synchronizer.sync_all().await?;
    Ok(ApiResponse::data(summary))
}
