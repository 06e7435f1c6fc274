use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde_json::Value;

use super::{ApiError, AppState, HealthResponse};
use crate::models::{PriceRequest, PriceResponse};

pub async fn get_prices(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<PriceResponse>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::warn!("Rejected price request body: {}", rejection);
        ApiError::bad_request("request body must be JSON")
    })?;

    let request: PriceRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::bad_request("JSON body must contain a 'products' list"))?;

    tracing::info!("Price request for {} products", request.products.len());

    let results = state.lookup.lookup_items(&request.products).await;
    Ok(Json(PriceResponse { results }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let session = state.lookup.session_state().await;
    Json(HealthResponse::from_session(
        session,
        state.started_at.elapsed().as_secs(),
        state.lookup.threshold(),
    ))
}
