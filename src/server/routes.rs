use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;

use super::error::ApiError;
use crate::core::{ExchangeRateObservation, GoldPriceObservation};
use crate::query::QueryService;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Newest `limit` records; full history when absent.
    limit: Option<usize>,
}

pub fn history_routes() -> Router<Arc<QueryService>> {
    Router::new()
        .route("/gold-history/", get(gold_history))
        .route("/currency-history/", get(currency_history))
}

async fn gold_history(
    State(service): State<Arc<QueryService>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<GoldPriceObservation>>, ApiError> {
    Ok(Json(service.gold_history(q.limit).await?))
}

async fn currency_history(
    State(service): State<Arc<QueryService>>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<Vec<ExchangeRateObservation>>, ApiError> {
    Ok(Json(service.rate_history(q.limit).await?))
}
