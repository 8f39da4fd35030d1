use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{DealerId, ValuationRequest};
use super::pricing::{PriceBreakdownEntry, PriceFactors};
use super::report::ValuationReport;
use super::repository::{AlgorithmConfigStore, MarketDataSource, ValuationSink, VehicleCatalog};
use super::service::{ValuationOutcome, ValuationService, ValuationServiceError};

const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Response body for a successful estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationView {
    pub final_price: u64,
    pub displayed_estimate: u64,
    pub market_average: Option<u64>,
    pub factors: PriceFactors,
    pub breakdown: Vec<PriceBreakdownEntry>,
    pub report: ValuationReport,
}

impl From<ValuationOutcome> for ValuationView {
    fn from(outcome: ValuationOutcome) -> Self {
        Self {
            final_price: outcome.result.final_price,
            displayed_estimate: outcome.estimate.displayed_estimate,
            market_average: outcome.estimate.market_average,
            factors: outcome.result.factors,
            breakdown: outcome.result.breakdown,
            report: outcome.report,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    limit: Option<usize>,
}

/// Router builder exposing the estimate and audit history endpoints.
pub fn valuation_router<C, K, S, M>(service: Arc<ValuationService<C, K, S, M>>) -> Router
where
    C: VehicleCatalog + 'static,
    K: AlgorithmConfigStore + 'static,
    S: ValuationSink + 'static,
    M: MarketDataSource + 'static,
{
    Router::new()
        .route("/api/v1/valuations", post(estimate_handler::<C, K, S, M>))
        .route(
            "/api/v1/dealers/:dealer_id/valuations",
            get(history_handler::<C, K, S, M>),
        )
        .with_state(service)
}

pub(crate) async fn estimate_handler<C, K, S, M>(
    State(service): State<Arc<ValuationService<C, K, S, M>>>,
    payload: Result<axum::Json<ValuationRequest>, JsonRejection>,
) -> Response
where
    C: VehicleCatalog + 'static,
    K: AlgorithmConfigStore + 'static,
    S: ValuationSink + 'static,
    M: MarketDataSource + 'static,
{
    let request = match payload {
        Ok(axum::Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    match service.estimate(request).await {
        Ok(outcome) => {
            let view = ValuationView::from(outcome);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn history_handler<C, K, S, M>(
    State(service): State<Arc<ValuationService<C, K, S, M>>>,
    Path(dealer_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    C: VehicleCatalog + 'static,
    K: AlgorithmConfigStore + 'static,
    S: ValuationSink + 'static,
    M: MarketDataSource + 'static,
{
    let dealer = DealerId(dealer_id);
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    match service.history(&dealer, limit).await {
        Ok(records) => {
            let payload = json!({
                "dealerId": dealer.0,
                "valuations": records,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub(crate) fn status_for(err: &ValuationServiceError) -> StatusCode {
    match err {
        ValuationServiceError::Validation(_) | ValuationServiceError::Unpriceable(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        ValuationServiceError::VehicleNotFound(_) | ValuationServiceError::ConfigNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        ValuationServiceError::ConfigInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ValuationServiceError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ValuationServiceError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Body extraction failures keep axum's status but use the JSON error shape.
fn rejection_response(rejection: &JsonRejection) -> Response {
    let payload = json!({
        "error": rejection.body_text(),
    });
    (rejection.status(), axum::Json(payload)).into_response()
}

fn error_response(err: &ValuationServiceError) -> Response {
    let payload = json!({
        "error": err.to_string(),
    });
    (status_for(err), axum::Json(payload)).into_response()
}
