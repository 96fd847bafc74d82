use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use crate::errors::StoreResult;
use crate::server::app::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store are reachable"),
        (status = 503, description = "Store is unreachable")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let timestamp = Utc::now().to_rfc3339();

    let counts: StoreResult<(u64, usize)> = async {
        let drugs = state.store.count_all().await?;
        let companies = state.store.distinct_companies().await?.len();
        Ok((drugs, companies))
    }
    .await;

    match counts {
        Ok((drug_count, company_count)) => (
            StatusCode::OK,
            Json(json!({
                "status": "OK",
                "service": "drugtable",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": timestamp,
                "database": "connected",
                "drugCount": drug_count,
                "companyCount": company_count
            })),
        ),
        Err(err) => {
            error!("Health check failed: {}", err);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "ERROR",
                    "service": "drugtable",
                    "version": env!("CARGO_PKG_VERSION"),
                    "timestamp": timestamp,
                    "database": "disconnected"
                })),
            )
        }
    }
}
