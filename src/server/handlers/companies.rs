use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::CompanyStats;
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompaniesResponse {
    pub companies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStatsResponse {
    pub company_stats: Vec<CompanyStats>,
}

#[utoipa::path(
    get,
    path = "/api/companies",
    responses(
        (status = 200, description = "Distinct company names, case-insensitively sorted", body = CompaniesResponse),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
) -> Result<Json<CompaniesResponse>, ApiError> {
    let companies = state
        .companies
        .list_companies()
        .await
        .map_err(|e| ApiError::from_drug_error(e, "Failed to fetch companies"))?;

    Ok(Json(CompaniesResponse { companies }))
}

#[utoipa::path(
    get,
    path = "/api/companies/stats",
    responses(
        (status = 200, description = "Drug count and launch range per company", body = CompanyStatsResponse),
        (status = 500, description = "Store failure")
    )
)]
pub async fn company_stats(
    State(state): State<AppState>,
) -> Result<Json<CompanyStatsResponse>, ApiError> {
    let company_stats = state
        .companies
        .company_stats()
        .await
        .map_err(|e| ApiError::from_drug_error(e, "Failed to fetch company statistics"))?;

    Ok(Json(CompanyStatsResponse { company_stats }))
}
