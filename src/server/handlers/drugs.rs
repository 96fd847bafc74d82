use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::Json,
};

use crate::model::{DrugView, NewDrug};
use crate::server::app::AppState;
use crate::server::error::ApiError;
use crate::services::{DrugListParams, DrugListRequest, DrugPage};

#[utoipa::path(
    get,
    path = "/api/drugs",
    params(DrugListParams),
    responses(
        (status = 200, description = "One page of drugs with sequential ids", body = DrugPage),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn list_drugs(
    State(state): State<AppState>,
    params: Result<Query<DrugListParams>, QueryRejection>,
) -> Result<Json<DrugPage>, ApiError> {
    let Query(params) =
        params.map_err(|e| ApiError::bad_request(format!("Invalid query string: {}", e.body_text())))?;

    let request = DrugListRequest::from_params(&params, &state.limits)
        .map_err(|e| ApiError::from_drug_error(e, "Failed to fetch drugs"))?;

    let page = state
        .drugs
        .list_drugs(&request)
        .await
        .map_err(|e| ApiError::from_drug_error(e, "Failed to fetch drugs"))?;

    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/drugs/{id}",
    params(
        ("id" = i32, Path, description = "Drug ID")
    ),
    responses(
        (status = 200, description = "Drug found", body = DrugView),
        (status = 400, description = "Malformed drug ID"),
        (status = 404, description = "Drug not found")
    )
)]
pub async fn get_drug(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DrugView>, ApiError> {
    let id: i32 = id
        .trim()
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid drug ID"))?;

    let drug = state
        .drugs
        .get_drug(id)
        .await
        .map_err(|e| ApiError::from_drug_error(e, "Failed to fetch drug"))?;

    Ok(Json(drug))
}

#[utoipa::path(
    post,
    path = "/api/drugs",
    request_body = NewDrug,
    responses(
        (status = 201, description = "Drug created", body = DrugView),
        (status = 400, description = "Invalid payload or duplicate code"),
        (status = 500, description = "Store failure")
    )
)]
pub async fn create_drug(
    State(state): State<AppState>,
    payload: Result<Json<NewDrug>, JsonRejection>,
) -> Result<(StatusCode, Json<DrugView>), ApiError> {
    let Json(payload) =
        payload.map_err(|e| ApiError::bad_request(format!("Invalid drug payload: {}", e.body_text())))?;

    let drug = state
        .drugs
        .create_drug(payload)
        .await
        .map_err(|e| ApiError::from_drug_error(e, "Failed to create drug"))?;

    Ok((StatusCode::CREATED, Json(drug)))
}
