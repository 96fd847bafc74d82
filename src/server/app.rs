use std::any::Any;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::{
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::error;
use utoipa::OpenApi;

use super::error::{ApiError, GENERIC_ERROR};
use super::handlers::{self, companies, drugs, health, table};
use crate::config::QueryLimits;
use crate::services::{CompanyService, DrugService};
use crate::store::DrugStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DrugStore>,
    pub drugs: DrugService,
    pub companies: CompanyService,
    pub limits: QueryLimits,
}

impl AppState {
    pub fn new(store: Arc<dyn DrugStore>, limits: QueryLimits) -> Self {
        Self {
            drugs: DrugService::new(store.clone()),
            companies: CompanyService::new(store.clone()),
            store,
            limits,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        drugs::list_drugs,
        drugs::get_drug,
        drugs::create_drug,
        companies::list_companies,
        companies::company_stats,
        table::get_table_config,
    ),
    components(schemas(
        crate::model::DrugView,
        crate::model::NewDrug,
        crate::model::Pagination,
        crate::model::CompanyStats,
        crate::model::SortField,
        crate::model::SortDirection,
        crate::services::DrugPage,
        crate::services::table_config::TableConfig,
        crate::services::table_config::ColumnConfig,
        crate::services::table_config::ColumnType,
        crate::services::table_config::PaginationDefaults,
        crate::services::table_config::SortingDefaults,
        companies::CompaniesResponse,
        companies::CompanyStatsResponse,
    ))
)]
pub struct ApiDoc;

pub async fn create_app(
    store: Arc<dyn DrugStore>,
    limits: QueryLimits,
    cors_origin: Option<&str>,
) -> Result<Router> {
    let state = AppState::new(store, limits);

    let cors_layer = match cors_origin {
        Some(origin) if origin != "*" => CorsLayer::new().allow_origin(
            origin
                .parse::<HeaderValue>()
                .map_err(|e| anyhow!("Invalid CORS origin: {}", e))?,
        ),
        _ => CorsLayer::new().allow_origin(cors::Any),
    }
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    .allow_headers(cors::Any)
    .allow_credentials(false);

    let app = Router::new()
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_document))
        .nest("/api", api_routes())
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                ))
                .layer(cors_layer),
        )
        .with_state(state);

    Ok(app)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/drugs", get(drugs::list_drugs).post(drugs::create_drug))
        .route("/drugs/:id", get(drugs::get_drug))
        .route("/companies", get(companies::list_companies))
        .route("/companies/stats", get(companies::company_stats))
        .route("/config", get(table::get_table_config))
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Request handler panicked: {}", detail);
    ApiError::internal(GENERIC_ERROR).into_response()
}
