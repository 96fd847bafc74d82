use axum::response::Json;

use crate::services::table_config::{table_config, TableConfig};

#[utoipa::path(
    get,
    path = "/api/config",
    responses(
        (status = 200, description = "Table column, pagination and sorting configuration", body = TableConfig)
    )
)]
pub async fn get_table_config() -> Json<TableConfig> {
    Json(table_config())
}
