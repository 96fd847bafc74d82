pub mod companies;
pub mod drugs;
pub mod health;
pub mod table;

use super::error::ApiError;

pub async fn not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
