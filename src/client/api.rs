use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::state::DrugQuery;
use crate::config::ClientConfig;
use crate::services::{DrugListParams, DrugPage, TableConfig};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure, timeout or undecodable body
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// The calls the table client makes against the drug API
#[async_trait]
pub trait DrugApi: Send + Sync {
    async fn fetch_config(&self) -> ClientResult<TableConfig>;

    async fn fetch_companies(&self) -> ClientResult<Vec<String>>;

    async fn fetch_drugs(&self, query: &DrugQuery) -> ClientResult<DrugPage>;
}

#[derive(Deserialize)]
struct CompaniesBody {
    companies: Vec<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP implementation of [`DrugApi`]
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: Option<&DrugListParams>,
    ) -> ClientResult<T> {
        let mut request = self.http.get(self.url(path));
        if let Some(params) = params {
            request = request.query(params);
        }
        debug!("GET {}", path);

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
            };
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl DrugApi for ApiClient {
    async fn fetch_config(&self) -> ClientResult<TableConfig> {
        self.get_json("/api/config", None).await
    }

    async fn fetch_companies(&self) -> ClientResult<Vec<String>> {
        let body: CompaniesBody = self.get_json("/api/companies", None).await?;
        Ok(body.companies)
    }

    async fn fetch_drugs(&self, query: &DrugQuery) -> ClientResult<DrugPage> {
        self.get_json("/api/drugs", Some(&query.to_params())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let client = ApiClient::new(&ClientConfig {
            base_url: "http://localhost:3000/".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        assert_eq!(client.url("/api/config"), "http://localhost:3000/api/config");
    }
}
