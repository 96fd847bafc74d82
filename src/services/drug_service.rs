use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::{IntoParams, ToSchema};

use crate::config::QueryLimits;
use crate::errors::{DrugError, DrugResult};
use crate::model::{
    DrugFilter, DrugView, FindQuery, NewDrug, Pagination, SortDirection, SortField, SortSpec,
};
use crate::store::DrugStore;

/// Raw `GET /api/drugs` query string, exactly as received.
///
/// Everything is kept as text so that validation produces our own messages
/// instead of extractor rejections.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DrugListParams {
    /// Exact company name; blank means no filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    /// 1-based page number (default 1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Page size (default 50)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<String>,
    /// code, genericName, brandName, company or launchDate (default launchDate)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// asc or desc (default desc)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,
}

/// A validated list request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrugListRequest {
    pub filter: DrugFilter,
    pub page: u64,
    pub page_size: u64,
    pub sort: SortSpec,
}

impl DrugListRequest {
    pub fn from_params(params: &DrugListParams, limits: &QueryLimits) -> DrugResult<Self> {
        let page = parse_positive("page", params.page.as_deref())?.unwrap_or(1);
        let page_size = parse_positive("limit", params.limit.as_deref())?
            .unwrap_or(limits.default_page_size);
        if page_size > limits.max_page_size {
            return Err(DrugError::InvalidQuery(format!(
                "limit must not exceed {}",
                limits.max_page_size
            )));
        }

        let mut sort = SortSpec::default();
        if let Some(field) = non_blank(params.sort_by.as_deref()) {
            sort.field = field.parse::<SortField>().map_err(DrugError::InvalidQuery)?;
        }
        if let Some(direction) = non_blank(params.sort_order.as_deref()) {
            sort.direction = direction
                .parse::<SortDirection>()
                .map_err(DrugError::InvalidQuery)?;
        }

        Ok(Self {
            filter: DrugFilter::by_company(params.company.as_deref()),
            page,
            page_size,
            sort,
        })
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    fn find_query(&self) -> FindQuery {
        FindQuery {
            filter: self.filter.clone(),
            sort: self.sort,
            skip: self.skip(),
            limit: self.page_size,
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_positive(name: &str, raw: Option<&str>) -> DrugResult<Option<u64>> {
    let Some(raw) = non_blank(raw) else {
        return Ok(None);
    };
    match raw.parse::<u64>() {
        Ok(value) if value >= 1 => Ok(Some(value)),
        _ => Err(DrugError::InvalidQuery(format!(
            "{} must be a positive integer",
            name
        ))),
    }
}

/// One page of drugs plus its pagination envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DrugPage {
    pub drugs: Vec<DrugView>,
    pub pagination: Pagination,
}

/// Resolves list, lookup and create requests against a [`DrugStore`]
#[derive(Clone)]
pub struct DrugService {
    store: Arc<dyn DrugStore>,
}

impl DrugService {
    pub fn new(store: Arc<dyn DrugStore>) -> Self {
        Self { store }
    }

    /// Run a list request. Sequential ids are `skip + index + 1`, the rank of each
    /// record in the whole filtered, sorted set at the time of this call.
    pub async fn list_drugs(&self, request: &DrugListRequest) -> DrugResult<DrugPage> {
        debug!(
            "Listing drugs: company={:?} page={} limit={} sort={} {}",
            request.filter.company,
            request.page,
            request.page_size,
            request.sort.field,
            request.sort.direction
        );

        let total_count = self.store.count(&request.filter).await?;
        let skip = request.skip();
        let records = if skip >= total_count {
            Vec::new()
        } else {
            self.store.find(&request.find_query()).await?
        };

        let drugs = records
            .into_iter()
            .enumerate()
            .map(|(index, drug)| {
                DrugView::ranked(drug, skip.saturating_add(index as u64).saturating_add(1))
            })
            .collect();

        Ok(DrugPage {
            drugs,
            pagination: Pagination::compute(request.page, request.page_size, total_count),
        })
    }

    pub async fn get_drug(&self, id: i32) -> DrugResult<DrugView> {
        self.store
            .find_by_id(id)
            .await?
            .map(DrugView::from)
            .ok_or(DrugError::NotFound(id))
    }

    pub async fn create_drug(&self, drug: NewDrug) -> DrugResult<DrugView> {
        let drug = validate_new_drug(drug)?;
        let created = self.store.insert(drug).await?;
        info!("Created drug {} ({})", created.code, created.id);
        Ok(created.into())
    }
}

fn required(name: &str, value: String) -> DrugResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DrugError::Validation(format!("{} is required", name)));
    }
    Ok(trimmed.to_string())
}

pub fn validate_new_drug(drug: NewDrug) -> DrugResult<NewDrug> {
    Ok(NewDrug {
        code: required("code", drug.code)?,
        generic_name: required("genericName", drug.generic_name)?,
        brand_name: required("brandName", drug.brand_name)?,
        company: required("company", drug.company)?,
        launch_date: drug.launch_date,
    })
}
