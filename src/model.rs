use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored drug record. `code` is the unique key; `id` is assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Drug {
    pub id: i32,
    pub code: String,
    pub generic_name: String,
    pub brand_name: String,
    pub company: String,
    pub launch_date: DateTime<Utc>,
}

impl Drug {
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.generic_name, self.brand_name)
    }
}

/// Payload for creating a drug
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewDrug {
    pub code: String,
    pub generic_name: String,
    pub brand_name: String,
    pub company: String,
    pub launch_date: DateTime<Utc>,
}

impl NewDrug {
    pub fn into_drug(self, id: i32) -> Drug {
        Drug {
            id,
            code: self.code,
            generic_name: self.generic_name,
            brand_name: self.brand_name,
            company: self.company,
            launch_date: self.launch_date,
        }
    }
}

/// A drug as it crosses the API boundary, carrying the derived fields.
///
/// `sequential_id` is the 1-based rank of the record within the filtered, sorted
/// result set of one particular list request. It is recomputed per request and is
/// never an identity; use `code` (or `id`) for that.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DrugView {
    pub id: i32,
    pub code: String,
    pub generic_name: String,
    pub brand_name: String,
    pub company: String,
    pub launch_date: DateTime<Utc>,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequential_id: Option<u64>,
}

impl DrugView {
    pub fn ranked(drug: Drug, sequential_id: u64) -> Self {
        let mut view = Self::from(drug);
        view.sequential_id = Some(sequential_id);
        view
    }
}

impl From<Drug> for DrugView {
    fn from(drug: Drug) -> Self {
        let display_name = drug.display_name();
        Self {
            id: drug.id,
            code: drug.code,
            generic_name: drug.generic_name,
            brand_name: drug.brand_name,
            company: drug.company,
            launch_date: drug.launch_date,
            display_name,
            sequential_id: None,
        }
    }
}

/// Sortable drug fields, named as they appear on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Code,
    GenericName,
    BrandName,
    Company,
    LaunchDate,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Code,
        SortField::GenericName,
        SortField::BrandName,
        SortField::Company,
        SortField::LaunchDate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Code => "code",
            SortField::GenericName => "genericName",
            SortField::BrandName => "brandName",
            SortField::Company => "company",
            SortField::LaunchDate => "launchDate",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| format!("Invalid sortBy field: {}", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Invalid sortOrder: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::LaunchDate,
            direction: SortDirection::Desc,
        }
    }
}

/// Record filter. An absent company means every record matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrugFilter {
    pub company: Option<String>,
}

impl DrugFilter {
    /// Build a filter from a raw parameter; blank values mean "no restriction".
    pub fn by_company(raw: Option<&str>) -> Self {
        let company = raw
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        Self { company }
    }

    pub fn matches(&self, drug: &Drug) -> bool {
        match &self.company {
            Some(company) => drug.company == *company,
            None => true,
        }
    }
}

/// One skip/limit query against a store
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FindQuery {
    pub filter: DrugFilter,
    pub sort: SortSpec,
    pub skip: u64,
    pub limit: u64,
}

/// Pagination envelope returned with every list response
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn compute(current_page: u64, page_size: u64, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(page_size.max(1));
        Self {
            current_page,
            total_pages,
            total_count,
            has_next_page: current_page < total_pages,
            has_prev_page: current_page > 1,
        }
    }
}

/// Per-company aggregate over the stored drugs
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStats {
    pub company: String,
    pub drug_count: u64,
    pub earliest_launch: DateTime<Utc>,
    pub latest_launch: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertManyOutcome {
    pub inserted: u64,
    pub skipped: u64,
}

/// Result of swapping the whole store contents for a new batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceOutcome {
    pub removed: u64,
    pub inserted: u64,
    pub skipped: u64,
}
