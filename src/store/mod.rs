//! Record store adapter
//!
//! [`DrugStore`] is the single capability interface the services talk to. Two
//! backends implement it: [`SqlDrugStore`] on top of sea-orm/SQLite and
//! [`MemoryDrugStore`], an in-process stand-in that can persist to a JSON file for
//! local development. Which one a process uses is decided once, by [`open_store`].
//!
//! Both backends order results by the requested field and direction, then by
//! `code` ascending, so every query has a total, deterministic order.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::StoreConfig;
use crate::errors::StoreResult;
use crate::model::{
    CompanyStats, Drug, DrugFilter, FindQuery, InsertManyOutcome, NewDrug, ReplaceOutcome,
    SortDirection, SortField, SortSpec,
};

pub mod memory;
pub mod sql;

pub use memory::MemoryDrugStore;
pub use sql::SqlDrugStore;

#[async_trait]
pub trait DrugStore: Send + Sync {
    /// Filtered, sorted, skip/limit page of records
    async fn find(&self, query: &FindQuery) -> StoreResult<Vec<Drug>>;

    /// Number of records matching `filter`
    async fn count(&self, filter: &DrugFilter) -> StoreResult<u64>;

    async fn count_all(&self) -> StoreResult<u64> {
        self.count(&DrugFilter::default()).await
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Drug>>;

    /// Distinct company values, in no particular order
    async fn distinct_companies(&self) -> StoreResult<Vec<String>>;

    /// Count and launch range grouped by company, in no particular order
    async fn company_stats(&self) -> StoreResult<Vec<CompanyStats>>;

    /// Insert one record; an existing code yields `StoreError::DuplicateCode`
    async fn insert(&self, drug: NewDrug) -> StoreResult<Drug>;

    /// Insert records, skipping any whose code already exists
    async fn insert_many(&self, drugs: Vec<NewDrug>) -> StoreResult<InsertManyOutcome>;

    /// Remove every record, returning how many were removed
    async fn delete_all(&self) -> StoreResult<u64>;

    /// `delete_all` followed by `insert_many` as one unit: on failure the
    /// previous contents stay in place
    async fn replace_all(&self, drugs: Vec<NewDrug>) -> StoreResult<ReplaceOutcome>;
}

/// Open the backend named by the configuration.
pub async fn open_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn DrugStore>> {
    match config {
        StoreConfig::Sqlite { database } => {
            info!("Opening SQLite drug store at {}", database);
            let store = SqlDrugStore::open(database).await?;
            Ok(Arc::new(store))
        }
        StoreConfig::Memory { data_file } => {
            let store = match data_file {
                Some(path) => {
                    info!("Opening file-backed memory drug store at {}", path.display());
                    MemoryDrugStore::open(path).await?
                }
                None => {
                    info!("Opening in-memory drug store");
                    MemoryDrugStore::new()
                }
            };
            Ok(Arc::new(store))
        }
    }
}

/// Ordering shared by every backend: requested field first, then `code` ascending.
pub fn compare_drugs(a: &Drug, b: &Drug, sort: &SortSpec) -> Ordering {
    let primary = match sort.field {
        SortField::Code => a.code.cmp(&b.code),
        SortField::GenericName => a.generic_name.cmp(&b.generic_name),
        SortField::BrandName => a.brand_name.cmp(&b.brand_name),
        SortField::Company => a.company.cmp(&b.company),
        SortField::LaunchDate => a.launch_date.cmp(&b.launch_date),
    };
    let primary = match sort.direction {
        SortDirection::Asc => primary,
        SortDirection::Desc => primary.reverse(),
    };
    primary.then_with(|| a.code.cmp(&b.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn drug(code: &str, company: &str, year: i32) -> Drug {
        Drug {
            id: 0,
            code: code.to_string(),
            generic_name: "g".to_string(),
            brand_name: "b".to_string(),
            company: company.to_string(),
            launch_date: Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn ties_break_on_code_ascending_in_both_directions() {
        let a = drug("A", "X", 2020);
        let b = drug("B", "X", 2020);
        for direction in [SortDirection::Asc, SortDirection::Desc] {
            let sort = SortSpec {
                field: SortField::Company,
                direction,
            };
            assert_eq!(compare_drugs(&a, &b, &sort), Ordering::Less);
        }
    }

    #[test]
    fn dates_compare_as_instants() {
        let older = drug("Z", "X", 1999);
        let newer = drug("A", "X", 2021);
        let sort = SortSpec::default();
        assert_eq!(compare_drugs(&newer, &older, &sort), Ordering::Less);
    }
}
