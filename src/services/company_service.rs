use std::cmp::Ordering;
use std::sync::Arc;

use crate::errors::DrugResult;
use crate::model::CompanyStats;
use crate::store::DrugStore;

/// Case-insensitive collation for company names.
///
/// Names that differ only in case sort next to each other; exact byte order
/// breaks the tie so the listing is deterministic.
pub fn company_collation(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Derives the company directory from stored drugs
#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn DrugStore>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn DrugStore>) -> Self {
        Self { store }
    }

    /// Distinct company names, case-insensitively ascending
    pub async fn list_companies(&self) -> DrugResult<Vec<String>> {
        let mut companies = self.store.distinct_companies().await?;
        companies.sort_by(|a, b| company_collation(a, b));
        companies.dedup();
        Ok(companies)
    }

    /// Per-company statistics, largest catalogue first, then by name
    pub async fn company_stats(&self) -> DrugResult<Vec<CompanyStats>> {
        let mut stats = self.store.company_stats().await?;
        stats.sort_by(|a, b| {
            b.drug_count
                .cmp(&a.drug_count)
                .then_with(|| company_collation(&a.company, &b.company))
        });
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewDrug;
    use crate::store::MemoryDrugStore;
    use chrono::{TimeZone, Utc};

    async fn service_with(entries: &[(&str, &str, i32)]) -> CompanyService {
        let store = Arc::new(MemoryDrugStore::new());
        let drugs = entries
            .iter()
            .map(|(code, company, year)| NewDrug {
                code: code.to_string(),
                generic_name: "g".to_string(),
                brand_name: "b".to_string(),
                company: company.to_string(),
                launch_date: Utc.with_ymd_and_hms(*year, 1, 1, 0, 0, 0).unwrap(),
            })
            .collect();
        store.insert_many(drugs).await.unwrap();
        CompanyService::new(store)
    }

    #[test]
    fn collation_ignores_case_first() {
        let mut names = vec!["Zydus", "cipla", "Abbott", "Cipla", "biocon"];
        names.sort_by(|a, b| company_collation(a, b));
        assert_eq!(names, ["Abbott", "biocon", "Cipla", "cipla", "Zydus"]);
    }

    #[tokio::test]
    async fn companies_are_distinct_and_sorted() {
        let service = service_with(&[("1", "A", 2000), ("2", "B", 2000), ("3", "A", 2000), ("4", "C", 2000)]).await;
        assert_eq!(service.list_companies().await.unwrap(), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn stats_order_by_count_then_name() {
        let service = service_with(&[
            ("1", "Lupin", 2010),
            ("2", "Cipla", 2001),
            ("3", "Cipla", 2015),
            ("4", "Abbott", 2005),
        ])
        .await;

        let stats = service.company_stats().await.unwrap();
        let order: Vec<_> = stats.iter().map(|s| s.company.as_str()).collect();
        assert_eq!(order, ["Cipla", "Abbott", "Lupin"]);

        let cipla = &stats[0];
        assert_eq!(cipla.drug_count, 2);
        assert_eq!(cipla.earliest_launch, Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(cipla.latest_launch, Utc.with_ymd_and_hms(2015, 1, 1, 0, 0, 0).unwrap());
    }
}
