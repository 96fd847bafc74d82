use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{compare_drugs, DrugStore};
use crate::errors::{StoreError, StoreResult};
use crate::model::{
    CompanyStats, Drug, DrugFilter, FindQuery, InsertManyOutcome, NewDrug, ReplaceOutcome,
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct Contents {
    next_id: i32,
    drugs: Vec<Drug>,
}

impl Contents {
    fn has_code(&self, code: &str) -> bool {
        self.drugs.iter().any(|d| d.code == code)
    }

    fn push(&mut self, drug: NewDrug) -> Drug {
        self.next_id += 1;
        let drug = drug.into_drug(self.next_id);
        self.drugs.push(drug.clone());
        drug
    }

    fn push_skipping_duplicates(&mut self, drugs: Vec<NewDrug>) -> InsertManyOutcome {
        let mut outcome = InsertManyOutcome::default();
        for drug in drugs {
            if self.has_code(&drug.code) {
                debug!("Skipping duplicate drug code {}", drug.code);
                outcome.skipped += 1;
                continue;
            }
            self.push(drug);
            outcome.inserted += 1;
        }
        outcome
    }
}

/// In-process drug store for local development and tests.
///
/// With a data file the full contents are loaded on open and rewritten after
/// every mutation.
#[derive(Debug, Default)]
pub struct MemoryDrugStore {
    contents: RwLock<Contents>,
    data_file: Option<PathBuf>,
}

impl MemoryDrugStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let contents = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Contents::default(),
            Err(e) => return Err(e.into()),
        };
        info!(
            "Loaded {} drugs from {}",
            contents.drugs.len(),
            path.display()
        );
        Ok(Self {
            contents: RwLock::new(contents),
            data_file: Some(path),
        })
    }

    async fn persist(&self, contents: &Contents) -> StoreResult<()> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(contents)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, bytes).await?;
        debug!("Persisted {} drugs to {}", contents.drugs.len(), path.display());
        Ok(())
    }

    /// Apply `change` to a copy of the contents and publish it only once it
    /// has been persisted.
    async fn commit<R>(
        &self,
        change: impl FnOnce(&mut Contents) -> StoreResult<R> + Send,
    ) -> StoreResult<R> {
        let mut contents = self.contents.write().await;
        let mut next = contents.clone();
        let output = change(&mut next)?;
        self.persist(&next).await?;
        *contents = next;
        Ok(output)
    }
}

#[async_trait]
impl DrugStore for MemoryDrugStore {
    async fn find(&self, query: &FindQuery) -> StoreResult<Vec<Drug>> {
        let contents = self.contents.read().await;
        let mut matching: Vec<&Drug> = contents
            .drugs
            .iter()
            .filter(|d| query.filter.matches(d))
            .collect();
        matching.sort_by(|a, b| compare_drugs(a, b, &query.sort));

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn count(&self, filter: &DrugFilter) -> StoreResult<u64> {
        let contents = self.contents.read().await;
        Ok(contents.drugs.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Drug>> {
        let contents = self.contents.read().await;
        Ok(contents.drugs.iter().find(|d| d.id == id).cloned())
    }

    async fn distinct_companies(&self) -> StoreResult<Vec<String>> {
        let contents = self.contents.read().await;
        let mut seen = HashSet::new();
        Ok(contents
            .drugs
            .iter()
            .filter(|d| seen.insert(d.company.as_str()))
            .map(|d| d.company.clone())
            .collect())
    }

    async fn company_stats(&self) -> StoreResult<Vec<CompanyStats>> {
        let contents = self.contents.read().await;
        let mut groups: BTreeMap<&str, CompanyStats> = BTreeMap::new();
        for drug in &contents.drugs {
            groups
                .entry(drug.company.as_str())
                .and_modify(|stats| {
                    stats.drug_count += 1;
                    stats.earliest_launch = stats.earliest_launch.min(drug.launch_date);
                    stats.latest_launch = stats.latest_launch.max(drug.launch_date);
                })
                .or_insert_with(|| CompanyStats {
                    company: drug.company.clone(),
                    drug_count: 1,
                    earliest_launch: drug.launch_date,
                    latest_launch: drug.launch_date,
                });
        }
        Ok(groups.into_values().collect())
    }

    async fn insert(&self, drug: NewDrug) -> StoreResult<Drug> {
        self.commit(|contents| {
            if contents.has_code(&drug.code) {
                return Err(StoreError::DuplicateCode(drug.code));
            }
            Ok(contents.push(drug))
        })
        .await
    }

    async fn insert_many(&self, drugs: Vec<NewDrug>) -> StoreResult<InsertManyOutcome> {
        self.commit(|contents| Ok(contents.push_skipping_duplicates(drugs)))
            .await
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        self.commit(|contents| {
            let removed = contents.drugs.len() as u64;
            contents.drugs.clear();
            Ok(removed)
        })
        .await
    }

    async fn replace_all(&self, drugs: Vec<NewDrug>) -> StoreResult<ReplaceOutcome> {
        self.commit(|contents| {
            let removed = contents.drugs.len() as u64;
            contents.drugs.clear();
            let outcome = contents.push_skipping_duplicates(drugs);
            Ok(ReplaceOutcome {
                removed,
                inserted: outcome.inserted,
                skipped: outcome.skipped,
            })
        })
        .await
    }
}
