use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::NewDrug;
use crate::services::drug_service::validate_new_drug;
use crate::store::DrugStore;

static DATA_DIR: Dir = include_dir!("data");

const SAMPLE_FILE: &str = "drugs.csv";

/// One row of an import CSV
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvDrugRecord {
    code: String,
    generic_name: String,
    brand_name: String,
    company: String,
    launch_date: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub removed: u64,
    pub inserted: u64,
    pub skipped: u64,
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (UTC midnight)
pub fn parse_launch_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("Invalid launch date: {}", raw))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid launch date: {}", raw))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

/// Parse CSV with the header `code,genericName,brandName,company,launchDate`
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<NewDrug>> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut drugs = Vec::new();
    for (index, row) in csv_reader.deserialize::<CsvDrugRecord>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = row.with_context(|| format!("Invalid CSV row on line {}", line))?;
        let launch_date = parse_launch_date(&row.launch_date)
            .with_context(|| format!("Invalid CSV row on line {}", line))?;
        drugs.push(NewDrug {
            code: row.code,
            generic_name: row.generic_name,
            brand_name: row.brand_name,
            company: row.company,
            launch_date,
        });
    }
    Ok(drugs)
}

/// The sample dataset compiled into the binary
pub fn sample_drugs() -> Result<Vec<NewDrug>> {
    let file = DATA_DIR
        .get_file(SAMPLE_FILE)
        .ok_or_else(|| anyhow!("Bundled sample {} is missing", SAMPLE_FILE))?;
    read_csv(file.contents())
}

/// Bulk (re)import: swap the store contents for the batch, skipping duplicates
#[derive(Clone)]
pub struct ImportService {
    store: Arc<dyn DrugStore>,
}

impl ImportService {
    pub fn new(store: Arc<dyn DrugStore>) -> Self {
        Self { store }
    }

    pub async fn import(&self, drugs: Vec<NewDrug>) -> Result<ImportSummary> {
        let mut seen = HashSet::new();
        let mut batch = Vec::with_capacity(drugs.len());
        let mut skipped = 0;

        for drug in drugs {
            let drug = match validate_new_drug(drug) {
                Ok(drug) => drug,
                Err(e) => {
                    warn!("Skipping invalid drug record: {}", e);
                    skipped += 1;
                    continue;
                }
            };
            if !seen.insert(drug.code.clone()) {
                warn!("Skipping duplicate drug code {}", drug.code);
                skipped += 1;
                continue;
            }
            batch.push(drug);
        }

        let outcome = self.store.replace_all(batch).await?;

        let summary = ImportSummary {
            removed: outcome.removed,
            inserted: outcome.inserted,
            skipped: skipped + outcome.skipped,
        };
        info!(
            "Import complete: removed {}, inserted {}, skipped {}",
            summary.removed, summary.inserted, summary.skipped
        );
        Ok(summary)
    }

    /// Load the bundled sample dataset when the store holds no drugs yet.
    /// Returns whether anything was imported.
    pub async fn seed_if_empty(&self) -> Result<bool> {
        if self.store.count_all().await? > 0 {
            info!("Drug store already populated, skipping seed data");
            return Ok(false);
        }
        info!("Seeding drug store with bundled sample data");
        self.import(sample_drugs()?).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryDrugStore;

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_launch_date("2020-06-20").unwrap(),
            Utc.with_ymd_and_hms(2020, 6, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_launch_date("2020-06-20T05:30:00+05:30").unwrap(),
            Utc.with_ymd_and_hms(2020, 6, 20, 0, 0, 0).unwrap()
        );
        assert!(parse_launch_date("20/06/2020").is_err());
    }

    #[test]
    fn reads_csv_rows() {
        let csv = "code,genericName,brandName,company,launchDate\n\
                   D1, Paracetamol ,Crocin,GSK,1996-04-12\n";
        let drugs = read_csv(csv.as_bytes()).unwrap();
        assert_eq!(drugs.len(), 1);
        assert_eq!(drugs[0].generic_name, "Paracetamol");
    }

    #[test]
    fn reports_bad_line_numbers() {
        let csv = "code,genericName,brandName,company,launchDate\n\
                   D1,A,B,C,1996-04-12\n\
                   D2,A,B,C,someday\n";
        let err = read_csv(csv.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }

    #[test]
    fn bundled_sample_is_valid() {
        let drugs = sample_drugs().unwrap();
        assert!(drugs.len() >= 30);
        let codes: HashSet<_> = drugs.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes.len(), drugs.len());
    }

    #[tokio::test]
    async fn import_replaces_contents_and_skips_duplicates() {
        let store = Arc::new(MemoryDrugStore::new());
        let service = ImportService::new(store.clone());

        assert!(service.seed_if_empty().await.unwrap());
        assert!(!service.seed_if_empty().await.unwrap());

        let csv = "code,genericName,brandName,company,launchDate\n\
                   D1,A,B,C,2001-01-01\n\
                   D1,A,B,C,2002-01-01\n\
                   D2,A,,C,2003-01-01\n\
                   D3,A,B,C,2004-01-01\n";
        let summary = service.import(read_csv(csv.as_bytes()).unwrap()).await.unwrap();

        assert!(summary.removed >= 30);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.skipped, 2);
        assert_eq!(store.count_all().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_import_keeps_previous_drugs() {
        let dir = tempfile::TempDir::new().unwrap();
        let parent = dir.path().join("store");
        let store = Arc::new(MemoryDrugStore::open(parent.join("drugs.json")).await.unwrap());
        let service = ImportService::new(store.clone());
        assert!(service.seed_if_empty().await.unwrap());
        let seeded = store.count_all().await.unwrap();

        std::fs::remove_dir_all(&parent).unwrap();
        std::fs::write(&parent, b"not a directory").unwrap();

        let csv = "code,genericName,brandName,company,launchDate\n\
                   N1,A,B,C,2001-01-01\n";
        assert!(service.import(read_csv(csv.as_bytes()).unwrap()).await.is_err());
        assert_eq!(store.count_all().await.unwrap(), seeded);
    }
}
