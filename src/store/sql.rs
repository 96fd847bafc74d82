use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
    SqlErr, TransactionTrait,
};
use tracing::debug;

use super::DrugStore;
use crate::database::connection::connect_and_migrate;
use crate::database::entities::{drugs, Drugs};
use crate::errors::{StoreError, StoreResult};
use crate::model::{
    CompanyStats, Drug, DrugFilter, FindQuery, InsertManyOutcome, NewDrug, ReplaceOutcome,
    SortDirection, SortField,
};

/// Drug store backed by a sea-orm connection
#[derive(Clone)]
pub struct SqlDrugStore {
    db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct CompanyStatsRow {
    company: String,
    drug_count: i64,
    earliest_launch: DateTime<Utc>,
    latest_launch: DateTime<Utc>,
}

impl SqlDrugStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect to the SQLite file at `database_path` and run migrations
    pub async fn open(database_path: &str) -> StoreResult<Self> {
        let db = connect_and_migrate(database_path).await?;
        Ok(Self::new(db))
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    fn filtered(filter: &DrugFilter) -> Select<Drugs> {
        let select = Drugs::find();
        match &filter.company {
            Some(company) => select.filter(drugs::Column::Company.eq(company.as_str())),
            None => select,
        }
    }

    fn active_model(drug: NewDrug) -> drugs::ActiveModel {
        drugs::ActiveModel {
            code: Set(drug.code),
            generic_name: Set(drug.generic_name),
            brand_name: Set(drug.brand_name),
            company: Set(drug.company),
            launch_date: Set(drug.launch_date),
            ..Default::default()
        }
    }
}

fn sort_column(field: SortField) -> drugs::Column {
    match field {
        SortField::Code => drugs::Column::Code,
        SortField::GenericName => drugs::Column::GenericName,
        SortField::BrandName => drugs::Column::BrandName,
        SortField::Company => drugs::Column::Company,
        SortField::LaunchDate => drugs::Column::LaunchDate,
    }
}

fn sort_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// SQLite binds OFFSET/LIMIT as i64
fn bind_u64(value: u64) -> u64 {
    value.min(i64::MAX as u64)
}

/// Insert one by one, skipping codes that already exist
async fn insert_skipping_duplicates<C: ConnectionTrait>(
    db: &C,
    drugs: Vec<NewDrug>,
) -> StoreResult<InsertManyOutcome> {
    let mut outcome = InsertManyOutcome::default();

    for drug in drugs {
        let code = drug.code.clone();
        let affected = Drugs::insert(SqlDrugStore::active_model(drug))
            .on_conflict(
                OnConflict::column(drugs::Column::Code)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?;

        if affected == 0 {
            debug!("Skipping duplicate drug code {}", code);
            outcome.skipped += 1;
        } else {
            outcome.inserted += affected;
        }
    }

    Ok(outcome)
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[async_trait]
impl DrugStore for SqlDrugStore {
    async fn find(&self, query: &FindQuery) -> StoreResult<Vec<Drug>> {
        // Launch dates are stored as UTC RFC 3339 text, so column order is instant order
        let models = Self::filtered(&query.filter)
            .order_by(sort_column(query.sort.field), sort_order(query.sort.direction))
            .order_by(drugs::Column::Code, Order::Asc)
            .offset(bind_u64(query.skip))
            .limit(bind_u64(query.limit))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Drug::from).collect())
    }

    async fn count(&self, filter: &DrugFilter) -> StoreResult<u64> {
        Ok(Self::filtered(filter).count(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32) -> StoreResult<Option<Drug>> {
        let model = Drugs::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Drug::from))
    }

    async fn distinct_companies(&self) -> StoreResult<Vec<String>> {
        let companies = Drugs::find()
            .select_only()
            .column(drugs::Column::Company)
            .distinct()
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(companies)
    }

    async fn company_stats(&self) -> StoreResult<Vec<CompanyStats>> {
        let rows = Drugs::find()
            .select_only()
            .column(drugs::Column::Company)
            .column_as(drugs::Column::Id.count(), "drug_count")
            .column_as(drugs::Column::LaunchDate.min(), "earliest_launch")
            .column_as(drugs::Column::LaunchDate.max(), "latest_launch")
            .group_by(drugs::Column::Company)
            .into_model::<CompanyStatsRow>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CompanyStats {
                company: row.company,
                drug_count: row.drug_count.max(0) as u64,
                earliest_launch: row.earliest_launch,
                latest_launch: row.latest_launch,
            })
            .collect())
    }

    async fn insert(&self, drug: NewDrug) -> StoreResult<Drug> {
        let code = drug.code.clone();
        let model = Self::active_model(drug)
            .insert(&self.db)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    StoreError::DuplicateCode(code)
                } else {
                    StoreError::Database(err)
                }
            })?;
        Ok(model.into())
    }

    async fn insert_many(&self, drugs: Vec<NewDrug>) -> StoreResult<InsertManyOutcome> {
        let txn = self.db.begin().await?;
        let outcome = insert_skipping_duplicates(&txn, drugs).await?;
        txn.commit().await?;
        Ok(outcome)
    }

    async fn delete_all(&self) -> StoreResult<u64> {
        let result = Drugs::delete_many().exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    async fn replace_all(&self, drugs: Vec<NewDrug>) -> StoreResult<ReplaceOutcome> {
        // Dropping the transaction without commit rolls the delete back
        let txn = self.db.begin().await?;
        let removed = Drugs::delete_many().exec(&txn).await?.rows_affected;
        let outcome = insert_skipping_duplicates(&txn, drugs).await?;
        txn.commit().await?;

        Ok(ReplaceOutcome {
            removed,
            inserted: outcome.inserted,
            skipped: outcome.skipped,
        })
    }
}
