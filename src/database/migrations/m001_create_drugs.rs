use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Drugs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Drugs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Drugs::Code).string().not_null().unique_key())
                    .col(ColumnDef::new(Drugs::GenericName).string().not_null())
                    .col(ColumnDef::new(Drugs::BrandName).string().not_null())
                    .col(ColumnDef::new(Drugs::Company).string().not_null())
                    .col(ColumnDef::new(Drugs::LaunchDate).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        // Company filter and the default launch date sort
        manager
            .create_index(
                Index::create()
                    .name("idx_drugs_company")
                    .table(Drugs::Table)
                    .col(Drugs::Company)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_drugs_launch_date")
                    .table(Drugs::Table)
                    .col(Drugs::LaunchDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Drugs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Drugs {
    Table,
    Id,
    Code,
    GenericName,
    BrandName,
    Company,
    LaunchDate,
}
