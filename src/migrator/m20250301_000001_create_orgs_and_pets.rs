use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create Orgs Table
        manager
            .create_table(
                Table::create()
                    .table(Orgs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orgs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orgs::Name).string().not_null())
                    .col(ColumnDef::new(Orgs::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Orgs::Whatsapp).string().not_null())
                    .col(ColumnDef::new(Orgs::Address).string().not_null())
                    .col(ColumnDef::new(Orgs::City).string().not_null())
                    .col(ColumnDef::new(Orgs::ZipCode).string().not_null())
                    .col(ColumnDef::new(Orgs::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Orgs::UpdatedAt).date_time().not_null())
                    .col(ColumnDef::new(Orgs::DeletedAt).date_time())
                    .to_owned(),
            )
            .await?;

        // Create Pets Table
        manager
            .create_table(
                Table::create()
                    .table(Pets::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Pets::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Pets::Name).string().not_null())
                    .col(ColumnDef::new(Pets::Description).text().not_null())
                    .col(ColumnDef::new(Pets::AgeInMonths).integer().not_null())
                    .col(ColumnDef::new(Pets::Size).string().not_null())
                    .col(ColumnDef::new(Pets::EnergyLevel).string().not_null())
                    .col(
                        ColumnDef::new(Pets::AdoptionRequirements)
                            .array(ColumnType::Text)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Pets::OrgId).uuid().not_null())
                    .col(ColumnDef::new(Pets::CreatedAt).date_time().not_null())
                    .col(ColumnDef::new(Pets::UpdatedAt).date_time().not_null())
                    .col(ColumnDef::new(Pets::DeletedAt).date_time())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-pet-org_id")
                            .from(Pets::Table, Pets::OrgId)
                            .to(Orgs::Table, Orgs::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_pets_org_id")
                    .table(Pets::Table)
                    .col(Pets::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orgs_city")
                    .table(Orgs::Table)
                    .col(Orgs::City)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Pets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orgs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Orgs {
    Table,
    Id,
    Name,
    Email,
    Whatsapp,
    Address,
    City,
    ZipCode,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum Pets {
    Table,
    Id,
    Name,
    Description,
    AgeInMonths,
    Size,
    EnergyLevel,
    AdoptionRequirements,
    OrgId,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
