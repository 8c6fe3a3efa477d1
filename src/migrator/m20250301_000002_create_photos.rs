use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Photos::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Photos::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Photos::Hash).string().not_null())
                    .col(ColumnDef::new(Photos::Url).text().not_null())
                    .col(ColumnDef::new(Photos::Key).text())
                    .col(ColumnDef::new(Photos::PetId).uuid().not_null())
                    .col(ColumnDef::new(Photos::CreatedAt).date_time().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-photo-pet_id")
                            .from(Photos::Table, Photos::PetId)
                            .to(Pets::Table, Pets::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // One live row per content hash per pet
        manager
            .create_index(
                Index::create()
                    .name("idx_photos_pet_id_hash")
                    .table(Photos::Table)
                    .col(Photos::PetId)
                    .col(Photos::Hash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Photos::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Photos {
    Table,
    Id,
    Hash,
    Url,
    Key,
    PetId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Pets {
    Table,
    Id,
}
