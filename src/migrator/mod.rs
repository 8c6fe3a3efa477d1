use sea_orm_migration::prelude::*;

mod m20250301_000001_create_orgs_and_pets;
mod m20250301_000002_create_photos;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_orgs_and_pets::Migration),
            Box::new(m20250301_000002_create_photos::Migration),
        ]
    }
}
