use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter};

use crate::entities::{org, pet, photo};

/// Seed the inventory gauges from the database at startup.
pub async fn init_metrics(db: &DatabaseConnection) -> Result<(), DbErr> {
    let org_count = org::Entity::find()
        .filter(org::Column::DeletedAt.is_null())
        .count(db)
        .await?;
    metrics::gauge!("adopto_orgs_total").set(org_count as f64);

    let pet_count = pet::Entity::find()
        .filter(pet::Column::DeletedAt.is_null())
        .count(db)
        .await?;
    metrics::gauge!("adopto_pets_total").set(pet_count as f64);

    let photo_count = photo::Entity::find().count(db).await?;
    metrics::gauge!("adopto_photos_total").set(photo_count as f64);

    tracing::info!(
        "Initialized metrics: Orgs={}, Pets={}, Photos={}",
        org_count,
        pet_count,
        photo_count
    );
    Ok(())
}
