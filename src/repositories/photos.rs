use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use crate::entities::photo;

/// Persistent mapping of pets to their stored photos.
///
/// Calls are independent; nothing is transactional across them.
#[async_trait]
pub trait PhotoIndex: Send + Sync {
    async fn get_many_by_pet_id(&self, pet_id: Uuid) -> Result<Vec<photo::Model>, DbErr>;
    async fn create(&self, photo: photo::Model) -> Result<photo::Model, DbErr>;
    /// Insert all rows, returning how many were written. Empty input is a no-op.
    async fn create_many(&self, photos: Vec<photo::Model>) -> Result<u64, DbErr>;
    async fn delete(&self, id: Uuid) -> Result<(), DbErr>;
}

pub struct PostgresPhotoIndex {
    db: DatabaseConnection,
}

impl PostgresPhotoIndex {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PhotoIndex for PostgresPhotoIndex {
    async fn get_many_by_pet_id(&self, pet_id: Uuid) -> Result<Vec<photo::Model>, DbErr> {
        photo::Entity::find()
            .filter(photo::Column::PetId.eq(pet_id))
            .order_by_asc(photo::Column::CreatedAt)
            .all(&self.db)
            .await
    }

    async fn create(&self, photo: photo::Model) -> Result<photo::Model, DbErr> {
        photo.into_active_model().reset_all().insert(&self.db).await
    }

    async fn create_many(&self, photos: Vec<photo::Model>) -> Result<u64, DbErr> {
        if photos.is_empty() {
            return Ok(0);
        }
        let count = photos.len() as u64;
        photo::Entity::insert_many(photos.into_iter().map(|p| p.into_active_model().reset_all()))
            .exec(&self.db)
            .await?;
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbErr> {
        let res = photo::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(DbErr::RecordNotFound(format!("photo {}", id)));
        }
        Ok(())
    }
}
