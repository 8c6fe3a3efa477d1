use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A stored pet photo. Rows are never mutated; a replaced photo is deleted and
/// a new row is inserted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "photos")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Lowercase hex SHA-256 of the photo bytes.
    pub hash: String,
    #[sea_orm(column_type = "Text")]
    pub url: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub key: Option<String>,
    pub pet_id: Uuid,
    pub created_at: DateTime,
}

impl Model {
    /// Key used to delete the object from blob storage. Backends that do not
    /// report a key get it derived from the last segment of the url.
    pub fn storage_key(&self) -> &str {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => self.url.rsplit('/').next().unwrap_or(&self.url),
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::pet::Entity",
        from = "Column::PetId",
        to = "super::pet::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Pet,
}

impl Related<super::pet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
