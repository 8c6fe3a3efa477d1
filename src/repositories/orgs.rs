use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, QueryFilter,
};
use uuid::Uuid;

use crate::entities::org;

/// Fields of an org row about to be created.
#[derive(Debug, Clone)]
pub struct NewOrg {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl NewOrg {
    pub fn into_model(self, id: Uuid, now: chrono::NaiveDateTime) -> org::Model {
        org::Model {
            id,
            name: self.name,
            email: self.email,
            whatsapp: self.whatsapp,
            address: self.address,
            city: self.city,
            zip_code: self.zip_code,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[async_trait]
pub trait OrgRepository: Send + Sync {
    /// Live (not soft-deleted) org by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<org::Model>, DbErr>;
    /// Org holding `email`, soft-deleted ones included since the address
    /// stays reserved by the unique index.
    async fn find_by_email(&self, email: &str) -> Result<Option<org::Model>, DbErr>;
    async fn create(&self, org: NewOrg) -> Result<org::Model, DbErr>;
    async fn save(&self, org: org::Model) -> Result<org::Model, DbErr>;
    /// Live orgs whose city matches, ignoring case.
    async fn find_many_by_city(&self, city: &str) -> Result<Vec<org::Model>, DbErr>;
    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr>;
}

pub struct PostgresOrgRepository {
    db: DatabaseConnection,
}

impl PostgresOrgRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrgRepository for PostgresOrgRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<org::Model>, DbErr> {
        org::Entity::find_by_id(id)
            .filter(org::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<org::Model>, DbErr> {
        org::Entity::find()
            .filter(org::Column::Email.eq(email.trim().to_lowercase()))
            .one(&self.db)
            .await
    }

    async fn create(&self, org: NewOrg) -> Result<org::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        org.into_model(Uuid::new_v4(), now)
            .into_active_model()
            .reset_all()
            .insert(&self.db)
            .await
    }

    async fn save(&self, org: org::Model) -> Result<org::Model, DbErr> {
        org.into_active_model().reset_all().update(&self.db).await
    }

    async fn find_many_by_city(&self, city: &str) -> Result<Vec<org::Model>, DbErr> {
        org::Entity::find()
            .filter(org::Column::DeletedAt.is_null())
            .filter(Expr::expr(Func::lower(Expr::col(org::Column::City))).eq(city.trim().to_lowercase()))
            .all(&self.db)
            .await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let res = org::Entity::update_many()
            .col_expr(org::Column::DeletedAt, Expr::value(now))
            .col_expr(org::Column::UpdatedAt, Expr::value(now))
            .filter(org::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(DbErr::RecordNotUpdated);
        }
        Ok(())
    }
}
