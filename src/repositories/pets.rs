use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::pet::{self, EnergyLevel, PetSize};

/// Pets per search page.
pub const PAGE_SIZE: u64 = 20;

/// Fields of a pet row about to be created.
#[derive(Debug, Clone)]
pub struct NewPet {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub age_in_months: i32,
    pub size: PetSize,
    pub energy_level: EnergyLevel,
    pub adoption_requirements: Vec<String>,
    pub org_id: Uuid,
}

impl NewPet {
    pub fn into_model(self, now: chrono::NaiveDateTime) -> pet::Model {
        pet::Model {
            id: self.id,
            name: self.name,
            description: self.description,
            age_in_months: self.age_in_months,
            size: self.size,
            energy_level: self.energy_level,
            adoption_requirements: self.adoption_requirements,
            org_id: self.org_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// Optional search filters. The age range is inclusive on both ends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PetFilters {
    pub min_age_in_months: Option<i32>,
    pub max_age_in_months: Option<i32>,
    pub size: Option<PetSize>,
    pub energy_level: Option<EnergyLevel>,
}

impl PetFilters {
    pub fn matches(&self, pet: &pet::Model) -> bool {
        self.min_age_in_months.map_or(true, |min| pet.age_in_months >= min)
            && self.max_age_in_months.map_or(true, |max| pet.age_in_months <= max)
            && self.size.map_or(true, |size| pet.size == size)
            && self.energy_level.map_or(true, |level| pet.energy_level == level)
    }
}

#[async_trait]
pub trait PetRepository: Send + Sync {
    /// Live (not soft-deleted) pet by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<pet::Model>, DbErr>;
    /// Live pets of the given orgs, newest first, `PAGE_SIZE` per 1-based page.
    async fn find_many_by_org_ids(
        &self,
        org_ids: &[Uuid],
        page: u64,
        filters: &PetFilters,
    ) -> Result<Vec<pet::Model>, DbErr>;
    async fn create(&self, pet: NewPet) -> Result<pet::Model, DbErr>;
    async fn save(&self, pet: pet::Model) -> Result<pet::Model, DbErr>;
    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr>;
    /// Soft-delete every live pet of an org, returning how many were marked.
    async fn soft_delete_many_by_org_id(&self, org_id: Uuid) -> Result<u64, DbErr>;
}

pub struct PostgresPetRepository {
    db: DatabaseConnection,
}

impl PostgresPetRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PetRepository for PostgresPetRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<pet::Model>, DbErr> {
        pet::Entity::find_by_id(id)
            .filter(pet::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
    }

    async fn find_many_by_org_ids(
        &self,
        org_ids: &[Uuid],
        page: u64,
        filters: &PetFilters,
    ) -> Result<Vec<pet::Model>, DbErr> {
        // Pages whose offset overflows cannot hold any rows.
        if org_ids.is_empty() || page.saturating_sub(1).checked_mul(PAGE_SIZE).is_none() {
            return Ok(vec![]);
        }

        let mut query = pet::Entity::find()
            .filter(pet::Column::OrgId.is_in(org_ids.iter().copied()))
            .filter(pet::Column::DeletedAt.is_null());
        if let Some(min) = filters.min_age_in_months {
            query = query.filter(pet::Column::AgeInMonths.gte(min));
        }
        if let Some(max) = filters.max_age_in_months {
            query = query.filter(pet::Column::AgeInMonths.lte(max));
        }
        if let Some(size) = filters.size {
            query = query.filter(pet::Column::Size.eq(size));
        }
        if let Some(level) = filters.energy_level {
            query = query.filter(pet::Column::EnergyLevel.eq(level));
        }

        query
            .order_by_desc(pet::Column::CreatedAt)
            .paginate(&self.db, PAGE_SIZE)
            .fetch_page(page.saturating_sub(1))
            .await
    }

    async fn create(&self, pet: NewPet) -> Result<pet::Model, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        pet.into_model(now)
            .into_active_model()
            .reset_all()
            .insert(&self.db)
            .await
    }

    async fn save(&self, pet: pet::Model) -> Result<pet::Model, DbErr> {
        pet.into_active_model().reset_all().update(&self.db).await
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let res = pet::Entity::update_many()
            .col_expr(pet::Column::DeletedAt, Expr::value(now))
            .filter(pet::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(DbErr::RecordNotUpdated);
        }
        Ok(())
    }

    async fn soft_delete_many_by_org_id(&self, org_id: Uuid) -> Result<u64, DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let res = pet::Entity::update_many()
            .col_expr(pet::Column::DeletedAt, Expr::value(now))
            .filter(pet::Column::OrgId.eq(org_id))
            .filter(pet::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet(age: i32, size: PetSize, energy: EnergyLevel) -> pet::Model {
        NewPet {
            id: Uuid::new_v4(),
            name: "Rex".into(),
            description: "Good dog".into(),
            age_in_months: age,
            size,
            energy_level: energy,
            adoption_requirements: vec![],
            org_id: Uuid::new_v4(),
        }
        .into_model(chrono::Utc::now().naive_utc())
    }

    #[test]
    fn empty_filters_match_everything() {
        assert!(PetFilters::default().matches(&pet(3, PetSize::Small, EnergyLevel::Low)));
    }

    #[test]
    fn filters_combine() {
        let filters = PetFilters {
            min_age_in_months: Some(6),
            max_age_in_months: Some(24),
            size: Some(PetSize::Large),
            energy_level: None,
        };
        assert!(filters.matches(&pet(6, PetSize::Large, EnergyLevel::High)));
        assert!(filters.matches(&pet(24, PetSize::Large, EnergyLevel::Low)));
        assert!(!filters.matches(&pet(25, PetSize::Large, EnergyLevel::Low)));
        assert!(!filters.matches(&pet(12, PetSize::Small, EnergyLevel::Low)));
    }

    #[tokio::test]
    async fn unreachable_pages_skip_the_query() {
        use sea_orm::{DatabaseBackend, MockDatabase};

        // No results are queued, so any query would fail.
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let repo = PostgresPetRepository::new(db);
        let pets = repo
            .find_many_by_org_ids(&[Uuid::new_v4()], u64::MAX, &PetFilters::default())
            .await
            .unwrap();
        assert!(pets.is_empty());
    }
}
