//! Process-local repositories for tests and local development.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use sea_orm::DbErr;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewOrg, NewPet, OrgRepository, PetFilters, PetRepository, PhotoIndex, PAGE_SIZE};
use crate::entities::{org, pet, photo};

#[derive(Default)]
pub struct InMemoryOrgRepository {
    orgs: Mutex<Vec<org::Model>>,
}

impl InMemoryOrgRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, org: org::Model) -> org::Model {
        self.orgs.lock().await.push(org.clone());
        org
    }

    /// All rows, soft-deleted ones included.
    pub async fn all(&self) -> Vec<org::Model> {
        self.orgs.lock().await.clone()
    }
}

#[async_trait]
impl OrgRepository for InMemoryOrgRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<org::Model>, DbErr> {
        Ok(self
            .orgs
            .lock()
            .await
            .iter()
            .find(|o| o.id == id && o.deleted_at.is_none())
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<org::Model>, DbErr> {
        let email = email.trim().to_lowercase();
        Ok(self.orgs.lock().await.iter().find(|o| o.email == email).cloned())
    }

    async fn create(&self, org: NewOrg) -> Result<org::Model, DbErr> {
        let model = org.into_model(Uuid::new_v4(), chrono::Utc::now().naive_utc());
        let mut orgs = self.orgs.lock().await;
        if orgs.iter().any(|o| o.email == model.email) {
            return Err(DbErr::RecordNotInserted);
        }
        orgs.push(model.clone());
        Ok(model)
    }

    async fn save(&self, org: org::Model) -> Result<org::Model, DbErr> {
        let mut orgs = self.orgs.lock().await;
        let slot = orgs
            .iter_mut()
            .find(|o| o.id == org.id)
            .ok_or(DbErr::RecordNotUpdated)?;
        *slot = org.clone();
        Ok(org)
    }

    async fn find_many_by_city(&self, city: &str) -> Result<Vec<org::Model>, DbErr> {
        let city = city.trim().to_lowercase();
        Ok(self
            .orgs
            .lock()
            .await
            .iter()
            .filter(|o| o.deleted_at.is_none() && o.city.to_lowercase() == city)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr> {
        let now = chrono::Utc::now().naive_utc();
        let mut orgs = self.orgs.lock().await;
        let org = orgs
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(DbErr::RecordNotUpdated)?;
        org.deleted_at = Some(now);
        org.updated_at = now;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPetRepository {
    pets: Mutex<Vec<pet::Model>>,
    fail_cascade: AtomicBool,
}

impl InMemoryPetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows, soft-deleted ones included.
    pub async fn all(&self) -> Vec<pet::Model> {
        self.pets.lock().await.clone()
    }

    /// Make `soft_delete_many_by_org_id` fail.
    pub fn fail_cascade(&self, fail: bool) {
        self.fail_cascade.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PetRepository for InMemoryPetRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<pet::Model>, DbErr> {
        Ok(self
            .pets
            .lock()
            .await
            .iter()
            .find(|p| p.id == id && p.deleted_at.is_none())
            .cloned())
    }

    async fn find_many_by_org_ids(
        &self,
        org_ids: &[Uuid],
        page: u64,
        filters: &PetFilters,
    ) -> Result<Vec<pet::Model>, DbErr> {
        let mut pets: Vec<pet::Model> = self
            .pets
            .lock()
            .await
            .iter()
            .filter(|p| p.deleted_at.is_none() && org_ids.contains(&p.org_id) && filters.matches(p))
            .cloned()
            .collect();
        pets.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let Some(skip) = page
            .saturating_sub(1)
            .checked_mul(PAGE_SIZE)
            .and_then(|skip| usize::try_from(skip).ok())
        else {
            return Ok(vec![]);
        };
        Ok(pets.into_iter().skip(skip).take(PAGE_SIZE as usize).collect())
    }

    async fn create(&self, pet: NewPet) -> Result<pet::Model, DbErr> {
        let model = pet.into_model(chrono::Utc::now().naive_utc());
        let mut pets = self.pets.lock().await;
        if pets.iter().any(|p| p.id == model.id) {
            return Err(DbErr::RecordNotInserted);
        }
        pets.push(model.clone());
        Ok(model)
    }

    async fn save(&self, pet: pet::Model) -> Result<pet::Model, DbErr> {
        let mut pets = self.pets.lock().await;
        let slot = pets
            .iter_mut()
            .find(|p| p.id == pet.id)
            .ok_or(DbErr::RecordNotUpdated)?;
        *slot = pet.clone();
        Ok(pet)
    }

    async fn soft_delete(&self, id: Uuid) -> Result<(), DbErr> {
        let mut pets = self.pets.lock().await;
        let pet = pets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(DbErr::RecordNotUpdated)?;
        pet.deleted_at = Some(chrono::Utc::now().naive_utc());
        Ok(())
    }

    async fn soft_delete_many_by_org_id(&self, org_id: Uuid) -> Result<u64, DbErr> {
        if self.fail_cascade.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("cascade refused".into()));
        }
        let now = chrono::Utc::now().naive_utc();
        let mut count = 0;
        for pet in self
            .pets
            .lock()
            .await
            .iter_mut()
            .filter(|p| p.org_id == org_id && p.deleted_at.is_none())
        {
            pet.deleted_at = Some(now);
            count += 1;
        }
        Ok(count)
    }
}

#[derive(Default)]
pub struct InMemoryPhotoIndex {
    photos: Mutex<Vec<photo::Model>>,
    fail_create_many: AtomicBool,
    fail_delete: AtomicBool,
}

impl InMemoryPhotoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<photo::Model> {
        self.photos.lock().await.clone()
    }

    pub fn fail_create_many(&self, fail: bool) {
        self.fail_create_many.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PhotoIndex for InMemoryPhotoIndex {
    async fn get_many_by_pet_id(&self, pet_id: Uuid) -> Result<Vec<photo::Model>, DbErr> {
        Ok(self
            .photos
            .lock()
            .await
            .iter()
            .filter(|p| p.pet_id == pet_id)
            .cloned()
            .collect())
    }

    async fn create(&self, photo: photo::Model) -> Result<photo::Model, DbErr> {
        self.photos.lock().await.push(photo.clone());
        Ok(photo)
    }

    async fn create_many(&self, photos: Vec<photo::Model>) -> Result<u64, DbErr> {
        if self.fail_create_many.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("create_many refused".into()));
        }
        let count = photos.len() as u64;
        self.photos.lock().await.extend(photos);
        Ok(count)
    }

    async fn delete(&self, id: Uuid) -> Result<(), DbErr> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(DbErr::Custom("delete refused".into()));
        }
        let mut photos = self.photos.lock().await;
        let before = photos.len();
        photos.retain(|p| p.id != id);
        if photos.len() == before {
            return Err(DbErr::RecordNotFound(format!("photo {}", id)));
        }
        Ok(())
    }
}
