use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::pet::{self, EnergyLevel, PetSize};
use crate::entities::photo;
use crate::error::PetError;
use crate::photos::{IncomingPhoto, PhotoPolicy, PhotoReconciler};
use crate::repositories::{NewPet, OrgRepository, PetFilters, PetRepository, PhotoIndex};
use crate::storage::BlobStore;

/// A pet with the public urls of its photos.
#[derive(Debug, Clone, Serialize)]
pub struct PetProfile {
    #[serde(flatten)]
    pub pet: pet::Model,
    pub photos: Vec<String>,
}

impl PetProfile {
    fn new(pet: pet::Model, photos: &[photo::Model]) -> Self {
        Self {
            pet,
            photos: photos.iter().map(|p| p.url.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegisterPet {
    pub name: String,
    pub description: String,
    pub age_in_months: i32,
    pub size: PetSize,
    pub energy_level: EnergyLevel,
    pub adoption_requirements: Vec<String>,
    pub photos: Vec<IncomingPhoto>,
    pub org_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct UpdatePet {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub age_in_months: i32,
    pub size: PetSize,
    pub energy_level: EnergyLevel,
    pub adoption_requirements: Vec<String>,
    pub photos: Vec<IncomingPhoto>,
    pub org_id: Uuid,
}

/// Pet create/update/delete flows and the ordering between the pet row, the
/// photo index and blob storage.
#[derive(Clone)]
pub struct PetService {
    orgs: Arc<dyn OrgRepository>,
    pets: Arc<dyn PetRepository>,
    photos: Arc<dyn PhotoIndex>,
    reconciler: PhotoReconciler,
    policy: PhotoPolicy,
}

impl PetService {
    pub fn new(
        orgs: Arc<dyn OrgRepository>,
        pets: Arc<dyn PetRepository>,
        photos: Arc<dyn PhotoIndex>,
        blob_store: Arc<dyn BlobStore>,
        policy: PhotoPolicy,
    ) -> Self {
        Self {
            orgs,
            pets,
            photos,
            reconciler: PhotoReconciler::new(blob_store),
            policy,
        }
    }

    /// Create a pet with its photos.
    ///
    /// Photos are uploaded before the pet row exists, under a pet id chosen
    /// here; if any upload fails neither the pet nor any photo row is written.
    /// If the photo rows cannot be recorded, the new pet row is soft-deleted
    /// before the error is returned.
    pub async fn register_pet(&self, input: RegisterPet) -> Result<PetProfile, PetError> {
        if self.orgs.find_by_id(input.org_id).await?.is_none() {
            return Err(PetError::OrgNotFound);
        }
        self.policy.check_all(&input.photos)?;

        let pet_id = Uuid::new_v4();
        let reconciliation = self.reconciler.reconcile(pet_id, vec![], input.photos).await?;

        let pet = self
            .pets
            .create(NewPet {
                id: pet_id,
                name: input.name,
                description: input.description,
                age_in_months: input.age_in_months,
                size: input.size,
                energy_level: input.energy_level,
                adoption_requirements: input.adoption_requirements,
                org_id: input.org_id,
            })
            .await?;

        let photos = match reconciliation.commit(pet.id, self.photos.as_ref()).await {
            Ok(photos) => photos,
            Err(e) => {
                self.discard_pet(pet.id).await;
                return Err(e);
            }
        };

        tracing::info!(pet_id = %pet.id, org_id = %pet.org_id, photos = photos.len(), "pet registered");
        metrics::counter!("adopto_pets_registered_total").increment(1);
        metrics::gauge!("adopto_pets_total").increment(1.0);

        Ok(PetProfile::new(pet, &photos))
    }

    /// Replace a pet's metadata and photo set.
    ///
    /// Existence and ownership are checked before any photo is read. A photo
    /// failure fails the whole update and leaves the metadata untouched.
    pub async fn update_pet(&self, input: UpdatePet) -> Result<PetProfile, PetError> {
        let mut pet = self
            .pets
            .find_by_id(input.id)
            .await?
            .ok_or(PetError::PetNotFound)?;

        if self.orgs.find_by_id(input.org_id).await?.is_none() {
            return Err(PetError::OrgNotFound);
        }

        if pet.org_id != input.org_id {
            tracing::warn!(pet_id = %pet.id, org_id = %input.org_id, "update refused for non-owner org");
            return Err(PetError::Unauthorized);
        }

        self.policy.check_all(&input.photos)?;

        let existing = self.photos.get_many_by_pet_id(pet.id).await?;
        let reconciliation = self.reconciler.reconcile(pet.id, existing, input.photos).await?;
        let photos = reconciliation.commit(pet.id, self.photos.as_ref()).await?;

        pet.name = input.name;
        pet.description = input.description;
        pet.age_in_months = input.age_in_months;
        pet.size = input.size;
        pet.energy_level = input.energy_level;
        pet.adoption_requirements = input.adoption_requirements;
        pet.updated_at = chrono::Utc::now().naive_utc();
        let pet = self.pets.save(pet).await?;

        tracing::info!(pet_id = %pet.id, photos = photos.len(), "pet updated");

        Ok(PetProfile::new(pet, &photos))
    }

    pub async fn get_pet_profile(&self, id: Uuid) -> Result<PetProfile, PetError> {
        let pet = self.pets.find_by_id(id).await?.ok_or(PetError::PetNotFound)?;
        let photos = self.photos.get_many_by_pet_id(pet.id).await?;
        Ok(PetProfile::new(pet, &photos))
    }

    /// Hide a pet whose photos could not be recorded, so no live pet is left
    /// without photos.
    async fn discard_pet(&self, pet_id: Uuid) {
        match self.pets.soft_delete(pet_id).await {
            Ok(()) => tracing::warn!(%pet_id, "discarded pet after its photos failed to record"),
            Err(e) => {
                tracing::error!(%pet_id, "failed to discard pet without photos: {}", e);
                metrics::counter!("adopto_pet_discard_failures_total").increment(1);
            }
        }
    }

    /// Soft-delete a pet owned by `org_id`. Photos stay in place.
    pub async fn delete_pet(&self, id: Uuid, org_id: Uuid) -> Result<pet::Model, PetError> {
        let pet = self.pets.find_by_id(id).await?.ok_or(PetError::PetNotFound)?;
        if pet.org_id != org_id {
            return Err(PetError::Unauthorized);
        }
        self.pets.soft_delete(pet.id).await?;
        tracing::info!(pet_id = %pet.id, "pet deleted");
        metrics::gauge!("adopto_pets_total").decrement(1.0);
        Ok(pet)
    }

    /// Live pets of orgs located in `city`.
    pub async fn search_by_city(
        &self,
        city: &str,
        page: u64,
        filters: &PetFilters,
    ) -> Result<Vec<PetProfile>, PetError> {
        let org_ids: Vec<Uuid> = self
            .orgs
            .find_many_by_city(city)
            .await?
            .into_iter()
            .map(|o| o.id)
            .collect();
        if org_ids.is_empty() {
            return Ok(vec![]);
        }

        let pets = self.pets.find_many_by_org_ids(&org_ids, page, filters).await?;
        let profiles = try_join_all(pets.into_iter().map(|pet| async move {
            let photos = self.photos.get_many_by_pet_id(pet.id).await?;
            Ok::<_, PetError>(PetProfile::new(pet, &photos))
        }))
        .await?;

        Ok(profiles)
    }
}
