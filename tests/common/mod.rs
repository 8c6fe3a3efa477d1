#![allow(dead_code)]

use std::sync::Arc;

use adopto_server::entities::org;
use adopto_server::entities::pet::{EnergyLevel, PetSize};
use adopto_server::photos::{IncomingPhoto, PhotoPolicy};
use adopto_server::repositories::{InMemoryOrgRepository, InMemoryPetRepository, InMemoryPhotoIndex};
use adopto_server::services::{OrgService, PetService, RegisterPet, UpdatePet};
use adopto_server::storage::InMemoryBlobStore;
use uuid::Uuid;

pub struct Harness {
    pub orgs: Arc<InMemoryOrgRepository>,
    pub pets: Arc<InMemoryPetRepository>,
    pub photos: Arc<InMemoryPhotoIndex>,
    pub store: Arc<InMemoryBlobStore>,
    pub pet_service: PetService,
    pub org_service: OrgService,
}

impl Harness {
    pub fn new() -> Self {
        let orgs = Arc::new(InMemoryOrgRepository::new());
        let pets = Arc::new(InMemoryPetRepository::new());
        let photos = Arc::new(InMemoryPhotoIndex::new());
        let store = Arc::new(InMemoryBlobStore::new());

        let pet_service = PetService::new(
            orgs.clone(),
            pets.clone(),
            photos.clone(),
            store.clone(),
            PhotoPolicy::default(),
        );
        let org_service = OrgService::new(orgs.clone(), pets.clone());

        Self {
            orgs,
            pets,
            photos,
            store,
            pet_service,
            org_service,
        }
    }

    pub async fn org_in(&self, city: &str) -> org::Model {
        let now = chrono::Utc::now().naive_utc();
        let id = Uuid::new_v4();
        self.orgs
            .insert(org::Model {
                id,
                name: format!("Shelter {}", &id.to_string()[..8]),
                email: format!("{}@shelter.test", id),
                whatsapp: "+5511999999999".into(),
                address: "1 Main St".into(),
                city: city.into(),
                zip_code: "00000-000".into(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .await
    }
}

pub fn photo(content: &'static [u8], filename: &str) -> IncomingPhoto {
    IncomingPhoto::new(content, filename, "image/png")
}

pub fn register(org_id: Uuid, photos: Vec<IncomingPhoto>) -> RegisterPet {
    RegisterPet {
        name: "Rex".into(),
        description: "Good boy".into(),
        age_in_months: 14,
        size: PetSize::Medium,
        energy_level: EnergyLevel::High,
        adoption_requirements: vec!["fenced yard".into()],
        photos,
        org_id,
    }
}

pub fn update(id: Uuid, org_id: Uuid, photos: Vec<IncomingPhoto>) -> UpdatePet {
    UpdatePet {
        id,
        name: "Rex II".into(),
        description: "Still a good boy".into(),
        age_in_months: 15,
        size: PetSize::Large,
        energy_level: EnergyLevel::Medium,
        adoption_requirements: vec!["fenced yard".into(), "daily walks".into()],
        photos,
        org_id,
    }
}
