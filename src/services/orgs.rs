use std::sync::Arc;

use uuid::Uuid;

use crate::entities::org;
use crate::error::PetError;
use crate::repositories::{NewOrg, OrgRepository, PetRepository};

#[derive(Clone)]
pub struct OrgService {
    orgs: Arc<dyn OrgRepository>,
    pets: Arc<dyn PetRepository>,
}

impl OrgService {
    pub fn new(orgs: Arc<dyn OrgRepository>, pets: Arc<dyn PetRepository>) -> Self {
        Self { orgs, pets }
    }

    /// Create an org. Emails are compared lowercased and must be unused.
    pub async fn register_org(&self, mut input: NewOrg) -> Result<org::Model, PetError> {
        input.email = input.email.trim().to_lowercase();
        if self.orgs.find_by_email(&input.email).await?.is_some() {
            return Err(PetError::EmailTaken);
        }

        let org = self.orgs.create(input).await?;

        tracing::info!(org_id = %org.id, city = %org.city, "org registered");
        metrics::counter!("adopto_orgs_registered_total").increment(1);
        metrics::gauge!("adopto_orgs_total").increment(1.0);

        Ok(org)
    }

    /// Replace an org's profile fields. The email may stay the same but must
    /// not belong to another org.
    pub async fn update_org(&self, id: Uuid, input: NewOrg) -> Result<org::Model, PetError> {
        let mut org = self.orgs.find_by_id(id).await?.ok_or(PetError::OrgNotFound)?;

        let email = input.email.trim().to_lowercase();
        if let Some(holder) = self.orgs.find_by_email(&email).await? {
            if holder.id != org.id {
                return Err(PetError::EmailTaken);
            }
        }

        org.name = input.name;
        org.email = email;
        org.whatsapp = input.whatsapp;
        org.address = input.address;
        org.city = input.city;
        org.zip_code = input.zip_code;
        org.updated_at = chrono::Utc::now().naive_utc();
        let org = self.orgs.save(org).await?;

        tracing::info!(org_id = %org.id, "org updated");
        Ok(org)
    }

    /// Soft-delete an org and then all of its pets.
    ///
    /// The pet cascade runs whenever the org row was marked deleted. It is not
    /// transactional with the org update; a cascade failure is logged and
    /// counted, and the org deletion still stands.
    pub async fn delete_org(&self, id: Uuid) -> Result<org::Model, PetError> {
        let org = self.orgs.find_by_id(id).await?.ok_or(PetError::OrgNotFound)?;

        self.orgs.soft_delete(org.id).await?;
        metrics::gauge!("adopto_orgs_total").decrement(1.0);

        match self.pets.soft_delete_many_by_org_id(org.id).await {
            Ok(count) => {
                tracing::info!(org_id = %org.id, pets = count, "org deleted");
                metrics::gauge!("adopto_pets_total").decrement(count as f64);
            }
            Err(e) => {
                tracing::error!(org_id = %org.id, "org deleted but pet cascade failed: {}", e);
                metrics::counter!("adopto_pet_cascade_failures_total").increment(1);
            }
        }

        Ok(org)
    }
}
