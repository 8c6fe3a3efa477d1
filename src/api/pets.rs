use std::sync::Arc;

use axum::{
    extract::{Extension, Json, Multipart, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::error::ApiError;
use super::middleware::AuthenticatedOrg;
use crate::entities::pet::{EnergyLevel, PetSize};
use crate::photos::IncomingPhoto;
use crate::repositories::PetFilters;
use crate::services::{PetService, RegisterPet, UpdatePet};

/// Pet fields and photos read from a multipart body.
#[derive(Debug)]
pub struct PetForm {
    pub name: String,
    pub description: String,
    pub age_in_months: i32,
    pub size: PetSize,
    pub energy_level: EnergyLevel,
    pub adoption_requirements: Vec<String>,
    pub photos: Vec<IncomingPhoto>,
}

impl PetForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut name = None;
        let mut description = None;
        let mut age_in_months = None;
        let mut size = None;
        let mut energy_level = None;
        let mut adoption_requirements = Vec::new();
        let mut photos = Vec::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            let field_name = field.name().unwrap_or("").to_string();

            if field_name == "photos" {
                let filename = field.file_name().unwrap_or("photo").to_string();
                let mimetype = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream().to_string());
                let content = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                photos.push(IncomingPhoto::new(content, filename, mimetype));
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;

            match field_name.as_str() {
                "name" => name = Some(value),
                "description" => description = Some(value),
                "age_in_months" => {
                    age_in_months = Some(value.trim().parse::<i32>().map_err(|_| {
                        ApiError::BadRequest(format!("age_in_months must be an integer, got {value:?}"))
                    })?)
                }
                "size" => size = Some(value.parse::<PetSize>().map_err(ApiError::BadRequest)?),
                "energy_level" => {
                    energy_level = Some(value.parse::<EnergyLevel>().map_err(ApiError::BadRequest)?)
                }
                "adoption_requirements" => adoption_requirements.extend(parse_requirements(&value)?),
                _ => tracing::debug!(field = %field_name, "ignoring unknown form field"),
            }
        }

        let missing = |field: &str| ApiError::BadRequest(format!("{field} is required"));
        let age_in_months = age_in_months.ok_or_else(|| missing("age_in_months"))?;
        if age_in_months < 0 {
            return Err(ApiError::BadRequest("age_in_months must not be negative".into()));
        }
        if photos.is_empty() {
            return Err(ApiError::BadRequest("at least one photo is required".into()));
        }

        Ok(Self {
            name: name.filter(|n| !n.trim().is_empty()).ok_or_else(|| missing("name"))?,
            description: description.ok_or_else(|| missing("description"))?,
            age_in_months,
            size: size.ok_or_else(|| missing("size"))?,
            energy_level: energy_level.ok_or_else(|| missing("energy_level"))?,
            adoption_requirements,
            photos,
        })
    }
}

/// A requirements field is either a JSON string array or a single plain
/// requirement; repeated fields accumulate.
fn parse_requirements(value: &str) -> Result<Vec<String>, ApiError> {
    let trimmed = value.trim();
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<String>>(trimmed)
            .map_err(|e| ApiError::BadRequest(format!("adoption_requirements: {e}")));
    }
    if trimmed.is_empty() {
        return Ok(vec![]);
    }
    Ok(vec![trimmed.to_string()])
}

/// POST /pets
pub async fn create_pet(
    Extension(pets): Extension<Arc<PetService>>,
    Extension(AuthenticatedOrg(org_id)): Extension<AuthenticatedOrg>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = PetForm::from_multipart(multipart).await?;

    let profile = pets
        .register_pet(RegisterPet {
            name: form.name,
            description: form.description,
            age_in_months: form.age_in_months,
            size: form.size,
            energy_level: form.energy_level,
            adoption_requirements: form.adoption_requirements,
            photos: form.photos,
            org_id,
        })
        .await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "create_pet")
        .record("pet_id", tracing::field::display(profile.pet.id))
        .record("business_event", "Pet registered");

    Ok((StatusCode::CREATED, Json(profile)).into_response())
}

/// GET /pets/:id
pub async fn get_pet(
    Extension(pets): Extension<Arc<PetService>>,
    Path(pet_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    tracing::Span::current().record("pet_id", tracing::field::display(pet_id));
    let profile = pets.get_pet_profile(pet_id).await?;
    Ok((StatusCode::OK, Json(profile)).into_response())
}

/// PUT /pets/:id - replaces metadata and the photo set
pub async fn update_pet(
    Extension(pets): Extension<Arc<PetService>>,
    Extension(AuthenticatedOrg(org_id)): Extension<AuthenticatedOrg>,
    Path(pet_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    tracing::Span::current().record("pet_id", tracing::field::display(pet_id));
    let form = PetForm::from_multipart(multipart).await?;

    let profile = pets
        .update_pet(UpdatePet {
            id: pet_id,
            name: form.name,
            description: form.description,
            age_in_months: form.age_in_months,
            size: form.size,
            energy_level: form.energy_level,
            adoption_requirements: form.adoption_requirements,
            photos: form.photos,
            org_id,
        })
        .await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "update_pet")
        .record("business_event", "Pet updated");

    Ok((StatusCode::OK, Json(profile)).into_response())
}

/// DELETE /pets/:id
pub async fn delete_pet(
    Extension(pets): Extension<Arc<PetService>>,
    Extension(AuthenticatedOrg(org_id)): Extension<AuthenticatedOrg>,
    Path(pet_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    tracing::Span::current().record("pet_id", tracing::field::display(pet_id));
    pets.delete_pet(pet_id, org_id).await?;

    tracing::Span::current()
        .record("table", "pets")
        .record("action", "delete_pet")
        .record("business_event", "Pet soft-deleted");

    Ok((StatusCode::OK, Json(json!({"message": "Pet deleted"}))).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub city: String,
    #[serde(default = "default_page")]
    pub page: u64,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub size: Option<PetSize>,
    pub energy_level: Option<EnergyLevel>,
}

fn default_page() -> u64 {
    1
}

/// Highest page number accepted by the search route.
pub const MAX_PAGE: u64 = 10_000;

/// GET /pets?city=...
pub async fn search_pets(
    Extension(pets): Extension<Arc<PetService>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    if params.city.trim().is_empty() {
        return Err(ApiError::BadRequest("city is required".into()));
    }
    if params.page > MAX_PAGE {
        return Err(ApiError::BadRequest(format!("page must be at most {MAX_PAGE}")));
    }

    let filters = PetFilters {
        min_age_in_months: params.min_age,
        max_age_in_months: params.max_age,
        size: params.size,
        energy_level: params.energy_level,
    };
    let results = pets.search_by_city(&params.city, params.page.max(1), &filters).await?;

    Ok((
        StatusCode::OK,
        Json(json!({ "pets": results, "page": params.page.max(1) })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requirements_accept_json_arrays() {
        let parsed = parse_requirements(r#"["fenced yard", "no cats"]"#).unwrap();
        assert_eq!(parsed, vec!["fenced yard", "no cats"]);
    }

    #[test]
    fn requirements_accept_plain_values() {
        assert_eq!(parse_requirements(" fenced yard ").unwrap(), vec!["fenced yard"]);
        assert!(parse_requirements("  ").unwrap().is_empty());
    }

    #[test]
    fn malformed_requirement_arrays_are_rejected() {
        assert!(matches!(parse_requirements("[1, 2"), Err(ApiError::BadRequest(_))));
    }
}
