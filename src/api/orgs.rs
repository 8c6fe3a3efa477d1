use std::sync::Arc;

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use super::error::ApiError;
use super::middleware::AuthenticatedOrg;
use crate::repositories::NewOrg;
use crate::services::OrgService;

#[derive(Debug, Deserialize)]
pub struct OrgRequest {
    pub name: String,
    pub email: String,
    pub whatsapp: String,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl OrgRequest {
    fn validate(self) -> Result<NewOrg, ApiError> {
        let required = [
            ("name", &self.name),
            ("whatsapp", &self.whatsapp),
            ("address", &self.address),
            ("city", &self.city),
            ("zip_code", &self.zip_code),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ApiError::BadRequest(format!("{field} is required")));
        }

        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(ApiError::BadRequest(format!("invalid email {:?}", self.email))),
        }

        Ok(NewOrg {
            email: email.to_string(),
            name: self.name.trim().to_string(),
            whatsapp: self.whatsapp.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            zip_code: self.zip_code.trim().to_string(),
        })
    }
}

/// POST /orgs
pub async fn register_org(
    Extension(orgs): Extension<Arc<OrgService>>,
    Json(payload): Json<OrgRequest>,
) -> Result<Response, ApiError> {
    let org = orgs.register_org(payload.validate()?).await?;

    tracing::Span::current()
        .record("table", "orgs")
        .record("action", "register_org")
        .record("org_id", tracing::field::display(org.id))
        .record("business_event", "Org registered");

    Ok((StatusCode::CREATED, Json(org)).into_response())
}

/// PUT /orgs - replaces the signed-in org's profile
pub async fn update_org(
    Extension(orgs): Extension<Arc<OrgService>>,
    Extension(AuthenticatedOrg(org_id)): Extension<AuthenticatedOrg>,
    Json(payload): Json<OrgRequest>,
) -> Result<Response, ApiError> {
    let org = orgs.update_org(org_id, payload.validate()?).await?;

    tracing::Span::current()
        .record("table", "orgs")
        .record("action", "update_org")
        .record("business_event", "Org updated");

    Ok((StatusCode::OK, Json(org)).into_response())
}

/// DELETE /orgs - soft-delete the signed-in org and its pets
pub async fn delete_org(
    Extension(orgs): Extension<Arc<OrgService>>,
    Extension(AuthenticatedOrg(org_id)): Extension<AuthenticatedOrg>,
) -> Result<Response, ApiError> {
    let org = orgs.delete_org(org_id).await?;

    tracing::Span::current()
        .record("table", "orgs")
        .record("action", "delete_org")
        .record("business_event", "Org and its pets soft-deleted");

    Ok((StatusCode::OK, Json(json!({"message": "Org deleted", "id": org.id}))).into_response())
}
