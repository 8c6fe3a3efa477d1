pub mod error;
pub mod middleware;
pub mod orgs;
pub mod pets;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::services::{OrgService, PetService};

pub use error::ApiError;
pub use middleware::{AuthenticatedOrg, ORG_COOKIE};

async fn health_check() -> &'static str {
    "OK"
}

/// Routes of the adoption API, without the observability layers.
pub fn router(pet_service: Arc<PetService>, org_service: Arc<OrgService>) -> Router {
    let public_routes = Router::new()
        .route("/pets", get(pets::search_pets))
        .route("/pets/:id", get(pets::get_pet))
        .route("/orgs", post(orgs::register_org));

    let protected_routes = Router::new()
        .route("/pets", post(pets::create_pet))
        .route("/pets/:id", axum::routing::put(pets::update_pet).delete(pets::delete_pet))
        .route("/orgs", axum::routing::put(orgs::update_org).delete(orgs::delete_org))
        .route_layer(axum::middleware::from_fn(middleware::auth_middleware));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(Extension(pet_service))
        .layer(Extension(org_service))
        .layer(tower_cookies::CookieManagerLayer::new())
}
