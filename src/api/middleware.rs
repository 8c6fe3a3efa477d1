use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tower_cookies::Cookies;
use uuid::Uuid;

/// Cookie carrying the id of the signed-in org.
pub const ORG_COOKIE: &str = "adopto_org";

/// The org making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedOrg(pub Uuid);

pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    if let Some(cookie) = cookies.get(ORG_COOKIE) {
        if let Ok(org_id) = cookie.value().parse::<Uuid>() {
            tracing::Span::current().record("org_id", tracing::field::display(org_id));
            request.extensions_mut().insert(AuthenticatedOrg(org_id));
            return next.run(request).await;
        }
    }
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
}
