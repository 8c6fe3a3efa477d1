use std::sync::Arc;

use adopto_server::config::AppConfig;
use adopto_server::photos::PhotoPolicy;
use adopto_server::repositories::{PostgresOrgRepository, PostgresPetRepository, PostgresPhotoIndex};
use adopto_server::services::{OrgService, PetService};
use adopto_server::storage::GcsBlobStore;
use adopto_server::{api, migrator};
use axum::{routing::get, Router};
use sea_orm::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    dotenvy::dotenv().ok();

    adopto_server::telemetry::init_telemetry("adopto-server")?;
    let config = AppConfig::from_env()?;

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url).await?;

    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None).await?;

    adopto_server::metrics::init_metrics(&db).await?;

    let gcs_config = google_cloud_storage::client::ClientConfig::default()
        .with_auth()
        .await?;
    let gcs_client = google_cloud_storage::client::Client::new(gcs_config);
    let blob_store = Arc::new(GcsBlobStore::new(
        gcs_client,
        config.bucket_name.clone(),
        config.public_base_url.clone(),
    ));

    let orgs = Arc::new(PostgresOrgRepository::new(db.clone()));
    let pets = Arc::new(PostgresPetRepository::new(db.clone()));
    let photos = Arc::new(PostgresPhotoIndex::new(db.clone()));

    let pet_service = Arc::new(PetService::new(
        orgs.clone(),
        pets.clone(),
        photos,
        blob_store,
        PhotoPolicy::new(config.max_upload_bytes),
    ));
    let org_service = Arc::new(OrgService::new(orgs, pets));

    let app = app(&config, pet_service, org_service, prometheus_layer, metric_handle)?;

    let addr = config.bind_addr();
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn app(
    config: &AppConfig,
    pet_service: Arc<PetService>,
    org_service: Arc<OrgService>,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Result<Router, axum::http::header::InvalidHeaderValue> {
    let cors_origin = config.cors_origin.parse::<axum::http::HeaderValue>()?;

    Ok(api::router(pet_service, org_service)
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    // "METHOD /path", e.g. "PUT /pets/:id"
                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    let client_ip = request
                        .headers()
                        .get("x-forwarded-for")
                        .and_then(|v| v.to_str().ok())
                        .or_else(|| {
                            request
                                .headers()
                                .get("x-real-ip")
                                .and_then(|v| v.to_str().ok())
                        })
                        .unwrap_or("unknown");

                    // Handlers fill in the empty fields
                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        client_ip = client_ip,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        table = tracing::field::Empty,
                        action = tracing::field::Empty,
                        org_id = tracing::field::Empty,
                        pet_id = tracing::field::Empty,
                        business_event = tracing::field::Empty,
                        error = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency = tracing::field::Empty,
                    )
                })
                .on_request(|_request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {})
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("status", tracing::field::display(response.status()));
                        span.record("latency", tracing::field::debug(latency));
                        tracing::info!("request completed");
                    },
                ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(cors_origin)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(axum::extract::DefaultBodyLimit::max(config.max_request_bytes)))
}
