//! # Server Configuration
//!
//! Router assembly, middleware stack and OpenAPI document for the Outreach CRM API.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{ChainedVerifier, SharedVerifier, auth_middleware};
use crate::config::AppConfig;
use crate::error::{ApiError, ErrorType};
use crate::handlers::{
    self, activities, companies, dashboard, engagements, files, follow_ups, resources, tags,
};
use crate::telemetry::{REQUEST_ID_HEADER, TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub verifier: SharedVerifier,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/companies",
            get(companies::list_companies).post(companies::create_company),
        )
        .route(
            "/companies/{id}",
            get(companies::get_company)
                .put(companies::update_company)
                .delete(companies::delete_company),
        )
        .route("/companies/{id}/tags", post(tags::attach_company_tag))
        .route(
            "/companies/{id}/tags/{tag_id}",
            delete(tags::detach_company_tag),
        )
        .route(
            "/engagements",
            get(engagements::list_engagements).post(engagements::create_engagement),
        )
        .route(
            "/engagements/{id}",
            get(engagements::get_engagement)
                .put(engagements::update_engagement)
                .delete(engagements::delete_engagement),
        )
        .route("/follow-ups", get(follow_ups::list_follow_ups))
        .route("/follow-ups/{id}", put(follow_ups::update_follow_up))
        .route(
            "/activities",
            get(activities::list_activities).post(activities::create_activity),
        )
        .route(
            "/activities/{id}",
            get(activities::get_activity)
                .put(activities::update_activity)
                .delete(activities::delete_activity),
        )
        .route("/files", get(files::list_files).post(files::create_file))
        .route("/files/{id}", delete(files::delete_file))
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/{id}", delete(tags::delete_tag))
        .route(
            "/resources",
            get(resources::list_resources).post(resources::create_resource),
        )
        .route("/resources/distribute", post(resources::distribute_resource))
        .route(
            "/resources/{id}",
            get(resources::get_resource)
                .put(resources::update_resource)
                .delete(resources::delete_resource),
        )
        .route("/distributions/{id}/click", post(resources::record_click))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route_layer(middleware::from_fn_with_state(
            state.verifier.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(protected)
        .fallback(route_not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(trace_context_middleware))
}

async fn route_not_found() -> ApiError {
    ErrorType::NotFound.into()
}

async fn method_not_allowed() -> ApiError {
    ErrorType::MethodNotAllowed.into()
}

/// Configured origins only; local and test profiles with no list allow any origin.
fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.cors_allowed_origins.is_empty() {
        return if config.is_development() {
            CorsLayer::permissive()
        } else {
            CorsLayer::new()
        };
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, REQUEST_ID_HEADER])
        .expose_headers([TRACE_ID_HEADER])
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let verifier: SharedVerifier = Arc::new(
        ChainedVerifier::from_config(&config).context("Failed to build token verifier")?,
    );

    let addr = config.bind_addr().context("Invalid server address")?;
    let profile = config.profile.clone();

    let state = AppState {
        db,
        config: Arc::new(config),
        verifier,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::companies::list_companies,
        crate::handlers::companies::create_company,
        crate::handlers::companies::get_company,
        crate::handlers::companies::update_company,
        crate::handlers::companies::delete_company,
        crate::handlers::engagements::list_engagements,
        crate::handlers::engagements::create_engagement,
        crate::handlers::engagements::get_engagement,
        crate::handlers::engagements::update_engagement,
        crate::handlers::engagements::delete_engagement,
        crate::handlers::follow_ups::list_follow_ups,
        crate::handlers::follow_ups::update_follow_up,
        crate::handlers::activities::list_activities,
        crate::handlers::activities::create_activity,
        crate::handlers::activities::get_activity,
        crate::handlers::activities::update_activity,
        crate::handlers::activities::delete_activity,
        crate::handlers::files::list_files,
        crate::handlers::files::create_file,
        crate::handlers::files::delete_file,
        crate::handlers::tags::list_tags,
        crate::handlers::tags::create_tag,
        crate::handlers::tags::delete_tag,
        crate::handlers::tags::attach_company_tag,
        crate::handlers::tags::detach_company_tag,
        crate::handlers::resources::list_resources,
        crate::handlers::resources::create_resource,
        crate::handlers::resources::get_resource,
        crate::handlers::resources::update_resource,
        crate::handlers::resources::delete_resource,
        crate::handlers::resources::distribute_resource,
        crate::handlers::resources::record_click,
        crate::handlers::dashboard::get_dashboard,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::HealthStatus,
            crate::error::ApiError,
            crate::handlers::companies::CompanyDto,
            crate::handlers::companies::CompanyDetailDto,
            crate::handlers::companies::CompanyRequest,
            crate::handlers::engagements::EngagementDto,
            crate::handlers::engagements::EngagementRequest,
            crate::handlers::engagements::FollowUpRequest,
            crate::handlers::follow_ups::FollowUpDto,
            crate::handlers::activities::ActivityDto,
            crate::handlers::activities::ActivityRequest,
            crate::handlers::files::FileDto,
            crate::handlers::files::CreateFileRequest,
            crate::handlers::tags::TagDto,
            crate::handlers::tags::CreateTagRequest,
            crate::handlers::tags::AttachTagRequest,
            crate::handlers::resources::ResourceDto,
            crate::handlers::resources::ResourceDetailDto,
            crate::handlers::resources::ResourceRequest,
            crate::handlers::resources::DistributionDto,
            crate::handlers::resources::DistributeRequest,
            crate::handlers::resources::DistributeResponse,
            crate::handlers::dashboard::DashboardDto,
            crate::handlers::dashboard::CountsDto,
            crate::handlers::dashboard::TotalsDto,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "companies", description = "Partner companies"),
        (name = "engagements", description = "Engagements and follow-up actions"),
        (name = "activities", description = "Additional learning activities"),
        (name = "files", description = "File attachments"),
        (name = "tags", description = "Company tags"),
        (name = "resources", description = "Resources and their distribution"),
        (name = "dashboard", description = "Programme summary")
    ),
    info(
        title = "Outreach CRM API",
        description = "Companies, engagements, activities and resources for an educational-outreach programme",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
