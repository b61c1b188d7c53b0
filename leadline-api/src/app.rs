/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Routes
///
/// ```text
/// /
/// ├── /health                       # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register        # Public
///     │   ├── POST /login           # Public
///     │   ├── POST /refresh         # Public (token in header)
///     │   └── GET  /profile         # Protected
///     ├── /campaigns/               # Protected, owner-scoped
///     │   ├── GET/POST /
///     │   ├── GET/PUT/DELETE /:id
///     │   └── GET /:id/stats
///     └── /leads/                   # Protected, shared workspace
///         ├── GET/POST /
///         ├── GET/PUT/DELETE /:id
///         ├── GET /stats/overview
///         └── GET /export/csv
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Request logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Security headers
/// 4. JWT authentication (per route group)

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use leadline_shared::auth::middleware::{jwt_auth_middleware, AuthError};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the
/// config is behind an Arc so the clone is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Register, login, and refresh need no auth middleware; refresh reads
    // and verifies its own bearer token because it accepts expired ones.
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    let auth_protected = Router::new()
        .route("/profile", get(routes::auth::profile))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let campaign_routes = Router::new()
        .route("/", get(routes::campaigns::list))
        .route("/", post(routes::campaigns::create))
        .route("/:id", get(routes::campaigns::get))
        .route("/:id", put(routes::campaigns::update))
        .route("/:id", delete(routes::campaigns::delete))
        .route("/:id/stats", get(routes::campaigns::stats))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let lead_routes = Router::new()
        .route("/", get(routes::leads::list))
        .route("/", post(routes::leads::create))
        .route("/stats/overview", get(routes::leads::stats_overview))
        .route("/export/csv", get(routes::leads::export_csv))
        .route("/:id", get(routes::leads::get))
        .route("/:id", put(routes::leads::update))
        .route("/:id", delete(routes::leads::delete))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/campaigns", campaign_routes)
        .nest("/leads", lead_routes);

    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// JWT authentication layer
///
/// Delegates to the shared middleware, which validates the bearer token,
/// re-checks the account is active, and injects `AuthContext`.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(
        state.db.clone(),
        state.config.jwt.secret.clone(),
        req,
        next,
    )
    .await
}
