/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasknest_api::{app::{build_router, AppState}, config::Config};
/// use tasknest_shared::{notify::LogNotifier, store::memory::MemoryStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), Arc::new(LogNotifier), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::auth::require_auth, middleware::security::SecurityHeadersLayer};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasknest_shared::{
    auth::tokens::TokenService,
    notify::{Notifications, Notifier},
    services::{Accounts, Tasks},
    store::Store,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 16 * 1024;

/// Shared application state
///
/// Cloned into every handler through Axum's `State` extractor; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator
    pub store: Arc<dyn Store>,

    /// Bearer token issuing and validation
    pub tokens: TokenService,

    /// Account operations
    pub accounts: Accounts,

    /// Task operations
    pub tasks: Tasks,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the services around one store and one notifier
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, config: Config) -> Self {
        let tokens = TokenService::new(config.jwt.secret.as_str(), store.clone());
        let accounts = Accounts::new(store.clone(), tokens.clone(), Notifications::new(notifier));
        let tasks = Tasks::new(store.clone());

        Self {
            store,
            tokens,
            accounts,
            tasks,
            config: Arc::new(config),
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Routes
///
/// ```text
/// /
/// ├── GET    /health
/// ├── POST   /users                  (public)
/// ├── POST   /users/login            (public)
/// ├── GET    /users/:id/avatar       (public)
/// ├── POST   /users/logout
/// ├── POST   /users/logout-all
/// ├── GET    /users/me
/// ├── PATCH  /users/me
/// ├── DELETE /users/me
/// ├── POST   /users/me/avatar
/// ├── DELETE /users/me/avatar
/// ├── POST   /tasks
/// ├── GET    /tasks
/// ├── GET    /tasks/:id
/// ├── PATCH  /tasks/:id
/// └── DELETE /tasks/:id
/// ```
///
/// Unmarked routes require a bearer token.
///
/// # Middleware Stack
///
/// 1. Security headers
/// 2. CORS
/// 3. Request tracing
/// 4. Authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes::{avatar, health, index, tasks, users};

    let public_routes = Router::new()
        .route("/", get(index::index))
        .route("/health", get(health::health_check))
        .route("/users", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/:id/avatar", get(avatar::get_avatar));

    let avatar_limit = state.config.upload.avatar_max_bytes + MULTIPART_OVERHEAD_BYTES;

    let protected_routes = Router::new()
        .route("/users/logout", post(users::logout))
        .route("/users/logout-all", post(users::logout_all))
        .route(
            "/users/me",
            get(users::me).patch(users::update_me).delete(users::delete_me),
        )
        .route(
            "/users/me/avatar",
            post(avatar::upload_avatar)
                .layer(DefaultBodyLimit::max(avatar_limit))
                .delete(avatar::delete_avatar),
        )
        .route("/tasks", post(tasks::create_task).get(tasks::list_tasks))
        .route(
            "/tasks/:id",
            get(tasks::get_task)
                .patch(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
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
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}
