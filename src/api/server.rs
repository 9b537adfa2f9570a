//! HTTP API server

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::accounts::AccountService;
use crate::auth::{Authenticator, PasswordHasher, SessionCache, TokenService};
use crate::cache::{CacheStore, MemoryCacheStore, RedisCacheStore};
use crate::config::Config;
use crate::contacts::ContactService;
use crate::db::{ContactStore, MemoryStore, PgStore, UserStore};
use crate::error::Result;
use crate::mail::{self, LogMailer, Mailer};
use crate::upload::{AvatarUploader, CloudinaryUploader};

use super::ratelimit::RateLimiter;
use super::{auth, contacts, routes, users};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub accounts: AccountService,
    pub contacts: ContactService,
    pub authenticator: Authenticator,
    pub users: Arc<dyn UserStore>,
    pub limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;

/// The external systems the service talks to
pub struct Backends {
    pub users: Arc<dyn UserStore>,
    pub contacts: Arc<dyn ContactStore>,
    pub cache: Arc<dyn CacheStore>,
    pub mailer: Arc<dyn Mailer>,
    pub uploader: Option<Arc<dyn AvatarUploader>>,
}

impl Backends {
    /// PostgreSQL and Redis as configured
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = PgStore::connect(&config.database).await?;
        let cache = RedisCacheStore::connect(&config.cache.url).await?;
        Ok(Self {
            users: Arc::new(store.clone()),
            contacts: Arc::new(store),
            cache: Arc::new(cache),
            mailer: mail::from_config(&config.mail)?,
            uploader: uploader_from(config),
        })
    }

    /// Everything in process; nothing survives a restart
    pub fn in_memory(config: &Config) -> Self {
        let store = MemoryStore::new();
        Self {
            users: Arc::new(store.clone()),
            contacts: Arc::new(store),
            cache: Arc::new(MemoryCacheStore::new()),
            mailer: Arc::new(LogMailer::new(&config.mail)),
            uploader: uploader_from(config),
        }
    }
}

fn uploader_from(config: &Config) -> Option<Arc<dyn AvatarUploader>> {
    match &config.cloudinary {
        Some(cloudinary) => Some(Arc::new(CloudinaryUploader::new(cloudinary.clone()))),
        None => {
            tracing::warn!("No [cloudinary] section configured, avatar uploads are disabled");
            None
        }
    }
}

/// Wire services on top of `backends`
pub fn build_state(config: Config, backends: Backends) -> Result<SharedState> {
    if config.auth.uses_default_secret() {
        tracing::warn!("Signing tokens with the built-in secret key; set [auth] secret_key");
    }
    let tokens = TokenService::from_config(&config.auth)?;
    let cache = SessionCache::new(backends.cache, config.cache.ttl_secs);

    let authenticator = Authenticator::new(
        tokens.clone(),
        cache.clone(),
        backends.users.clone(),
        config.auth.role_reconciliation,
    );

    let mut accounts = AccountService::new(
        backends.users.clone(),
        cache,
        tokens,
        PasswordHasher::new(config.auth.bcrypt_cost),
        backends.mailer,
        config.server.public_url.clone(),
    );
    if let Some(uploader) = backends.uploader {
        accounts = accounts.with_uploader(uploader);
    }

    let limiter = RateLimiter::from_config(&config.rate_limit);

    Ok(Arc::new(AppState {
        config,
        accounts,
        contacts: ContactService::new(backends.contacts),
        authenticator,
        users: backends.users,
        limiter,
    }))
}

/// Serve on an already bound listener until the process is stopped
pub async fn serve(listener: TcpListener, state: SharedState) -> Result<()> {
    spawn_limiter_cleanup(state.clone());

    let app = create_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16, in_memory: bool) -> Result<()> {
    let backends = if in_memory {
        tracing::warn!("Using in-memory stores, data is lost on exit");
        Backends::in_memory(&config)
    } else {
        Backends::connect(&config).await?
    };
    let state = build_state(config, backends)?;

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    serve(listener, state).await
}

fn spawn_limiter_cleanup(state: SharedState) {
    let period = Duration::from_secs(state.config.rate_limit.window_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            state.limiter.cleanup().await;
        }
    });
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        // Auth routes
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/confirmed_email/{token}", get(auth::confirmed_email))
        .route("/auth/me", get(auth::me))
        .route(
            "/auth/request-reset-password",
            post(auth::request_reset_password),
        )
        .route("/auth/reset-password/{token}", post(auth::reset_password))
        // User routes
        .route("/user/avatar", patch(users::update_avatar))
        // Contact routes
        .route(
            "/contacts",
            post(contacts::create_contact).get(contacts::list_contacts),
        )
        .route("/contacts/search", get(contacts::search_contacts))
        .route("/contacts/birthdays", get(contacts::upcoming_birthdays))
        .route(
            "/contacts/{id}",
            get(contacts::get_contact)
                .patch(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
