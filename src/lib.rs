pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{middleware::Logger, web, App, HttpServer};
use tokio_util::sync::CancellationToken;

use application::order_service::OrderService;
use config::{Config, StoreBackend};
use domain::context::Context;
use domain::ports::OrderRepository;
use errors::AppError;
use infrastructure::{EngineError, KvOrderRepository, MemoryEngine, RedisEngine};

/// Shared by every request handler.
pub struct AppState {
    pub orders: OrderService,
    pub request_timeout: Duration,
    pub list_page_size: u64,
    /// Fired on shutdown; each request context holds a child token.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn context(&self) -> Context {
        Context::new(self.shutdown.child_token()).with_timeout(self.request_timeout)
    }
}

/// Builds the order repository for the configured backend.
pub async fn build_repository(config: &Config) -> Result<Arc<dyn OrderRepository>, EngineError> {
    let repo: Arc<dyn OrderRepository> = match config.backend {
        StoreBackend::Redis => {
            let engine = RedisEngine::connect(&config.redis_url).await?;
            Arc::new(KvOrderRepository::new(engine))
        }
        StoreBackend::Memory => {
            log::warn!("Using the in-memory store; orders are lost on restart");
            Arc::new(KvOrderRepository::new(MemoryEngine::new()))
        }
    };
    Ok(repo)
}

/// Registers every route on `cfg`.
///
/// Body and query extraction failures go through `AppError` so they carry the
/// same JSON error body as every other 400.
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
            )
            .route("/", web::get().to(handlers::orders::health))
            .route("/api-docs/openapi.json", web::get().to(handlers::openapi_json))
            .service(
                web::scope("/orders")
                    .route("", web::post().to(handlers::orders::create_order))
                    .route("", web::get().to(handlers::orders::list_orders))
                    .route("/{id}", web::get().to(handlers::orders::get_order))
                    .route("/{id}", web::put().to(handlers::orders::update_order))
                    .route("/{id}", web::delete().to(handlers::orders::delete_order)),
            );
    }
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    state: AppState,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(state);
    Ok(HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure(state.clone()))
    })
    .bind((host.to_string(), port))?
    .run())
}
