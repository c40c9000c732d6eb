use dotenvy::dotenv;
use order_kv_service::application::order_service::OrderService;
use order_kv_service::config::Config;
use order_kv_service::{build_repository, build_server, AppState};
use tokio_util::sync::CancellationToken;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(std::io::Error::other)?;
    let repo = build_repository(&config).await.map_err(std::io::Error::other)?;

    let shutdown = CancellationToken::new();
    let state = AppState {
        orders: OrderService::new(repo),
        request_timeout: config.request_timeout,
        list_page_size: config.list_page_size,
        shutdown: shutdown.clone(),
    };

    // actix stops accepting on Ctrl-C on its own; this aborts in-flight store calls.
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("Shutdown requested, cancelling in-flight requests");
            shutdown.cancel();
        }
    });

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
