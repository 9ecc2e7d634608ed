//! Cookie Checker Service: standalone binary for validating cookie bundles
//! against declarative service configs.
//!
//! Hosts the RPC API on a single port. Default: http://127.0.0.1:9105/

mod config_store;
mod engine;
mod http;
mod routes;

use routes::AppState;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    let port: u16 = std::env::var("COOKIE_CHECKER_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9105);

    let configs_dir = config_store::configs_dir();
    if !configs_dir.exists() {
        log::warn!(
            "[COOKIE_CHECKER] Configs directory does not exist: {}",
            configs_dir.display()
        );
    } else {
        log::info!(
            "[COOKIE_CHECKER] Serving {} configs from {}",
            config_store::count_configs(&configs_dir),
            configs_dir.display()
        );
    }

    let state = Arc::new(AppState {
        configs_dir,
        start_time: Instant::now(),
    });

    let cors = tower_http::cors::CorsLayer::permissive();

    let app = axum::Router::new()
        .route("/rpc/check", axum::routing::post(routes::check_cookie))
        .route("/rpc/check/batch", axum::routing::post(routes::check_batch))
        .route("/rpc/status", axum::routing::get(routes::status))
        .with_state(state)
        .layer(cors);

    let addr = format!("127.0.0.1:{}", port);
    log::info!("[COOKIE_CHECKER] Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app).await.expect("Server error");
}
