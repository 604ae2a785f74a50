//! VOPRF gateway server.
//!
//! Exposes the two HTTP endpoints and three static artifacts from spec
//! §6: `POST /api/scan` (text-scan collaborator), `POST /api/scan/image`
//! (blind OPRF evaluation + DLEQ proof), and the key-commitment/DB
//! manifest artifacts the client verifies before trusting a scan.

mod config;
mod error;
mod routes;
mod services;
mod state;

use actix_web::{middleware, web, App, HttpServer};
use tracing::info;

use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("starting voprf gateway server");

    let config = Config::from_env();
    info!("configuration loaded");

    let app_state = web::Data::new(AppState::load(config.clone()));
    info!(public_key = %app_state.public_key_hex, "server key commitment ready");

    let bind_addr = format!("{}:{}", config.server_host, config.server_port);
    info!(%bind_addr, "starting http server");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .service(routes::health::health_check)
            .service(routes::artifacts::key_commitment)
            .service(routes::artifacts::evaluated_phashes)
            .service(routes::artifacts::database_signature)
            .service(routes::scan::scan_text)
            .service(routes::scan_image::scan_image)
    })
    .bind(&bind_addr)?
    .run()
    .await
}
