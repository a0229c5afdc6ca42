use std::sync::Arc;

use actix_web::{middleware, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use accessibility_analyzer::config::{Config, API_KEY_VAR};
use accessibility_analyzer::model::{CompletionProvider, GatewayClient};
use accessibility_analyzer::web::{routes, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting accessibility analyzer");

    let config = Config::from_env();
    if config.api_key.is_none() {
        warn!("{} is not set; analyzer requests will fail until it is configured", API_KEY_VAR);
    }
    if config.strict_actions {
        info!("Unknown actions will be rejected");
    }

    let provider: Arc<dyn CompletionProvider> = Arc::new(GatewayClient::new(&config));
    let bind_addr = (config.bind_host.clone(), config.bind_port);
    let app_state = Data::new(AppState::new(config, provider));

    info!("Listening on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(routes::cors_headers())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
