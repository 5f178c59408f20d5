//! GitEvents server - main entry point.
//!
//! Runs the query API and the webhook listener as two actix-web servers on
//! one runtime, plus the branch monitor when a GitHub token is configured.

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::{Files, NamedFile};
use actix_web::{App, HttpRequest, HttpServer, Result as ActixResult, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gitevents_lib::api::{self, ApiDoc};
use gitevents_lib::config::Config;
use gitevents_lib::db::DbPool;
use gitevents_lib::middleware;
use gitevents_lib::services::post_merge::register_post_merge_handler;
use gitevents_lib::services::{
    AutoPrStore, BranchMonitor, EventHandler, GitHubClient, MonitorHandle, SettingsService,
    TokenChecker, TunnelService, WebhookSecret,
};

/// GitHub caps webhook payloads at 25 MB.
const MAX_WEBHOOK_PAYLOAD: usize = 25 * 1024 * 1024;

/// SPA fallback handler - serves index.html for client-side routing.
async fn spa_fallback(req: HttpRequest) -> ActixResult<NamedFile> {
    let static_dir = req
        .app_data::<web::Data<PathBuf>>()
        .ok_or_else(|| actix_web::error::ErrorNotFound("Static dir not configured"))?;
    Ok(NamedFile::open(static_dir.join("index.html"))?)
}

fn start_branch_monitor(config: &Config, store: &AutoPrStore) -> Option<MonitorHandle> {
    let Some(token) = config.github_token.clone() else {
        info!("GITHUB_TOKEN not set, branch monitor disabled");
        return None;
    };

    match GitHubClient::new(token) {
        Ok(client) => {
            info!("Starting branch monitor");
            Some(BranchMonitor::new(Arc::new(client), store.clone()).start())
        }
        Err(e) => {
            error!("Failed to create GitHub client: {}", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("Check API_PORT, WEBHOOK_PORT, DB_TYPE and RUST_ENV in your .env file");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  GitEvents {}", env!("CARGO_PKG_VERSION"));
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.webhook_secret.is_none() {
        if config.environment.is_production() {
            warn!("GITHUB_WEBHOOK_SECRET is not set - webhook deliveries will NOT be verified!");
        } else {
            info!("GITHUB_WEBHOOK_SECRET not set, signature verification disabled");
        }
    }

    let pool = match DbPool::new(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!(
                "Failed to connect to {} database at {}: {}",
                config.database.db_type,
                config.database.redacted_location(),
                e
            );
            std::process::exit(1);
        }
    };
    info!(
        "Connected to {} database at {}",
        config.database.db_type,
        config.database.redacted_location()
    );

    pool.run_migrations().await.map_err(std::io::Error::other)?;
    info!("Database migrations complete");

    let auto_pr_store = AutoPrStore::load(&config.auto_pr_config_path);
    let event_handler = web::Data::new(EventHandler::new(pool.clone()));
    register_post_merge_handler(&event_handler, auto_pr_store.clone()).await;

    let monitor = start_branch_monitor(&config, &auto_pr_store);

    let tunnels = web::Data::new(TunnelService::new(config.ngrok_auth_token.clone()));
    if config.enable_ngrok {
        match tunnels.start_webhook_tunnel(config.webhook_port).await {
            Some(url) => info!("Webhook URL: {}", url),
            None => warn!("Webhook tunnel could not be started"),
        }
        match tunnels.start_api_tunnel(config.api_port).await {
            Some(url) => info!("API URL: {}", url),
            None => warn!("API tunnel could not be started"),
        }
    }

    // Shared state
    let pool_data = web::Data::new(pool);
    let config_data = web::Data::new(config.clone());
    let settings = web::Data::new(SettingsService::new(config.env_file.clone()));
    let store_data = web::Data::new(auto_pr_store);
    let checker = web::Data::new(TokenChecker::new());
    let secret = web::Data::new(WebhookSecret::new(config.webhook_secret.clone()));
    let static_dir = config.static_dir.clone();
    let is_development = config.is_development();

    if static_dir.is_some() {
        info!("Static file serving enabled from {:?}", static_dir);
    }

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    let api_address = config.api_bind_address();
    let webhook_address = config.webhook_bind_address();
    info!(
        "Starting API at http://{} and webhook listener at http://{} ({} workers each)",
        api_address, webhook_address, worker_count
    );

    let api_tunnels = tunnels.clone();
    let api_server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        let mut app = App::new()
            .wrap(cors)
            .wrap(middleware::RequestLogger)
            .app_data(pool_data.clone())
            .app_data(config_data.clone())
            .app_data(settings.clone())
            .app_data(store_data.clone())
            .app_data(checker.clone())
            .app_data(api_tunnels.clone())
            .configure(api::configure_api_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            );

        if let Some(ref dir) = static_dir {
            app = app
                .app_data(web::Data::new(dir.clone()))
                .service(Files::new("/assets", dir.join("assets")).prefer_utf8(true))
                .service(Files::new("/favicon", dir.clone()).index_file("favicon.ico"))
                .default_service(web::route().to(spa_fallback));
        }

        app
    })
    .workers(worker_count)
    .bind(&api_address)?
    .run();

    let webhook_handler = event_handler.clone();
    let webhook_server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::RequestLogger)
            .app_data(web::PayloadConfig::new(MAX_WEBHOOK_PAYLOAD))
            .app_data(secret.clone())
            .app_data(webhook_handler.clone())
            .configure(api::configure_webhook_routes)
    })
    .workers(worker_count)
    .bind(&webhook_address)?
    .run();

    let result = futures_util::future::try_join(api_server, webhook_server)
        .await
        .map(|_| ());

    info!("Shutting down");
    if let Some(monitor) = monitor {
        monitor.stop().await;
    }
    tunnels.close_tunnels().await;
    event_handler.unsubscribe_all().await;

    result
}
