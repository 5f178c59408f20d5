//! API endpoint modules.

pub mod auto_pr;
pub mod database;
pub mod events;
pub mod health;
pub mod openapi;
pub mod repos;
pub mod settings;
pub mod system;
pub mod webhook;

use actix_web::web;

pub use health::configure_health_routes;
pub use openapi::ApiDoc;

/// Routes served by the API listener under `/api`.
pub fn configure_api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(configure_health_routes)
            .configure(events::configure_routes)
            .configure(repos::configure_routes)
            .configure(settings::configure_routes)
            .configure(database::configure_routes)
            .configure(auto_pr::configure_routes)
            .configure(system::configure_routes),
    );
}

/// Routes served by the webhook listener under `/webhook`.
pub fn configure_webhook_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").configure(webhook::configure_routes));
}
