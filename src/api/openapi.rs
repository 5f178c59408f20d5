//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "GitEvents",
        version = "0.3.0",
        description = "GitHub webhook ingestion with an event query API, branch automation and post-merge scripts"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health
        api::health::health,
        api::health::ready,
        // Webhook listener
        api::webhook::receive_webhook,
        api::webhook::webhook_health,
        // Events
        api::events::pr_events,
        api::events::branch_events,
        api::events::push_events,
        api::events::all_events,
        // Repositories
        api::repos::list_repos,
        api::repos::list_repo_prs,
        api::repos::pr_history,
        // Settings
        api::settings::get_settings,
        api::settings::update_settings,
        api::settings::get_config,
        api::settings::update_config,
        // Database
        api::database::database_info,
        api::database::test_connection,
        api::database::update_database_config,
        api::database::create_sqlite,
        // Auto PR
        api::auto_pr::get_auto_pr_config,
        api::auto_pr::update_auto_pr_config,
        api::auto_pr::list_projects,
        api::auto_pr::add_project,
        api::auto_pr::list_scripts,
        api::auto_pr::add_script,
        api::auto_pr::remove_script,
        // System
        api::system::tunnels,
        api::system::validate_tokens,
    ),
    components(
        schemas(
            error::ErrorResponse,
            models::OperationResult,
            api::health::Liveness,
            api::health::Readiness,
            // Events
            models::events::PrEventResponse,
            models::events::PrEventPullRequest,
            models::events::PrEventRepository,
            models::events::PrEventUser,
            models::events::BranchEventResponse,
            models::events::PushEventResponse,
            models::events::CombinedEvent,
            models::events::PrHistoryEvent,
            models::RepositoryResponse,
            models::PullRequestResponse,
            // Settings
            models::Settings,
            models::ConfigView,
            models::ConfigUpdate,
            models::settings::ConfigUpdateResponse,
            // Database
            models::database::DatabaseConfigRequest,
            models::database::DatabaseInfo,
            // Auto PR
            models::AutoPrConfig,
            models::AutoPrSettings,
            models::PostMergeScripts,
            models::PostMergeScript,
            models::Project,
            models::auto_pr::CreateProjectRequest,
            models::auto_pr::CreateScriptRequest,
            // System
            models::system::TunnelStatus,
            models::system::TokenValidation,
            models::system::TokenValidationResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Webhook", description = "GitHub webhook listener"),
        (name = "Events", description = "Stored event feeds"),
        (name = "Repositories", description = "Repositories and pull requests"),
        (name = "Settings", description = "Settings stored in the .env file"),
        (name = "Database", description = "Database backend management"),
        (name = "Auto PR", description = "Automatic PRs and post-merge scripts"),
        (name = "System", description = "Tunnels and token validation")
    ),
    modifiers(&WebhookSignatureAddon)
)]
pub struct ApiDoc;

/// Document the webhook HMAC header as a security scheme.
struct WebhookSignatureAddon;

impl utoipa::Modify for WebhookSignatureAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "webhook_signature",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new(
                            crate::config::SIGNATURE_HEADER,
                        ),
                    ),
                ),
            );
        }
    }
}
