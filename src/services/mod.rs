//! Business logic services.

pub mod auto_pr;
pub mod event_handler;
pub mod github_api;
pub mod persister;
pub mod post_merge;
pub mod settings;
pub mod signature;
pub mod token_check;
pub mod tunnel;

pub use auto_pr::{AutoPrStore, BranchMonitor, MonitorHandle};
pub use event_handler::{EventHandler, WebhookHeaders};
pub use github_api::{GitHubApi, GitHubClient};
pub use settings::SettingsService;
pub use signature::{SignatureCheck, WebhookSecret};
pub use token_check::TokenChecker;
pub use tunnel::TunnelService;
