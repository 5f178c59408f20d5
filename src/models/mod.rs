//! Domain models for GitEvents.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod auto_pr;
pub mod database;
pub mod events;
pub mod github;
pub mod repository;
pub mod settings;
pub mod system;

// Re-export commonly used types
pub use auto_pr::{AutoPrConfig, AutoPrSettings, PostMergeScript, PostMergeScripts, Project};
pub use events::{
    BranchEventResponse, CombinedEvent, LimitParams, PrEventResponse, PrHistoryEvent,
    PushEventResponse,
};
pub use repository::{PullRequestResponse, RepositoryResponse};
pub use settings::{ConfigUpdate, ConfigView, Settings};

/// Outcome of an operation that reports failure in-band instead of as an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperationResult {
    pub success: bool,
    pub message: String,
}

impl OperationResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
