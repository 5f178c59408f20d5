//! Webhook event dispatch.
//!
//! Deliveries are keyed `"<event>:<action>"` (or just `"<event>"` when the
//! payload has no action). Every delivery is offered to the persister first;
//! storage failures are logged and never reach the caller. A callback
//! registered for the key then produces the response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::BoxFuture;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::db::DbPool;
use crate::error::AppResult;

use super::persister::EventPersister;

/// Async callback invoked with the raw payload.
pub type EventCallback = Arc<dyn Fn(Value) -> BoxFuture<'static, AppResult<Value>> + Send + Sync>;

/// GitHub delivery headers forwarded from the webhook request.
#[derive(Debug, Clone, Default)]
pub struct WebhookHeaders {
    pub event: Option<String>,
    pub delivery: Option<String>,
    pub hook_id: Option<String>,
    pub installation_target_id: Option<String>,
    pub installation_target_type: Option<String>,
}

/// Compute the dispatch key of a delivery.
///
/// Without an `X-GitHub-Event` header the delivery is treated as simulated:
/// `pull_request:<action>` when an action exists, else the payload's `type`,
/// else `unknown`.
pub fn event_key(payload: &Value, headers: Option<&WebhookHeaders>) -> String {
    let action = payload.get("action").and_then(Value::as_str);

    match headers.and_then(|h| h.event.as_deref()) {
        Some(event) => match action {
            Some(action) if !action.is_empty() => format!("{}:{}", event, action),
            _ => event.to_string(),
        },
        None => match action {
            Some(action) => format!("pull_request:{}", action),
            None => payload
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown")
                .to_string(),
        },
    }
}

pub struct EventHandler {
    persister: EventPersister,
    handlers: RwLock<HashMap<String, EventCallback>>,
}

impl EventHandler {
    pub fn new(pool: DbPool) -> Self {
        Self {
            persister: EventPersister::new(pool),
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a callback for an event key, replacing any previous one.
    pub async fn register<F, Fut>(&self, key: &str, callback: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Value>> + Send + 'static,
    {
        info!("Registering handler for {}", key);
        let callback: EventCallback = Arc::new(move |payload| Box::pin(callback(payload)));
        self.handlers.write().await.insert(key.to_string(), callback);
    }

    pub async fn unsubscribe_all(&self) {
        info!("Clearing all event handlers");
        self.handlers.write().await.clear();
    }

    pub async fn is_registered(&self, key: &str) -> bool {
        self.handlers.read().await.contains_key(key)
    }

    /// Handle one delivery.
    ///
    /// GitHub App installation callbacks are acknowledged without storage.
    /// Only a failing callback produces an error.
    pub async fn handle(&self, payload: Value, headers: Option<&WebhookHeaders>) -> AppResult<Value> {
        if let (Some(installation_id), Some(code)) = (payload.get("installation_id"), payload.get("code")) {
            info!("GitHub App installation callback: installation {}", installation_id);
            return Ok(json!({
                "message": "GitHub app installation details received",
                "details": {
                    "code": code,
                    "installation_id": installation_id,
                    "setup_action": payload.get("setup_action").cloned().unwrap_or(Value::Null),
                }
            }));
        }

        let key = event_key(&payload, headers);
        if let Some(delivery) = headers.and_then(|h| h.delivery.as_deref()) {
            debug!("Delivery {} keyed as {}", delivery, key);
        }

        if let Err(e) = self.persister.persist(&key, &payload, Utc::now()).await {
            error!("Error storing {} event in database: {}", key, e);
        }

        // Clone the callback out so the lock is not held across the await
        let callback = self.handlers.read().await.get(&key).cloned();
        match callback {
            Some(callback) => {
                info!("Handling event: {}", key);
                callback(payload).await
            }
            None => {
                info!("No handler found for event type: {}", key);
                Ok(json!({ "message": "Event type not handled" }))
            }
        }
    }
}
