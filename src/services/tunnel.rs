//! ngrok tunnels exposing the local listeners.
//!
//! Each tunnel is an `ngrok http <port>` agent process. Its public URL is
//! read back from the agent's local inspection API.

use std::process::Stdio;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::models::system::{NgrokTunnelList, TunnelStatus};

/// Inspection API ports; the first agent takes 4040, later ones the next free port.
const AGENT_API_PORTS: [u16; 3] = [4040, 4041, 4042];
const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(500);
const STARTUP_ATTEMPTS: u32 = 30;

#[derive(Default)]
struct TunnelState {
    webhook_public_url: Option<String>,
    api_public_url: Option<String>,
    agents: Vec<Child>,
}

pub struct TunnelService {
    auth_token: Option<SecretString>,
    http: reqwest::Client,
    state: Mutex<TunnelState>,
}

impl TunnelService {
    pub fn new(auth_token: Option<SecretString>) -> Self {
        Self {
            auth_token,
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            state: Mutex::new(TunnelState::default()),
        }
    }

    /// Open a tunnel to the webhook listener and return the GitHub webhook URL.
    pub async fn start_webhook_tunnel(&self, port: u16) -> Option<String> {
        let public_url = self.open_tunnel(port).await?;
        let webhook_url = webhook_url_for(&public_url);
        info!("GitHub webhook URL: {}", webhook_url);
        self.state.lock().await.webhook_public_url = Some(public_url);
        Some(webhook_url)
    }

    pub async fn start_api_tunnel(&self, port: u16) -> Option<String> {
        let public_url = self.open_tunnel(port).await?;
        info!("API ngrok tunnel established: {}", public_url);
        self.state.lock().await.api_public_url = Some(public_url.clone());
        Some(public_url)
    }

    pub async fn webhook_url(&self) -> Option<String> {
        self.state
            .lock()
            .await
            .webhook_public_url
            .as_deref()
            .map(webhook_url_for)
    }

    pub async fn api_url(&self) -> Option<String> {
        self.state.lock().await.api_public_url.clone()
    }

    pub async fn status(&self) -> TunnelStatus {
        TunnelStatus {
            webhook_url: self.webhook_url().await,
            api_url: self.api_url().await,
        }
    }

    /// Kill every agent started by this service.
    pub async fn close_tunnels(&self) {
        let mut state = self.state.lock().await;
        for mut agent in state.agents.drain(..) {
            if let Err(e) = agent.kill().await {
                error!("Error closing ngrok tunnel: {}", e);
            }
        }
        state.webhook_public_url = None;
        state.api_public_url = None;
        info!("All ngrok tunnels closed");
    }

    async fn open_tunnel(&self, port: u16) -> Option<String> {
        let mut command = Command::new("ngrok");
        command
            .args(["http", &port.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        match &self.auth_token {
            Some(token) => {
                command.env("NGROK_AUTHTOKEN", token.expose_secret());
            }
            None => warn!("No NGROK_AUTH_TOKEN provided. Tunnels will be limited and temporary."),
        }

        let agent = match command.spawn() {
            Ok(agent) => agent,
            Err(e) => {
                error!("Failed to start ngrok for port {}: {}", port, e);
                return None;
            }
        };
        self.state.lock().await.agents.push(agent);

        for _ in 0..STARTUP_ATTEMPTS {
            tokio::time::sleep(STARTUP_POLL_INTERVAL).await;
            if let Some(url) = self.find_public_url(port).await {
                return Some(url);
            }
        }

        error!("Failed to establish ngrok tunnel for port {}", port);
        None
    }

    async fn find_public_url(&self, port: u16) -> Option<String> {
        for api_port in AGENT_API_PORTS {
            let url = format!("http://127.0.0.1:{}/api/tunnels", api_port);
            let Ok(response) = self.http.get(&url).send().await else {
                continue;
            };
            let Ok(list) = response.json::<NgrokTunnelList>().await else {
                continue;
            };
            if let Some(found) = select_public_url(&list, port) {
                return Some(found);
            }
        }
        None
    }
}

/// Public URL of the tunnel forwarding to `port`, preferring https.
fn select_public_url(list: &NgrokTunnelList, port: u16) -> Option<String> {
    let suffix = format!(":{}", port);
    let mut matching = list
        .tunnels
        .iter()
        .filter(|t| t.config.addr.ends_with(&suffix));
    let first = matching.clone().next();
    matching
        .find(|t| t.proto == "https" || t.public_url.starts_with("https://"))
        .or(first)
        .map(|t| t.public_url.clone())
}

fn webhook_url_for(public_url: &str) -> String {
    format!("{}/webhook/github", public_url.trim_end_matches('/'))
}
