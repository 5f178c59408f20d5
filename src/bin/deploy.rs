//! One-command local deployment.
//!
//! Prepares `data/` and `.env`, initializes the database, then runs the
//! server (and optionally the dashboard) until Ctrl-C.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use clap::Parser;
use tokio::process::{Child, Command};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use gitevents_lib::config::{Config, DatabaseSettings, defaults};
use gitevents_lib::db::DbPool;

const DATA_DIR: &str = "data";
const FRONTEND_DIR: &str = "frontend";
const DASHBOARD_URL: &str = "http://localhost:3000";
const HEALTH_ATTEMPTS: u32 = 30;

const DEFAULT_ENV: &str = "# GitEvents environment

# Listeners
API_PORT=8001
WEBHOOK_PORT=8002

# GitHub
GITHUB_TOKEN=
GITHUB_WEBHOOK_SECRET=

# Database (SQLite by default)
DB_TYPE=SQLite
GITHUB_EVENTS_DB=data/github_events.db
# DB_TYPE=MySQL
# DB_HOST=localhost
# DB_PORT=3306
# DB_NAME=github_events
# DB_USER=admin
# DB_PASSWORD=password

# ngrok
ENABLE_NGROK=false
NGROK_AUTH_TOKEN=

# Open the dashboard after startup
OPEN_BROWSER=true
";

/// Deploy and start GitEvents locally.
#[derive(Parser)]
#[command(name = "gitevents-deploy", version, about = "Set up and start GitEvents")]
struct Cli {
    /// Do not start the dashboard dev server
    #[arg(long)]
    no_frontend: bool,

    /// Do not open a browser
    #[arg(long)]
    no_browser: bool,

    /// Run the server with RUST_LOG=debug
    #[arg(long)]
    debug: bool,
}

async fn command_version(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().await.ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn check_prerequisites(need_node: bool) -> bool {
    info!("Checking prerequisites...");
    let mut tools = vec![("git", "https://git-scm.com/downloads")];
    if need_node {
        tools.push(("node", "https://nodejs.org/"));
        tools.push(("npm", "https://nodejs.org/"));
    }

    let mut ok = true;
    for (tool, url) in tools {
        match command_version(tool, &["--version"]).await {
            Some(version) => info!("[OK] {} {}", tool, version),
            None => {
                error!("{} is not installed or not in PATH (see {})", tool, url);
                ok = false;
            }
        }
    }
    ok
}

fn setup_environment(env_file: &Path) -> std::io::Result<()> {
    if !Path::new(DATA_DIR).exists() {
        std::fs::create_dir_all(DATA_DIR)?;
        info!("[OK] Created {} directory", DATA_DIR);
    }

    if env_file.exists() {
        info!("[OK] {} already exists", env_file.display());
    } else {
        std::fs::write(env_file, DEFAULT_ENV)?;
        info!("[OK] Created default {}", env_file.display());
        warn!("Edit {} to add your GitHub token and webhook secret", env_file.display());
    }
    Ok(())
}

async fn initialize_database() -> bool {
    let settings = match Config::from_env() {
        Ok(config) => config.database,
        Err(e) => {
            warn!("Invalid configuration ({}), falling back to SQLite defaults", e);
            DatabaseSettings::sqlite(defaults::SQLITE_PATH)
        }
    };

    info!(
        "Initializing {} database at {}",
        settings.db_type,
        settings.redacted_location()
    );
    let pool = match DbPool::new(&settings).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return false;
        }
    };
    match pool.run_migrations().await {
        Ok(()) => {
            info!("[OK] Database initialized");
            true
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            false
        }
    }
}

/// The server binary sits next to this one after `cargo build`.
fn server_binary() -> PathBuf {
    let name = if cfg!(windows) { "gitevents.exe" } else { "gitevents" };
    std::env::current_exe()
        .ok()
        .map(|exe| exe.with_file_name(name))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(name))
}

fn start_server(debug: bool) -> std::io::Result<Child> {
    let binary = server_binary();
    info!("Starting server ({})", binary.display());
    let mut command = Command::new(binary);
    if debug {
        command.env("RUST_LOG", "debug");
    }
    command.kill_on_drop(true).spawn()
}

fn start_frontend() -> std::io::Result<Child> {
    info!("Starting dashboard in {}/", FRONTEND_DIR);
    let npm = if cfg!(windows) { "npm.cmd" } else { "npm" };
    Command::new(npm)
        .arg("start")
        .current_dir(FRONTEND_DIR)
        .env("BROWSER", "none")
        .stdout(Stdio::null())
        .kill_on_drop(true)
        .spawn()
}

async fn wait_for_server(api_port: u16) -> bool {
    let url = format!("http://localhost:{}/api/health", api_port);
    let client = reqwest::Client::new();
    for _ in 0..HEALTH_ATTEMPTS {
        if let Ok(response) = client.get(&url).send().await {
            if response.status().is_success() {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
    false
}

fn open_browser(url: &str) {
    let result = if cfg!(target_os = "macos") {
        std::process::Command::new("open").arg(url).spawn()
    } else if cfg!(windows) {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn()
    } else {
        std::process::Command::new("xdg-open").arg(url).spawn()
    };
    if let Err(e) = result {
        warn!("Could not open browser: {}", e);
    }
}

async fn terminate(name: &str, child: &mut Child) {
    if let Err(e) = child.kill().await {
        warn!("Failed to stop {}: {}", name, e);
    } else {
        info!("Stopped {}", name);
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(std::io::Error::other)?;

    info!("GitEvents deployment");

    if !check_prerequisites(!cli.no_frontend).await {
        std::process::exit(1);
    }

    let env_file = PathBuf::from(
        std::env::var("ENV_FILE").unwrap_or_else(|_| defaults::ENV_FILE.to_string()),
    );
    setup_environment(&env_file)?;
    dotenvy::from_path(&env_file).ok();

    if !initialize_database().await {
        std::process::exit(1);
    }

    let api_port = Config::from_env()
        .map(|c| c.api_port)
        .unwrap_or(defaults::API_PORT);

    let mut server = start_server(cli.debug)?;
    let mut frontend = if cli.no_frontend {
        None
    } else {
        match start_frontend() {
            Ok(child) => Some(child),
            Err(e) => {
                warn!("Failed to start dashboard: {}", e);
                None
            }
        }
    };

    if wait_for_server(api_port).await {
        info!("Server is up: http://localhost:{}/api", api_port);
        if !cli.no_browser {
            let target = if frontend.is_some() {
                DASHBOARD_URL.to_string()
            } else {
                format!("http://localhost:{}/swagger-ui/", api_port)
            };
            open_browser(&target);
        }
    } else {
        warn!("Server did not report healthy after {} s", HEALTH_ATTEMPTS);
    }

    info!("Press Ctrl-C to stop");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
        status = server.wait() => warn!("Server exited: {:?}", status),
    }

    terminate("server", &mut server).await;
    if let Some(child) = frontend.as_mut() {
        terminate("dashboard", child).await;
    }
    Ok(())
}
