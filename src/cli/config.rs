use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::api::auth::{AuthApi, HttpAuthApi, StaticAuthApi};
use crate::api::client::HttpClient;
use crate::app::App;
use crate::error::ConsoleError;
use crate::router::views::{ViewRegistry, ViewResolver};
use crate::session::controller::{RouteMode, SessionController};
use crate::storage::FileStore;
use crate::tabs::store::TabsStore;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "admin-console.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "admin-console",
    version,
    about = "Headless admin console: sessions, dynamic routes, tabs and schema forms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: admin-console.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Backend API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Auth backend: static or http
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Path of the persisted state file
    #[arg(long, global = true)]
    pub state: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform a menu tree and print the resulting route table
    Routes {
        /// Menu tree file (YAML or JSON); the demo menu when omitted
        #[arg(long)]
        menu: Option<String>,

        /// The file holds backend menu rows rather than a tree
        #[arg(long)]
        rows: bool,

        /// Route mode: flatten or nested (default from config)
        #[arg(long)]
        mode: Option<String>,
    },

    /// Build a schema form and print its layout and shaped values
    Form {
        /// Form definition file (YAML or JSON)
        #[arg(long)]
        schema: String,

        /// Values to set, as a JSON object
        #[arg(long)]
        values: Option<String>,

        /// Viewport width in pixels
        #[arg(long, default_value_t = 1920)]
        width: u32,

        /// Toggle the advanced section once before printing
        #[arg(long)]
        toggle: bool,

        /// Submit the form (runs validation)
        #[arg(long)]
        submit: bool,
    },

    /// Log in, load routes and open the landing page
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Page to open instead of the landing page
        #[arg(long)]
        redirect: Option<String>,
    },

    /// Clear the persisted session
    Logout,

    /// Print the persisted tabs
    Tabs,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `admin-console.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub views: ViewsConfig,
    #[serde(default)]
    pub routes: RoutesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// `static` answers from built-in demo data, `http` talks to `base_url`.
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            backend: default_backend(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewsConfig {
    /// Directory scanned for view modules.
    pub root: Option<String>,

    #[serde(default = "default_extension")]
    pub extension: String,

    /// Modules registered without scanning, relative to the view root.
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,
}

impl Default for ViewsConfig {
    fn default() -> Self {
        Self {
            root: None,
            extension: default_extension(),
            modules: default_modules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutesConfig {
    #[serde(default = "default_home_path")]
    pub home_path: String,

    #[serde(default)]
    pub mode: RouteMode,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            home_path: default_home_path(),
            mode: RouteMode::default(),
        }
    }
}

// Serde default helpers
fn default_base_url() -> String { "http://localhost:8080/api".to_string() }
fn default_timeout_ms() -> u64 { 10_000 }
fn default_backend() -> String { "static".to_string() }
fn default_state_path() -> String { ".admin-console/state.json".to_string() }
fn default_extension() -> String { "vue".to_string() }
fn default_home_path() -> String { "/dashboard".to_string() }
fn default_modules() -> Vec<String> {
    vec![
        "dashboard/index.vue".to_string(),
        "system/user/index.vue".to_string(),
        "system/role/index.vue".to_string(),
    ]
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_FILE);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Apply command-line overrides on top of the file config.
pub fn apply_overrides(mut config: AppConfig, cli: &Cli) -> AppConfig {
    if let Some(base_url) = &cli.base_url {
        config.api.base_url = base_url.clone();
    }
    if let Some(backend) = &cli.backend {
        config.api.backend = backend.clone();
    }
    if let Some(state) = &cli.state {
        config.storage.path = state.clone();
    }
    config
}

pub fn parse_route_mode(mode: &str) -> Option<RouteMode> {
    match mode.to_ascii_lowercase().as_str() {
        "flatten" | "flat" => Some(RouteMode::Flatten),
        "nested" | "tree" => Some(RouteMode::Nested),
        _ => None,
    }
}

// ============================================================================
// Builders (config → runtime objects)
// ============================================================================

pub fn build_view_registry(views: &ViewsConfig) -> ViewRegistry {
    let mut registry = ViewRegistry::new(views.extension.as_str()).with_modules(views.modules.iter().cloned());
    if let Some(root) = &views.root {
        if let Err(e) = registry.scan(Path::new(root)) {
            tracing::warn!("could not scan view root {}: {}", root, e);
        }
    }
    registry
}

pub fn build_auth_api(api: &ApiConfig) -> Result<Box<dyn AuthApi>, ConsoleError> {
    match api.backend.as_str() {
        "http" => {
            let client = HttpClient::new(&api.base_url, Duration::from_millis(api.timeout_ms))?;
            Ok(Box::new(HttpAuthApi::new(client)))
        }
        "static" => Ok(Box::new(StaticAuthApi::new())),
        other => {
            tracing::warn!("unknown backend '{}', using the static backend", other);
            Ok(Box::new(StaticAuthApi::new()))
        }
    }
}

/// Assemble the application context described by `config`.
pub fn build_app(config: &AppConfig) -> Result<App, ConsoleError> {
    let resolver = ViewResolver::new(build_view_registry(&config.views));
    let session = SessionController::new(build_auth_api(&config.api)?, resolver)
        .with_mode(config.routes.mode)
        .with_home_path(config.routes.home_path.clone());
    let tabs = TabsStore::new().with_home_path(config.routes.home_path.clone());
    let storage = FileStore::open(&config.storage.path)?;
    Ok(App::new(session, tabs, Box::new(storage)))
}
