//! Configuration types for media-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf};

/// Download behavior configuration (output directory, public paths, buffering)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory completed files are written to (default: "./downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// URL prefix under which completed files are served (default: "downloads")
    ///
    /// The `completed` event carries `<public_path>/<file name>`.
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Capacity of each job's outbound event channel (default: 64)
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            public_path: default_public_path(),
            event_buffer: default_event_buffer(),
        }
    }
}

/// External worker and credential configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to the extraction worker executable (auto-detected if None)
    #[serde(default)]
    pub worker_path: Option<PathBuf>,

    /// Arguments placed before every invocation (e.g. `["-m", "yt_dlp"]` when
    /// `worker_path` is a Python interpreter)
    #[serde(default)]
    pub worker_args: Vec<String>,

    /// Whether to search PATH for the worker if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Well-known location of the session cookie file (default: "./cookies.txt")
    ///
    /// Checked once per request; its presence enables the credentialed retry.
    #[serde(default = "default_cookies_file")]
    pub cookies_file: PathBuf,

    /// User-agent passed to the worker
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            worker_path: None,
            worker_args: Vec::new(),
            search_path: true,
            cookies_file: default_cookies_file(),
            user_agent: default_user_agent(),
        }
    }
}

/// Main configuration for MediaDownloader
///
/// Fields are organized into logical sub-configs:
/// - [`download`](DownloadConfig) - output directory and event buffering
/// - [`tools`](ToolsConfig) - worker binary, cookie file, user-agent
/// - [`server`](ServerIntegrationConfig) - HTTP API settings
///
/// The `download` and `tools` sub-configs are flattened, so their keys live at the top
/// level of the JSON document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External worker and credential settings
    #[serde(flatten)]
    pub tools: ToolsConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Download directory
    pub fn download_dir(&self) -> &PathBuf {
        &self.download.download_dir
    }

    /// Load configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults. The loaded config is validated
    /// before it is returned.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the downloader cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.download.event_buffer == 0 {
            return Err(Error::Config {
                message: "event_buffer must be at least 1".to_string(),
                key: Some("event_buffer".to_string()),
            });
        }
        if self.tools.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user_agent must not be empty".to_string(),
                key: Some("user_agent".to_string()),
            });
        }
        if self.server.api.allowed_hosts.is_empty() {
            return Err(Error::Config {
                message: "allowed_hosts must list at least one host".to_string(),
                key: Some("allowed_hosts".to_string()),
            });
        }
        Ok(())
    }
}

/// Server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Serve completed files under `/<public_path>` (default: true)
    #[serde(default = "default_true")]
    pub serve_downloads: bool,

    /// Hosts accepted by the request validator; subdomains of an entry match too
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            serve_downloads: true,
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

// Default value functions
fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_public_path() -> String {
    "downloads".into()
}

fn default_event_buffer() -> usize {
    64
}

fn default_cookies_file() -> PathBuf {
    PathBuf::from("cookies.txt")
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .into()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_allowed_hosts() -> Vec<String> {
    vec![
        "youtube.com".into(),
        "youtu.be".into(),
        "vimeo.com".into(),
        "soundcloud.com".into(),
    ]
}
