use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ReconError, ReconResult};

pub const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";
pub const DEFAULT_USER_AGENT: &str = "BugBounty-Framework/v0.1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub recon: ReconSettings,
    pub tools: ToolPaths,
    pub api: ApiEndpoints,
    /// Pattern key (`sensitive_ext`, `image_ext`, ...) to regex source.
    pub url_patterns: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconSettings {
    pub default_output_dir: PathBuf,
    pub user_agent: String,
    pub log_dir: PathBuf,
}

impl Default for ReconSettings {
    fn default() -> Self {
        Self {
            default_output_dir: PathBuf::from("outputs/"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

/// Command prefixes for the external tools. `None` falls back to the bare
/// program name, except for subdominator which has no conventional name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub subdominator: Option<String>,
    pub subfinder: Option<String>,
    pub amass: Option<String>,
    pub httpx: Option<String>,
    pub gau: Option<String>,
    pub katana: Option<String>,
}

impl ToolPaths {
    pub fn subdominator(&self) -> ReconResult<&str> {
        self.subdominator
            .as_deref()
            .ok_or_else(|| ReconError::Config("tools.subdominator is not set".into()))
    }

    pub fn subfinder(&self) -> &str { self.subfinder.as_deref().unwrap_or("subfinder") }
    pub fn amass(&self) -> &str { self.amass.as_deref().unwrap_or("amass") }
    pub fn httpx(&self) -> &str { self.httpx.as_deref().unwrap_or("httpx") }
    pub fn gau(&self) -> &str { self.gau.as_deref().unwrap_or("gau") }
    pub fn katana(&self) -> &str { self.katana.as_deref().unwrap_or("katana") }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiEndpoints {
    pub crtsh_url: String,
    pub urlscan_url: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            crtsh_url: "https://crt.sh/".to_string(),
            urlscan_url: "https://urlscan.io/api/v1/search/".to_string(),
        }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> ReconResult<Self> {
        toml::from_str(content).map_err(|e| ReconError::parse("config", e))
    }

    pub fn load_from_file(path: &Path) -> ReconResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load `custom` if given (any failure is fatal), otherwise the default
    /// location. A missing or broken default file yields built-in defaults
    /// plus the reason, so the caller can log it once logging is up.
    pub fn load(custom: Option<&Path>) -> ReconResult<(Self, Option<ReconError>)> {
        match custom {
            Some(path) => Ok((Self::load_from_file(path)?, None)),
            None => Ok(Self::load_or_default(Path::new(DEFAULT_CONFIG_PATH))),
        }
    }

    pub fn load_or_default(path: &Path) -> (Self, Option<ReconError>) {
        if !path.exists() {
            let reason = ReconError::Config(format!("{} not found", path.display()));
            return (Self::default(), Some(reason));
        }
        match Self::load_from_file(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }
}
