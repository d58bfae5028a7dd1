use crate::error::{BoardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "taskboard.yaml";

// ---------------------------------------------------------------------------
// ActionsRoute
// ---------------------------------------------------------------------------

/// Where the "actions of one project" listing is mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionsRoute {
    /// `GET /api/projects/{id}/actions`
    #[default]
    Nested,
    /// `GET /api/projects/actions/{id}`
    Legacy,
}

impl ActionsRoute {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nested => "nested",
            Self::Legacy => "legacy",
        }
    }

    /// Router path template for this shape.
    pub fn path(self) -> &'static str {
        match self {
            Self::Nested => "/api/projects/{id}/actions",
            Self::Legacy => "/api/projects/actions/{id}",
        }
    }
}

impl fmt::Display for ActionsRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionsRoute {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "nested" => Ok(Self::Nested),
            "legacy" => Ok(Self::Legacy),
            other => Err(BoardError::InvalidConfig(format!(
                "unknown actions_route '{other}' (expected 'nested' or 'legacy')"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default)]
    pub actions_route: ActionsRoute,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_port() -> u16 {
    8534
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_database_url() -> String {
    "sqlite://taskboard.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            database_url: default_database_url(),
            actions_route: ActionsRoute::default(),
            max_connections: default_max_connections(),
        }
    }
}

impl ServerConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let cfg: ServerConfig = serde_yaml::from_str(&data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(BoardError::InvalidConfig(
                "database_url must not be empty".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(BoardError::InvalidConfig(
                "max_connections must be at least 1".into(),
            ));
        }
        if self.bind.trim().is_empty() {
            return Err(BoardError::InvalidConfig("bind must not be empty".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
