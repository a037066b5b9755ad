//! Application configuration.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::application::services::DispatcherConfig;
use crate::domain::entities::BotToken;
use crate::infrastructure::resolver::DEFAULT_MAX_CONCURRENT;

const APP_NAME: &str = "oxilinks";

/// Default port of the health endpoint.
pub const DEFAULT_HEALTH_PORT: u16 = 8800;

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Configuration assembled from the config file and the command line.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path. Logs go to stderr when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Bot account settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Redirect lookups.
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Health endpoint.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Bot account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token. Prefer `BOT_TOKEN` over storing it on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Wait before hiding the link preview of a rewritten message.
    #[serde(default = "default_embed_suppress_delay_ms")]
    pub embed_suppress_delay_ms: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: None,
            embed_suppress_delay_ms: default_embed_suppress_delay_ms(),
        }
    }
}

/// Redirect lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Lookups in flight across every provider.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Deadline for generic redirect lookups.
    #[serde(default = "default_follow_timeout_secs")]
    pub follow_timeout_secs: u64,

    /// Deadline for Reddit share links.
    #[serde(default = "default_reddit_timeout_secs")]
    pub reddit_timeout_secs: u64,

    /// `User-Agent` sent with lookups.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            follow_timeout_secs: default_follow_timeout_secs(),
            reddit_timeout_secs: default_reddit_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ResolverConfig {
    /// Deadline for generic lookups.
    #[must_use]
    pub const fn follow_timeout(&self) -> Duration {
        Duration::from_secs(self.follow_timeout_secs)
    }

    /// Deadline for Reddit lookups.
    #[must_use]
    pub const fn reddit_timeout(&self) -> Duration {
        Duration::from_secs(self.reddit_timeout_secs)
    }
}

/// Health endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Serve the health endpoint.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Listen address.
    #[serde(default = "default_health_addr")]
    pub addr: SocketAddr,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            addr: default_health_addr(),
        }
    }
}

const fn default_embed_suppress_delay_ms() -> u64 {
    2000
}

const fn default_max_concurrent() -> usize {
    DEFAULT_MAX_CONCURRENT
}

const fn default_follow_timeout_secs() -> u64 {
    15
}

const fn default_reddit_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("{APP_NAME}/{}", crate::VERSION)
}

const fn default_true() -> bool {
    true
}

fn default_health_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_HEALTH_PORT))
}

impl AppConfig {
    /// Merges CLI arguments into the configuration. Arguments win.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(token) = &args.bot_token {
            self.bot.token = Some(token.clone());
        }
        if let Some(addr) = args.health_addr {
            self.health.addr = addr;
        }
        if args.disable_healthcheck {
            self.health.enabled = false;
        }
    }

    /// Returns the configured token, if it is usable.
    #[must_use]
    pub fn bot_token(&self) -> Option<BotToken> {
        self.bot.token.as_deref().and_then(BotToken::new)
    }

    /// Settings for the link dispatcher.
    #[must_use]
    pub const fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            embed_suppress_delay: Duration::from_millis(self.bot.embed_suppress_delay_ms),
        }
    }
}
