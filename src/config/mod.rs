//! Configuration management.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for statuswatch.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Path to the SQLite subscription registry.
    pub db_path: PathBuf,
    /// Path to the JSON presence cache file.
    pub cache_path: PathBuf,
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    /// Delay between successive chat-delivery calls within a cycle.
    pub pacing_delay: Duration,
    /// Timeout applied to each external HTTP request.
    pub request_timeout: Duration,
    /// Discord delivery configuration.
    pub discord: DiscordConfig,
    /// Roblox API endpoint configuration.
    pub roblox: RobloxConfig,
    /// Discord user id allowed to broadcast announcements.
    pub admin_id: Option<u64>,
}

/// Discord delivery configuration.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    /// Bot token. Usually supplied via `STATUSWATCH_DISCORD_TOKEN`.
    pub token: Option<String>,
    /// Base URL of the Discord REST API.
    pub api_base: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: "https://discord.com/api/v10".to_string(),
        }
    }
}

/// Roblox API endpoint configuration.
///
/// Base URLs are configurable so tests can point the clients at a local
/// stub server.
#[derive(Debug, Clone)]
pub struct RobloxConfig {
    /// Presence query API base.
    pub presence_base: String,
    /// User profile API base.
    pub users_base: String,
    /// Place details API base.
    pub games_base: String,
    /// Avatar thumbnail API base.
    pub thumbnails_base: String,
}

impl Default for RobloxConfig {
    fn default() -> Self {
        Self {
            presence_base: "https://presence.roblox.com".to_string(),
            users_base: "https://users.roblox.com".to_string(),
            games_base: "https://games.roblox.com".to_string(),
            thumbnails_base: "https://thumbnails.roblox.com".to_string(),
        }
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Registry database path.
    pub db_path: Option<String>,
    /// Presence cache path.
    pub cache_path: Option<String>,
    /// Poll interval in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Pacing delay in seconds.
    pub pacing_delay_secs: Option<u64>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: Option<u64>,
    /// Admin Discord user id.
    pub admin_id: Option<u64>,
    /// Discord section.
    pub discord: Option<ConfigFileDiscord>,
    /// Roblox section.
    pub roblox: Option<ConfigFileRoblox>,
}

/// Discord section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileDiscord {
    /// Bot token.
    pub token: Option<String>,
    /// API base URL.
    pub api_base: Option<String>,
}

/// Roblox section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileRoblox {
    /// Presence API base URL.
    pub presence_base: Option<String>,
    /// Users API base URL.
    pub users_base: Option<String>,
    /// Games API base URL.
    pub games_base: Option<String>,
    /// Thumbnails API base URL.
    pub thumbnails_base: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("subscriptions.db"),
            cache_path: PathBuf::from("status_cache.json"),
            poll_interval: Duration::from_secs(60),
            pacing_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(5),
            discord: DiscordConfig::default(),
            roblox: RobloxConfig::default(),
            admin_id: None,
        }
    }
}

impl WatchConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| crate::Error::Config {
            operation: "read_config_file".to_string(),
            cause: e.to_string(),
        })?;

        let file: ConfigFile = toml::from_str(&contents).map_err(|e| crate::Error::Config {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/statuswatch/` on macOS)
    /// 2. XDG config dir (`~/.config/statuswatch/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found. The
    /// Discord token may also arrive later from the environment.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs
            .config_dir()
            .join("statuswatch")
            .join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("statuswatch")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `WatchConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(db_path) = file.db_path {
            config.db_path = PathBuf::from(db_path);
        }
        if let Some(cache_path) = file.cache_path {
            config.cache_path = PathBuf::from(cache_path);
        }
        if let Some(secs) = file.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.pacing_delay_secs {
            config.pacing_delay = Duration::from_secs(secs);
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.admin_id = file.admin_id;
        if let Some(discord) = file.discord {
            if let Some(token) = discord.token {
                config.discord.token = Some(token);
            }
            if let Some(api_base) = discord.api_base {
                config.discord.api_base = api_base;
            }
        }
        if let Some(roblox) = file.roblox {
            if let Some(v) = roblox.presence_base {
                config.roblox.presence_base = v;
            }
            if let Some(v) = roblox.users_base {
                config.roblox.users_base = v;
            }
            if let Some(v) = roblox.games_base {
                config.roblox.games_base = v;
            }
            if let Some(v) = roblox.thumbnails_base {
                config.roblox.thumbnails_base = v;
            }
        }

        config
    }

    /// Sets the registry database path.
    #[must_use]
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    /// Sets the presence cache path.
    #[must_use]
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Checks that `sender_id` may broadcast announcements.
    ///
    /// With no admin configured anyone may broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] when an admin is configured
    /// and `sender_id` is someone else.
    pub fn authorize_broadcast(&self, sender_id: u64) -> crate::Result<()> {
        match self.admin_id {
            Some(admin) if admin != sender_id => Err(crate::Error::InvalidInput(format!(
                "user {sender_id} is not allowed to broadcast announcements"
            ))),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.pacing_delay, Duration::from_secs(1));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(config.discord.token.is_none());
        assert_eq!(config.discord.api_base, "https://discord.com/api/v10");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
db_path = "/tmp/sw/users.db"
poll_interval_secs = 30
admin_id = 1066881053219881050

[discord]
api_base = "http://127.0.0.1:9999/api"

[roblox]
presence_base = "http://127.0.0.1:9999/presence"
"#
        )
        .expect("write config");

        let config = WatchConfig::load_from_file(file.path()).expect("load config");
        assert_eq!(config.db_path, PathBuf::from("/tmp/sw/users.db"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.admin_id, Some(1_066_881_053_219_881_050));
        assert_eq!(config.discord.api_base, "http://127.0.0.1:9999/api");
        assert_eq!(config.roblox.presence_base, "http://127.0.0.1:9999/presence");
        // Unset sections keep defaults.
        assert_eq!(config.roblox.users_base, "https://users.roblox.com");
        assert_eq!(config.pacing_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_broadcast_authorization() {
        let mut config = WatchConfig::default();
        // No admin configured: open.
        assert!(config.authorize_broadcast(7).is_ok());

        config.admin_id = Some(5);
        assert!(config.authorize_broadcast(5).is_ok());
        assert!(matches!(
            config.authorize_broadcast(7),
            Err(crate::Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_load_from_missing_file_errors() {
        let result = WatchConfig::load_from_file(std::path::Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(crate::Error::Config { .. })));
    }
}
