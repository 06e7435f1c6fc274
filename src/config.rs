use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub vendor: VendorConfig,
    pub browser: BrowserConfig,
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorConfig {
    pub home_page_url: String,
    /// The percent-encoded query is appended verbatim to this URL.
    pub search_page_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub chrome_path: Option<String>,
    pub login_timeout_secs: u64,
    pub consent_timeout_secs: u64,
    pub login_settle_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub diagnostics_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub confidence_threshold: u8,
}

/// Environment variables read on top of the layered sources, mapped to config keys.
const LEGACY_ENV: &[(&str, &str)] = &[
    ("HOME_PAGE_URL", "vendor.home_page_url"),
    ("SEARCH_PAGE_URL", "vendor.search_page_url"),
    ("FORNECEDOR_USER", "vendor.username"),
    ("FORNECEDOR_PASS", "vendor.password"),
    ("CHROME_PATH", "browser.chrome_path"),
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            vendor: VendorConfig {
                home_page_url: "https://www.triodistribuidora.com.br/".to_string(),
                search_page_url: "https://www.triodistribuidora.com.br/produtos?pagina=1&busca="
                    .to_string(),
                username: String::new(),
                password: String::new(),
            },
            browser: BrowserConfig {
                headless: true,
                window_width: 1920,
                window_height: 1080,
                chrome_path: None,
                login_timeout_secs: 20,
                consent_timeout_secs: 10,
                login_settle_timeout_secs: 15,
                search_timeout_secs: 15,
                poll_interval_ms: 250,
                diagnostics_dir: "data/diagnostics".to_string(),
            },
            matching: MatchingConfig {
                confidence_threshold: 65,
            },
        }
    }
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load(config_file, |key| std::env::var(key).ok())
    }

    /// Layers, lowest priority first: built-in defaults, `config/default`,
    /// `config/local`, the explicit file, `PRICE_BRIDGE__*` variables and
    /// finally the legacy vendor variables resolved through `lookup`.
    pub fn load<F>(config_file: Option<&Path>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }

        builder = builder.add_source(
            Environment::with_prefix("PRICE_BRIDGE")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = apply_legacy_env(builder, lookup)?.build()?.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port must be greater than 0".into()));
        }

        if Url::parse(&self.vendor.home_page_url).is_err() {
            return Err(ConfigError::Message("Invalid home page URL format".into()));
        }

        if Url::parse(&self.vendor.search_page_url).is_err() {
            return Err(ConfigError::Message("Invalid search page URL format".into()));
        }

        if self.matching.confidence_threshold > 100 {
            return Err(ConfigError::Message(
                "Confidence threshold must be between 0 and 100".into(),
            ));
        }

        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::Message("Browser window size must be non-zero".into()));
        }

        if self.browser.login_timeout_secs == 0
            || self.browser.login_settle_timeout_secs == 0
            || self.browser.search_timeout_secs == 0
        {
            return Err(ConfigError::Message("Browser timeouts must be greater than 0".into()));
        }

        if self.browser.poll_interval_ms == 0 {
            return Err(ConfigError::Message("Poll interval must be greater than 0".into()));
        }

        Ok(())
    }

    /// Credentials are optional for startup, but login cannot succeed without them.
    pub fn has_credentials(&self) -> bool {
        !self.vendor.username.is_empty() && !self.vendor.password.is_empty()
    }
}

impl BrowserConfig {
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn consent_timeout(&self) -> Duration {
        Duration::from_secs(self.consent_timeout_secs)
    }

    pub fn login_settle_timeout(&self) -> Duration {
        Duration::from_secs(self.login_settle_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn diagnostics_dir(&self) -> PathBuf {
        PathBuf::from(&self.diagnostics_dir)
    }
}

fn apply_legacy_env<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in LEGACY_ENV {
        builder = builder.set_override_option(*key, lookup(var).filter(|v| !v.is_empty()))?;
    }
    Ok(builder)
}
