use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not a valid number: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Credentials of the HTTP email provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

/// Tunables of the orchestrator itself (independent of where the store lives).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    /// Upper bound for every notification, email, conversation and moderation call.
    pub dispatch_timeout: Duration,
    pub directory_cache_ttl: Duration,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_millis(3000), // 3 seconds
            directory_cache_ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngagementConfig {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub email: Option<EmailConfig>,
    pub moderation_url: Option<String>,
    pub options: OrchestratorOptions,
}

impl EngagementConfig {
    /// Read the configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = non_empty("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let email = match non_empty("EMAIL_API_URL") {
            Some(api_url) => Some(EmailConfig {
                api_url,
                api_key: non_empty("EMAIL_API_KEY").ok_or(ConfigError::Missing("EMAIL_API_KEY"))?,
                from: non_empty("EMAIL_FROM").unwrap_or_else(|| "no-reply@localhost".to_string()),
            }),
            None => None,
        };

        let defaults = OrchestratorOptions::default();
        let options = OrchestratorOptions {
            dispatch_timeout: parse_duration(
                "DISPATCH_TIMEOUT_MS",
                non_empty("DISPATCH_TIMEOUT_MS"),
                Duration::from_millis,
                defaults.dispatch_timeout,
            )?,
            directory_cache_ttl: parse_duration(
                "DIRECTORY_CACHE_TTL",
                non_empty("DIRECTORY_CACHE_TTL"),
                Duration::from_secs,
                defaults.directory_cache_ttl,
            )?,
        };

        Ok(Self {
            database_url,
            redis_url: non_empty("REDIS_URL"),
            email,
            moderation_url: non_empty("MODERATION_API_URL"),
            options,
        })
    }
}

fn parse_duration(
    name: &'static str,
    raw: Option<String>,
    unit: fn(u64) -> Duration,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .map(unit)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
