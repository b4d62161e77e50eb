use std::env;

use sparkroles_core::{AccessToken, AppError, AppResult};
use sparkroles_infrastructure::HttpRolesApiConfig;
use tracing_subscriber::EnvFilter;
use url::Url;

const DEFAULT_API_URL: &str = "https://api.ciscospark.com/v1";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub api_base_url: Url,
    pub access_token: AccessToken,
    pub max_attempts: u8,
    pub retry_backoff_ms: u64,
    pub request_timeout_secs: u64,
    pub page_size: usize,
}

impl CliConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup("SPARKY_API_TOKEN")
            .ok_or_else(|| AppError::Validation("SPARKY_API_TOKEN is required".to_owned()))
            .and_then(AccessToken::new)?;

        let api_base_url = lookup("SPARKY_API_URL")
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        let api_base_url = Url::parse(api_base_url.as_str()).map_err(|error| {
            AppError::Validation(format!("invalid SPARKY_API_URL '{api_base_url}': {error}"))
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(AppError::Validation(format!(
                "SPARKY_API_URL must use http or https, got '{}'",
                api_base_url.scheme()
            )));
        }

        let max_attempts = parse_positive(&lookup, "SPARKY_MAX_ATTEMPTS", 3_u8)?;
        let retry_backoff_ms = parse_positive(&lookup, "SPARKY_RETRY_BACKOFF_MS", 500_u64)?;
        let request_timeout_secs = parse_positive(&lookup, "SPARKY_REQUEST_TIMEOUT_SECS", 15_u64)?;
        let page_size = parse_positive(&lookup, "SPARKY_PAGE_SIZE", 100_usize)?;

        Ok(Self {
            api_base_url,
            access_token,
            max_attempts,
            retry_backoff_ms,
            request_timeout_secs,
            page_size,
        })
    }

    pub fn roles_api_config(&self) -> HttpRolesApiConfig {
        HttpRolesApiConfig {
            base_url: self.api_base_url.clone(),
            access_token: self.access_token.clone(),
            max_attempts: self.max_attempts,
            retry_backoff_ms: self.retry_backoff_ms,
            page_size: self.page_size,
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_positive<F, T>(lookup: &F, name: &str, default: T) -> AppResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(name) else {
        return Ok(default);
    };

    let parsed = value.trim().parse::<T>().map_err(|error| {
        AppError::Validation(format!("invalid {name} value '{value}': {error}"))
    })?;

    if parsed == T::default() {
        return Err(AppError::Validation(format!(
            "{name} must be greater than zero"
        )));
    }

    Ok(parsed)
}
