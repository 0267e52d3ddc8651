use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Pages pre-allocated when an editor session opens a worksheet with no saved layout.
    pub initial_pages: usize,
    /// Rasterization multiplier for PDF export.
    pub export_scale: f32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let initial_pages = parse_env("WORKSHEET_INITIAL_PAGES", 2usize)?;
        if initial_pages == 0 {
            anyhow::bail!("WORKSHEET_INITIAL_PAGES must be at least 1");
        }
        let export_scale = parse_env("EXPORT_SCALE", 2.0f32)?;
        if !(export_scale.is_finite() && export_scale > 0.0) {
            anyhow::bail!("EXPORT_SCALE must be a positive number");
        }

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: parse_env("PORT", 8080u16).context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            initial_pages,
            export_scale,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            anthropic_api_key: "test-key".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            initial_pages: 2,
            export_scale: 0.25,
        }
    }
}
