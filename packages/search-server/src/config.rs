use anyhow::{Context, Result};
use dotenvy::dotenv;
use search_engine::{EngineConfig, FetcherConfig, SiteConfig};
use std::env;
use std::str::FromStr;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; in-memory storage when unset
    pub database_url: Option<String>,
    pub engine: EngineConfig,
    pub fetcher: FetcherConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = EngineConfig::default();
        let fetcher_defaults = FetcherConfig::default();

        let engine = EngineConfig::new()
            .with_sites(load_sites(&lookup)?)
            .with_snippet_length(parse_or(&lookup, "SNIPPET_LENGTH", defaults.snippet_length)?)
            .with_crawl_concurrency(parse_or(
                &lookup,
                "CRAWL_CONCURRENCY",
                defaults.crawl_concurrency,
            )?)
            .with_max_sessions(parse_or(&lookup, "MAX_SESSIONS", defaults.max_sessions)?)
            .with_request_delay(parse_or(&lookup, "REQUEST_DELAY_MS", defaults.request_delay_ms)?);

        let fetcher = FetcherConfig::default()
            .with_user_agent(lookup("BOT_USER_AGENT").unwrap_or(fetcher_defaults.user_agent))
            .with_referrer(lookup("BOT_REFERRER").unwrap_or(fetcher_defaults.referrer))
            .with_timeout_secs(parse_or(
                &lookup,
                "BOT_TIMEOUT_SECS",
                fetcher_defaults.timeout_secs,
            )?);

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            engine,
            fetcher,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Sites from `SEARCH_SITES` (inline JSON) or the file named by `SEARCH_SITES_FILE`.
fn load_sites<F>(lookup: &F) -> Result<Vec<SiteConfig>>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(json) = lookup("SEARCH_SITES") {
        return serde_json::from_str(&json).context("SEARCH_SITES must be a JSON array of {url, name}");
    }
    if let Some(path) = lookup("SEARCH_SITES_FILE") {
        let json = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read SEARCH_SITES_FILE {}", path))?;
        return serde_json::from_str(&json)
            .with_context(|| format!("{} must contain a JSON array of {{url, name}}", path));
    }
    Ok(Vec::new())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number", key)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.database_url.is_none());
        assert!(config.engine.sites.is_empty());
        assert_eq!(config.engine.snippet_length, 200);
        assert_eq!(config.fetcher.timeout_secs, 30);
    }

    #[test]
    fn test_reads_sites_and_limits() {
        let config = config_from(&[
            (
                "SEARCH_SITES",
                r#"[{"url": "https://example.com", "name": "Example"}]"#,
            ),
            ("CRAWL_CONCURRENCY", "4"),
            ("BOT_USER_AGENT", "TestBot/2.0"),
            ("PORT", "9000"),
        ])
        .unwrap();

        assert_eq!(config.engine.sites, vec![SiteConfig::new("https://example.com", "Example")]);
        assert_eq!(config.engine.crawl_concurrency, 4);
        assert_eq!(config.fetcher.user_agent, "TestBot/2.0");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_rejects_bad_values() {
        tokio_test::assert_err!(config_from(&[("PORT", "eighty")]));
        tokio_test::assert_err!(config_from(&[("SEARCH_SITES", "not json")]));
    }
}
