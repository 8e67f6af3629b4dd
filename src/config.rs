use std::time::Duration;

use anyhow::{Context, Result};

use crate::enrich::OpenAiConfig;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_AI_TIMEOUT_SECS: u64 = 30;
const DEFAULT_AI_SAMPLE_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    /// `None` when no API key is configured; enrichment is then skipped.
    pub openai: Option<OpenAiConfig>,
    pub ai_timeout: Duration,
    pub ai_sample_size: usize,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        let ai_timeout = Duration::from_secs(parse_or(
            &lookup,
            "AI_TIMEOUT_SECS",
            DEFAULT_AI_TIMEOUT_SECS,
        )?);
        let ai_sample_size = parse_or(&lookup, "AI_SAMPLE_SIZE", DEFAULT_AI_SAMPLE_SIZE)?;

        let openai = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .map(|api_key| OpenAiConfig {
                api_key,
                base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: ai_timeout,
            });

        Ok(Self {
            database_url,
            openai,
            ai_timeout,
            ai_sample_size,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        let error = settings(&[]).unwrap_err();
        assert!(error.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn defaults_apply_without_ai_credentials() {
        let settings = settings(&[("DATABASE_URL", "postgres://localhost/reviews")]).unwrap();
        assert!(settings.openai.is_none());
        assert_eq!(settings.ai_timeout, Duration::from_secs(30));
        assert_eq!(settings.ai_sample_size, 50);
    }

    #[test]
    fn api_key_enables_enrichment() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://localhost/reviews"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("AI_TIMEOUT_SECS", "12"),
        ])
        .unwrap();
        let openai = settings.openai.unwrap();
        assert_eq!(openai.model, "gpt-4o");
        assert_eq!(openai.base_url, "https://api.openai.com");
        assert_eq!(openai.timeout, Duration::from_secs(12));
    }

    #[test]
    fn blank_api_key_disables_enrichment() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://localhost/reviews"),
            ("OPENAI_API_KEY", "  "),
        ])
        .unwrap();
        assert!(settings.openai.is_none());
    }

    #[test]
    fn malformed_numbers_are_reported() {
        let error = settings(&[
            ("DATABASE_URL", "postgres://localhost/reviews"),
            ("AI_SAMPLE_SIZE", "lots"),
        ])
        .unwrap_err();
        assert!(error.to_string().contains("AI_SAMPLE_SIZE"));
    }
}
