use std::time::Duration;

use anyhow::{Context, bail};

use cartas_web::WebConfig;

/// Runtime settings, read from `CARTAS_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub files_url: String,
    pub cache_ttl: Duration,
    pub page_size: u32,
    pub http_timeout: Duration,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; unset and blank values fall back
    /// to their defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let Some(api_url) = get("CARTAS_API_URL") else {
            bail!("CARTAS_API_URL is not set; point it at the correspondence API");
        };
        let api_url = api_url.trim_end_matches('/').to_string();
        let files_url = get("CARTAS_FILES_URL").unwrap_or_else(|| format!("{api_url}/fileupload/file/"));

        let port: u16 = parse(&get, "CARTAS_PORT", 3000)?;
        let cache_ttl_secs: u64 = parse(&get, "CARTAS_CACHE_TTL_SECS", 60)?;
        let page_size: u32 = parse(&get, "CARTAS_PAGE_SIZE", 10)?;
        let http_timeout_secs: u64 = parse(&get, "CARTAS_HTTP_TIMEOUT_SECS", 30)?;
        if page_size == 0 {
            bail!("CARTAS_PAGE_SIZE must be at least 1");
        }

        let secure_cookies = match get("CARTAS_SECURE_COOKIES").as_deref() {
            None => false,
            Some("1" | "true" | "yes" | "on") => true,
            Some("0" | "false" | "no" | "off") => false,
            Some(other) => bail!("CARTAS_SECURE_COOKIES must be true or false, got {other:?}"),
        };

        Ok(Self {
            host: get("CARTAS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            api_url,
            files_url,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            page_size,
            http_timeout: Duration::from_secs(http_timeout_secs),
            secure_cookies,
        })
    }

    pub fn web(&self) -> WebConfig {
        WebConfig {
            files_url: self.files_url.clone(),
            page_size: self.page_size,
            cache_ttl: self.cache_ttl,
            secure_cookies: self.secure_cookies,
        }
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let c = config(&[("CARTAS_API_URL", "http://api.local/")]).unwrap();
        assert_eq!(c.host, "0.0.0.0");
        assert_eq!(c.port, 3000);
        assert_eq!(c.api_url, "http://api.local");
        assert_eq!(c.files_url, "http://api.local/fileupload/file/");
        assert_eq!(c.cache_ttl, Duration::from_secs(60));
        assert_eq!(c.page_size, 10);
        assert_eq!(c.http_timeout, Duration::from_secs(30));
        assert!(!c.secure_cookies);
    }

    #[test]
    fn api_url_is_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("CARTAS_API_URL", "  ")]).is_err());
    }

    #[test]
    fn overrides_are_read() {
        let c = config(&[
            ("CARTAS_API_URL", "https://api.example.com"),
            ("CARTAS_FILES_URL", "https://files.example.com/"),
            ("CARTAS_PORT", "8080"),
            ("CARTAS_PAGE_SIZE", "25"),
            ("CARTAS_SECURE_COOKIES", "true"),
        ])
        .unwrap();
        assert_eq!(c.port, 8080);
        assert_eq!(c.page_size, 25);
        assert_eq!(c.files_url, "https://files.example.com/");
        assert!(c.secure_cookies);
        assert_eq!(c.web().page_size, 25);
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = config(&[("CARTAS_API_URL", "http://api"), ("CARTAS_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("CARTAS_PORT"));
        assert!(config(&[("CARTAS_API_URL", "http://api"), ("CARTAS_PAGE_SIZE", "0")]).is_err());
        assert!(config(&[("CARTAS_API_URL", "http://api"), ("CARTAS_SECURE_COOKIES", "maybe")]).is_err());
    }
}
