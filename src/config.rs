use std::env;

use thiserror::Error;
use url::Url;

/// Address the analysis service listens on when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DESIGNER_CONTACT: &str = "mailto:design@example.com";

const BASE_URL_VAR: &str = "ASSISTANT_BASE_URL";
const DESIGNER_CONTACT_VAR: &str = "DESIGNER_CONTACT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid service base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported URL scheme '{0}', expected http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    pub designer_contact: String,
}

impl ClientConfig {
    /// Reads `ASSISTANT_BASE_URL` and `DESIGNER_CONTACT`. A base URL given on
    /// the command line wins over the environment.
    pub fn from_env(base_url_override: Option<&str>) -> Result<Self, ConfigError> {
        let base_url = resolve(base_url_override, env::var(BASE_URL_VAR).ok(), DEFAULT_BASE_URL);
        let designer_contact = resolve(
            None,
            env::var(DESIGNER_CONTACT_VAR).ok(),
            DEFAULT_DESIGNER_CONTACT,
        );
        Self::new(&base_url, &designer_contact)
    }

    pub fn new(base_url: &str, designer_contact: &str) -> Result<Self, ConfigError> {
        let mut parsed = Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        // Endpoints are joined relative to the base, so keep any path prefix
        // as a directory.
        if !parsed.path().ends_with('/') {
            let path = format!("{}/", parsed.path());
            parsed.set_path(&path);
        }

        Ok(Self {
            base_url: parsed,
            designer_contact: designer_contact.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ConfigError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                source,
            })
    }
}

fn resolve(cli: Option<&str>, env: Option<String>, default: &str) -> String {
    let given = |value: &String| !value.trim().is_empty();
    cli.map(str::to_string)
        .filter(given)
        .or_else(|| env.filter(given))
        .unwrap_or_else(|| default.to_string())
}
