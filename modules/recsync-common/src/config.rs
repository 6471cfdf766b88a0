use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use recommendation_client::{
    ApiCredentials, ClientOptions, DEFAULT_API_ENDPOINT, DEFAULT_RECOMMENDATION_ENDPOINT,
    DEFAULT_TENANT,
};

use crate::error::ConfigError;

pub const DEFAULT_EXPORT_DOWNLOAD_PATH: &str = "/api/ezp/v2/ez_recommendation/v1/exportDownload/";

/// How exported chunk directories are protected for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportAuthMethod {
    /// Chunks are publicly downloadable.
    None,
    /// A random password is generated per export run; login is the customer id.
    Basic,
    /// Fixed credentials from configuration.
    User { login: String, password: String },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    // Recommendation service account
    pub customer_id: String,
    pub license_key: String,

    // Endpoints
    pub api_endpoint: String,
    pub recommendation_endpoint: String,
    pub tenant: String,
    pub http_timeout: Duration,

    // Content
    pub server_uri: String,
    pub included_content_types: Vec<String>,
    pub default_languages: Vec<String>,
    pub mandator_languages: BTreeMap<u32, Vec<String>>,

    // Export
    pub export_root: PathBuf,
    pub export_host: Option<String>,
    pub export_download_path: String,
    pub export_auth: ExportAuthMethod,
}

impl RecommendationConfig {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = match optional("RECSYNC_HTTP_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "RECSYNC_HTTP_TIMEOUT_SECS",
                reason: format!("'{raw}' is not a number of seconds"),
            })?),
            None => Duration::from_secs(10),
        };

        let mandator_languages = match optional("RECSYNC_MANDATOR_LANGUAGES") {
            Some(raw) => parse_mandator_languages(&raw)?,
            None => BTreeMap::new(),
        };

        let export_auth = match optional("RECSYNC_EXPORT_AUTH_METHOD").as_deref() {
            None | Some("none") => ExportAuthMethod::None,
            Some("basic") => ExportAuthMethod::Basic,
            Some("user") => ExportAuthMethod::User {
                login: required("RECSYNC_EXPORT_AUTH_LOGIN")?,
                password: required("RECSYNC_EXPORT_AUTH_PASSWORD")?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "RECSYNC_EXPORT_AUTH_METHOD",
                    reason: format!("expected none, basic or user, got '{other}'"),
                })
            }
        };

        Ok(Self {
            customer_id: required("RECSYNC_CUSTOMER_ID")?,
            license_key: required("RECSYNC_LICENSE_KEY")?,
            api_endpoint: optional("RECSYNC_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            recommendation_endpoint: optional("RECSYNC_RECOMMENDATION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_RECOMMENDATION_ENDPOINT.to_string()),
            tenant: optional("RECSYNC_TENANT").unwrap_or_else(|| DEFAULT_TENANT.to_string()),
            http_timeout,
            server_uri: required("RECSYNC_SERVER_URI")?,
            included_content_types: split_list(&optional("RECSYNC_INCLUDED_CONTENT_TYPES").unwrap_or_default()),
            default_languages: split_list(&optional("RECSYNC_LANGUAGES").unwrap_or_default()),
            mandator_languages,
            export_root: optional("RECSYNC_EXPORT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./var/export")),
            export_host: optional("RECSYNC_EXPORT_HOST"),
            export_download_path: optional("RECSYNC_EXPORT_DOWNLOAD_PATH")
                .unwrap_or_else(|| DEFAULT_EXPORT_DOWNLOAD_PATH.to_string()),
            export_auth,
        })
    }

    /// Languages configured for a mandator, falling back to the defaults.
    pub fn languages_for(&self, mandator_id: u32) -> Vec<String> {
        self.mandator_languages
            .get(&mandator_id)
            .filter(|langs| !langs.is_empty())
            .cloned()
            .unwrap_or_else(|| self.default_languages.clone())
    }

    pub fn api_credentials(&self) -> ApiCredentials {
        ApiCredentials::new(&self.customer_id, &self.license_key)
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            api_endpoint: self.api_endpoint.clone(),
            recommendation_endpoint: self.recommendation_endpoint.clone(),
            tenant: self.tenant.clone(),
            timeout: self.http_timeout,
        }
    }

    /// Log config with secrets reduced to a short preview.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            format!("{}...", val.chars().take(4).collect::<String>())
        }

        tracing::info!(
            customer_id = %self.customer_id,
            license_key = %preview(&self.license_key),
            api_endpoint = %self.api_endpoint,
            tenant = %self.tenant,
            server_uri = %self.server_uri,
            included_content_types = ?self.included_content_types,
            export_root = %self.export_root.display(),
            "Loaded recommendation config"
        );
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse `"1=eng-GB,ger-DE;2=fre-FR"` into mandator → languages.
pub fn parse_mandator_languages(raw: &str) -> Result<BTreeMap<u32, Vec<String>>, ConfigError> {
    let mut map = BTreeMap::new();
    for entry in raw.split(';').map(str::trim).filter(|e| !e.is_empty()) {
        let (id, langs) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "RECSYNC_MANDATOR_LANGUAGES",
            reason: format!("entry '{entry}' is missing '='"),
        })?;
        let id: u32 = id.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "RECSYNC_MANDATOR_LANGUAGES",
            reason: format!("mandator id '{}' is not a number", id.trim()),
        })?;
        map.insert(id, split_list(langs));
    }
    Ok(map)
}
