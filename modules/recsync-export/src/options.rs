use std::path::PathBuf;

use serde::Deserialize;
use uuid::Uuid;

use recommendation_client::ApiCredentials;
use recsync_common::config::split_list;
use recsync_common::{ContentTypeId, ExportAuthMethod, RecommendationConfig};

use crate::error::ExportError;

pub const DEFAULT_PAGE_SIZE: u64 = 1000;

/// Raw export parameters as they arrive from the CLI or an HTTP trigger.
/// Everything is optional here; [`ExportOptions::resolve`] validates.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub web_hook: Option<String>,
    pub transaction: Option<String>,
    pub host: Option<String>,
    pub customer_id: Option<String>,
    pub license_key: Option<String>,
    /// Comma-separated language codes.
    pub lang: Option<String>,
    pub page_size: Option<u64>,
    pub page: Option<u64>,
    pub path: Option<String>,
    /// `1` includes hidden content, `0` (the default) leaves it out.
    pub hidden: Option<u8>,
    /// Comma-separated content type ids.
    pub content_type_id_list: Option<String>,
    /// Comma-separated field identifiers.
    pub fields: Option<String>,
    pub mandator_id: Option<u32>,
}

/// Validated, immutable parameters for one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub content_type_ids: Vec<ContentTypeId>,
    pub languages: Vec<String>,
    pub page_size: u64,
    /// First page written. Pages before it are skipped.
    pub start_page: u64,
    pub path: Option<String>,
    pub include_hidden: bool,
    pub fields: Vec<String>,
    pub host: String,
    pub download_path: String,
    pub export_root: PathBuf,
    pub webhook: Option<String>,
    pub transaction: Option<String>,
    pub credentials: ApiCredentials,
    pub auth: ExportAuthMethod,
    pub mandator_id: u32,
}

impl ExportOptions {
    /// Merge a request with configuration. Touches no files.
    pub fn resolve(
        request: ExportRequest,
        config: &RecommendationConfig,
    ) -> Result<Self, ExportError> {
        let raw_ids = request
            .content_type_id_list
            .as_deref()
            .map(split_list)
            .unwrap_or_default();
        if raw_ids.is_empty() {
            return Err(ExportError::Configuration(
                "contentTypeIdList is required".into(),
            ));
        }
        let content_type_ids = raw_ids
            .iter()
            .map(|raw| {
                raw.parse::<ContentTypeId>().map_err(|_| {
                    ExportError::Configuration(format!("invalid content type id '{raw}'"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let host = request
            .host
            .or_else(|| config.export_host.clone())
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| ExportError::Configuration("host is required".into()))?;

        let page_size = request.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(ExportError::Configuration("pageSize must be positive".into()));
        }
        let start_page = request.page.unwrap_or(1);
        if start_page == 0 {
            return Err(ExportError::Configuration("page starts at 1".into()));
        }

        let include_hidden = match request.hidden.unwrap_or(0) {
            0 => false,
            1 => true,
            other => {
                return Err(ExportError::Configuration(format!(
                    "hidden must be 0 or 1, got {other}"
                )))
            }
        };

        let mandator_id = request.mandator_id.unwrap_or(0);
        let languages = match request.lang.as_deref().map(split_list) {
            Some(langs) if !langs.is_empty() => langs,
            _ => config.languages_for(mandator_id),
        };
        if languages.is_empty() {
            return Err(ExportError::Configuration(format!(
                "no languages given or configured for mandator {mandator_id}"
            )));
        }

        let credentials = ApiCredentials::new(
            request
                .customer_id
                .unwrap_or_else(|| config.customer_id.clone()),
            request
                .license_key
                .unwrap_or_else(|| config.license_key.clone()),
        );

        Ok(Self {
            content_type_ids,
            languages,
            page_size,
            start_page,
            path: request.path.filter(|p| !p.is_empty()),
            include_hidden,
            fields: request.fields.as_deref().map(split_list).unwrap_or_default(),
            host: host.trim_end_matches('/').to_string(),
            download_path: normalize_download_path(&config.export_download_path),
            export_root: config.export_root.clone(),
            webhook: request.web_hook.filter(|w| !w.is_empty()),
            transaction: Some(
                request
                    .transaction
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
            credentials,
            auth: config.export_auth.clone(),
            mandator_id,
        })
    }
}

/// Ensure a leading and trailing slash.
fn normalize_download_path(raw: &str) -> String {
    let trimmed = raw.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RecommendationConfig {
        RecommendationConfig::from_lookup(|key| match key {
            "RECSYNC_CUSTOMER_ID" => Some("12345".into()),
            "RECSYNC_LICENSE_KEY" => Some("secret".into()),
            "RECSYNC_SERVER_URI" => Some("https://cms.example".into()),
            "RECSYNC_LANGUAGES" => Some("eng-GB".into()),
            "RECSYNC_MANDATOR_LANGUAGES" => Some("3=ger-DE,fre-FR".into()),
            _ => None,
        })
        .unwrap()
    }

    fn request() -> ExportRequest {
        ExportRequest {
            content_type_id_list: Some("3, 10".into()),
            host: Some("https://cms.example/".into()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_in_missing_parameters() {
        let options = ExportOptions::resolve(request(), &config()).unwrap();
        assert_eq!(options.content_type_ids, vec![3, 10]);
        assert_eq!(options.languages, vec!["eng-GB"]);
        assert_eq!(options.page_size, 1000);
        assert_eq!(options.start_page, 1);
        assert_eq!(options.host, "https://cms.example");
        assert_eq!(options.credentials.customer_id, "12345");
        assert!(options.transaction.is_some());
    }

    #[test]
    fn missing_content_types_is_a_configuration_error() {
        let mut req = request();
        req.content_type_id_list = Some(" , ".into());
        let err = ExportOptions::resolve(req, &config()).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn non_numeric_content_type_is_rejected() {
        let mut req = request();
        req.content_type_id_list = Some("3,article".into());
        assert!(ExportOptions::resolve(req, &config()).is_err());
    }

    #[test]
    fn missing_host_is_a_configuration_error() {
        let mut req = request();
        req.host = None;
        let err = ExportOptions::resolve(req, &config()).unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn mandator_languages_apply_without_explicit_lang() {
        let mut req = request();
        req.mandator_id = Some(3);
        let options = ExportOptions::resolve(req, &config()).unwrap();
        assert_eq!(options.languages, vec!["ger-DE", "fre-FR"]);
    }

    #[test]
    fn explicit_overrides_win() {
        let mut req = request();
        req.lang = Some("pol-PL".into());
        req.customer_id = Some("999".into());
        req.transaction = Some("tx-1".into());
        let options = ExportOptions::resolve(req, &config()).unwrap();
        assert_eq!(options.languages, vec!["pol-PL"]);
        assert_eq!(options.credentials.customer_id, "999");
        assert_eq!(options.transaction.as_deref(), Some("tx-1"));
    }

    #[test]
    fn hidden_is_zero_or_one() {
        let options = ExportOptions::resolve(request(), &config()).unwrap();
        assert!(!options.include_hidden);

        let mut req = request();
        req.hidden = Some(1);
        assert!(ExportOptions::resolve(req, &config()).unwrap().include_hidden);

        let mut req = request();
        req.hidden = Some(2);
        let err = ExportOptions::resolve(req, &config()).unwrap_err();
        assert!(matches!(err, ExportError::Configuration(_)));
    }

    #[test]
    fn download_path_is_slash_delimited() {
        assert_eq!(normalize_download_path("export/dl"), "/export/dl/");
        assert_eq!(normalize_download_path("/"), "/");
    }
}
