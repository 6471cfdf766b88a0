use std::collections::BTreeMap;

use serde::Serialize;

use recommendation_client::{DownloadCredentials, NotificationEvent};
use recsync_common::ContentTypeId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub content_type_name: String,
    pub url_list: Vec<String>,
}

/// Chunk URLs produced by an export run, keyed by content type then language.
///
/// A URL is only recorded after its chunk was written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportManifest {
    entries: BTreeMap<ContentTypeId, BTreeMap<String, ManifestEntry>>,
}

impl ExportManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_url(
        &mut self,
        content_type_id: ContentTypeId,
        content_type_name: &str,
        lang: &str,
        url: String,
    ) {
        let entry = self
            .entries
            .entry(content_type_id)
            .or_default()
            .entry(lang.to_string())
            .or_insert_with(|| ManifestEntry {
                content_type_name: content_type_name.to_string(),
                url_list: Vec::new(),
            });
        entry.url_list.push(url);
    }

    pub fn urls(&self, content_type_id: ContentTypeId, lang: &str) -> &[String] {
        self.entries
            .get(&content_type_id)
            .and_then(|langs| langs.get(lang))
            .map(|e| e.url_list.as_slice())
            .unwrap_or(&[])
    }

    pub fn url_count(&self) -> usize {
        self.entries
            .values()
            .flat_map(|langs| langs.values())
            .map(|e| e.url_list.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One FULL event per content type and language.
    pub fn to_events(&self, credentials: Option<&DownloadCredentials>) -> Vec<NotificationEvent> {
        self.entries
            .iter()
            .flat_map(|(content_type_id, langs)| {
                langs.iter().map(move |(lang, entry)| {
                    NotificationEvent::full(
                        *content_type_id,
                        entry.content_type_name.clone(),
                        lang.clone(),
                        entry.url_list.clone(),
                        credentials.cloned(),
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recommendation_client::{EventAction, EventUri};

    #[test]
    fn events_group_urls_per_type_and_language() {
        let mut manifest = ExportManifest::new();
        manifest.add_url(10, "Blog post", "eng-GB", "u/10_eng-GB_1".into());
        manifest.add_url(3, "Article", "eng-GB", "u/3_eng-GB_1".into());
        manifest.add_url(3, "Article", "eng-GB", "u/3_eng-GB_2".into());

        let creds = DownloadCredentials {
            login: "12345".into(),
            password: "pw".into(),
        };
        let events = manifest.to_events(Some(&creds));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, EventAction::Full);
        assert_eq!(events[0].content_type_id, Some(3));
        assert_eq!(
            events[0].uri,
            EventUri::List(vec!["u/3_eng-GB_1".into(), "u/3_eng-GB_2".into()])
        );
        assert_eq!(events[1].content_type_name.as_deref(), Some("Blog post"));
        assert_eq!(events[1].credentials.as_ref(), Some(&creds));
        assert_eq!(manifest.url_count(), 3);
    }

    #[test]
    fn unknown_pair_has_no_urls() {
        assert!(ExportManifest::new().urls(3, "eng-GB").is_empty());
    }
}
