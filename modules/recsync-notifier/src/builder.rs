use recommendation_client::{EventAction, NotificationEvent};
use recsync_common::{ContentId, ContentTypeId};

/// Builds per-language notification events with item URIs under `server_uri`.
#[derive(Debug, Clone)]
pub struct NotificationEventBuilder {
    server_uri: String,
}

impl NotificationEventBuilder {
    pub fn new(server_uri: impl Into<String>) -> Self {
        Self {
            server_uri: server_uri.into().trim_end_matches('/').to_string(),
        }
    }

    /// `{server_uri}/content/{id}` plus `?lang={lang}` when a language is known.
    pub fn content_uri(&self, content_id: ContentId, lang: Option<&str>) -> String {
        match lang {
            Some(lang) => format!("{}/content/{}?lang={}", self.server_uri, content_id, lang),
            None => format!("{}/content/{}", self.server_uri, content_id),
        }
    }

    /// DELETE for content that is already gone from the repository.
    pub fn build_removed(&self, content_id: ContentId) -> NotificationEvent {
        NotificationEvent::removed(self.content_uri(content_id, None), content_id)
    }

    /// One event per language. Without any language a single language-less
    /// event is produced.
    pub fn build(
        &self,
        action: EventAction,
        content_id: ContentId,
        content_type_id: ContentTypeId,
        language_codes: &[String],
    ) -> Vec<NotificationEvent> {
        if language_codes.is_empty() {
            return vec![NotificationEvent::item(
                action,
                self.content_uri(content_id, None),
                content_id,
                content_type_id,
                None,
            )];
        }

        language_codes
            .iter()
            .map(|lang| {
                NotificationEvent::item(
                    action,
                    self.content_uri(content_id, Some(lang)),
                    content_id,
                    content_type_id,
                    Some(lang.clone()),
                )
            })
            .collect()
    }
}
