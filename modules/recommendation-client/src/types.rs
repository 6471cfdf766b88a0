use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Format tag the recommendation service expects on every notification.
pub const EVENT_FORMAT: &str = "EZ";

// --- Authentication ---

/// Account credentials used as HTTP Basic-Auth against the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub customer_id: String,
    pub license_key: String,
}

impl ApiCredentials {
    pub fn new(customer_id: impl Into<String>, license_key: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            license_key: license_key.into(),
        }
    }
}

/// Login/password pair the service uses to download protected export chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadCredentials {
    pub login: String,
    pub password: String,
}

// --- Notification payloads ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventAction {
    Update,
    Delete,
    Full,
}

impl std::fmt::Display for EventAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

/// Item URI: a single content URI for live events, a chunk URL list for FULL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EventUri {
    Single(String),
    List(Vec<String>),
}

/// One outbound notification record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    pub action: EventAction,
    pub format: String,
    pub uri: EventUri,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,
    /// Absent only on DELETE events for content that can no longer be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<DownloadCredentials>,
}

impl NotificationEvent {
    /// A live UPDATE/DELETE event for a single content item.
    pub fn item(
        action: EventAction,
        uri: String,
        item_id: u64,
        content_type_id: u64,
        lang: Option<String>,
    ) -> Self {
        Self {
            action,
            format: EVENT_FORMAT.to_string(),
            uri: EventUri::Single(uri),
            item_id: Some(item_id),
            content_type_id: Some(content_type_id),
            content_type_name: None,
            lang,
            credentials: None,
        }
    }

    /// A DELETE event built from the item id alone, with no type or language.
    pub fn removed(uri: String, item_id: u64) -> Self {
        Self {
            action: EventAction::Delete,
            format: EVENT_FORMAT.to_string(),
            uri: EventUri::Single(uri),
            item_id: Some(item_id),
            content_type_id: None,
            content_type_name: None,
            lang: None,
            credentials: None,
        }
    }

    /// A FULL import event pointing at a list of exported chunk URLs.
    pub fn full(
        content_type_id: u64,
        content_type_name: String,
        lang: String,
        urls: Vec<String>,
        credentials: Option<DownloadCredentials>,
    ) -> Self {
        Self {
            action: EventAction::Full,
            format: EVENT_FORMAT.to_string(),
            uri: EventUri::List(urls),
            item_id: None,
            content_type_id: Some(content_type_id),
            content_type_name: Some(content_type_name),
            lang: Some(lang),
            credentials,
        }
    }
}

/// Request body for both the notification and the item import endpoints.
/// `transaction` is serialized as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationBatch {
    pub transaction: Option<String>,
    pub events: Vec<NotificationEvent>,
}

impl NotificationBatch {
    pub fn new(transaction: Option<String>, events: Vec<NotificationEvent>) -> Self {
        Self {
            transaction,
            events,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// What came back from a successful POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: String,
}

// --- Recommendation queries ---

/// Parameters for a personalized recommendation request.
#[derive(Debug, Clone, Default)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub scenario: String,
    pub limit: u32,
    pub context_items: Vec<u64>,
    pub category_path: Option<String>,
    pub output_type_id: Option<u64>,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecommendationResponse {
    #[serde(rename = "recommendationItems", default)]
    pub recommendation_items: Vec<RawRecommendationItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawRecommendationItem {
    #[serde(rename = "itemId")]
    pub item_id: u64,
    #[serde(rename = "itemType")]
    pub item_type: Option<u64>,
    pub relevance: Option<f64>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAttribute {
    pub key: String,
    #[serde(default)]
    pub values: Vec<serde_json::Value>,
}

/// A recommended item with its attributes flattened into a map.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationItem {
    pub item_id: u64,
    pub item_type: Option<u64>,
    pub relevance: Option<f64>,
    pub attributes: BTreeMap<String, Vec<String>>,
}

impl From<RawRecommendationItem> for RecommendationItem {
    fn from(raw: RawRecommendationItem) -> Self {
        let attributes = raw
            .attributes
            .into_iter()
            .map(|attr| {
                let values = attr
                    .values
                    .into_iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect();
                (attr.key, values)
            })
            .collect();

        Self {
            item_id: raw.item_id,
            item_type: raw.item_type,
            relevance: raw.relevance,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn batch_serializes_null_transaction() {
        let batch = NotificationBatch::new(
            None,
            vec![NotificationEvent::item(
                EventAction::Update,
                "https://cms.example/content/42?lang=eng-GB".into(),
                42,
                16,
                Some("eng-GB".into()),
            )],
        );

        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            json!({
                "transaction": null,
                "events": [{
                    "action": "UPDATE",
                    "format": "EZ",
                    "uri": "https://cms.example/content/42?lang=eng-GB",
                    "itemId": 42,
                    "contentTypeId": 16,
                    "lang": "eng-GB"
                }]
            })
        );
    }

    #[test]
    fn full_event_carries_url_list_and_credentials() {
        let event = NotificationEvent::full(
            3,
            "Article".into(),
            "ger-DE".into(),
            vec!["a".into(), "b".into()],
            Some(DownloadCredentials {
                login: "12345".into(),
                password: "secret".into(),
            }),
        );

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["action"], "FULL");
        assert_eq!(value["uri"], json!(["a", "b"]));
        assert_eq!(value["contentTypeName"], "Article");
        assert_eq!(value["credentials"]["login"], "12345");
        assert!(value.get("itemId").is_none());
    }

    #[test]
    fn recommendation_attributes_flatten_to_strings() {
        let raw: RawRecommendationItem = serde_json::from_value(json!({
            "itemId": 7,
            "itemType": 2,
            "relevance": 0.5,
            "attributes": [
                {"key": "title", "values": ["Hello"]},
                {"key": "rating", "values": [4]}
            ]
        }))
        .unwrap();

        let item = RecommendationItem::from(raw);
        assert_eq!(item.attributes["title"], vec!["Hello".to_string()]);
        assert_eq!(item.attributes["rating"], vec!["4".to_string()]);
    }

    #[test]
    fn removed_event_omits_type_and_language() {
        let event = NotificationEvent::removed("https://cms.example/content/7".into(), 7);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "action": "DELETE",
                "format": "EZ",
                "uri": "https://cms.example/content/7",
                "itemId": 7
            })
        );
    }
}
