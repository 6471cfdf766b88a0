use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use recommendation_client::EventAction;

pub type ContentId = u64;
pub type LocationId = u64;
pub type ContentTypeId = u64;

// --- Repository model ---

/// Metadata of a content item as the repository reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    pub id: ContentId,
    pub content_type_id: ContentTypeId,
    pub main_language_code: String,
    /// Languages the published version is available in.
    #[serde(default)]
    pub language_codes: Vec<String>,
    #[serde(default)]
    pub main_location_id: Option<LocationId>,
    #[serde(default = "default_version")]
    pub current_version: u32,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentType {
    pub id: ContentTypeId,
    pub identifier: String,
    #[serde(default)]
    pub name: String,
}

/// A placement of a content item in the location tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub content_id: ContentId,
    #[serde(default)]
    pub parent_id: Option<LocationId>,
    /// Materialized path, e.g. `/1/2/58/`.
    #[serde(default)]
    pub path_string: String,
    /// Explicitly hidden by an editor.
    #[serde(default)]
    pub hidden: bool,
    /// Hidden because an ancestor is hidden.
    #[serde(default)]
    pub invisible: bool,
}

impl Location {
    pub fn is_visible(&self) -> bool {
        !self.hidden && !self.invisible
    }
}

/// True when any of the content's locations can still be reached.
pub fn is_content_visible(locations: &[Location]) -> bool {
    locations.iter().any(Location::is_visible)
}

/// One language rendition of a content item, as returned by catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub content_id: ContentId,
    pub content_type_id: ContentTypeId,
    pub language: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub main_location_id: Option<LocationId>,
    #[serde(default)]
    pub path_string: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    /// Copy of this item keeping only the named fields. Empty list keeps all.
    pub fn with_fields(&self, fields: &[String]) -> Self {
        if fields.is_empty() {
            return self.clone();
        }
        let mut item = self.clone();
        item.fields.retain(|key, _| fields.iter().any(|f| f == key));
        item
    }
}

/// Criteria for paginated catalog search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCriteria {
    pub content_type_id: ContentTypeId,
    pub language: String,
    /// Only items whose path starts with this subtree path.
    pub path_prefix: Option<String>,
    pub include_hidden: bool,
}

impl ContentCriteria {
    pub fn matches(&self, item: &ContentItem) -> bool {
        item.content_type_id == self.content_type_id
            && item.language == self.language
            && (self.include_hidden || !item.hidden)
            && self
                .path_prefix
                .as_deref()
                .map_or(true, |prefix| item.path_string.starts_with(prefix))
    }
}

// --- Signal resolution ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffectedContent {
    pub content_id: ContentId,
    pub action: EventAction,
}

/// Content ids one signal touches, in resolution order, unique by id.
/// The first action recorded for an id wins.
#[derive(Debug, Clone, Default)]
pub struct AffectedContentSet {
    entries: Vec<AffectedContent>,
    seen: HashSet<ContentId>,
}

impl AffectedContentSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, content_id: ContentId, action: EventAction) -> bool {
        if !self.seen.insert(content_id) {
            return false;
        }
        self.entries.push(AffectedContent { content_id, action });
        true
    }

    pub fn extend(&mut self, ids: impl IntoIterator<Item = ContentId>, action: EventAction) {
        for id in ids {
            self.insert(id, action);
        }
    }

    pub fn contains(&self, content_id: ContentId) -> bool {
        self.seen.contains(&content_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AffectedContent> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<ContentId> {
        self.entries.iter().map(|e| e.content_id).collect()
    }
}

impl IntoIterator for AffectedContentSet {
    type Item = AffectedContent;
    type IntoIter = std::vec::IntoIter<AffectedContent>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
