// In-memory content repository.
//
// Backs tests and the snapshot-driven export CLI. Builder style:
// `.with_content_type()`, `.with_content()`, `.with_location()`,
// `.with_relation()`, `.with_item()`. A JSON snapshot with the same
// collections can be loaded from disk.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RepositoryError;
use crate::repository::{ContentRepository, RepositoryResult};
use crate::types::{
    ContentCriteria, ContentId, ContentInfo, ContentItem, ContentType, ContentTypeId, Location,
    LocationId,
};

/// `source` relates to (embeds, links) `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub source: ContentId,
    pub destination: ContentId,
}

/// On-disk form of an [`InMemoryRepository`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    #[serde(default)]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub contents: Vec<ContentInfo>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub items: Vec<ContentItem>,
}

#[derive(Debug)]
struct Inner {
    content_types: BTreeMap<ContentTypeId, ContentType>,
    contents: BTreeMap<ContentId, ContentInfo>,
    locations: BTreeMap<LocationId, Location>,
    relations: Vec<Relation>,
    items: Vec<ContentItem>,
    fail_search: bool,
    search_calls: u64,
}

#[derive(Debug)]
pub struct InMemoryRepository {
    inner: Mutex<Inner>,
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                content_types: BTreeMap::new(),
                contents: BTreeMap::new(),
                locations: BTreeMap::new(),
                relations: Vec::new(),
                items: Vec::new(),
                fail_search: false,
                search_calls: 0,
            }),
        }
    }

    pub fn from_snapshot(snapshot: RepositorySnapshot) -> Self {
        let repo = Self::new();
        {
            let mut inner = repo.lock();
            inner.content_types = snapshot
                .content_types
                .into_iter()
                .map(|ct| (ct.id, ct))
                .collect();
            inner.contents = snapshot.contents.into_iter().map(|c| (c.id, c)).collect();
            inner.locations = snapshot.locations.into_iter().map(|l| (l.id, l)).collect();
            inner.relations = snapshot.relations;
            inner.items = snapshot.items;
        }
        repo
    }

    /// Read a JSON [`RepositorySnapshot`] from disk.
    pub async fn load_snapshot(path: &Path) -> std::io::Result<Self> {
        let raw = tokio::fs::read(path).await?;
        let snapshot: RepositorySnapshot = serde_json::from_slice(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self::from_snapshot(snapshot))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock only means a test panicked mid-update; the data is still usable.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn with_content_type(self, id: ContentTypeId, identifier: &str, name: &str) -> Self {
        self.lock().content_types.insert(
            id,
            ContentType {
                id,
                identifier: identifier.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_content(self, id: ContentId, content_type_id: ContentTypeId, languages: &[&str]) -> Self {
        let language_codes: Vec<String> = languages.iter().map(|l| l.to_string()).collect();
        self.lock().contents.insert(
            id,
            ContentInfo {
                id,
                content_type_id,
                main_language_code: language_codes.first().cloned().unwrap_or_default(),
                language_codes,
                main_location_id: None,
                current_version: 1,
            },
        );
        self
    }

    /// Add a location under `parent`. The path string is derived from the parent's.
    pub fn with_location(self, id: LocationId, content_id: ContentId, parent: Option<LocationId>) -> Self {
        {
            let mut inner = self.lock();
            let parent_path = parent
                .and_then(|p| inner.locations.get(&p))
                .map(|p| p.path_string.clone())
                .unwrap_or_else(|| "/".to_string());
            let path_string = format!("{parent_path}{id}/");
            inner.locations.insert(
                id,
                Location {
                    id,
                    content_id,
                    parent_id: parent,
                    path_string,
                    hidden: false,
                    invisible: false,
                },
            );
            if let Some(content) = inner.contents.get_mut(&content_id) {
                content.main_location_id.get_or_insert(id);
            }
        }
        self
    }

    pub fn with_relation(self, source: ContentId, destination: ContentId) -> Self {
        self.lock().relations.push(Relation {
            source,
            destination,
        });
        self
    }

    pub fn with_item(self, item: ContentItem) -> Self {
        self.lock().items.push(item);
        self
    }

    pub fn with_items(self, items: impl IntoIterator<Item = ContentItem>) -> Self {
        self.lock().items.extend(items);
        self
    }

    /// Make catalog count/search calls fail.
    pub fn failing_search(self) -> Self {
        self.lock().fail_search = true;
        self
    }

    /// Mark a location hidden and its descendants invisible, the way the
    /// repository does before emitting a hide signal.
    pub fn hide(&self, location_id: LocationId) {
        self.set_visibility(location_id, true);
    }

    pub fn unhide(&self, location_id: LocationId) {
        self.set_visibility(location_id, false);
    }

    fn set_visibility(&self, location_id: LocationId, hidden: bool) {
        let mut inner = self.lock();
        let Some(root_path) = inner.locations.get(&location_id).map(|l| l.path_string.clone()) else {
            return;
        };
        for location in inner.locations.values_mut() {
            if location.id == location_id {
                location.hidden = hidden;
            } else if location.path_string.starts_with(&root_path) {
                location.invisible = hidden;
            }
        }
    }

    /// Drop a content item with all its locations, items and relations, the
    /// way the repository has already done when it emits a delete signal.
    pub fn remove_content(&self, content_id: ContentId) {
        let mut inner = self.lock();
        inner.contents.remove(&content_id);
        inner.locations.retain(|_, l| l.content_id != content_id);
        inner.items.retain(|i| i.content_id != content_id);
        inner
            .relations
            .retain(|r| r.source != content_id && r.destination != content_id);
    }

    /// Number of count/search calls served so far.
    pub fn search_calls(&self) -> u64 {
        self.lock().search_calls
    }
}

#[async_trait]
impl ContentRepository for InMemoryRepository {
    async fn load_content(
        &self,
        content_id: ContentId,
        version: Option<u32>,
    ) -> RepositoryResult<ContentInfo> {
        let inner = self.lock();
        let content = inner
            .contents
            .get(&content_id)
            .ok_or_else(|| RepositoryError::not_found("content", content_id))?;
        match version {
            Some(v) if v > content.current_version => {
                Err(RepositoryError::not_found("content version", u64::from(v)))
            }
            _ => Ok(content.clone()),
        }
    }

    async fn load_content_type(
        &self,
        content_type_id: ContentTypeId,
    ) -> RepositoryResult<ContentType> {
        self.lock()
            .content_types
            .get(&content_type_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("content type", content_type_id))
    }

    async fn load_location(&self, location_id: LocationId) -> RepositoryResult<Location> {
        self.lock()
            .locations
            .get(&location_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("location", location_id))
    }

    async fn load_location_children(&self, location: &Location) -> RepositoryResult<Vec<Location>> {
        Ok(self
            .lock()
            .locations
            .values()
            .filter(|l| l.parent_id == Some(location.id))
            .cloned()
            .collect())
    }

    async fn load_locations(&self, content_id: ContentId) -> RepositoryResult<Vec<Location>> {
        let inner = self.lock();
        if !inner.contents.contains_key(&content_id) {
            return Err(RepositoryError::not_found("content", content_id));
        }
        Ok(inner
            .locations
            .values()
            .filter(|l| l.content_id == content_id)
            .cloned()
            .collect())
    }

    async fn load_reverse_relations(
        &self,
        content_id: ContentId,
    ) -> RepositoryResult<Vec<ContentId>> {
        Ok(self
            .lock()
            .relations
            .iter()
            .filter(|r| r.destination == content_id)
            .map(|r| r.source)
            .collect())
    }

    async fn load_subtree_ids(&self, location_id: LocationId) -> RepositoryResult<Vec<ContentId>> {
        let inner = self.lock();
        let root = inner
            .locations
            .get(&location_id)
            .ok_or_else(|| RepositoryError::not_found("location", location_id))?;

        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for location in inner.locations.values() {
            if location.path_string.starts_with(&root.path_string) && seen.insert(location.content_id) {
                ids.push(location.content_id);
            }
        }
        Ok(ids)
    }

    async fn count_content(&self, criteria: &ContentCriteria) -> RepositoryResult<u64> {
        let mut inner = self.lock();
        inner.search_calls += 1;
        if inner.fail_search {
            return Err(RepositoryError::Backend("search unavailable".into()));
        }
        Ok(inner.items.iter().filter(|i| criteria.matches(i)).count() as u64)
    }

    async fn find_content(
        &self,
        criteria: &ContentCriteria,
        offset: u64,
        limit: u64,
    ) -> RepositoryResult<Vec<ContentItem>> {
        let mut inner = self.lock();
        inner.search_calls += 1;
        if inner.fail_search {
            return Err(RepositoryError::Backend("search unavailable".into()));
        }
        let mut matching: Vec<&ContentItem> =
            inner.items.iter().filter(|i| criteria.matches(i)).collect();
        matching.sort_by_key(|i| i.content_id);
        Ok(matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
