// Read-side boundary to the content repository.
//
// Signal resolution and catalog export only ever read through this trait.
// InMemoryRepository implements it for tests and for snapshot-driven exports.

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::types::{
    ContentCriteria, ContentId, ContentInfo, ContentItem, ContentType, ContentTypeId, Location,
    LocationId,
};

pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// Load content metadata. `version` selects a specific version; a version
    /// that does not exist (e.g. an unpublished draft) is `NotFound`.
    async fn load_content(
        &self,
        content_id: ContentId,
        version: Option<u32>,
    ) -> RepositoryResult<ContentInfo>;

    async fn load_content_type(&self, content_type_id: ContentTypeId)
        -> RepositoryResult<ContentType>;

    async fn load_location(&self, location_id: LocationId) -> RepositoryResult<Location>;

    /// Direct children of a location.
    async fn load_location_children(&self, location: &Location) -> RepositoryResult<Vec<Location>>;

    /// Every location of a content item.
    async fn load_locations(&self, content_id: ContentId) -> RepositoryResult<Vec<Location>>;

    /// Ids of content items that relate to `content_id`.
    async fn load_reverse_relations(&self, content_id: ContentId)
        -> RepositoryResult<Vec<ContentId>>;

    /// Content ids of a location and all its descendants, from the
    /// persistence-level subtree index.
    async fn load_subtree_ids(&self, location_id: LocationId) -> RepositoryResult<Vec<ContentId>>;

    async fn count_content(&self, criteria: &ContentCriteria) -> RepositoryResult<u64>;

    async fn find_content(
        &self,
        criteria: &ContentCriteria,
        offset: u64,
        limit: u64,
    ) -> RepositoryResult<Vec<ContentItem>>;
}
