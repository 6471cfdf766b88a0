//! Expands a repository signal into the content ids it affects.
//!
//! Hide/unhide walk the location tree with an explicit stack, children
//! before their parent. Move, copy and recover read the persistence-level
//! subtree index in a single call instead.

use std::sync::Arc;

use tracing::{debug, warn};

use recommendation_client::EventAction;
use recsync_common::{
    is_content_visible, AffectedContentSet, ContentId, ContentRepository, Location, LocationId,
    RepositoryError, RepositorySignal,
};

pub struct ContentGraphResolver {
    repository: Arc<dyn ContentRepository>,
}

impl ContentGraphResolver {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    /// Signals that name their content directly. No repository access.
    pub fn resolve_for_content_signal(&self, signal: &RepositorySignal) -> AffectedContentSet {
        let mut set = AffectedContentSet::new();
        match signal {
            RepositorySignal::ContentPublished { content_id, .. }
            | RepositorySignal::LocationCreated { content_id, .. }
            | RepositorySignal::ObjectStateSet { content_id, .. } => {
                set.insert(*content_id, EventAction::Update);
            }
            RepositorySignal::ContentCopied { dst_content_id, .. } => {
                set.insert(*dst_content_id, EventAction::Update);
            }
            RepositorySignal::ContentDeleted { content_id }
            | RepositorySignal::ContentTrashed { content_id, .. } => {
                set.insert(*content_id, EventAction::Delete);
            }
            _ => {}
        }
        set
    }

    /// Signals that name a location. Fails only if the signal's own
    /// location cannot be loaded; failures further down the tree are
    /// logged and skipped.
    pub async fn resolve_for_location_signal(
        &self,
        signal: &RepositorySignal,
    ) -> Result<AffectedContentSet, RepositoryError> {
        match signal {
            RepositorySignal::LocationHidden { location_id } => {
                self.resolve_hidden(*location_id).await
            }
            RepositorySignal::LocationUnhidden { location_id } => {
                self.resolve_unhidden(*location_id).await
            }
            RepositorySignal::LocationDeleted { content_id, .. } => {
                self.resolve_location_deleted(*content_id).await
            }
            RepositorySignal::SubtreeMoved { location_id, .. } => {
                self.resolve_subtree(*location_id).await
            }
            RepositorySignal::SubtreeCopied {
                target_new_subtree_id,
                ..
            } => self.resolve_subtree(*target_new_subtree_id).await,
            RepositorySignal::ContentRecovered {
                new_location_id, ..
            } => self.resolve_subtree(*new_location_id).await,
            _ => Ok(AffectedContentSet::new()),
        }
    }

    /// Content items holding a relation to `content_id`.
    pub async fn resolve_reverse_relations(
        &self,
        content_id: ContentId,
    ) -> Result<Vec<ContentId>, RepositoryError> {
        let mut ids = self.repository.load_reverse_relations(content_id).await?;
        ids.retain(|id| *id != content_id);
        Ok(ids)
    }

    async fn resolve_subtree(
        &self,
        location_id: LocationId,
    ) -> Result<AffectedContentSet, RepositoryError> {
        let ids = self.repository.load_subtree_ids(location_id).await?;
        let mut set = AffectedContentSet::new();
        set.extend(ids, EventAction::Update);
        Ok(set)
    }

    async fn resolve_hidden(
        &self,
        location_id: LocationId,
    ) -> Result<AffectedContentSet, RepositoryError> {
        let root = self.repository.load_location(location_id).await?;
        let mut set = AffectedContentSet::new();

        for location in self.children_first(root).await {
            if set.contains(location.content_id) {
                continue;
            }
            match self.still_visible(location.content_id).await {
                Ok(true) => {
                    debug!(
                        content_id = location.content_id,
                        location_id = location.id,
                        "Content still reachable through another location, not deleting"
                    );
                }
                Ok(false) => {
                    set.insert(location.content_id, EventAction::Delete);
                }
                Err(e) => {
                    warn!(
                        content_id = location.content_id,
                        location_id = location.id,
                        error = %e,
                        "Failed to load locations for hidden content, skipping"
                    );
                }
            }
        }

        Ok(set)
    }

    async fn resolve_unhidden(
        &self,
        location_id: LocationId,
    ) -> Result<AffectedContentSet, RepositoryError> {
        let root = self.repository.load_location(location_id).await?;
        let mut set = AffectedContentSet::new();
        for location in self.children_first(root).await {
            set.insert(location.content_id, EventAction::Update);
        }
        Ok(set)
    }

    async fn resolve_location_deleted(
        &self,
        content_id: ContentId,
    ) -> Result<AffectedContentSet, RepositoryError> {
        let mut set = AffectedContentSet::new();
        match self.still_visible(content_id).await {
            Ok(true) => {
                debug!(content_id, "Content keeps other visible locations, not deleting");
            }
            Ok(false) => {
                set.insert(content_id, EventAction::Delete);
            }
            // Content removed together with its last location.
            Err(e) if e.is_not_found() => {
                set.insert(content_id, EventAction::Delete);
            }
            Err(e) => return Err(e),
        }
        Ok(set)
    }

    async fn still_visible(&self, content_id: ContentId) -> Result<bool, RepositoryError> {
        let locations = self.repository.load_locations(content_id).await?;
        Ok(is_content_visible(&locations))
    }

    /// Every location under `root` (inclusive), each child listed before its parent.
    async fn children_first(&self, root: Location) -> Vec<Location> {
        let mut order = Vec::new();
        let mut stack = vec![(root, false)];

        while let Some((location, expanded)) = stack.pop() {
            if expanded {
                order.push(location);
                continue;
            }

            let children = match self.repository.load_location_children(&location).await {
                Ok(children) => children,
                Err(e) => {
                    warn!(location_id = location.id, error = %e, "Failed to load child locations");
                    Vec::new()
                }
            };

            stack.push((location, true));
            for child in children.into_iter().rev() {
                stack.push((child, false));
            }
        }

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_repository;
    use recsync_common::InMemoryRepository;

    fn resolver(repo: InMemoryRepository) -> (ContentGraphResolver, Arc<InMemoryRepository>) {
        let repo = Arc::new(repo);
        (ContentGraphResolver::new(repo.clone()), repo)
    }

    #[test]
    fn copy_resolves_destination() {
        let (resolver, _) = resolver(sample_repository());
        let set = resolver.resolve_for_content_signal(&RepositorySignal::ContentCopied {
            content_id: 50,
            dst_content_id: 51,
        });
        assert_eq!(set.ids(), vec![51]);
    }

    #[tokio::test]
    async fn hidden_subtree_lists_children_before_parent() {
        let (resolver, repo) = resolver(sample_repository());
        repo.hide(58);

        let set = resolver
            .resolve_for_location_signal(&RepositorySignal::LocationHidden { location_id: 58 })
            .await
            .unwrap();

        assert_eq!(set.ids(), vec![101, 105, 50]);
        assert!(set.iter().all(|a| a.action == EventAction::Delete));
    }

    #[tokio::test]
    async fn hidden_location_with_visible_sibling_is_not_deleted() {
        let (resolver, repo) = resolver(sample_repository());
        repo.hide(70);

        let set = resolver
            .resolve_for_location_signal(&RepositorySignal::LocationHidden { location_id: 70 })
            .await
            .unwrap();

        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn deep_tree_walk_does_not_recurse() {
        let mut repo = InMemoryRepository::new().with_content_type(16, "article", "Article");
        repo = repo.with_content(1, 16, &["eng-GB"]).with_location(1, 1, None);
        for id in 2..=2000u64 {
            repo = repo.with_content(id, 16, &["eng-GB"]).with_location(id, id, Some(id - 1));
        }
        let (resolver, _) = resolver(repo);

        let set = resolver
            .resolve_for_location_signal(&RepositorySignal::LocationUnhidden { location_id: 1 })
            .await
            .unwrap();

        assert_eq!(set.len(), 2000);
        assert_eq!(set.ids().first(), Some(&2000));
        assert_eq!(set.ids().last(), Some(&1));
    }

    #[tokio::test]
    async fn missing_location_fails_resolution() {
        let (resolver, _) = resolver(sample_repository());
        let err = resolver
            .resolve_for_location_signal(&RepositorySignal::LocationHidden { location_id: 999 })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn moved_subtree_uses_subtree_index() {
        let (resolver, _) = resolver(sample_repository());
        let set = resolver
            .resolve_for_location_signal(&RepositorySignal::SubtreeMoved {
                location_id: 58,
                new_parent_location_id: 2,
            })
            .await
            .unwrap();
        assert_eq!(set.ids(), vec![50, 101, 105]);
    }

    #[tokio::test]
    async fn reverse_relations_exclude_self() {
        let repo = sample_repository()
            .with_relation(101, 50)
            .with_relation(50, 50)
            .with_relation(105, 50);
        let (resolver, _) = resolver(repo);

        let ids = resolver.resolve_reverse_relations(50).await.unwrap();
        assert_eq!(ids, vec![101, 105]);
    }
}
