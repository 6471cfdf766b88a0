//! Repository change signals, as emitted by the CMS event bus.
//!
//! Each variant carries only the identifiers needed to resolve the affected
//! content. Kinds outside this set deserialize to [`RepositorySignal::Unknown`]
//! and are ignored downstream.

use serde::{Deserialize, Serialize};

use crate::types::{ContentId, LocationId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositorySignal {
    ContentPublished {
        content_id: ContentId,
        #[serde(default)]
        version_no: Option<u32>,
    },

    ContentDeleted {
        content_id: ContentId,
    },

    ContentCopied {
        content_id: ContentId,
        dst_content_id: ContentId,
    },

    ContentTrashed {
        content_id: ContentId,
        location_id: LocationId,
    },

    ContentRecovered {
        content_id: ContentId,
        location_id: LocationId,
        new_location_id: LocationId,
    },

    LocationCreated {
        content_id: ContentId,
        location_id: LocationId,
    },

    LocationDeleted {
        content_id: ContentId,
        location_id: LocationId,
    },

    LocationHidden {
        location_id: LocationId,
    },

    LocationUnhidden {
        location_id: LocationId,
    },

    SubtreeMoved {
        location_id: LocationId,
        new_parent_location_id: LocationId,
    },

    SubtreeCopied {
        subtree_id: LocationId,
        target_new_subtree_id: LocationId,
    },

    ObjectStateSet {
        content_id: ContentId,
        object_state_group_id: u64,
        object_state_id: u64,
    },

    #[serde(other)]
    Unknown,
}

impl RepositorySignal {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ContentPublished { .. } => "content_published",
            Self::ContentDeleted { .. } => "content_deleted",
            Self::ContentCopied { .. } => "content_copied",
            Self::ContentTrashed { .. } => "content_trashed",
            Self::ContentRecovered { .. } => "content_recovered",
            Self::LocationCreated { .. } => "location_created",
            Self::LocationDeleted { .. } => "location_deleted",
            Self::LocationHidden { .. } => "location_hidden",
            Self::LocationUnhidden { .. } => "location_unhidden",
            Self::SubtreeMoved { .. } => "subtree_moved",
            Self::SubtreeCopied { .. } => "subtree_copied",
            Self::ObjectStateSet { .. } => "object_state_set",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for RepositorySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_tagged_signal() {
        let signal: RepositorySignal =
            serde_json::from_value(json!({"type": "location_hidden", "location_id": 58})).unwrap();
        assert_eq!(signal, RepositorySignal::LocationHidden { location_id: 58 });
    }

    #[test]
    fn unrecognized_kind_becomes_unknown() {
        let signal: RepositorySignal =
            serde_json::from_value(json!({"type": "section_assigned"})).unwrap();
        assert_eq!(signal, RepositorySignal::Unknown);
    }

    #[test]
    fn publish_version_is_optional() {
        let signal: RepositorySignal =
            serde_json::from_value(json!({"type": "content_published", "content_id": 4})).unwrap();
        assert_eq!(
            signal,
            RepositorySignal::ContentPublished {
                content_id: 4,
                version_no: None
            }
        );
    }
}
