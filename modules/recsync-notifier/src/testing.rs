// Test doubles for the notifier.
//
// RecordingDispatcher keeps every batch it was asked to send and can be
// switched to fail, standing in for an unreachable recommendation service.

use std::sync::Mutex;

use async_trait::async_trait;

use recommendation_client::{
    ClientError, DispatchResponse, EventAction, NotificationBatch, NotificationEvent,
    Result as ClientResult,
};
use recsync_common::InMemoryRepository;

use crate::dispatch::NotificationDispatcher;

#[derive(Default)]
pub struct RecordingDispatcher {
    batches: Mutex<Vec<NotificationBatch>>,
    fail: bool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the batch, then fail with a network error.
    pub fn failing() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn batches(&self) -> Vec<NotificationBatch> {
        self.batches.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.batches()
            .into_iter()
            .flat_map(|b| b.events)
            .collect()
    }

    /// Item ids of recorded events with the given action, in order.
    pub fn item_ids(&self, action: EventAction) -> Vec<u64> {
        self.events()
            .into_iter()
            .filter(|e| e.action == action)
            .filter_map(|e| e.item_id)
            .collect()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, batch: &NotificationBatch) -> ClientResult<DispatchResponse> {
        self.batches.lock().unwrap().push(batch.clone());
        if self.fail {
            return Err(ClientError::Network("connection refused".into()));
        }
        Ok(DispatchResponse {
            status: 202,
            body: String::new(),
        })
    }
}

/// Content tree used across router tests.
///
/// ```text
/// 2 (content 1, folder)
/// ├── 58 (content 50, article)
/// │   ├── 59 (content 101, article)
/// │   └── 60 (content 105, article)
/// ├── 70 (content 80, article)
/// ├── 71 (content 80, article)   second location of 80
/// └── 90 (content 200, image)
/// ```
pub fn sample_repository() -> InMemoryRepository {
    InMemoryRepository::new()
        .with_content_type(1, "folder", "Folder")
        .with_content_type(16, "article", "Article")
        .with_content_type(27, "image", "Image")
        .with_content(1, 1, &["eng-GB"])
        .with_content(50, 16, &["eng-GB"])
        .with_content(101, 16, &["eng-GB"])
        .with_content(105, 16, &["eng-GB"])
        .with_content(80, 16, &["eng-GB", "ger-DE"])
        .with_content(200, 27, &["eng-GB"])
        .with_location(2, 1, None)
        .with_location(58, 50, Some(2))
        .with_location(59, 101, Some(58))
        .with_location(60, 105, Some(58))
        .with_location(70, 80, Some(2))
        .with_location(71, 80, Some(2))
        .with_location(90, 200, Some(2))
}
