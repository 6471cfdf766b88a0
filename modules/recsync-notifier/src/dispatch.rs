use async_trait::async_trait;

use recommendation_client::{
    ApiCredentials, DispatchResponse, NotificationBatch, RecommendationClient,
    Result as ClientResult,
};

/// Sends one notification batch to the recommendation service.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, batch: &NotificationBatch) -> ClientResult<DispatchResponse>;
}

/// Posts batches to the publisher notification endpoint.
pub struct PublisherDispatcher {
    client: RecommendationClient,
    credentials: ApiCredentials,
}

impl PublisherDispatcher {
    pub fn new(client: RecommendationClient, credentials: ApiCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl NotificationDispatcher for PublisherDispatcher {
    async fn dispatch(&self, batch: &NotificationBatch) -> ClientResult<DispatchResponse> {
        self.client.notify(batch, &self.credentials).await
    }
}

/// Drops every batch. Selected by `recsync-notify --dry-run`.
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn dispatch(&self, _batch: &NotificationBatch) -> ClientResult<DispatchResponse> {
        Ok(DispatchResponse {
            status: 202,
            body: String::new(),
        })
    }
}
