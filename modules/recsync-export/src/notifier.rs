use tracing::{error, info};

use recommendation_client::{DownloadCredentials, NotificationBatch, RecommendationClient};

use crate::error::ExportError;
use crate::manifest::ExportManifest;
use crate::options::ExportOptions;

/// Announces a finished export to the recommendation service as FULL events.
pub struct ExportNotifier {
    client: RecommendationClient,
}

impl ExportNotifier {
    pub fn new(client: RecommendationClient) -> Self {
        Self { client }
    }

    /// POST the manifest to the request's webhook, or the items endpoint.
    /// Returns the response body. Failures propagate.
    pub async fn send_export_manifest(
        &self,
        manifest: &ExportManifest,
        options: &ExportOptions,
        credentials: Option<&DownloadCredentials>,
    ) -> Result<String, ExportError> {
        let batch = NotificationBatch::new(
            options.transaction.clone(),
            manifest.to_events(credentials),
        );
        let events = batch.events.len();

        let response = self
            .client
            .post_items(options.webhook.as_deref(), &batch, &options.credentials)
            .await
            .map_err(|e| {
                error!(events, error = %e, "Failed to announce export");
                ExportError::Dispatch(e)
            })?;

        info!(
            events,
            status = response.status,
            transaction = options.transaction.as_deref().unwrap_or_default(),
            "Export announced"
        );
        Ok(response.body)
    }
}
