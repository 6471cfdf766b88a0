pub mod error;
pub mod types;

pub use error::{ClientError, Result};
pub use types::{
    ApiCredentials, DispatchResponse, DownloadCredentials, EventAction, EventUri,
    NotificationBatch, NotificationEvent, RecommendationItem, RecommendationRequest,
    EVENT_FORMAT,
};

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::StatusCode;
use types::RecommendationResponse;

pub const DEFAULT_API_ENDPOINT: &str = "https://admin.yoochoose.net";
pub const DEFAULT_RECOMMENDATION_ENDPOINT: &str = "https://reco.yoochoose.net";
pub const DEFAULT_TENANT: &str = "ez";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoints and transport settings for [`RecommendationClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_endpoint: String,
    pub recommendation_endpoint: String,
    pub tenant: String,
    pub timeout: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            recommendation_endpoint: DEFAULT_RECOMMENDATION_ENDPOINT.to_string(),
            tenant: DEFAULT_TENANT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the recommendation service. Every call is a single request:
/// no retries, no deduplication across calls.
#[derive(Debug, Clone)]
pub struct RecommendationClient {
    client: reqwest::Client,
    options: ClientOptions,
}

impl RecommendationClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { client, options })
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// `POST {api}/api/v1/publisher/{tenant}/{customerId}/notifications`
    pub fn notifications_url(&self, customer_id: &str) -> String {
        format!(
            "{}/api/v1/publisher/{}/{}/notifications",
            self.options.api_endpoint.trim_end_matches('/'),
            self.options.tenant,
            customer_id
        )
    }

    /// `POST {api}/api/{customerId}/items`
    pub fn items_url(&self, customer_id: &str) -> String {
        format!(
            "{}/api/{}/items",
            self.options.api_endpoint.trim_end_matches('/'),
            customer_id
        )
    }

    /// Send live content notifications to the publisher endpoint.
    pub async fn notify(
        &self,
        batch: &NotificationBatch,
        credentials: &ApiCredentials,
    ) -> Result<DispatchResponse> {
        let url = self.notifications_url(&credentials.customer_id);
        self.dispatch(&url, batch, credentials).await
    }

    /// Announce exported chunk files. `webhook` overrides the default items URL.
    pub async fn post_items(
        &self,
        webhook: Option<&str>,
        batch: &NotificationBatch,
        credentials: &ApiCredentials,
    ) -> Result<DispatchResponse> {
        let url = match webhook {
            Some(hook) => hook.to_string(),
            None => self.items_url(&credentials.customer_id),
        };
        self.dispatch(&url, batch, credentials).await
    }

    /// POST one batch as JSON with Basic-Auth. 200 and 202 count as success.
    pub async fn dispatch(
        &self,
        url: &str,
        batch: &NotificationBatch,
        credentials: &ApiCredentials,
    ) -> Result<DispatchResponse> {
        let request = self
            .client
            .post(url)
            .basic_auth(&credentials.customer_id, Some(&credentials.license_key))
            .json(batch)
            .build()?;

        tracing::debug!(
            url,
            events = batch.events.len(),
            headers = ?redacted(request.headers()),
            "Sending notification request"
        );

        let resp = match self.client.execute(request).await {
            Ok(resp) => resp,
            Err(e) => {
                let err = ClientError::from(e);
                tracing::error!(url, events = batch.events.len(), error = %err, "Notification request failed");
                return Err(err);
            }
        };

        let status = resp.status();
        tracing::debug!(
            url,
            status = status.as_u16(),
            headers = ?resp.headers(),
            "Received notification response"
        );

        let body = resp.text().await?;
        if status != StatusCode::OK && status != StatusCode::ACCEPTED {
            tracing::error!(url, status = status.as_u16(), body = %body, "Recommendation service rejected notification");
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(DispatchResponse {
            status: status.as_u16(),
            body,
        })
    }

    /// Fetch personalized recommendations for a user in a scenario.
    pub async fn fetch_recommendations(
        &self,
        request: &RecommendationRequest,
        credentials: &ApiCredentials,
    ) -> Result<Vec<RecommendationItem>> {
        let url = format!(
            "{}/api/v2/{}/{}/{}.json",
            self.options.recommendation_endpoint.trim_end_matches('/'),
            credentials.customer_id,
            request.user_id,
            request.scenario
        );

        let mut query: Vec<(&str, String)> = vec![("numrecs", request.limit.to_string())];
        if !request.context_items.is_empty() {
            let items = request
                .context_items
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            query.push(("contextitems", items));
        }
        if let Some(path) = &request.category_path {
            query.push(("categorypath", path.clone()));
        }
        if let Some(output_type) = request.output_type_id {
            query.push(("outputtypeid", output_type.to_string()));
        }
        for attribute in &request.attributes {
            query.push(("attribute", attribute.clone()));
        }

        let resp = self
            .client
            .get(&url)
            .basic_auth(&credentials.customer_id, Some(&credentials.license_key))
            .query(&query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let parsed: RecommendationResponse = serde_json::from_str(&body)?;
        tracing::debug!(
            scenario = %request.scenario,
            count = parsed.recommendation_items.len(),
            "Fetched recommendations"
        );

        Ok(parsed
            .recommendation_items
            .into_iter()
            .map(RecommendationItem::from)
            .collect())
    }
}

fn redacted(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if name == AUTHORIZATION {
                "<redacted>".to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.to_string(), shown)
        })
        .collect()
}
