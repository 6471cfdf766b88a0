use std::sync::Arc;

use tracing::{debug, error, info, warn};

use recommendation_client::{
    ClientError, EventAction, NotificationBatch, NotificationEvent, RecommendationClient,
};
use recsync_common::{
    AffectedContent, AffectedContentSet, ContentRepository, RecommendationConfig,
    RepositoryError, RepositorySignal,
};

use crate::builder::NotificationEventBuilder;
use crate::dispatch::{NotificationDispatcher, PublisherDispatcher};
use crate::filter::ContentTypeFilter;
use crate::resolver::ContentGraphResolver;

/// Outcome of the outbound call for one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Nothing eligible to notify, no request made.
    NothingToSend,
    Sent { status: u16 },
    /// The request failed. Logged, not retried.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalReport {
    pub signal: &'static str,
    pub affected: usize,
    pub skipped: usize,
    pub events: usize,
    pub delivery: Delivery,
}

impl SignalReport {
    fn empty(signal: &RepositorySignal) -> Self {
        Self {
            signal: signal.kind(),
            affected: 0,
            skipped: 0,
            events: 0,
            delivery: Delivery::NothingToSend,
        }
    }
}

/// Turns repository signals into notifications, one outbound batch per signal.
///
/// Holds no state between signals. Failures never propagate to the caller:
/// resolution errors skip the signal (or the single item), dispatch errors
/// are logged and reported in [`SignalReport::delivery`].
pub struct SignalRouter {
    repository: Arc<dyn ContentRepository>,
    resolver: ContentGraphResolver,
    filter: ContentTypeFilter,
    builder: NotificationEventBuilder,
    dispatcher: Arc<dyn NotificationDispatcher>,
}

impl SignalRouter {
    pub fn new(
        repository: Arc<dyn ContentRepository>,
        filter: ContentTypeFilter,
        builder: NotificationEventBuilder,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            resolver: ContentGraphResolver::new(repository.clone()),
            repository,
            filter,
            builder,
            dispatcher,
        }
    }

    /// Wire a router that posts to the publisher endpoint from config.
    pub fn from_config(
        config: &RecommendationConfig,
        repository: Arc<dyn ContentRepository>,
    ) -> Result<Self, ClientError> {
        let client = RecommendationClient::new(config.client_options())?;
        let dispatcher = PublisherDispatcher::new(client, config.api_credentials());
        Ok(Self::with_dispatcher(config, repository, Arc::new(dispatcher)))
    }

    /// Filter and item URIs from config, batches to `dispatcher`.
    pub fn with_dispatcher(
        config: &RecommendationConfig,
        repository: Arc<dyn ContentRepository>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self::new(
            repository,
            ContentTypeFilter::new(config.included_content_types.clone()),
            NotificationEventBuilder::new(config.server_uri.clone()),
            dispatcher,
        )
    }

    pub async fn handle(&self, signal: &RepositorySignal) -> SignalReport {
        if matches!(signal, RepositorySignal::Unknown) {
            return SignalReport::empty(signal);
        }

        let affected = match self.affected_for(signal).await {
            Ok(affected) => affected,
            Err(e) => {
                warn!(signal = signal.kind(), error = %e, "Could not resolve signal, skipping");
                return SignalReport::empty(signal);
            }
        };

        let mut report = SignalReport::empty(signal);
        report.affected = affected.len();

        let version = match signal {
            RepositorySignal::ContentPublished {
                content_id,
                version_no,
            } => version_no.map(|v| (*content_id, v)),
            _ => None,
        };

        let mut events = Vec::new();
        for entry in affected {
            let pinned = version
                .filter(|(id, _)| *id == entry.content_id)
                .map(|(_, v)| v);
            match self.events_for(&entry, pinned).await {
                Ok(mut built) => events.append(&mut built),
                Err(e) => {
                    report.skipped += 1;
                    warn!(
                        signal = signal.kind(),
                        content_id = entry.content_id,
                        error = %e,
                        "Could not load affected content, skipping"
                    );
                }
            }
        }

        report.events = events.len();
        if events.is_empty() {
            debug!(signal = signal.kind(), "No eligible content, nothing to notify");
            return report;
        }

        let batch = NotificationBatch::new(None, events);
        report.delivery = match self.dispatcher.dispatch(&batch).await {
            Ok(resp) => {
                info!(
                    signal = signal.kind(),
                    events = report.events,
                    status = resp.status,
                    "Notified recommendation service"
                );
                Delivery::Sent {
                    status: resp.status,
                }
            }
            Err(e) => {
                error!(
                    signal = signal.kind(),
                    events = report.events,
                    error = %e,
                    "Failed to notify recommendation service"
                );
                Delivery::Failed(e.to_string())
            }
        };

        report
    }

    /// Affected content per signal kind.
    async fn affected_for(
        &self,
        signal: &RepositorySignal,
    ) -> Result<AffectedContentSet, RepositoryError> {
        match signal {
            RepositorySignal::ContentPublished { .. }
            | RepositorySignal::ContentDeleted { .. }
            | RepositorySignal::ContentCopied { .. }
            | RepositorySignal::LocationCreated { .. }
            | RepositorySignal::ObjectStateSet { .. } => {
                Ok(self.resolver.resolve_for_content_signal(signal))
            }
            RepositorySignal::ContentTrashed { content_id, .. } => {
                let mut set = self.resolver.resolve_for_content_signal(signal);
                self.add_reverse_relations(&mut set, *content_id).await;
                Ok(set)
            }
            RepositorySignal::ContentRecovered { content_id, .. } => {
                let mut set = self.resolver.resolve_for_location_signal(signal).await?;
                self.add_reverse_relations(&mut set, *content_id).await;
                Ok(set)
            }
            RepositorySignal::LocationDeleted { .. }
            | RepositorySignal::LocationHidden { .. }
            | RepositorySignal::LocationUnhidden { .. }
            | RepositorySignal::SubtreeMoved { .. }
            | RepositorySignal::SubtreeCopied { .. } => {
                self.resolver.resolve_for_location_signal(signal).await
            }
            RepositorySignal::Unknown => Ok(AffectedContentSet::new()),
        }
    }

    async fn add_reverse_relations(&self, set: &mut AffectedContentSet, content_id: u64) {
        match self.resolver.resolve_reverse_relations(content_id).await {
            Ok(ids) => set.extend(ids, EventAction::Update),
            Err(e) => {
                warn!(content_id, error = %e, "Failed to load reverse relations");
            }
        }
    }

    /// Events for one affected item, or none if its type is not eligible.
    /// A DELETE for content that no longer exists cannot be filtered by type
    /// and is sent bare.
    async fn events_for(
        &self,
        entry: &AffectedContent,
        version: Option<u32>,
    ) -> Result<Vec<NotificationEvent>, RepositoryError> {
        let content = match self.repository.load_content(entry.content_id, version).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() && entry.action == EventAction::Delete => {
                debug!(
                    content_id = entry.content_id,
                    "Deleted content is gone, sending DELETE without type or language"
                );
                return Ok(vec![self.builder.build_removed(entry.content_id)]);
            }
            Err(e) => return Err(e),
        };
        let content_type = self
            .repository
            .load_content_type(content.content_type_id)
            .await?;

        if !self.filter.is_eligible(&content_type.identifier) {
            debug!(
                content_id = entry.content_id,
                content_type = %content_type.identifier,
                "Content type not included, skipping"
            );
            return Ok(Vec::new());
        }

        Ok(self.builder.build(
            entry.action,
            content.id,
            content.content_type_id,
            &content.language_codes,
        ))
    }
}
