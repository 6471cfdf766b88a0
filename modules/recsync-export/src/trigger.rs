use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::lock::ExportLock;
use crate::manifest::ExportManifest;
use crate::notifier::ExportNotifier;
use crate::options::ExportOptions;
use crate::pipeline::ExportPipeline;

#[derive(Debug, Clone)]
pub struct ExportReport {
    pub manifest: ExportManifest,
    pub files_written: usize,
    pub response: String,
}

/// Runs export-then-announce, in the foreground or as a background task.
#[derive(Clone)]
pub struct ExportTrigger {
    pipeline: Arc<ExportPipeline>,
    notifier: Arc<ExportNotifier>,
}

impl ExportTrigger {
    pub fn new(pipeline: ExportPipeline, notifier: ExportNotifier) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            notifier: Arc::new(notifier),
        }
    }

    pub async fn run(&self, options: &ExportOptions) -> Result<ExportReport, ExportError> {
        let outcome = self.pipeline.run(options).await?;
        let response = self
            .notifier
            .send_export_manifest(&outcome.manifest, options, outcome.credentials.as_ref())
            .await?;
        Ok(ExportReport {
            manifest: outcome.manifest,
            files_written: outcome.files_written,
            response,
        })
    }

    /// Start an export in the background. Refuses up front if one is already
    /// running; the task itself still takes the lock atomically.
    pub async fn spawn(
        &self,
        options: ExportOptions,
    ) -> Result<JoinHandle<Result<ExportReport, ExportError>>, ExportError> {
        if ExportLock::is_held(&options.export_root).await {
            return Err(ExportError::InProgress(ExportLock::path_in(
                &options.export_root,
            )));
        }

        info!(
            transaction = options.transaction.as_deref().unwrap_or_default(),
            "Export started in background"
        );
        let trigger = self.clone();
        Ok(tokio::spawn(async move {
            let result = trigger.run(&options).await;
            if let Err(e) = &result {
                warn!(error = %e, "Background export failed");
            }
            result
        }))
    }
}
