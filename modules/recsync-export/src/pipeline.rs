use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use recommendation_client::DownloadCredentials;
use recsync_common::{ContentCriteria, ContentRepository, ContentType};

use crate::chunk::{write_chunk, ChunkDocument, ChunkLayout};
use crate::credentials::{resolve_credentials, write_credentials_file};
use crate::error::ExportError;
use crate::lock::ExportLock;
use crate::manifest::ExportManifest;
use crate::options::ExportOptions;

/// What one export run left on disk.
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub manifest: ExportManifest,
    pub credentials: Option<DownloadCredentials>,
    pub directory: PathBuf,
    pub files_written: usize,
}

/// Pages the catalog into chunk files under a dated directory.
///
/// Any failure aborts the run. Chunks already written stay on disk and the
/// lock is released regardless.
pub struct ExportPipeline {
    repository: Arc<dyn ContentRepository>,
}

impl ExportPipeline {
    pub fn new(repository: Arc<dyn ContentRepository>) -> Self {
        Self { repository }
    }

    pub async fn run(&self, options: &ExportOptions) -> Result<ExportOutcome, ExportError> {
        self.run_at(options, Utc::now()).await
    }

    /// Run with an explicit start time, which names the chunk directory.
    pub async fn run_at(
        &self,
        options: &ExportOptions,
        started_at: DateTime<Utc>,
    ) -> Result<ExportOutcome, ExportError> {
        let lock = ExportLock::acquire(&options.export_root).await?;
        let layout = ChunkLayout::new(&options.export_root, started_at);

        let result = self.write_chunks(options, &layout).await;

        // Always release lock
        lock.release().await;

        let (manifest, files_written) = result?;

        let credentials = resolve_credentials(&options.auth, &options.credentials.customer_id);
        if let Some(creds) = &credentials {
            write_credentials_file(&layout.dir(), creds).await?;
        }

        info!(
            directory = %layout.dir().display(),
            files = files_written,
            content_types = options.content_type_ids.len(),
            languages = options.languages.len(),
            "Export written"
        );

        Ok(ExportOutcome {
            manifest,
            credentials,
            directory: layout.dir(),
            files_written,
        })
    }

    async fn write_chunks(
        &self,
        options: &ExportOptions,
        layout: &ChunkLayout,
    ) -> Result<(ExportManifest, usize), ExportError> {
        let mut manifest = ExportManifest::new();
        let mut files_written = 0;

        for &content_type_id in &options.content_type_ids {
            let content_type = self.repository.load_content_type(content_type_id).await?;

            for lang in &options.languages {
                files_written += self
                    .export_language(options, layout, &content_type, lang, &mut manifest)
                    .await?;
            }
        }

        Ok((manifest, files_written))
    }

    async fn export_language(
        &self,
        options: &ExportOptions,
        layout: &ChunkLayout,
        content_type: &ContentType,
        lang: &str,
        manifest: &mut ExportManifest,
    ) -> Result<usize, ExportError> {
        let criteria = ContentCriteria {
            content_type_id: content_type.id,
            language: lang.to_string(),
            path_prefix: options.path.clone(),
            include_hidden: options.include_hidden,
        };

        let count = self.repository.count_content(&criteria).await?;
        let pages = count.div_ceil(options.page_size);
        if pages < options.start_page {
            debug!(
                content_type_id = content_type.id,
                lang,
                count,
                "Nothing to export for content type"
            );
            return Ok(0);
        }

        let mut written = 0;
        for page in options.start_page..=pages {
            let offset = (page - 1) * options.page_size;
            let items = self
                .repository
                .find_content(&criteria, offset, options.page_size)
                .await?;
            if items.is_empty() {
                warn!(
                    content_type_id = content_type.id,
                    lang, page, "Search returned an empty page"
                );
            }

            let document = ChunkDocument {
                content_type_id: content_type.id,
                lang,
                page,
                contents: items
                    .iter()
                    .map(|item| item.with_fields(&options.fields))
                    .collect(),
            };
            let path = layout.file_path(content_type.id, lang, page);
            write_chunk(&path, &document).await?;
            written += 1;

            manifest.add_url(
                content_type.id,
                &content_type.name,
                lang,
                layout.url(&options.host, &options.download_path, content_type.id, lang, page),
            );
            debug!(path = %path.display(), items = document.contents.len(), "Chunk written");
        }

        info!(
            content_type_id = content_type.id,
            lang,
            count,
            pages = written,
            "Exported content type"
        );
        Ok(written)
    }
}
