//! On-disk layout of exported chunks.
//!
//! One export run writes into a single directory named after its start
//! time, `{root}/{Y}/{m}/{d}/{H}/{M}/`. Each chunk is one file named
//! `{contentTypeId}_{lang}_{page}` holding a JSON page of items.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::fs;

use recsync_common::{ContentItem, ContentTypeId};

use crate::error::ExportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkLayout {
    root: PathBuf,
    /// Relative dated directory with a trailing slash, e.g. `2026/10/16/09/05/`.
    dated: String,
}

impl ChunkLayout {
    pub fn new(root: impl Into<PathBuf>, started_at: DateTime<Utc>) -> Self {
        Self {
            root: root.into(),
            dated: started_at.format("%Y/%m/%d/%H/%M/").to_string(),
        }
    }

    pub fn dated_path(&self) -> &str {
        &self.dated
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(self.dated.trim_end_matches('/'))
    }

    pub fn file_name(content_type_id: ContentTypeId, lang: &str, page: u64) -> String {
        format!("{content_type_id}_{lang}_{page}")
    }

    pub fn file_path(&self, content_type_id: ContentTypeId, lang: &str, page: u64) -> PathBuf {
        self.dir().join(Self::file_name(content_type_id, lang, page))
    }

    /// Public download URL for a chunk.
    pub fn url(
        &self,
        host: &str,
        download_path: &str,
        content_type_id: ContentTypeId,
        lang: &str,
        page: u64,
    ) -> String {
        format!(
            "{}{}{}{}",
            host,
            download_path,
            self.dated,
            Self::file_name(content_type_id, lang, page)
        )
    }
}

/// One page of exported content as written to disk.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkDocument<'a> {
    pub content_type_id: ContentTypeId,
    pub lang: &'a str,
    pub page: u64,
    pub contents: Vec<ContentItem>,
}

/// Serialize and write one chunk, creating the dated directory as needed.
pub async fn write_chunk(path: &Path, document: &ChunkDocument<'_>) -> Result<(), ExportError> {
    let body = serde_json::to_vec(document)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ExportError::io(parent, e))?;
    }
    fs::write(path, body)
        .await
        .map_err(|e| ExportError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn layout() -> ChunkLayout {
        let at = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).unwrap();
        ChunkLayout::new("/var/export", at)
    }

    #[test]
    fn paths_are_zero_padded_by_minute() {
        let layout = layout();
        assert_eq!(layout.dated_path(), "2026/03/07/09/05/");
        assert_eq!(
            layout.file_path(16, "eng-GB", 2),
            PathBuf::from("/var/export/2026/03/07/09/05/16_eng-GB_2")
        );
    }

    #[test]
    fn url_joins_host_download_path_and_chunk() {
        assert_eq!(
            layout().url("https://cms.example", "/dl/", 16, "eng-GB", 1),
            "https://cms.example/dl/2026/03/07/09/05/16_eng-GB_1"
        );
    }

    #[tokio::test]
    async fn write_chunk_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ChunkLayout::new(dir.path(), Utc::now());
        let path = layout.file_path(3, "eng-GB", 1);
        let doc = ChunkDocument {
            content_type_id: 3,
            lang: "eng-GB",
            page: 1,
            contents: Vec::new(),
        };

        write_chunk(&path, &doc).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["contentTypeId"], 3);
        assert_eq!(written["contents"], serde_json::json!([]));
    }
}
