use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use recommendation_client::RecommendationClient;
use recsync_common::{InMemoryRepository, RecommendationConfig};
use recsync_export::{ExportNotifier, ExportOptions, ExportPipeline, ExportRequest, ExportTrigger};

/// Export the content catalog in chunks and announce it to the
/// recommendation service for a full import.
#[derive(Parser)]
#[command(name = "recsync-export")]
struct Cli {
    /// JSON repository snapshot to export from
    #[arg(long, env = "RECSYNC_REPOSITORY_SNAPSHOT")]
    snapshot: PathBuf,

    /// Comma-separated content type ids
    #[arg(long = "contentTypeIdList")]
    content_type_id_list: String,

    /// Public base URL the chunks are downloadable from
    #[arg(long)]
    host: Option<String>,

    /// URL to post the manifest to instead of the items endpoint
    #[arg(long = "webHook")]
    web_hook: Option<String>,

    #[arg(long)]
    transaction: Option<String>,

    #[arg(long = "customerId")]
    customer_id: Option<String>,

    #[arg(long = "licenseKey")]
    license_key: Option<String>,

    /// Comma-separated language codes
    #[arg(long)]
    lang: Option<String>,

    #[arg(long = "pageSize")]
    page_size: Option<u64>,

    #[arg(long)]
    page: Option<u64>,

    /// Restrict to a subtree path, e.g. /1/2/
    #[arg(long)]
    path: Option<String>,

    /// 1 to include hidden content
    #[arg(long, default_value_t = 0)]
    hidden: u8,

    /// Comma-separated field identifiers to keep
    #[arg(long)]
    fields: Option<String>,

    #[arg(long = "mandatorId")]
    mandator_id: Option<u32>,
}

impl Cli {
    fn request(&self) -> ExportRequest {
        ExportRequest {
            web_hook: self.web_hook.clone(),
            transaction: self.transaction.clone(),
            host: self.host.clone(),
            customer_id: self.customer_id.clone(),
            license_key: self.license_key.clone(),
            lang: self.lang.clone(),
            page_size: self.page_size,
            page: self.page,
            path: self.path.clone(),
            hidden: Some(self.hidden),
            content_type_id_list: Some(self.content_type_id_list.clone()),
            fields: self.fields.clone(),
            mandator_id: self.mandator_id,
        }
    }
}

/// `RUST_LOG` plus info for this workspace and its HTTP client.
fn log_filter() -> Result<EnvFilter> {
    Ok(EnvFilter::from_default_env()
        .add_directive("recsync=info".parse()?)
        .add_directive("recommendation_client=info".parse()?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = log_filter()?;
    if std::env::var("RECSYNC_LOG_JSON").is_ok_and(|v| v == "1") {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let cli = Cli::parse();

    let config = RecommendationConfig::from_env()?;
    config.log_redacted();

    let options = ExportOptions::resolve(cli.request(), &config)?;

    let repository = InMemoryRepository::load_snapshot(&cli.snapshot)
        .await
        .with_context(|| format!("cannot read snapshot {}", cli.snapshot.display()))?;
    let client = RecommendationClient::new(config.client_options())?;
    let trigger = ExportTrigger::new(
        ExportPipeline::new(Arc::new(repository)),
        ExportNotifier::new(client),
    );

    match trigger.run(&options).await {
        Ok(report) => {
            info!(
                files = report.files_written,
                urls = report.manifest.url_count(),
                "Export complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Export failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_takes_a_numeric_value() {
        let cli = Cli::try_parse_from([
            "recsync-export",
            "--snapshot",
            "catalog.json",
            "--contentTypeIdList",
            "3,10",
            "--hidden",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.request().hidden, Some(1));
    }

    #[test]
    fn hidden_defaults_to_zero() {
        let cli = Cli::try_parse_from([
            "recsync-export",
            "--snapshot",
            "catalog.json",
            "--contentTypeIdList",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.hidden, 0);
        assert_eq!(cli.request().content_type_id_list.as_deref(), Some("3"));
    }

    #[test]
    fn log_filter_covers_client_target() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("recommendation_client=info"));
        assert!(filter.contains("recsync=info"));
    }
}
