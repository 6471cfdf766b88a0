use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recsync_common::{InMemoryRepository, RecommendationConfig, RepositorySignal};
use recsync_notifier::{NoopDispatcher, SignalRouter};

/// Relay repository signals (one JSON object per line on stdin) to the
/// recommendation service.
#[derive(Parser)]
#[command(name = "recsync-notify")]
struct Cli {
    /// JSON repository snapshot to resolve content against
    #[arg(long, env = "RECSYNC_REPOSITORY_SNAPSHOT")]
    snapshot: PathBuf,

    /// Resolve and build events but send nothing
    #[arg(long, env = "RECSYNC_DRY_RUN")]
    dry_run: bool,
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

    let repository = InMemoryRepository::load_snapshot(&cli.snapshot)
        .await
        .with_context(|| format!("cannot read snapshot {}", cli.snapshot.display()))?;
    let repository = Arc::new(repository);
    let router = if cli.dry_run {
        info!("Dry run, notifications disabled");
        SignalRouter::with_dispatcher(&config, repository, Arc::new(NoopDispatcher))
    } else {
        SignalRouter::from_config(&config, repository)?
    };

    info!("Waiting for signals on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let signal: RepositorySignal = match serde_json::from_str(&line) {
            Ok(signal) => signal,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed signal");
                continue;
            }
        };
        let report = router.handle(&signal).await;
        info!(
            signal = report.signal,
            affected = report.affected,
            events = report.events,
            delivery = ?report.delivery,
            "Signal processed"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_filter_covers_client_target() {
        let filter = log_filter().unwrap().to_string();
        assert!(filter.contains("recommendation_client=info"));
        assert!(filter.contains("recsync=info"));
    }
}
