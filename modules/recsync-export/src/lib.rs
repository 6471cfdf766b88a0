pub mod chunk;
pub mod credentials;
pub mod error;
pub mod lock;
pub mod manifest;
pub mod notifier;
pub mod options;
pub mod pipeline;
pub mod trigger;

pub use error::ExportError;
pub use lock::ExportLock;
pub use manifest::{ExportManifest, ManifestEntry};
pub use notifier::ExportNotifier;
pub use options::{ExportOptions, ExportRequest};
pub use pipeline::{ExportOutcome, ExportPipeline};
pub use trigger::{ExportReport, ExportTrigger};
