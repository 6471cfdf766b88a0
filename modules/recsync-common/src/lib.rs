pub mod config;
pub mod error;
pub mod memory;
pub mod repository;
pub mod signals;
pub mod types;

pub use config::{ExportAuthMethod, RecommendationConfig};
pub use error::{ConfigError, RepositoryError};
pub use memory::InMemoryRepository;
pub use repository::ContentRepository;
pub use signals::RepositorySignal;
pub use types::*;
