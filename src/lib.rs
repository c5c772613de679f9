// 核心模块
pub mod cli;
pub mod core;
pub mod error;
pub mod infrastructure;

pub use cli::{Cli, CommandHandler};
pub use error::{AppError, AppResult, ContextualError, ContextualResult, EntryFailure};
pub use self::core::options::{Mode, RunOptions};
pub use infrastructure::config::Config;
pub use infrastructure::installer::{ArchiveFetcher, ArchiveHandle, ConcurrentExtractor, ExtractionReport};
pub use infrastructure::remote::{HttpClient, MajorVersion, Platform, VersionCatalog, VersionEntry};
