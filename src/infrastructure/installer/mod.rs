pub mod extractor;
pub mod fetcher;
pub mod utils;

pub use extractor::{ConcurrentExtractor, ExtractionReport, ExtractionTask};
pub use fetcher::{archive_file_name, persist_archive, ArchiveFetcher, ArchiveHandle};
