pub mod catalog;
pub mod download;
pub mod http_client;
pub mod platform;

pub use catalog::{parse_release_links, MajorVersion, VersionCatalog, VersionEntry};
pub use download::DownloadOptions;
pub use http_client::HttpClient;
pub use platform::Platform;
