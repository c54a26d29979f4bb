pub mod config;
pub mod logging;

pub mod checksum;
pub mod downloader;
pub mod progress;
pub mod range;
pub mod retry;
pub mod size;
pub mod transport;
pub mod window;

pub use downloader::{DownloadError, DownloadOutcome, Downloader};
pub use window::ByteWindow;
