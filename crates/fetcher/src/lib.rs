mod error;
mod models;
mod traits;
mod ytdlp;

pub use error::FetchError;
pub use models::MediaFile;
pub use traits::MediaFetcher;
pub use ytdlp::YtDlpFetcher;

pub type Result<T> = std::result::Result<T, FetchError>;
