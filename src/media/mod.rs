mod client;
mod error;
mod formats;
mod transport;
mod types;
mod validate;

pub use client::MediaClient;
pub use error::{ErrorCode, MediaError};
pub use formats::{available_filters, select_formats, FormatFilter};
pub use types::{DownloadRequest, DownloadTicket, MediaFormat, MediaInfo};
pub use validate::validate_url;

#[cfg(test)]
pub(crate) use transport::testing;
