//! DJ radio statistics for PMOMusic
//!
//! This crate fetches the public program listing of a NetEase Cloud Music
//! DJ radio channel, parses the listing table into [`Program`] records and
//! derives descriptive statistics: update cadence, play and like counts,
//! durations.
//!
//! # Features
//!
//! - **Paged listing**: walks the listing 500 programs at a time, oldest
//!   first, until the declared program count is reached
//! - **Table parsing**: page layout knowledge isolated in [`parser`]
//! - **Report**: [`ChannelReport`] computes and renders every metric
//! - **Configuration Extension**: base URL, timeout and User-Agent via
//!   `pmoconfig`
//!
//! # Example
//!
//! ```no_run
//! use pmodjradio::{ChannelReport, DjRadioClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DjRadioClient::new().await?;
//!
//!     if let Some(channel) = client.fetch_channel("336355127").await? {
//!         let now = chrono::Local::now().naive_local();
//!         println!("{}", ChannelReport::compute(&channel, now)?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Failure model
//!
//! Either the complete listing is produced or the call fails: a non-200
//! page ([`Error::Fetch`]) or a malformed row ([`Error::Parse`]) aborts the
//! whole operation. There is no retry.

pub mod client;
pub mod config_ext;
pub mod error;
pub mod models;
pub mod parser;
pub mod stats;

// Re-exports
pub use client::{ClientBuilder, DjRadioClient, FetchSettings};
pub use config_ext::DjRadioConfigExt;
pub use error::{Error, Result};
pub use models::{Channel, ChannelInfo, Host, Program};
pub use parser::extract_programs;
pub use stats::ChannelReport;
