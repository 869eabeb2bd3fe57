//! HTTP client for DJ radio listing pages
//!
//! This module fetches the paged program listing of a channel and turns it
//! into a [`Channel`]. Pages are requested one after another, oldest first,
//! 500 programs at a time.
//!
//! # Example
//!
//! ```no_run
//! use pmodjradio::DjRadioClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DjRadioClient::new().await?;
//!
//!     match client.fetch_channel("336355127").await? {
//!         Some(channel) => println!("{}: {} programs", channel.info.name, channel.programs.len()),
//!         None => println!("Channel not found"),
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::models::Channel;
use crate::parser;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default listing page URL
pub const DEFAULT_BASE_URL: &str = "https://music.163.com/djradio";

/// Default timeout for HTTP requests (8 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 8;

/// Default User-Agent (the site serves the full table to desktop browsers)
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/68.0.3440.106 Safari/537.36";

/// Programs per listing page (the largest value the site accepts)
pub const PAGE_SIZE: u64 = 500;

/// Listing order: 1 lists newest first, 2 oldest first
const ORDER_OLDEST_FIRST: u8 = 2;

/// Request settings shared by every page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Listing page URL, without query
    pub base_url: String,
    /// User-Agent header sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// DJ radio HTTP client
///
/// The client is stateless: every call to [`DjRadioClient::fetch_channel`]
/// starts from offset 0 and keeps nothing afterwards.
#[derive(Debug, Clone)]
pub struct DjRadioClient {
    pub(crate) client: Client,
    base_url: String,
    timeout: Duration,
}

impl DjRadioClient {
    /// Create a new client with default settings
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build the URL of the listing page starting at `offset`
    ///
    /// ```
    /// use pmodjradio::client::listing_url;
    ///
    /// let url = listing_url("https://music.163.com/djradio", "42", 500).unwrap();
    /// assert_eq!(
    ///     url.as_str(),
    ///     "https://music.163.com/djradio?id=42&order=2&limit=500&offset=500"
    /// );
    /// ```
    pub fn listing_url(&self, radio_id: &str, offset: u64) -> Result<Url> {
        listing_url(&self.base_url, radio_id, offset)
    }

    /// Fetch one page and return its body
    ///
    /// Any status other than 200 fails with [`Error::Fetch`]. There is no
    /// retry.
    pub async fn fetch_page(&self, url: &Url) -> Result<String> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!(%url, bytes = body.len(), "Fetched listing page");
        Ok(body)
    }

    /// Fetch the whole program listing of a channel
    ///
    /// Returns `Ok(None)` when the first page carries no channel metadata,
    /// i.e. the channel does not exist.
    ///
    /// The number of pages follows the declared `programCount`: pages are
    /// fetched at offsets 0, 500, 1000… while `offset + 500 < programCount`.
    /// A failed page aborts the whole listing.
    pub async fn fetch_channel(&self, radio_id: &str) -> Result<Option<Channel>> {
        let mut offset = 0;
        let first = self.fetch_page(&self.listing_url(radio_id, offset)?).await?;
        let page = parser::parse_page(&first)?;

        let info = match page.info {
            Some(info) => info,
            None => {
                warn!(radio_id, "No channel metadata on listing page");
                return Ok(None);
            }
        };

        let mut programs = page.programs;
        while offset + PAGE_SIZE < info.program_count {
            offset += PAGE_SIZE;
            let body = self.fetch_page(&self.listing_url(radio_id, offset)?).await?;
            programs.extend(parser::extract_programs(&body)?);
        }

        info!(
            radio_id,
            declared = info.program_count,
            listed = programs.len(),
            "Fetched channel listing"
        );

        Ok(Some(Channel { info, programs }))
    }
}

/// Build the URL of a listing page
pub fn listing_url(base_url: &str, radio_id: &str, offset: u64) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    url.query_pairs_mut()
        .append_pair("id", radio_id)
        .append_pair("order", &ORDER_OLDEST_FIRST.to_string())
        .append_pair("limit", &PAGE_SIZE.to_string())
        .append_pair("offset", &offset.to_string());
    Ok(url)
}

/// Builder for configuring a DjRadioClient
#[derive(Debug, Default)]
pub struct ClientBuilder {
    settings: FetchSettings,
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all request settings at once
    pub fn settings(mut self, settings: FetchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the listing page URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.settings.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.settings.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub async fn build(self) -> Result<DjRadioClient> {
        // Reject a malformed base URL before any request
        Url::parse(&self.settings.base_url)?;

        let client = Client::builder()
            .user_agent(&self.settings.user_agent)
            .timeout(self.settings.timeout)
            .build()?;

        Ok(DjRadioClient {
            client,
            base_url: self.settings.base_url,
            timeout: self.settings.timeout,
        })
    }
}
