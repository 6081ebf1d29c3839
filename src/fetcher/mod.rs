pub mod listing;

use crate::clock::Clock;
use crate::config::SourceConfig;
use crate::coupons::RawListing;
use crate::error::FetchError;
use crate::retry::{self, RetryPolicy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub use listing::{find_link_to_host, split_listings};

/// Where listings come from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Raw entries on page `page` (1-based). An empty result ends pagination.
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>, FetchError>;

    /// Final destination link behind a listing, if the source has one.
    async fn resolve_detail(&self, _listing_url: &Url) -> Result<Option<Url>, FetchError> {
        Ok(None)
    }
}

/// HTTP fetcher for the coupon-listing site.
pub struct HttpFetcher {
    client: reqwest::Client,
    listing_url: Url,
    page_param: String,
    listing_selector: String,
    detail_link_host: Option<String>,
    retry: RetryPolicy,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    pub fn new(
        config: &SourceConfig,
        retry: RetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FetchError> {
        let base_url = config
            .base_url()
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        let listing_url = base_url
            .join(&config.listing_path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {e}", config.listing_path)))?;

        crate::tls::install_crypto_provider();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| FetchError::Network {
                url: listing_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            listing_url,
            page_param: config.page_param.clone(),
            listing_selector: config.listing_selector.clone(),
            detail_link_host: config
                .detail_link_host
                .clone()
                .filter(|h| !h.trim().is_empty()),
            retry,
            clock,
        })
    }

    pub fn page_url(&self, page: u32) -> Url {
        let mut url = self.listing_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.page_param, &page.to_string());
        url
    }

    async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        retry::with_backoff(self.clock.as_ref(), self.retry, url.as_str(), || {
            self.get_text_once(url)
        })
        .await
    }

    async fn get_text_once(&self, url: &Url) -> Result<String, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.client.get(url.as_str()).send().await.map_err(network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(network)
    }
}

#[async_trait]
impl ListingSource for HttpFetcher {
    async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>, FetchError> {
        let url = self.page_url(page);
        let body = self.get_text(&url).await?;
        let listings = split_listings(&body, &self.listing_selector, page);
        tracing::debug!(page, count = listings.len(), url = %url, "fetched listing page");
        Ok(listings)
    }

    async fn resolve_detail(&self, listing_url: &Url) -> Result<Option<Url>, FetchError> {
        let Some(host) = self.detail_link_host.as_deref() else {
            return Ok(None);
        };
        if listing_url
            .host_str()
            .is_some_and(|h| h == host || h.ends_with(&format!(".{host}")))
        {
            return Ok(Some(listing_url.clone()));
        }
        let body = self.get_text(listing_url).await?;
        Ok(find_link_to_host(&body, listing_url, host))
    }
}

/// Lazy page sequence for one run: a page is only requested when asked for.
///
/// Ends after the first empty page, after `max_pages`, or after an error.
pub struct Pages<'a> {
    source: &'a dyn ListingSource,
    next: u32,
    max_pages: u32,
    done: bool,
}

impl<'a> Pages<'a> {
    pub fn new(source: &'a dyn ListingSource, max_pages: u32) -> Self {
        Self {
            source,
            next: 1,
            max_pages,
            done: max_pages == 0,
        }
    }

    pub async fn next_page(&mut self) -> Option<Result<Vec<RawListing>, FetchError>> {
        if self.done {
            return None;
        }

        let page = self.next;
        self.next += 1;
        if page >= self.max_pages {
            self.done = true;
        }

        match self.source.fetch_page(page).await {
            Ok(listings) if listings.is_empty() => {
                tracing::debug!(page, "empty page, pagination finished");
                self.done = true;
                None
            }
            Ok(listings) => Some(Ok(listings)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }

    /// Drain every remaining page; the first error aborts.
    pub async fn collect_all(mut self) -> Result<Vec<RawListing>, FetchError> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await {
            all.extend(page?);
        }
        Ok(all)
    }
}
