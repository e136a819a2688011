//! Listing-page crawl: walks the paginated search results for one
//! keyword and harvests every product detail link, page by page.

use crate::browser::{BrowserSession, Locator};
use crate::config::{Config, CrawlOptions, SiteProfile};
use crate::{CrawlError, Result};
use std::time::{Duration, Instant};

pub struct AddressCollector {
    keyword: String,
    page_limit: Option<usize>,
    session: BrowserSession,
    site: SiteProfile,
    crawl: CrawlOptions,
}

impl AddressCollector {
    /// `page_limit` carries the caller's intent verbatim: `None` means
    /// every discovered page, `Some(0)` means no pages at all.
    pub fn new(config: &Config, keyword: impl Into<String>, page_limit: Option<usize>) -> Self {
        Self {
            keyword: keyword.into(),
            page_limit,
            session: BrowserSession::new(config.browser.clone()),
            site: config.site.clone(),
            crawl: config.crawl.clone(),
        }
    }

    /// Runs the full collection pass and closes the session, even when
    /// a step fails mid-way.
    pub async fn collect(mut self) -> Result<Vec<String>> {
        let result = self.collect_inner().await;
        self.session.close().await;
        result
    }

    async fn collect_inner(&mut self) -> Result<Vec<String>> {
        self.session.open().await?;
        self.session
            .navigate(&self.site.search_url(&self.keyword))
            .await?;
        self.session
            .sleep(Duration::from_secs(self.crawl.initial_render_secs))
            .await;

        self.wait_for_listing_page().await?;

        let discovered = self.read_total_pages().await?;
        let effective = effective_page_count(self.page_limit, discovered);
        tracing::info!(
            "Discovered {} listing pages for {:?}, scraping {}",
            discovered,
            self.keyword,
            effective
        );

        // A redirect (e.g. a fresh verification challenge) can land
        // between pagination and the page loop; re-check before walking.
        self.wait_for_listing_page().await?;

        let mut all_urls = Vec::new();
        for page in 0..effective {
            self.session
                .navigate(&self.site.page_url(&self.keyword, page))
                .await?;
            self.scroll_out_lazy_content().await?;

            let urls = self.harvest_page_urls().await?;
            tracing::debug!("Listing page {} yielded {} links", page, urls.len());
            all_urls.extend(urls);
        }

        Ok(all_urls)
    }

    pub async fn is_on_verification_page(&self) -> Result<bool> {
        let url = self.session.current_url().await?;
        Ok(self.site.is_verification_url(&url))
    }

    /// Polls until the session lands on a search listing URL.
    async fn wait_for_listing_page(&self) -> Result<()> {
        let timeout = Duration::from_secs(self.crawl.listing_ready_timeout_secs);
        let start = Instant::now();

        loop {
            let url = self.session.current_url().await?;
            if self.site.is_search_url(&url) {
                return Ok(());
            }

            if self.site.is_verification_url(&url) {
                tracing::warn!("Held on verification interstitial: {}", url);
            }

            if start.elapsed() >= timeout {
                return Err(CrawlError::WaitTimeout {
                    what: "search listing page".into(),
                    secs: timeout.as_secs(),
                });
            }

            self.session
                .sleep(Duration::from_secs(self.crawl.listing_poll_secs))
                .await;
        }
    }

    async fn read_total_pages(&self) -> Result<usize> {
        let counter = self
            .session
            .wait_for_present(
                Duration::from_secs(self.crawl.page_counter_timeout_secs),
                &self.site.page_counter,
            )
            .await?;

        let text = counter.text().await?;
        text.trim()
            .parse::<usize>()
            .map_err(|_| CrawlError::General(format!("Unreadable page counter: {:?}", text)))
    }

    /// Lazy-loaded listing tiles only render once scrolled into view,
    /// so each page gets a fixed scroll ritual before harvesting.
    async fn scroll_out_lazy_content(&self) -> Result<()> {
        for _ in 0..self.crawl.scroll_passes {
            self.session
                .execute_script(&format!("window.scrollBy(0,{})", self.crawl.scroll_step_px))
                .await?;
            self.session
                .sleep(Duration::from_secs(self.crawl.scroll_pause_secs))
                .await;
        }
        Ok(())
    }

    /// Hrefs of every anchor inside the results container. A missing
    /// container yields no links, not an error.
    async fn harvest_page_urls(&self) -> Result<Vec<String>> {
        if !self.session.exists(&self.site.results_container).await {
            tracing::debug!("Results container absent, no links on this page");
            return Ok(Vec::new());
        }

        let container = self.session.find(&self.site.results_container).await?;
        let anchors = container.find_all(&Locator::tag_name("a")).await?;

        let mut urls = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if let Some(href) = anchor.attr("href").await? {
                urls.push(href);
            }
        }

        Ok(urls)
    }
}

/// Resolves the caller's page cap against the discovered page count.
pub(crate) fn effective_page_count(limit: Option<usize>, discovered: usize) -> usize {
    match limit {
        Some(limit) => limit.min(discovered),
        None => discovered,
    }
}
