//! Detail-page listener: a second browser session on its own task.
//!
//! The listener polls its own session and scrapes whenever the current
//! URL is a genuine product page. The orchestrator drives it through a
//! command channel; each visit request is answered with an explicit
//! outcome instead of being fire-and-forget, and the listener's
//! login/verification state is published on a watch channel so the
//! orchestrator never has to share the session itself.

use crate::browser::BrowserSession;
use crate::config::{Config, CrawlOptions, SiteProfile};
use crate::scrape::fields::{FieldKind, FieldSpec};
use crate::scrape::parse;
use crate::scrape::record::{
    FieldValue, PREFERRED_SELLER_FIELD, PRODUCT_NAME_FIELD, PRODUCT_URL_FIELD, ProductRecord,
};
use crate::{CrawlError, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

/// What happened to a commanded visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    Scraped,
    Duplicate,
    ScrapeFailed,
    NoProductPage,
}

impl std::fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisitOutcome::Scraped => write!(f, "scraped"),
            VisitOutcome::Duplicate => write!(f, "duplicate"),
            VisitOutcome::ScrapeFailed => write!(f, "scrape failed"),
            VisitOutcome::NoProductPage => write!(f, "no product page"),
        }
    }
}

/// Listener state observable by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct ListenerState {
    pub current_url: String,
    pub on_login_page: bool,
    pub on_verification_page: bool,
    pub records_captured: usize,
}

struct VisitRequest {
    url: String,
    done: oneshot::Sender<VisitOutcome>,
}

pub struct DetailListener {
    session: BrowserSession,
    site: SiteProfile,
    crawl: CrawlOptions,
    fields: Vec<FieldSpec>,
    records: Vec<ProductRecord>,
    state_tx: watch::Sender<ListenerState>,
}

impl DetailListener {
    /// Starts the listener loop on its own task and returns the handle
    /// the orchestrator drives it through.
    pub fn spawn(config: &Config) -> ListenerHandle {
        let (command_tx, command_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(ListenerState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let listener = DetailListener {
            session: BrowserSession::new(config.browser.clone()),
            site: config.site.clone(),
            crawl: config.crawl.clone(),
            fields: config.site.fields.clone(),
            records: Vec::new(),
            state_tx,
        };

        let task = tokio::spawn(listener.run(command_rx, shutdown_rx));

        ListenerHandle {
            commands: command_tx,
            state: state_rx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<VisitRequest>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Vec<ProductRecord> {
        if let Err(e) = self.open_at_home().await {
            tracing::error!("Detail listener failed to start: {}", e);
            self.session.close().await;
            return self.records;
        }

        let poll = Duration::from_millis(self.crawl.listener_poll_ms);
        let mut commands_open = true;

        loop {
            self.publish_state().await;

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                request = commands.recv(), if commands_open => match request {
                    Some(VisitRequest { url, done }) => {
                        let outcome = self.visit(&url).await;
                        done.send(outcome).ok();
                    }
                    None => commands_open = false,
                },
                _ = tokio::time::sleep(poll) => {
                    self.poll_once().await;
                }
            }
        }

        self.publish_state().await;
        self.session.close().await;
        self.records
    }

    async fn open_at_home(&mut self) -> Result<()> {
        self.session.open().await?;
        self.session.navigate(&self.site.base_url).await?;
        self.session
            .sleep(Duration::from_secs(self.crawl.listener_settle_secs))
            .await;
        Ok(())
    }

    /// Navigates to `url` and polls until the page resolves to a
    /// product page and is scraped, bounded by the visit timeout.
    async fn visit(&mut self, url: &str) -> VisitOutcome {
        if let Err(e) = self.session.navigate(url).await {
            tracing::warn!("Listener navigation to {} failed: {}", url, e);
            return VisitOutcome::ScrapeFailed;
        }

        let deadline = Instant::now() + Duration::from_secs(self.crawl.visit_timeout_secs);
        let poll = Duration::from_millis(self.crawl.listener_poll_ms);

        loop {
            match self.try_scrape_current().await {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Scrape of {} failed: {}", url, e);
                    return VisitOutcome::ScrapeFailed;
                }
            }

            if Instant::now() >= deadline {
                return VisitOutcome::NoProductPage;
            }

            self.publish_state().await;
            tokio::time::sleep(poll).await;
        }
    }

    /// One unsolicited poll tick. Scrape errors degrade to a logged
    /// skip so a broken page never kills the loop.
    async fn poll_once(&mut self) {
        if let Err(e) = self.try_scrape_current().await {
            tracing::warn!("Scrape failed: {}", e);
        }
    }

    /// Scrapes the current page if it is a product page. `Ok(None)`
    /// means the session is elsewhere (home, login, verification, ...).
    async fn try_scrape_current(&mut self) -> Result<Option<VisitOutcome>> {
        let url = self.session.current_url().await?;
        if !self.site.is_product_url(&url) {
            return Ok(None);
        }

        let record = self.scrape_product_page(&url).await?;
        let name = record.product_name().unwrap_or("<unnamed>").to_string();

        if !append_if_new(&mut self.records, record) {
            return Ok(Some(VisitOutcome::Duplicate));
        }

        tracing::info!("Captured product {:?} ({} total)", name, self.records.len());

        Ok(Some(VisitOutcome::Scraped))
    }

    /// Reads every configured field. An absent selector degrades to a
    /// missing value; a transform error aborts this page only.
    async fn scrape_product_page(&self, url: &str) -> Result<ProductRecord> {
        let mut values = HashMap::with_capacity(self.fields.len() + 2);

        for spec in &self.fields {
            if !self.session.exists(&spec.locator).await {
                tracing::debug!("{} for {} is absent", spec.locator, spec.name);
                values.insert(spec.name.clone(), FieldValue::Missing);
                continue;
            }

            let text = self.session.find(&spec.locator).await?.text().await?;
            let value = match spec.kind {
                FieldKind::Text => FieldValue::Text(text),
                FieldKind::Number(mode) => parse::extract_number(&text, mode)?,
                FieldKind::DurationDays(mode) => parse::convert_duration(&text, mode)?,
            };
            values.insert(spec.name.clone(), value);
        }

        let preferred = matches!(
            values.get(PRODUCT_NAME_FIELD),
            Some(FieldValue::Text(name)) if name.contains(&self.site.preferred_badge)
        );
        values.insert(
            PREFERRED_SELLER_FIELD.to_string(),
            FieldValue::Flag(preferred),
        );
        values.insert(
            PRODUCT_URL_FIELD.to_string(),
            FieldValue::Text(url.to_string()),
        );

        Ok(ProductRecord::new(values))
    }

    async fn publish_state(&self) {
        let url = self.session.current_url().await.unwrap_or_default();
        let state = ListenerState {
            on_login_page: self.site.is_login_url(&url),
            on_verification_page: self.site.is_verification_url(&url),
            current_url: url,
            records_captured: self.records.len(),
        };
        self.state_tx.send_replace(state);
    }
}

/// Appends `record` unless one with the same identity is already
/// accumulated. Linear scan; the result set is small.
pub(crate) fn append_if_new(records: &mut Vec<ProductRecord>, record: ProductRecord) -> bool {
    if records.contains(&record) {
        return false;
    }
    records.push(record);
    true
}

/// The orchestrator's side of a running listener.
pub struct ListenerHandle {
    commands: mpsc::Sender<VisitRequest>,
    state: watch::Receiver<ListenerState>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<Vec<ProductRecord>>,
}

impl ListenerHandle {
    pub fn state(&self) -> ListenerState {
        self.state.borrow().clone()
    }

    pub fn is_on_login_page(&self) -> bool {
        self.state.borrow().on_login_page
    }

    pub fn is_on_verification_page(&self) -> bool {
        self.state.borrow().on_verification_page
    }

    pub fn records_captured(&self) -> usize {
        self.state.borrow().records_captured
    }

    /// Commands a navigation and blocks until the listener acknowledges
    /// the scrape (or gives up within its visit timeout).
    pub async fn visit(&self, url: &str) -> Result<VisitOutcome> {
        let (done_tx, done_rx) = oneshot::channel();

        self.commands
            .send(VisitRequest {
                url: url.to_string(),
                done: done_tx,
            })
            .await
            .map_err(|_| CrawlError::ListenerGone)?;

        done_rx.await.map_err(|_| CrawlError::ListenerGone)
    }

    /// Signals shutdown, joins the task, and hands back the accumulated
    /// records. The read happens strictly after the listener stops
    /// writing because ownership moves on join.
    pub async fn stop(self) -> Result<Vec<ProductRecord>> {
        let ListenerHandle {
            commands,
            shutdown,
            task,
            ..
        } = self;

        drop(commands);
        shutdown.send(true).ok();

        task.await
            .map_err(|e| CrawlError::General(format!("Listener task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str, stars: f64) -> ProductRecord {
        let mut values = HashMap::new();
        values.insert(
            PRODUCT_NAME_FIELD.to_string(),
            FieldValue::Text(name.to_string()),
        );
        values.insert("number_of_stars".to_string(), FieldValue::Number(stars));
        ProductRecord::new(values)
    }

    #[test]
    fn test_append_if_new_accepts_distinct_names() {
        let mut records = Vec::new();
        assert!(append_if_new(&mut records, named("a", 1.0)));
        assert!(append_if_new(&mut records, named("b", 1.0)));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_append_if_new_rejects_same_identity() {
        let mut records = Vec::new();
        assert!(append_if_new(&mut records, named("a", 1.0)));
        // Same name, different fields: still the same product.
        assert!(!append_if_new(&mut records, named("a", 5.0)));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_dedup_invariant_over_append_sequences() {
        let names = ["a", "b", "a", "c", "b", "a", "d"];
        let mut records = Vec::new();
        for (i, name) in names.iter().enumerate() {
            append_if_new(&mut records, named(name, i as f64));
        }

        for (i, left) in records.iter().enumerate() {
            for right in &records[i + 1..] {
                assert_ne!(left, right);
            }
        }
        assert_eq!(records.len(), 4);
    }

    #[test]
    fn test_visit_outcome_display() {
        assert_eq!(VisitOutcome::Scraped.to_string(), "scraped");
        assert_eq!(VisitOutcome::NoProductPage.to_string(), "no product page");
    }
}
