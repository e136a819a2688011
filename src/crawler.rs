//! Crawl orchestration: one listener task, one address collection
//! pass, then a visit loop that hands every harvested URL to the
//! listener and waits for its acknowledgement.

use crate::config::Config;
use crate::export;
use crate::output;
use crate::scrape::{AddressCollector, DetailListener, ListenerHandle};
use crate::{CrawlError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub struct Crawler {
    config: Config,
    keyword: String,
    page_limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct CrawlSummary {
    pub keyword: String,
    pub export_file: PathBuf,
    pub urls_collected: usize,
    pub records_exported: usize,
    pub started_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub failure: Option<String>,
}

impl Crawler {
    pub fn new(config: Config, keyword: impl Into<String>, page_limit: Option<usize>) -> Self {
        Self {
            config,
            keyword: keyword.into(),
            page_limit,
        }
    }

    /// Runs the crawl to completion. The export runs no matter how the
    /// crawl itself ended, so a mid-run failure still flushes whatever
    /// the listener captured.
    pub async fn run(self) -> Result<CrawlSummary> {
        self.config.validate()?;

        let started_at = Utc::now();
        let started = Instant::now();
        let export_file = self
            .config
            .output
            .dir
            .join(format!("{}.csv", Uuid::new_v4()));

        let listener = DetailListener::spawn(&self.config);
        let crawl_result = self.drive(&listener).await;

        // Export must run no matter what, so a listener that died is
        // reduced to an empty capture set rather than an abort.
        let records = match listener.stop().await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to stop listener: {}", e);
                Vec::new()
            }
        };

        let failure = crawl_result.as_ref().err().map(|e| e.to_string());
        if let Some(reason) = &failure {
            tracing::error!("Crawl failed: {}; exporting captured records anyway", reason);
        }

        let records_exported =
            export::write_records(&export_file, &self.config.site.fields, &records)?;
        tracing::info!(
            "Exported {} records to {}",
            records_exported,
            export_file.display()
        );

        Ok(CrawlSummary {
            keyword: self.keyword,
            export_file,
            urls_collected: crawl_result.unwrap_or(0),
            records_exported,
            started_at,
            duration_secs: started.elapsed().as_secs(),
            failure,
        })
    }

    /// Collects every product URL, then feeds them to the listener in
    /// order. Returns how many URLs were collected.
    async fn drive(&self, listener: &ListenerHandle) -> Result<usize> {
        let collector = AddressCollector::new(&self.config, &self.keyword, self.page_limit);
        let urls = collector.collect().await?;
        let total = urls.len();
        tracing::info!("Collected {} product urls for {:?}", total, self.keyword);

        for (idx, url) in urls.iter().enumerate() {
            self.wait_for_clearance(listener).await?;

            let outcome = listener.visit(url).await?;
            tracing::info!("{}/{}: {} ({})", idx + 1, total, url, outcome);
        }

        Ok(total)
    }

    /// Blocks while the listener sits on a login or verification
    /// interstitial; someone has to resolve it in the listener's
    /// browser window before the crawl can push the next URL.
    async fn wait_for_clearance(&self, listener: &ListenerHandle) -> Result<()> {
        let timeout = Duration::from_secs(self.config.crawl.interstitial_timeout_secs);
        let start = Instant::now();
        let mut warned = false;

        loop {
            let state = listener.state();
            if !state.on_login_page && !state.on_verification_page {
                return Ok(());
            }

            if !warned {
                tracing::warn!("Listener held on interstitial: {}", state.current_url);
                warned = true;
            }

            if start.elapsed() >= timeout {
                return Err(CrawlError::WaitTimeout {
                    what: "listener to clear login/verification".into(),
                    secs: timeout.as_secs(),
                });
            }

            tokio::time::sleep(Duration::from_secs(self.config.crawl.interstitial_poll_secs))
                .await;
        }
    }
}

impl output::OutputFormatter for CrawlSummary {
    fn format_text(&self) -> String {
        use crate::output::text;

        let mut lines = vec![
            text::success(&format!(
                "Crawl finished: {} records exported",
                self.records_exported
            )),
            text::key_value("Keyword", &self.keyword),
            text::key_value("Export", &self.export_file.display().to_string()),
            text::key_value("Product URLs", &self.urls_collected.to_string()),
            text::key_value("Duration", &format!("{}s", self.duration_secs)),
        ];

        if let Some(ref reason) = self.failure {
            lines.push(text::warning(&format!(
                "Crawl ended early, export is partial: {}",
                reason
            )));
        }

        lines.join("\n")
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}
