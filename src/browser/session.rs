use crate::browser::dialogs::{AlertState, AlertWatcher};
use crate::browser::locator::{Locator, escape_selector};
use crate::config::BrowserOptions;
use crate::timeouts::{ms, secs};
use crate::{CrawlError, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCookiesParams, GetCookiesParams, SetCacheDisabledParams, SetCookieParams,
    TimeSinceEpoch,
};
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, ReloadParams};
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// A domain-scoped cookie mapping, the shape the crawl passes around
/// when restoring a signed-in state into a fresh session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// One remote browser plus its single page. Created per collector or
/// listener instance, opened once, closed exactly once (idempotent).
///
/// Lookups return explicit [`ElementHandle`]s; interaction goes through
/// the handle, so several handles can be held at the same time.
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Arc<Page>>,
    handler_task: Option<JoinHandle<()>>,
    alerts: AlertWatcher,
    options: BrowserOptions,
}

impl BrowserSession {
    pub fn new(options: BrowserOptions) -> Self {
        Self {
            browser: None,
            page: None,
            handler_task: None,
            alerts: AlertWatcher::new(),
            options,
        }
    }

    pub fn is_open(&self) -> bool {
        self.page.is_some()
    }

    fn page(&self) -> Result<&Arc<Page>> {
        self.page.as_ref().ok_or(CrawlError::SessionClosed)
    }

    /// Launches the browser with fingerprint-masking flags, caches
    /// disabled, and a clean cookie jar.
    pub async fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        let chrome_path = resolve_chrome_executable(self.options.chrome_path.clone())?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&chrome_path)
            .request_timeout(Duration::from_secs(secs::REQUEST))
            .arg("--disable-blink-features=AutomationControlled")
            .arg(format!("--user-agent={}", self.options.user_agent))
            .arg(format!(
                "--window-size={},{}",
                self.options.window_width, self.options.window_height
            ));

        if self.options.disable_cache {
            builder = builder.args(["--disk-cache-size=0", "--media-cache-size=0"]);
        }

        if !self.options.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(CrawlError::LaunchFailed)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| CrawlError::LaunchFailed(e.to_string()))?;

        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| CrawlError::LaunchFailed(format!("Failed to create page: {}", e)))?;
        let page = Arc::new(page);

        self.alerts.attach(&page).await?;

        if self.options.disable_cache {
            page.execute(SetCacheDisabledParams::new(true))
                .await
                .map_err(|e| CrawlError::General(format!("Failed to disable cache: {}", e)))?;
        }

        page.execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| CrawlError::General(format!("Failed to clear cookies: {}", e)))?;

        self.browser = Some(browser);
        self.page = Some(page);
        self.handler_task = Some(handler_task);

        Ok(())
    }

    pub async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page()?;
        tracing::debug!("Opening url: {}", url);

        page.goto(url)
            .await
            .map_err(|e| CrawlError::Navigation(format!("{}: {}", url, e)))?;

        Ok(())
    }

    pub async fn refresh(&self) -> Result<()> {
        let page = self.page()?;
        let params = ReloadParams::builder().build();

        page.execute(params)
            .await
            .map_err(|e| CrawlError::Navigation(format!("Reload failed: {}", e)))?;

        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        let page = self.page()?;
        Ok(page
            .url()
            .await
            .map_err(|e| CrawlError::General(format!("Failed to read url: {}", e)))?
            .unwrap_or_default())
    }

    pub async fn title(&self) -> Result<String> {
        let page = self.page()?;
        Ok(page
            .get_title()
            .await
            .map_err(|e| CrawlError::General(format!("Failed to read title: {}", e)))?
            .unwrap_or_default())
    }

    pub async fn cookies(&self) -> Result<Vec<SessionCookie>> {
        let page = self.page()?;
        let response = page
            .execute(GetCookiesParams::default())
            .await
            .map_err(|e| CrawlError::General(format!("Failed to get cookies: {}", e)))?;

        Ok(response
            .cookies
            .clone()
            .into_iter()
            .map(|c| SessionCookie {
                name: c.name,
                value: c.value,
                domain: c.domain,
                path: c.path,
                expires: Some(c.expires),
                secure: c.secure,
                http_only: c.http_only,
            })
            .collect())
    }

    /// Clears every cookie, then applies only the mappings whose domain
    /// contains `domain_filter`. Returns how many were applied.
    pub async fn replace_cookies(
        &self,
        cookies: &[SessionCookie],
        domain_filter: &str,
    ) -> Result<usize> {
        let page = self.page()?;

        page.execute(ClearBrowserCookiesParams::default())
            .await
            .map_err(|e| CrawlError::General(format!("Failed to clear cookies: {}", e)))?;

        let mut applied = 0;
        for cookie in cookies_for_domain(cookies, domain_filter) {
            let mut params = SetCookieParams::builder()
                .name(&cookie.name)
                .value(&cookie.value)
                .domain(&cookie.domain)
                .path(&cookie.path)
                .secure(cookie.secure)
                .http_only(cookie.http_only);

            if let Some(expires) = cookie.expires
                && expires > 0.0
            {
                params = params.expires(TimeSinceEpoch::new(expires));
            }

            let built = params
                .build()
                .map_err(|e| CrawlError::General(format!("Invalid cookie: {}", e)))?;

            page.execute(built)
                .await
                .map_err(|e| CrawlError::General(format!("Failed to set cookie: {}", e)))?;
            applied += 1;
        }

        Ok(applied)
    }

    /// Direct lookup. A missing element is a distinct error kind.
    pub async fn find(&self, locator: &Locator) -> Result<ElementHandle> {
        let page = self.page()?;
        let selector = locator.to_selector();

        let element = page.find_element(selector.as_str()).await.map_err(|_| {
            CrawlError::ElementNotFound {
                selector: selector.clone(),
            }
        })?;

        Ok(ElementHandle {
            element,
            page: page.clone(),
            selector,
        })
    }

    /// All matches for `locator`; no matches yields an empty list.
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let page = self.page()?;
        let selector = locator.to_selector();

        let elements = match page.find_elements(selector.as_str()).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!("find_all {}: {}", selector, e);
                return Ok(Vec::new());
            }
        };

        Ok(elements
            .into_iter()
            .map(|element| ElementHandle {
                element,
                page: page.clone(),
                selector: selector.clone(),
            })
            .collect())
    }

    /// Existence check. Wraps lookup failure into `false`, never errors.
    pub async fn exists(&self, locator: &Locator) -> bool {
        match self.page() {
            Ok(page) => page.find_element(locator.to_selector()).await.is_ok(),
            Err(_) => false,
        }
    }

    /// Blocks until the element is present, polling until `timeout`.
    pub async fn wait_for_present(
        &self,
        timeout: Duration,
        locator: &Locator,
    ) -> Result<ElementHandle> {
        let start = Instant::now();

        loop {
            if let Ok(handle) = self.find(locator).await {
                return Ok(handle);
            }

            if start.elapsed() >= timeout {
                return Err(CrawlError::WaitTimeout {
                    what: format!("element {}", locator),
                    secs: timeout.as_secs(),
                });
            }

            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
        }
    }

    /// Blocks until the element is present, visible, and enabled.
    pub async fn wait_for_clickable(
        &self,
        timeout: Duration,
        locator: &Locator,
    ) -> Result<ElementHandle> {
        let page = self.page()?;
        let start = Instant::now();
        let selector = locator.to_selector();
        let escaped = escape_selector(&selector);

        let clickable_script = format!(
            r#"(function(){{
                const el=document.querySelector('{}');
                if(!el)return false;
                const style=window.getComputedStyle(el);
                const rect=el.getBoundingClientRect();
                return style.display!=='none' &&
                       style.visibility!=='hidden' &&
                       parseFloat(style.opacity||'1')>0 &&
                       rect.width>0 && rect.height>0 &&
                       !el.disabled;
            }})()"#,
            escaped
        );

        loop {
            if let Ok(handle) = self.find(locator).await {
                let clickable = page
                    .evaluate(clickable_script.as_str())
                    .await
                    .ok()
                    .and_then(|r| r.into_value::<bool>().ok())
                    .unwrap_or(false);

                if clickable {
                    return Ok(handle);
                }
            }

            if start.elapsed() >= timeout {
                return Err(CrawlError::WaitTimeout {
                    what: format!("clickable element {}", locator),
                    secs: timeout.as_secs(),
                });
            }

            tokio::time::sleep(Duration::from_millis(ms::POLL_INTERVAL)).await;
        }
    }

    pub async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    pub async fn execute_script(&self, script: &str) -> Result<()> {
        let page = self.page()?;

        page.evaluate(script)
            .await
            .map_err(|e| CrawlError::Evaluation(e.to_string()))?;

        Ok(())
    }

    /// Captures a PNG of the element, optionally writing it to `file`.
    pub async fn screenshot_element(
        &self,
        locator: &Locator,
        file: Option<&Path>,
    ) -> Result<Vec<u8>> {
        let handle = self.find(locator).await?;
        let bytes = handle.screenshot_png().await?;

        if let Some(path) = file {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &bytes)?;
        }

        Ok(bytes)
    }

    pub fn alert_state(&self) -> AlertState {
        self.alerts.state()
    }

    pub fn is_alert_present(&self) -> bool {
        self.alerts.is_present()
    }

    pub fn alert_text(&self) -> Result<String> {
        self.alerts.text()
    }

    pub fn alert_contains(&self, needle: &str) -> bool {
        self.alerts.contains(needle)
    }

    pub async fn accept_alert(&self) -> Result<()> {
        let page = self.page()?;
        self.alerts.accept(page).await?;
        tokio::time::sleep(Duration::from_millis(ms::DIALOG_SETTLE)).await;
        Ok(())
    }

    /// Closes the browser. Safe to call more than once.
    pub async fn close(&mut self) {
        self.page = None;

        if let Some(mut browser) = self.browser.take() {
            tracing::debug!("Closing browser");
            browser.close().await.ok();
            browser.wait().await.ok();
        }

        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

/// An element returned by a lookup; interaction goes through the handle
/// rather than hidden per-session state.
pub struct ElementHandle {
    element: Element,
    page: Arc<Page>,
    selector: String,
}

impl ElementHandle {
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub async fn text(&self) -> Result<String> {
        Ok(self
            .element
            .inner_text()
            .await
            .map_err(|e| CrawlError::General(format!("Failed to read text: {}", e)))?
            .unwrap_or_default())
    }

    pub async fn attr(&self, name: &str) -> Result<Option<String>> {
        self.element
            .attribute(name)
            .await
            .map_err(|e| CrawlError::General(format!("Failed to read attribute: {}", e)))
    }

    pub async fn click(&self) -> Result<()> {
        self.click_n_times(1).await
    }

    pub async fn click_n_times(&self, n: usize) -> Result<()> {
        for _ in 0..n {
            self.element
                .click()
                .await
                .map_err(|e| CrawlError::General(format!("Click failed: {}", e)))?;
        }
        Ok(())
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.element
            .focus()
            .await
            .map_err(|e| CrawlError::General(format!("Focus failed: {}", e)))?;

        self.element
            .type_str(text)
            .await
            .map_err(|e| CrawlError::General(format!("Type failed: {}", e)))?;

        Ok(())
    }

    pub async fn press_key(&self, key: &str) -> Result<()> {
        self.element
            .press_key(key)
            .await
            .map_err(|e| CrawlError::General(format!("Key press failed: {}", e)))?;

        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let escaped = escape_selector(&self.selector);

        self.page
            .evaluate(format!(
                "document.querySelector('{}').value = ''",
                escaped
            ))
            .await
            .map_err(|e| CrawlError::General(format!("Clear failed: {}", e)))?;

        Ok(())
    }

    pub async fn select_by_visible_text(&self, text: &str) -> Result<()> {
        self.select_option("text", text).await
    }

    pub async fn select_by_value(&self, value: &str) -> Result<()> {
        self.select_option("value", value).await
    }

    async fn select_option(&self, field: &str, wanted: &str) -> Result<()> {
        let escaped = escape_selector(&self.selector);
        let escaped_wanted = escape_selector(wanted);

        let script = format!(
            r#"(function(){{
                const el=document.querySelector('{}');
                if(!el||!el.options)return false;
                for(const opt of el.options){{
                    if(opt.{}==='{}'){{
                        el.value=opt.value;
                        el.dispatchEvent(new Event('change',{{bubbles:true}}));
                        return true;
                    }}
                }}
                return false;
            }})()"#,
            escaped, field, escaped_wanted
        );

        let selected = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CrawlError::Evaluation(e.to_string()))?
            .into_value::<bool>()
            .unwrap_or(false);

        if selected {
            Ok(())
        } else {
            Err(CrawlError::General(format!(
                "No option with {} {:?} in {}",
                field, wanted, self.selector
            )))
        }
    }

    /// Elements matching `locator` scoped to this element's subtree.
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>> {
        let selector = locator.to_selector();

        let elements = match self.element.find_elements(selector.as_str()).await {
            Ok(elements) => elements,
            Err(e) => {
                tracing::debug!("scoped find_all {}: {}", selector, e);
                return Ok(Vec::new());
            }
        };

        Ok(elements
            .into_iter()
            .map(|element| ElementHandle {
                element,
                page: self.page.clone(),
                selector: selector.clone(),
            })
            .collect())
    }

    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| CrawlError::ScreenshotFailed(e.to_string()))
    }
}

/// The cookie mappings whose domain contains `domain_filter`; the rest
/// are dropped rather than applied to an unrelated domain.
pub(crate) fn cookies_for_domain<'a>(
    cookies: &'a [SessionCookie],
    domain_filter: &str,
) -> Vec<&'a SessionCookie> {
    cookies
        .iter()
        .filter(|cookie| cookie.domain.contains(domain_filter))
        .collect()
}

fn resolve_chrome_executable(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path);
        }
        return Err(CrawlError::LaunchFailed(format!(
            "Configured chrome path does not exist: {}",
            path.display()
        )));
    }

    let standard = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    for path in &standard {
        let p = PathBuf::from(path);
        if p.exists() {
            return Ok(p);
        }
    }

    for binary in ["google-chrome", "chromium", "chromium-browser", "chrome"] {
        if let Ok(path) = which::which(binary) {
            return Ok(path);
        }
    }

    Err(CrawlError::LaunchFailed(
        "Could not find Chrome/Chromium executable. Set browser.chrome_path in the config".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(name: &str, domain: &str) -> SessionCookie {
        SessionCookie {
            name: name.to_string(),
            value: "v".to_string(),
            domain: domain.to_string(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    #[test]
    fn test_cookies_for_domain_keeps_only_matches() {
        let cookies = vec![
            cookie("a", ".shopee.tw"),
            cookie("b", "tracker.example.com"),
            cookie("c", "shopee.tw"),
            cookie("d", "ads.example.net"),
            cookie("e", "cdn.other.org"),
        ];

        let matching = cookies_for_domain(&cookies, "shopee");
        assert_eq!(matching.len(), 2);
        assert_eq!(matching[0].name, "a");
        assert_eq!(matching[1].name, "c");
    }

    #[test]
    fn test_cookies_for_domain_substring_match() {
        let cookies = vec![cookie("a", ".www.shopee.tw")];
        assert_eq!(cookies_for_domain(&cookies, "shopee").len(), 1);
        assert!(cookies_for_domain(&cookies, "amazon").is_empty());
    }
}
