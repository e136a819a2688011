use crate::browser::Locator;
use crate::scrape::fields::{FieldSpec, default_fields};
use crate::{CrawlError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(default)]
    pub site: SiteProfile,
    #[serde(default)]
    pub crawl: CrawlOptions,
    #[serde(default)]
    pub output: OutputOptions,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserOptions {
    pub chrome_path: Option<PathBuf>,
    #[serde(default = "default_headless")]
    pub headless: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_window_width")]
    pub window_width: u32,
    #[serde(default = "default_window_height")]
    pub window_height: u32,
    #[serde(default = "default_disable_cache")]
    pub disable_cache: bool,
}

/// Everything that couples the crawl to one site's markup and URL
/// scheme: markers, selectors, and the detail-page field table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteProfile {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_marker")]
    pub search_marker: String,
    #[serde(default = "default_product_marker")]
    pub product_marker: String,
    #[serde(default = "default_login_marker")]
    pub login_marker: String,
    #[serde(default = "default_verification_marker")]
    pub verification_marker: String,
    #[serde(default = "default_cookie_domain")]
    pub cookie_domain: String,
    #[serde(default = "default_preferred_badge")]
    pub preferred_badge: String,
    #[serde(default = "default_results_container")]
    pub results_container: Locator,
    #[serde(default = "default_page_counter")]
    pub page_counter: Locator,
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldSpec>,
}

impl SiteProfile {
    pub fn search_url(&self, keyword: &str) -> String {
        format!("{}search?keyword={}", self.base_url, keyword)
    }

    /// Listing pages are zero-indexed in the site's query scheme.
    pub fn page_url(&self, keyword: &str, page: usize) -> String {
        format!("{}search?keyword={}&page={}", self.base_url, keyword, page)
    }

    pub fn is_search_url(&self, url: &str) -> bool {
        url.contains(&self.search_marker)
    }

    pub fn is_product_url(&self, url: &str) -> bool {
        url.contains(&self.product_marker)
    }

    pub fn is_login_url(&self, url: &str) -> bool {
        url.contains(&self.login_marker)
    }

    pub fn is_verification_url(&self, url: &str) -> bool {
        url.contains(&self.verification_marker)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrawlOptions {
    #[serde(default = "default_initial_render_secs")]
    pub initial_render_secs: u64,
    #[serde(default = "default_listing_poll_secs")]
    pub listing_poll_secs: u64,
    #[serde(default = "default_listing_ready_timeout_secs")]
    pub listing_ready_timeout_secs: u64,
    #[serde(default = "default_page_counter_timeout_secs")]
    pub page_counter_timeout_secs: u64,
    #[serde(default = "default_scroll_passes")]
    pub scroll_passes: u32,
    #[serde(default = "default_scroll_step_px")]
    pub scroll_step_px: u32,
    #[serde(default = "default_scroll_pause_secs")]
    pub scroll_pause_secs: u64,
    #[serde(default = "default_listener_settle_secs")]
    pub listener_settle_secs: u64,
    #[serde(default = "default_listener_poll_ms")]
    pub listener_poll_ms: u64,
    #[serde(default = "default_interstitial_poll_secs")]
    pub interstitial_poll_secs: u64,
    #[serde(default = "default_interstitial_timeout_secs")]
    pub interstitial_timeout_secs: u64,
    #[serde(default = "default_visit_timeout_secs")]
    pub visit_timeout_secs: u64,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputOptions {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_headless() -> bool {
    true
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Ubuntu; Linux i686; rv:24.0) Gecko/20100101 Firefox/24.0".to_string()
}
fn default_window_width() -> u32 {
    1280
}
fn default_window_height() -> u32 {
    800
}
fn default_disable_cache() -> bool {
    true
}
fn default_base_url() -> String {
    "https://shopee.tw/".to_string()
}
fn default_search_marker() -> String {
    "search?keyword".to_string()
}
fn default_product_marker() -> String {
    "sp_atk".to_string()
}
fn default_login_marker() -> String {
    "login".to_string()
}
fn default_verification_marker() -> String {
    "verify".to_string()
}
fn default_cookie_domain() -> String {
    "shopee".to_string()
}
fn default_preferred_badge() -> String {
    "優選".to_string()
}
fn default_results_container() -> Locator {
    Locator::class_name("shopee-search-item-result__items")
}
fn default_page_counter() -> Locator {
    Locator::class_name("shopee-mini-page-controller__total")
}
fn default_initial_render_secs() -> u64 {
    crate::timeouts::secs::INITIAL_RENDER
}
fn default_listing_poll_secs() -> u64 {
    crate::timeouts::secs::LISTING_POLL
}
fn default_listing_ready_timeout_secs() -> u64 {
    crate::timeouts::secs::LISTING_READY
}
fn default_page_counter_timeout_secs() -> u64 {
    crate::timeouts::secs::PAGE_COUNTER
}
fn default_scroll_passes() -> u32 {
    6
}
fn default_scroll_step_px() -> u32 {
    1000
}
fn default_scroll_pause_secs() -> u64 {
    crate::timeouts::secs::SCROLL_PAUSE
}
fn default_listener_settle_secs() -> u64 {
    crate::timeouts::secs::LISTENER_SETTLE
}
fn default_listener_poll_ms() -> u64 {
    crate::timeouts::ms::LISTENER_POLL
}
fn default_interstitial_poll_secs() -> u64 {
    crate::timeouts::secs::INTERSTITIAL_POLL
}
fn default_interstitial_timeout_secs() -> u64 {
    crate::timeouts::secs::INTERSTITIAL_CLEAR
}
fn default_visit_timeout_secs() -> u64 {
    crate::timeouts::secs::VISIT
}
fn default_max_workers() -> usize {
    5
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: default_headless(),
            user_agent: default_user_agent(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            disable_cache: default_disable_cache(),
        }
    }
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_marker: default_search_marker(),
            product_marker: default_product_marker(),
            login_marker: default_login_marker(),
            verification_marker: default_verification_marker(),
            cookie_domain: default_cookie_domain(),
            preferred_badge: default_preferred_badge(),
            results_container: default_results_container(),
            page_counter: default_page_counter(),
            fields: default_fields(),
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            initial_render_secs: default_initial_render_secs(),
            listing_poll_secs: default_listing_poll_secs(),
            listing_ready_timeout_secs: default_listing_ready_timeout_secs(),
            page_counter_timeout_secs: default_page_counter_timeout_secs(),
            scroll_passes: default_scroll_passes(),
            scroll_step_px: default_scroll_step_px(),
            scroll_pause_secs: default_scroll_pause_secs(),
            listener_settle_secs: default_listener_settle_secs(),
            listener_poll_ms: default_listener_poll_ms(),
            interstitial_poll_secs: default_interstitial_poll_secs(),
            interstitial_timeout_secs: default_interstitial_timeout_secs(),
            visit_timeout_secs: default_visit_timeout_secs(),
            max_workers: default_max_workers(),
        }
    }
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

pub fn default_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("shopcrawl"))
        .ok_or_else(|| CrawlError::ConfigError("Could not determine config directory".into()))
}

pub fn default_config_path() -> Result<PathBuf> {
    default_config_dir().map(|p| p.join("config.toml"))
}

impl Config {
    pub fn load(explicit: Option<&std::path::Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path)?;
            config = toml::from_str(&content)?;
        } else {
            let global_path = default_config_path()?;
            if global_path.exists() {
                let content = std::fs::read_to_string(&global_path)?;
                config = toml::from_str(&content)?;
            }

            let project_path = PathBuf::from(".shopcrawl.toml");
            if project_path.exists() {
                let content = std::fs::read_to_string(&project_path)?;
                config = toml::from_str(&content)?;
            }
        }

        config.load_from_env();

        Ok(config)
    }

    pub fn load_with_overrides(&self, overrides: ConfigOverrides) -> Self {
        let mut config = self.clone();

        if let Some(headless) = overrides.headless {
            config.browser.headless = headless;
        }
        if let Some(chrome_path) = overrides.chrome_path {
            config.browser.chrome_path = Some(chrome_path);
        }
        if let Some(output_dir) = overrides.output_dir {
            config.output.dir = output_dir;
        }

        config
    }

    fn load_from_env(&mut self) {
        if let Ok(headless) = std::env::var("SHOPCRAWL_HEADLESS") {
            self.browser.headless = headless == "true" || headless == "1";
        }
        if let Ok(path) = std::env::var("SHOPCRAWL_CHROME_PATH") {
            self.browser.chrome_path = Some(PathBuf::from(path));
        }
        if let Ok(dir) = std::env::var("SHOPCRAWL_OUTPUT_DIR") {
            self.output.dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.site.base_url)
            .map_err(|_| CrawlError::InvalidUrl(self.site.base_url.clone()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(CrawlError::InvalidUrl(self.site.base_url.clone()));
        }

        if self.crawl.scroll_step_px == 0 {
            return Err(CrawlError::ConfigError(
                "scroll_step_px must be greater than 0".into(),
            ));
        }

        if self.crawl.listing_ready_timeout_secs == 0 || self.crawl.visit_timeout_secs == 0 {
            return Err(CrawlError::ConfigError(
                "timeouts must be greater than 0".into(),
            ));
        }

        if self.crawl.max_workers == 0 {
            return Err(CrawlError::ConfigError(
                "max_workers must be greater than 0".into(),
            ));
        }

        if self.site.fields.is_empty() {
            return Err(CrawlError::ConfigError(
                "site.fields must not be empty".into(),
            ));
        }

        if !self
            .site
            .fields
            .iter()
            .any(|f| f.name == crate::scrape::record::PRODUCT_NAME_FIELD)
        {
            return Err(CrawlError::ConfigError(
                "site.fields must include product_name".into(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub headless: Option<bool>,
    pub chrome_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.browser.headless);
        assert_eq!(config.crawl.scroll_passes, 6);
        assert_eq!(config.crawl.scroll_step_px, 1000);
        assert_eq!(config.site.fields.len(), 14);
    }

    #[test]
    fn test_config_validate_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate_bad_base_url() {
        let mut config = Config::default();
        config.site.base_url = "not a url".into();
        assert!(config.validate().is_err());

        config.site.base_url = "ftp://example.com/".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_zero_timeout() {
        let mut config = Config::default();
        config.crawl.visit_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validate_requires_product_name_field() {
        let mut config = Config::default();
        config.site.fields.retain(|f| f.name != "product_name");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_load_with_overrides() {
        let config = Config::default();
        let overrides = ConfigOverrides {
            headless: Some(false),
            chrome_path: Some(PathBuf::from("/usr/bin/chromium")),
            output_dir: Some(PathBuf::from("/tmp/out")),
        };

        let result = config.load_with_overrides(overrides);
        assert!(!result.browser.headless);
        assert_eq!(
            result.browser.chrome_path,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert_eq!(result.output.dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_site_urls() {
        let site = SiteProfile::default();
        assert_eq!(
            site.search_url("aa"),
            "https://shopee.tw/search?keyword=aa"
        );
        assert_eq!(
            site.page_url("aa", 1),
            "https://shopee.tw/search?keyword=aa&page=1"
        );
    }

    #[test]
    fn test_site_markers() {
        let site = SiteProfile::default();
        assert!(site.is_search_url("https://shopee.tw/search?keyword=aa&page=0"));
        assert!(!site.is_search_url("https://shopee.tw/verify/traffic"));
        assert!(site.is_product_url("https://shopee.tw/item-i.1.2?sp_atk=abc"));
        assert!(site.is_login_url("https://shopee.tw/buyer/login"));
        assert!(site.is_verification_url("https://shopee.tw/verify/traffic"));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[site]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.site.base_url, config.site.base_url);
        assert_eq!(parsed.site.fields.len(), config.site.fields.len());
    }
}
