pub mod browser;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod error;
pub mod export;
pub mod output;
pub mod runner;
pub mod scrape;
pub mod timeouts;

pub use config::{BrowserOptions, Config, CrawlOptions, SiteProfile};
pub use crawler::{CrawlSummary, Crawler};
pub use error::CrawlError;

pub type Result<T> = std::result::Result<T, CrawlError>;
