//! Standard integration adapter library
//!
//! Each adapter implements one external capability behind the uniform
//! execute contract. Network-backed adapters delegate to well-known service
//! endpoints; store-backed adapters keep seeded local state so workflows
//! are usable without external credentials.

mod calendar;
mod crm;
mod database;
mod ecommerce;
mod email;
mod file;
mod notify;
mod reasoning;
mod scrape;
mod search;
mod shell;
mod social;
mod support;

pub use calendar::CalendarAdapter;
pub use crm::CrmAdapter;
pub use database::DatabaseAdapter;
pub use ecommerce::EcommerceAdapter;
pub use email::EmailAdapter;
pub use file::FileAdapter;
pub use notify::NotificationAdapter;
pub use reasoning::HttpReasoningClient;
pub use scrape::WebScrapeAdapter;
pub use search::WebSearchAdapter;
pub use shell::ShellAdapter;
pub use social::SocialAdapter;

use std::sync::Arc;
use std::time::Duration;
use weaveruntime::IntegrationRegistry;

/// Location of the external capability services network adapters call
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8620".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ServiceConfig {
    /// Read the base URL from `WEAVE_SERVICES_URL`, falling back to the
    /// local default
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("WEAVE_SERVICES_URL") {
            config.base_url = url;
        }
        config
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub(crate) fn client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.timeout).build()
    }
}

/// Register every standard adapter with a registry
pub fn register_all(
    registry: &mut IntegrationRegistry,
    config: &ServiceConfig,
) -> reqwest::Result<()> {
    registry.register(Arc::new(WebSearchAdapter::new(config)?));
    registry.register(Arc::new(WebScrapeAdapter::new(config)?));
    registry.register(Arc::new(ShellAdapter::new(config)?));
    registry.register(Arc::new(FileAdapter::new(config)?));
    registry.register(Arc::new(EmailAdapter::new(config)?));
    registry.register(Arc::new(CrmAdapter::new()));
    registry.register(Arc::new(CalendarAdapter::new()));
    registry.register(Arc::new(DatabaseAdapter::new()));
    registry.register(Arc::new(EcommerceAdapter::new()));
    registry.register(Arc::new(NotificationAdapter::new()));
    registry.register(Arc::new(SocialAdapter::new()));
    Ok(())
}
