// crates/wayfarer-server/src/adapters/mod.rs
// Backend adapters and their construction from environment and config

pub mod browser;
pub mod content;
pub mod context;
pub mod payments;
pub mod store;

pub use browser::{BrowserAdapter, BrowserOp};
pub use content::{ContentAdapter, ContentOp};
pub use context::{ContextAdapter, ContextOp};
pub use payments::{PaymentsAdapter, PaymentsOp};
pub use store::{StoreAdapter, StoreOp};

use crate::catalogue::Catalogue;
use crate::config::{ContentCredentials, PaymentsCredentials, StoreCredentials, WayfarerConfig};
use crate::error::Result;
use crate::http::create_shared_client;
use strum::{AsRefStr, EnumIter};

/// Which backend a process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter, clap::ValueEnum)]
#[strum(serialize_all = "snake_case")]
pub enum AdapterKind {
    /// Stripe payments
    Payments,
    /// Supabase tables and users
    Store,
    /// Notion pages and databases
    Content,
    /// Chromium automation
    Browser,
    /// Shared JSON context document
    Context,
}

impl AdapterKind {
    pub fn catalogue(self) -> Catalogue {
        match self {
            AdapterKind::Payments => Catalogue::of::<PaymentsOp>(),
            AdapterKind::Store => Catalogue::of::<StoreOp>(),
            AdapterKind::Content => Catalogue::of::<ContentOp>(),
            AdapterKind::Browser => Catalogue::of::<BrowserOp>(),
            AdapterKind::Context => Catalogue::of::<ContextOp>(),
        }
    }
}

pub fn payments(config: &WayfarerConfig) -> Result<PaymentsAdapter> {
    let credentials = PaymentsCredentials::from_env()?;
    PaymentsAdapter::from_credentials(&credentials, create_shared_client(config.http.timeout()))
}

pub fn store(config: &WayfarerConfig) -> Result<StoreAdapter> {
    let credentials = StoreCredentials::from_env()?;
    StoreAdapter::from_credentials(&credentials, create_shared_client(config.http.timeout()))
}

pub fn content(config: &WayfarerConfig) -> Result<ContentAdapter> {
    let credentials = ContentCredentials::from_env()?;
    ContentAdapter::from_credentials(&credentials, create_shared_client(config.http.timeout()))
}

pub fn browser(config: &WayfarerConfig) -> BrowserAdapter {
    BrowserAdapter::chromium(config.browser.clone())
}

pub async fn context(config: &WayfarerConfig) -> Result<ContextAdapter> {
    ContextAdapter::open(config.context.path.clone()).await
}
