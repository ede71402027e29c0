// crates/wayfarer-server/src/config/env.rs
// Environment-based credentials - single source of truth for all env vars

use crate::error::{AdapterError, Result};
use tracing::debug;

/// Read a single variable from the environment, filtering empty values
fn read_key(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|k| !k.trim().is_empty())
}

fn missing(names: &str, adapter: &str) -> AdapterError {
    AdapterError::Config(format!(
        "{names} environment variable is required for the {adapter} adapter"
    ))
}

/// Stripe credentials (STRIPE_SECRET_KEY)
#[derive(Clone)]
pub struct PaymentsCredentials {
    pub secret_key: String,
}

impl PaymentsCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(read_key)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let secret_key =
            lookup("STRIPE_SECRET_KEY").ok_or_else(|| missing("STRIPE_SECRET_KEY", "payments"))?;
        debug!("Payments credentials loaded");
        Ok(Self { secret_key })
    }
}

/// Supabase credentials (SUPABASE_URL plus a service-role or anon key)
#[derive(Clone)]
pub struct StoreCredentials {
    pub url: String,
    pub key: String,
}

impl StoreCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(read_key)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("SUPABASE_URL").ok_or_else(|| missing("SUPABASE_URL", "store"))?;
        let key = lookup("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|| lookup("SUPABASE_ANON_KEY"))
            .ok_or_else(|| missing("SUPABASE_SERVICE_ROLE_KEY (or SUPABASE_ANON_KEY)", "store"))?;
        debug!(url = %url, "Store credentials loaded");
        Ok(Self { url, key })
    }
}

/// Notion credentials (NOTION_API_KEY or NOTION_TOKEN)
#[derive(Clone)]
pub struct ContentCredentials {
    pub token: String,
}

impl ContentCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(read_key)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let token = lookup("NOTION_API_KEY")
            .or_else(|| lookup("NOTION_TOKEN"))
            .ok_or_else(|| missing("NOTION_API_KEY (or NOTION_TOKEN)", "content"))?;
        debug!("Content credentials loaded");
        Ok(Self { token })
    }
}

// Keys are never printed
impl std::fmt::Debug for PaymentsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsCredentials").finish_non_exhaustive()
    }
}

impl std::fmt::Debug for StoreCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCredentials")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for ContentCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCredentials").finish_non_exhaustive()
    }
}
