// crates/wayfarer-server/src/adapters/browser/driver.rs
// Driver seam between the browser adapter and the automation engine

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

/// Options for starting a browser
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchOptions {
    pub headless: bool,
    pub width: u32,
    pub height: u32,
    pub executable: Option<PathBuf>,
}

/// Result of a navigation
#[derive(Debug, Clone, PartialEq)]
pub struct PageInfo {
    pub url: String,
    pub title: Option<String>,
}

/// Starts browser sessions
#[async_trait]
pub trait BrowserDriver: Send + Sync + 'static {
    type Session: PageSession;

    /// Start a browser with one isolated browsing context and one page
    async fn launch(&self, options: &LaunchOptions) -> Result<Self::Session>;
}

/// One live browser → browsing context → page chain
#[async_trait]
pub trait PageSession: Send + 'static {
    async fn navigate(&mut self, url: &str) -> Result<PageInfo>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Replace the element's current value with `value`
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Rendered text of the first matching element
    async fn text(&mut self, selector: &str) -> Result<String>;

    /// PNG bytes of the viewport, or of the whole page
    async fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>>;

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    async fn evaluate(&mut self, script: &str) -> Result<Value>;

    /// Release page, context and browser, innermost first
    async fn close(self) -> Result<()>;
}
