// crates/wayfarer-server/src/adapters/browser/mod.rs
// Browser-automation adapter: one Chromium session behind a strict state machine

mod chromium;
mod driver;

pub use chromium::{ChromiumDriver, ChromiumSession};
pub use driver::{BrowserDriver, LaunchOptions, PageInfo, PageSession};

use crate::args::Arguments;
use crate::catalogue::Operation;
use crate::config::BrowserSettings;
use crate::dispatch::{Adapter, Output};
use crate::error::{AdapterError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::time::Duration;
use strum::{AsRefStr, EnumIter, EnumString};
use tracing::{info, warn};
use wayfarer_types::{FieldSpec, FieldType};

pub const ALREADY_LAUNCHED: &str = "Browser already launched";
pub const NO_INSTANCE: &str = "No browser instance found";
pub const NO_SESSION: &str = "No active browser session. Call launch first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum BrowserOp {
    Launch,
    Close,
    Navigate,
    Click,
    Fill,
    GetText,
    Screenshot,
    WaitForElement,
    Evaluate,
    AssertText,
}

impl Operation for BrowserOp {
    fn description(self) -> &'static str {
        match self {
            BrowserOp::Launch => "Launch a Chromium browser with a fresh browsing context and page.",
            BrowserOp::Close => "Close the browser and release its context and page.",
            BrowserOp::Navigate => "Navigate the page to a URL.",
            BrowserOp::Click => "Click the first element matching a CSS selector.",
            BrowserOp::Fill => "Replace the value of an input matching a CSS selector.",
            BrowserOp::GetText => "Read the rendered text of an element.",
            BrowserOp::Screenshot => {
                "Capture a PNG screenshot. Saved to `path` when given, otherwise returned as an image."
            }
            BrowserOp::WaitForElement => "Wait until an element matching a CSS selector is present.",
            BrowserOp::Evaluate => "Evaluate a JavaScript expression in the page and return its value.",
            BrowserOp::AssertText => "Fail unless an element's text equals the expected string.",
        }
    }

    fn input_shape(self) -> Vec<FieldSpec> {
        use FieldType::*;
        let selector = || FieldSpec::required("selector", String, "CSS selector");
        match self {
            BrowserOp::Launch => vec![
                FieldSpec::optional("headless", Boolean, "Run without a visible window (default true)"),
                FieldSpec::optional("width", Integer, "Viewport width in pixels"),
                FieldSpec::optional("height", Integer, "Viewport height in pixels"),
            ],
            BrowserOp::Close => vec![],
            BrowserOp::Navigate => vec![FieldSpec::required("url", String, "URL to open")],
            BrowserOp::Click | BrowserOp::GetText => vec![selector()],
            BrowserOp::Fill => vec![
                selector(),
                FieldSpec::required("value", String, "Text to enter"),
            ],
            BrowserOp::Screenshot => vec![
                FieldSpec::optional("path", String, "File to write the PNG to"),
                FieldSpec::optional("full_page", Boolean, "Capture the full scrollable page"),
            ],
            BrowserOp::WaitForElement => vec![
                selector(),
                FieldSpec::optional("timeout", Integer, "Timeout in milliseconds (default 30000)"),
            ],
            BrowserOp::Evaluate => vec![FieldSpec::required("script", String, "JavaScript expression")],
            BrowserOp::AssertText => vec![
                selector(),
                FieldSpec::required("expected", String, "Expected text"),
            ],
        }
    }
}

/// Session lifecycle: at most one open session at a time
#[derive(Debug)]
pub enum SessionState<S> {
    Closed,
    Open(S),
}

impl<S> Default for SessionState<S> {
    fn default() -> Self {
        SessionState::Closed
    }
}

impl<S> SessionState<S> {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionState::Open(_))
    }
}

pub struct BrowserAdapter<D: BrowserDriver = ChromiumDriver> {
    driver: D,
    settings: BrowserSettings,
    state: SessionState<D::Session>,
}

impl BrowserAdapter<ChromiumDriver> {
    pub fn chromium(settings: BrowserSettings) -> Self {
        Self::new(ChromiumDriver, settings)
    }
}

impl<D: BrowserDriver> BrowserAdapter<D> {
    pub fn new(driver: D, settings: BrowserSettings) -> Self {
        Self {
            driver,
            settings,
            state: SessionState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    fn page(&mut self) -> Result<&mut D::Session> {
        match &mut self.state {
            SessionState::Open(session) => Ok(session),
            SessionState::Closed => Err(AdapterError::Precondition(NO_SESSION.to_string())),
        }
    }

    fn launch_options(&self, args: &Arguments) -> Result<LaunchOptions> {
        Ok(LaunchOptions {
            headless: args.opt_bool("headless")?.unwrap_or(self.settings.headless),
            width: dimension(args, "width")?.unwrap_or(self.settings.width),
            height: dimension(args, "height")?.unwrap_or(self.settings.height),
            executable: self.settings.executable.clone(),
        })
    }

    async fn launch(&mut self, args: &Arguments) -> Result<Output> {
        if self.state.is_open() {
            return Err(AdapterError::Precondition(ALREADY_LAUNCHED.to_string()));
        }
        let options = self.launch_options(args)?;
        let session = self.driver.launch(&options).await?;
        self.state = SessionState::Open(session);
        Ok(Output::Text(format!(
            "Browser launched ({}, {}x{})",
            if options.headless { "headless" } else { "headed" },
            options.width,
            options.height
        )))
    }

    async fn close(&mut self) -> Result<Output> {
        match std::mem::take(&mut self.state) {
            SessionState::Open(session) => {
                session.close().await?;
                Ok(Output::text("Browser closed"))
            }
            SessionState::Closed => Err(AdapterError::Precondition(NO_INSTANCE.to_string())),
        }
    }

    async fn screenshot(&mut self, args: &Arguments) -> Result<Output> {
        let full_page = args.opt_bool("full_page")?.unwrap_or(false);
        let path = args.opt_str("path")?.map(str::to_string);
        let png = self.page()?.screenshot(full_page).await?;

        match path {
            Some(path) => {
                tokio::fs::write(&path, &png).await?;
                Ok(Output::Text(format!("Screenshot saved to {path}")))
            }
            None => Ok(Output::Image {
                data: STANDARD.encode(&png),
                mime_type: "image/png".to_string(),
            }),
        }
    }

    async fn wait_for_element(&mut self, args: &Arguments) -> Result<Output> {
        let selector = args.str("selector")?;
        let timeout = match args.opt_i64("timeout")? {
            Some(ms) if ms < 0 => {
                return Err(AdapterError::invalid_arguments(
                    args.operation(),
                    "`timeout` must not be negative",
                ));
            }
            Some(ms) => Duration::from_millis(ms as u64),
            None => self.settings.default_timeout(),
        };
        self.page()?.wait_for(selector, timeout).await?;
        Ok(Output::Text(format!("Element '{selector}' is present")))
    }

    async fn assert_text(&mut self, args: &Arguments) -> Result<Output> {
        let selector = args.str("selector")?;
        let expected = args.str("expected")?;
        let actual = self.page()?.text(selector).await?;
        if actual.trim() != expected.trim() {
            return Err(AdapterError::AssertionFailed {
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(Output::Text(format!("Text matches: \"{expected}\"")))
    }
}

fn dimension(args: &Arguments, key: &str) -> Result<Option<u32>> {
    match args.opt_i64(key)? {
        None => Ok(None),
        Some(v) => u32::try_from(v)
            .ok()
            .filter(|v| *v > 0)
            .map(Some)
            .ok_or_else(|| {
                AdapterError::invalid_arguments(args.operation(), format!("`{key}` must be a positive integer"))
            }),
    }
}

#[async_trait]
impl<D: BrowserDriver> Adapter for BrowserAdapter<D> {
    type Op = BrowserOp;

    fn name(&self) -> &'static str {
        "browser"
    }

    async fn invoke(&mut self, op: BrowserOp, args: &Arguments) -> Result<Output> {
        match op {
            BrowserOp::Launch => self.launch(args).await,
            BrowserOp::Close => self.close().await,
            BrowserOp::Navigate => {
                let info = self.page()?.navigate(args.str("url")?).await?;
                Ok(Output::Text(match info.title {
                    Some(title) if !title.is_empty() => format!("Navigated to {} ({title})", info.url),
                    _ => format!("Navigated to {}", info.url),
                }))
            }
            BrowserOp::Click => {
                let selector = args.str("selector")?;
                self.page()?.click(selector).await?;
                Ok(Output::Text(format!("Clicked '{selector}'")))
            }
            BrowserOp::Fill => {
                let selector = args.str("selector")?;
                self.page()?.fill(selector, args.str("value")?).await?;
                Ok(Output::Text(format!("Filled '{selector}'")))
            }
            BrowserOp::GetText => {
                let text = self.page()?.text(args.str("selector")?).await?;
                Ok(Output::Text(text))
            }
            BrowserOp::Screenshot => self.screenshot(args).await,
            BrowserOp::WaitForElement => self.wait_for_element(args).await,
            BrowserOp::Evaluate => {
                let value = self.page()?.evaluate(args.str("script")?).await?;
                Ok(Output::Json(value))
            }
            BrowserOp::AssertText => self.assert_text(args).await,
        }
    }

    /// Forced close regardless of state; failures are only logged
    async fn shutdown(&mut self) {
        if let SessionState::Open(session) = std::mem::take(&mut self.state) {
            match session.close().await {
                Ok(()) => info!("Browser session closed on shutdown"),
                Err(e) => warn!(error = %e, "Failed to close browser session on shutdown"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    struct StubDriver {
        log: Log,
    }

    struct StubSession {
        log: Log,
    }

    #[async_trait]
    impl BrowserDriver for StubDriver {
        type Session = StubSession;

        async fn launch(&self, options: &LaunchOptions) -> Result<StubSession> {
            self.log.lock().unwrap().push(format!("launch {}x{}", options.width, options.height));
            Ok(StubSession { log: self.log.clone() })
        }
    }

    #[async_trait]
    impl PageSession for StubSession {
        async fn navigate(&mut self, url: &str) -> Result<PageInfo> {
            Ok(PageInfo { url: url.to_string(), title: None })
        }
        async fn click(&mut self, _selector: &str) -> Result<()> {
            Ok(())
        }
        async fn fill(&mut self, _selector: &str, _value: &str) -> Result<()> {
            Ok(())
        }
        async fn text(&mut self, _selector: &str) -> Result<String> {
            Ok("  Tuscany Cooking Retreat\n".to_string())
        }
        async fn screenshot(&mut self, _full_page: bool) -> Result<Vec<u8>> {
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
        async fn wait_for(&mut self, _selector: &str, _timeout: Duration) -> Result<()> {
            Ok(())
        }
        async fn evaluate(&mut self, _script: &str) -> Result<Value> {
            Ok(json!(2))
        }
        async fn close(self) -> Result<()> {
            self.log.lock().unwrap().push("close".to_string());
            Ok(())
        }
    }

    fn adapter() -> (BrowserAdapter<StubDriver>, Log) {
        let log = Log::default();
        let driver = StubDriver { log: log.clone() };
        (BrowserAdapter::new(driver, BrowserSettings::default()), log)
    }

    fn args(op: &str, value: Value) -> Arguments {
        Arguments::new(op, value.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn test_launch_uses_settings_then_overrides() {
        let (mut browser, log) = adapter();
        browser
            .invoke(BrowserOp::Launch, &args("launch", json!({"width": 800})))
            .await
            .unwrap();
        assert!(browser.is_open());
        assert_eq!(log.lock().unwrap()[0], "launch 800x720");
    }

    #[tokio::test]
    async fn test_state_machine_errors() {
        let (mut browser, _log) = adapter();
        let err = browser.invoke(BrowserOp::Close, &args("close", json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), NO_INSTANCE);

        browser.invoke(BrowserOp::Launch, &args("launch", json!({}))).await.unwrap();
        let err = browser.invoke(BrowserOp::Launch, &args("launch", json!({}))).await.unwrap_err();
        assert_eq!(err.to_string(), ALREADY_LAUNCHED);
        assert!(browser.is_open(), "failed relaunch must keep the session");
    }

    #[tokio::test]
    async fn test_assert_text_trims_whitespace() {
        let (mut browser, _log) = adapter();
        browser.invoke(BrowserOp::Launch, &args("launch", json!({}))).await.unwrap();
        let ok = browser
            .invoke(
                BrowserOp::AssertText,
                &args("assert_text", json!({"selector": "h1", "expected": "Tuscany Cooking Retreat"})),
            )
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_screenshot_without_path_is_base64_image() {
        let (mut browser, _log) = adapter();
        browser.invoke(BrowserOp::Launch, &args("launch", json!({}))).await.unwrap();
        let output = browser
            .invoke(BrowserOp::Screenshot, &args("screenshot", json!({})))
            .await
            .unwrap();
        assert_eq!(
            output,
            Output::Image {
                data: STANDARD.encode([0x89, b'P', b'N', b'G']),
                mime_type: "image/png".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_session() {
        let (mut browser, log) = adapter();
        browser.shutdown().await;
        assert!(log.lock().unwrap().is_empty());

        browser.invoke(BrowserOp::Launch, &args("launch", json!({}))).await.unwrap();
        browser.shutdown().await;
        assert!(!browser.is_open());
        assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("close"));
    }

    #[test]
    fn test_dimension_rejects_zero() {
        let a = args("launch", json!({"width": 0}));
        assert!(dimension(&a, "width").is_err());
        assert_eq!(dimension(&a, "height").unwrap(), None);
    }
}
