// crates/wayfarer-server/src/adapters/browser/chromium.rs
// Chromium driver over the DevTools protocol

use super::driver::{BrowserDriver, LaunchOptions, PageInfo, PageSession};
use crate::error::{AdapterError, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Poll interval while waiting for an element
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Default, Clone, Copy)]
pub struct ChromiumDriver;

pub struct ChromiumSession {
    browser: Browser,
    context_id: BrowserContextId,
    page: Page,
    handler: JoinHandle<()>,
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    type Session = ChromiumSession;

    async fn launch(&self, options: &LaunchOptions) -> Result<ChromiumSession> {
        let mut builder = BrowserConfig::builder().window_size(options.width, options.height);
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| AdapterError::Other(format!("invalid browser configuration: {e}")))?;

        let (browser, mut events) = Browser::launch(config).await?;

        // The CDP connection only makes progress while its event stream is polled
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP event loop stopped");
                    break;
                }
            }
        });

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(AdapterError::Other)?;
        let page = browser.new_page(target).await?;

        info!(headless = options.headless, "Chromium launched");

        Ok(ChromiumSession {
            browser,
            context_id,
            page,
            handler,
        })
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<PageInfo> {
        self.page.goto(url).await?;
        let title = self.page.get_title().await?;
        let url = self.page.url().await?.unwrap_or_else(|| url.to_string());
        Ok(PageInfo { url, title })
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let element = self.page.find_element(selector).await?;
        element.click().await?;
        element
            .call_js_fn("function() { this.value = ''; }", false)
            .await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        let element = self.page.find_element(selector).await?;
        Ok(element.inner_text().await?.unwrap_or_default())
    }

    async fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(full_page)
            .build();
        Ok(self.page.screenshot(params).await?)
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let page = &self.page;
        let found = tokio::time::timeout(timeout, async {
            loop {
                if page.find_element(selector).await.is_ok() {
                    return;
                }
                tokio::time::sleep(WAIT_POLL_INTERVAL).await;
            }
        })
        .await;

        found.map_err(|_| {
            AdapterError::Timeout(format!(
                "element '{selector}' did not appear within {} ms",
                timeout.as_millis()
            ))
        })
    }

    async fn evaluate(&mut self, script: &str) -> Result<Value> {
        let result = self.page.evaluate(script).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn close(self) -> Result<()> {
        let ChromiumSession {
            mut browser,
            context_id,
            page,
            handler,
        } = self;

        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close page");
        }
        if let Err(e) = browser
            .execute(DisposeBrowserContextParams::new(context_id))
            .await
        {
            warn!(error = %e, "Failed to dispose browsing context");
        }

        let closed = browser.close().await;
        let _ = browser.wait().await;
        handler.abort();

        closed?;
        info!("Chromium closed");
        Ok(())
    }
}
