// src/browser/chrome.rs
// =============================================================================
// Headless Chrome through chromiumoxide.
//
// One browser process per crawl. Every evaluate/render call opens its own
// page (its own JavaScript context) and closes it afterwards, so a script
// that hangs or throws in one call leaves nothing behind for the next.
// Each call is bounded by the per-request timeout.
// =============================================================================

use super::{call_expression, EvalError, ScriptEngine};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub timeout: Duration,
    pub proxy: Option<Url>,
    pub user_agent: Option<String>,
}

pub struct ChromeEngine {
    browser: Browser,
    timeout: Duration,
    // Drives the DevTools websocket; aborted when the engine is dropped
    handler_task: JoinHandle<()>,
}

impl ChromeEngine {
    pub async fn launch(options: &ChromeOptions) -> Result<Self, EvalError> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(options.timeout)
            .arg("--ignore-certificate-errors")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");

        if let Some(proxy) = &options.proxy {
            builder = builder.arg(format!("--proxy-server={proxy}"));
        }
        if let Some(agent) = &options.user_agent {
            builder = builder.arg(format!("--user-agent={agent}"));
        }

        let config = builder.build().map_err(EvalError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EvalError::Browser(format!("failed to launch Chrome: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!("browser handler error: {e}");
                }
            }
            debug!("browser handler finished");
        });

        Ok(Self {
            browser,
            timeout: options.timeout,
            handler_task,
        })
    }

    // Runs `work` on a fresh page, closing the page whatever the outcome
    async fn with_page<T, F, Fut>(&self, url: &str, work: F) -> Result<T, EvalError>
    where
        F: FnOnce(Page) -> Fut,
        Fut: Future<Output = Result<T, EvalError>>,
    {
        let page = tokio::time::timeout(self.timeout, self.browser.new_page(url))
            .await
            .map_err(|_| EvalError::Timeout)?
            .map_err(|e| EvalError::Browser(e.to_string()))?;

        let result = tokio::time::timeout(self.timeout, work(page.clone()))
            .await
            .unwrap_or(Err(EvalError::Timeout));

        if let Err(e) = page.close().await {
            debug!("failed to close page: {e}");
        }
        result
    }
}

impl ScriptEngine for ChromeEngine {
    async fn evaluate(&self, function: &str, argument: &str) -> Result<Option<String>, EvalError> {
        let expression = call_expression(function, argument);

        self.with_page("about:blank", |page| async move {
            let evaluated = page
                .evaluate(expression.as_str())
                .await
                .map_err(|e| EvalError::Browser(e.to_string()))?;

            Ok(match evaluated.value() {
                None | Some(serde_json::Value::Null) => None,
                Some(serde_json::Value::String(text)) => Some(text.clone()),
                Some(other) => Some(other.to_string()),
            })
        })
        .await
    }

    async fn render(&self, url: &str) -> Result<String, EvalError> {
        self.with_page(url, |page| async move {
            page.wait_for_navigation()
                .await
                .map_err(|e| EvalError::Browser(e.to_string()))?;
            page.content()
                .await
                .map_err(|e| EvalError::Browser(e.to_string()))
        })
        .await
    }
}

impl Drop for ChromeEngine {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
