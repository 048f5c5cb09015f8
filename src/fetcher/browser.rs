//! Rendered acquisition through a shared headless browser.
//!
//! The browser handle is process-local and lazily launched; concurrent
//! handlers open independent pages from it. Navigation uses a bounded
//! settle wait rather than event-driven quiescence.

use super::{FetchError, FetchedPage};
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use reqwest::header::HeaderMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Extra wait after navigation so late script mutations land
const SETTLE_WAIT: Duration = Duration::from_secs(2);

pub struct BrowserFetcher {
    browser: Mutex<Option<Browser>>,
    handler_task: Mutex<Option<JoinHandle<()>>>,
    navigation_timeout: Duration,
}

impl BrowserFetcher {
    pub fn new(navigation_timeout: Duration) -> Self {
        Self {
            browser: Mutex::new(None),
            handler_task: Mutex::new(None),
            navigation_timeout,
        }
    }

    /// Fetch a URL by rendering it. A status >= 400 here is terminal.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let start_time = Instant::now();
        let page = self.new_page().await?;

        let deadline = self.navigation_timeout + SETTLE_WAIT;
        let result = tokio::time::timeout(deadline, async {
            page.goto(url)
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            let response = page
                .wait_for_navigation_response()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            let status_code = response
                .as_ref()
                .and_then(|req| req.response.as_ref())
                .map(|resp| resp.status as u16)
                .unwrap_or(200);

            if status_code >= 400 {
                return Err(FetchError::Http {
                    status: status_code,
                    url: url.to_string(),
                });
            }

            tokio::time::sleep(SETTLE_WAIT).await;

            let body = page
                .content()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            Ok((status_code, body))
        })
        .await;

        // Close the tab regardless of outcome
        if let Err(e) = page.close().await {
            debug!("Failed to close rendered page for {}: {}", url, e);
        }

        let (status_code, body) = match result {
            Ok(inner) => inner?,
            Err(_) => return Err(FetchError::Timeout(url.to_string())),
        };

        let fetch_time_ms = start_time.elapsed().as_millis() as u64;
        info!("Rendered {} ({} bytes, {} ms)", url, body.len(), fetch_time_ms);

        Ok(FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            body,
            content_type: "text/html".to_string(),
            status_code,
            last_modified: None,
            headers: HeaderMap::new(),
            fetch_time_ms,
            rendered: true,
        })
    }

    async fn new_page(&self) -> Result<chromiumoxide::Page, FetchError> {
        let mut guard = self.browser.lock().await;

        if guard.is_none() {
            debug!("Launching headless browser");
            let config = BrowserConfig::builder()
                // Skip image/font/media subresources to keep renders cheap
                .args(vec![
                    "--blink-settings=imagesEnabled=false",
                    "--disable-remote-fonts",
                    "--mute-audio",
                    "--disable-gpu",
                ])
                .request_timeout(self.navigation_timeout)
                .build()
                .map_err(FetchError::Browser)?;

            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;

            let task = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            *self.handler_task.lock().await = Some(task);
            *guard = Some(browser);
        }

        let browser = guard.as_ref().expect("browser just initialized");
        browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    /// Close the browser if it was launched
    pub async fn shutdown(&self) {
        let mut guard = self.browser.lock().await;
        if let Some(mut browser) = guard.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close headless browser: {}", e);
            }
            let _ = browser.wait().await;
        }

        if let Some(task) = self.handler_task.lock().await.take() {
            task.abort();
        }
    }
}
