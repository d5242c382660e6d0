//! Headless Chromium over the DevTools protocol.
//!
//! Every [`ChromiumBackend::launch`] starts its own browser process with a
//! throwaway profile directory, so concurrent conversions never share a
//! browser, a profile lock or a page. The DevTools event handler runs on a
//! Tokio task for the lifetime of the session and is torn down in
//! [`BackendSession::close`].

use super::{BackendSession, PrintSettings, RenderBackend};
use crate::error::Md2PdfError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// Default page-load timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Launches a fresh headless Chromium for each conversion.
#[derive(Debug, Clone)]
pub struct ChromiumBackend {
    executable: Option<PathBuf>,
    timeout: Duration,
    sandbox: bool,
}

impl Default for ChromiumBackend {
    fn default() -> Self {
        Self {
            executable: std::env::var_os("CHROME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            timeout: DEFAULT_TIMEOUT,
            sandbox: true,
        }
    }
}

impl ChromiumBackend {
    /// Backend using `CHROME` from the environment, or auto-detection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this Chrome/Chromium executable instead of searching for one.
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// How long to wait for the page to load.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run Chromium with `--no-sandbox` (needed as root in most containers).
    pub fn no_sandbox(mut self, v: bool) -> Self {
        self.sandbox = !v;
        self
    }
}

#[async_trait]
impl RenderBackend for ChromiumBackend {
    async fn launch(&self) -> Result<Box<dyn BackendSession>, Md2PdfError> {
        let profile = tempfile::Builder::new()
            .prefix("md2pdf-chromium-")
            .tempdir()
            .map_err(|e| Md2PdfError::BackendLaunch(format!("profile directory: {e}")))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .request_timeout(self.timeout)
            .launch_timeout(self.timeout);
        if let Some(ref exe) = self.executable {
            builder = builder.chrome_executable(exe);
        }
        if !self.sandbox {
            builder = builder.no_sandbox();
        }
        let config = builder.build().map_err(Md2PdfError::BackendLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Md2PdfError::BackendLaunch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("DevTools handler: {e}");
                }
            }
        });

        debug!("Chromium launched (profile {})", profile.path().display());
        Ok(Box::new(ChromiumSession {
            browser,
            handler_task,
            page: None,
            timeout: self.timeout,
            _profile: profile,
        }))
    }
}

struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Option<Page>,
    timeout: Duration,
    // Removed on drop, after the browser has exited.
    _profile: tempfile::TempDir,
}

#[async_trait]
impl BackendSession for ChromiumSession {
    async fn open(&mut self, url: &Url) -> Result<(), Md2PdfError> {
        let navigation_error = |detail: String| Md2PdfError::Navigation {
            url: url.to_string(),
            detail,
        };

        let load = async {
            let page = self.browser.new_page(url.as_str()).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(page)
        };

        let page = tokio::time::timeout(self.timeout, load)
            .await
            .map_err(|_| navigation_error(format!("timed out after {}s", self.timeout.as_secs())))?
            .map_err(|e| navigation_error(e.to_string()))?;

        debug!("Loaded {url}");
        self.page = Some(page);
        Ok(())
    }

    async fn export(&mut self, settings: &PrintSettings) -> Result<Vec<u8>, Md2PdfError> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| Md2PdfError::Export("no page has been opened".into()))?;

        let [top, right, bottom, left] = settings.margins;
        let params = PrintToPdfParams {
            landscape: Some(settings.landscape),
            display_header_footer: Some(settings.display_header_footer),
            print_background: Some(settings.print_background),
            scale: Some(settings.scale),
            paper_width: Some(settings.paper_width),
            paper_height: Some(settings.paper_height),
            margin_top: Some(top),
            margin_right: Some(right),
            margin_bottom: Some(bottom),
            margin_left: Some(left),
            header_template: Some(settings.header_template.clone()),
            footer_template: Some(settings.footer_template.clone()),
            ..PrintToPdfParams::default()
        };

        let bytes = page
            .pdf(params)
            .await
            .map_err(|e| Md2PdfError::Export(e.to_string()))?;
        if bytes.is_empty() {
            return Err(Md2PdfError::Export("backend returned an empty document".into()));
        }
        debug!("Exported {} bytes of PDF", bytes.len());
        Ok(bytes)
    }

    async fn close(mut self: Box<Self>) -> Result<(), Md2PdfError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Closing page: {e}");
            }
        }

        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!("Chromium did not exit cleanly: {e}");
        }
        self.handler_task.abort();

        closed
            .map(|_| ())
            .map_err(|e| Md2PdfError::Internal(format!("closing Chromium: {e}")))
    }
}
