use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use catalog_logging::{catalog_debug, catalog_warn};
use tokio::sync::{Mutex, MutexGuard};
use url::Url;

use crate::controller::{Control, ControllerError, Locator, PageController};
use crate::decode::{decode_body, is_json_content_type};
use crate::document::ParsedDocument;
use crate::fetch::Fetcher;
use crate::{FailureKind, FetchError, HarvestError};

/// Lower bound for every settle or pause delay.
pub const MIN_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// "Get a parsed document for a URL", whichever way the page is obtained.
#[async_trait::async_trait]
pub trait ContentResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<ParsedDocument, HarvestError>;
}

/// Plain HTTP GET, body parsed as JSON or HTML.
#[derive(Clone)]
pub struct StaticResolver {
    fetcher: Arc<dyn Fetcher>,
}

impl StaticResolver {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait::async_trait]
impl ContentResolver for StaticResolver {
    async fn resolve(&self, url: &str) -> Result<ParsedDocument, HarvestError> {
        let requested = Url::parse(url).map_err(|err| {
            HarvestError::fetch(url, FetchError::new(FailureKind::InvalidUrl, err.to_string()))
        })?;
        let output = self
            .fetcher
            .get(url)
            .await
            .map_err(|source| HarvestError::fetch(url, source))?;

        let final_url = Url::parse(&output.metadata.final_url).unwrap_or(requested);
        let content_type = output.metadata.content_type.as_deref();
        let decoded =
            decode_body(&output.bytes, content_type).map_err(|err| HarvestError::parse(url, err.to_string()))?;

        let wants_json = content_type.is_some_and(is_json_content_type)
            || final_url.path().ends_with(".json");
        if wants_json {
            let value = serde_json::from_str(&decoded.text)
                .map_err(|err| HarvestError::parse(url, format!("invalid json: {err}")))?;
            return Ok(ParsedDocument::json(final_url, value));
        }

        catalog_debug!(
            "Fetched {} ({} bytes, {})",
            final_url,
            output.metadata.byte_len,
            decoded.encoding_label
        );
        Ok(ParsedDocument::html(final_url, decoded.text))
    }
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// Wait after a navigation before reading the page.
    pub navigation_settle: Duration,
    /// Wait after activating a control (pagination link, size label).
    pub interaction_settle: Duration,
    /// Pause after each scroll.
    pub scroll_pause: Duration,
    /// Scroll-to-bottom passes after a page loads, to trigger lazy content.
    pub scroll_passes: u32,
    /// Upper bound for any single controller call.
    pub action_timeout: Duration,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            navigation_settle: Duration::from_secs(5),
            interaction_settle: Duration::from_secs(3),
            scroll_pause: Duration::from_secs(2),
            scroll_passes: 3,
            action_timeout: Duration::from_secs(30),
        }
    }
}

impl RenderSettings {
    /// Copy with every delay raised to at least [`MIN_SETTLE_DELAY`].
    pub fn clamped(&self) -> Self {
        Self {
            navigation_settle: self.navigation_settle.max(MIN_SETTLE_DELAY),
            interaction_settle: self.interaction_settle.max(MIN_SETTLE_DELAY),
            scroll_pause: self.scroll_pause.max(MIN_SETTLE_DELAY),
            scroll_passes: self.scroll_passes,
            action_timeout: self.action_timeout.max(MIN_SETTLE_DELAY),
        }
    }
}

/// A page controller session owned by one harvest.
pub struct RenderSession {
    controller: Mutex<Box<dyn PageController>>,
    settings: RenderSettings,
}

impl RenderSession {
    pub fn new(controller: Box<dyn PageController>, settings: RenderSettings) -> Self {
        Self {
            controller: Mutex::new(controller),
            settings: settings.clamped(),
        }
    }

    /// Exclusive access to the tab for a sequence of interactions.
    pub async fn page(&self) -> RenderPage<'_> {
        RenderPage {
            controller: self.controller.lock().await,
            settings: &self.settings,
        }
    }

    /// Release the underlying session. Errors are logged, not returned: the
    /// harvest result does not depend on a clean shutdown.
    pub async fn close(self) {
        let limit = self.settings.action_timeout;
        let mut controller = self.controller.into_inner();
        if let Err(err) = bounded(limit, controller.close()).await {
            catalog_warn!("Page controller did not close cleanly: {}", err);
        }
    }
}

#[async_trait::async_trait]
impl ContentResolver for RenderSession {
    async fn resolve(&self, url: &str) -> Result<ParsedDocument, HarvestError> {
        let mut page = self.page().await;
        page.open(url).await.map_err(|err| HarvestError::render(url, err))?;
        page.document().await.map_err(|err| HarvestError::render(url, err))
    }
}

/// Locked view of the session. Every controller call is bounded by
/// `action_timeout`.
pub struct RenderPage<'a> {
    controller: MutexGuard<'a, Box<dyn PageController>>,
    settings: &'a RenderSettings,
}

impl RenderPage<'_> {
    /// Navigate, settle, then scroll to trigger lazy loading.
    pub async fn open(&mut self, url: &str) -> Result<(), ControllerError> {
        let limit = self.settings.action_timeout;
        bounded(limit, self.controller.navigate(url)).await?;
        tokio::time::sleep(self.settings.navigation_settle).await;
        self.lazy_scroll().await
    }

    pub async fn lazy_scroll(&mut self) -> Result<(), ControllerError> {
        let limit = self.settings.action_timeout;
        for _ in 0..self.settings.scroll_passes {
            bounded(limit, self.controller.scroll_to_bottom()).await?;
            tokio::time::sleep(self.settings.scroll_pause).await;
        }
        Ok(())
    }

    pub async fn document(&mut self) -> Result<ParsedDocument, ControllerError> {
        let limit = self.settings.action_timeout;
        let current = bounded(limit, self.controller.current_url()).await?;
        let url = Url::parse(&current)
            .map_err(|err| ControllerError::Navigation(format!("bad current url {current}: {err}")))?;
        let html = bounded(limit, self.controller.current_html()).await?;
        Ok(ParsedDocument::html(url, html))
    }

    /// Text of the first element matching `css` in the live DOM.
    pub async fn read_text(&mut self, css: &str) -> Result<Option<String>, ControllerError> {
        Ok(self.document().await?.select_text(css))
    }

    /// `NotFound` from the backend is folded into `Ok(None)`.
    pub async fn find_control(&mut self, locator: &Locator) -> Result<Option<Control>, ControllerError> {
        let limit = self.settings.action_timeout;
        match bounded(limit, self.controller.find_control(locator)).await {
            Err(ControllerError::NotFound(_)) => Ok(None),
            other => other,
        }
    }

    /// `NotFound` from the backend is folded into an empty list.
    pub async fn find_controls(&mut self, locator: &Locator) -> Result<Vec<Control>, ControllerError> {
        let limit = self.settings.action_timeout;
        match bounded(limit, self.controller.find_controls(locator)).await {
            Err(ControllerError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Scroll the control into view, activate it and wait for the page to
    /// settle.
    pub async fn click(&mut self, control: &Control) -> Result<(), ControllerError> {
        let limit = self.settings.action_timeout;
        bounded(limit, self.controller.scroll_into_view(control)).await?;
        tokio::time::sleep(self.settings.scroll_pause).await;
        bounded(limit, self.controller.activate(control)).await?;
        tokio::time::sleep(self.settings.interaction_settle).await;
        Ok(())
    }
}

async fn bounded<T>(
    limit: Duration,
    action: impl Future<Output = Result<T, ControllerError>>,
) -> Result<T, ControllerError> {
    tokio::time::timeout(limit, action)
        .await
        .map_err(|_| ControllerError::Timeout(limit))?
}
