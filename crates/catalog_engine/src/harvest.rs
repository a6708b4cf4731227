//! Harvest orchestration: collections, then product details, under the
//! single-flight guard of a [`StatusBoard`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use catalog_core::{HarvestResult, ProductDetail, ProductStub, StatusBoard, DEFAULT_CURRENCY_SYMBOL};
use catalog_logging::{catalog_error, catalog_info, catalog_warn};
use chrono::{DateTime, Utc};
use url::Url;

use crate::controller::{ControllerError, ControllerLauncher};
use crate::detail::DetailResolver;
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::paginate::{paginate_rendered, paginate_static, PageLimits};
use crate::resolver::{ContentResolver, RenderSession, RenderSettings, StaticResolver};
use crate::HarvestError;

/// Lower bound for the pause between two product fetches.
pub const MIN_POLITENESS_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HarvestMode {
    /// Plain HTTP fetches; prices come from structured data or the page as
    /// served.
    #[default]
    Static,
    /// A page controller session renders pages and drives the size selector.
    Rendered,
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct HarvestConfig {
    pub mode: HarvestMode,
    pub limits: PageLimits,
    pub politeness_delay: Duration,
    pub fetch: FetchSettings,
    pub render: RenderSettings,
    pub currency_symbol: String,
    /// Source of `scraped_at`.
    pub clock: Clock,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            mode: HarvestMode::Static,
            limits: PageLimits::default(),
            politeness_delay: Duration::from_secs(1),
            fetch: FetchSettings::default(),
            render: RenderSettings::default(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for HarvestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarvestConfig")
            .field("mode", &self.mode)
            .field("limits", &self.limits)
            .field("politeness_delay", &self.politeness_delay)
            .field("fetch", &self.fetch)
            .field("render", &self.render)
            .field("currency_symbol", &self.currency_symbol)
            .finish_non_exhaustive()
    }
}

/// Page access chosen once per harvest.
enum Backend {
    Static(StaticResolver),
    Rendered {
        http: StaticResolver,
        session: RenderSession,
    },
}

impl Backend {
    fn http(&self) -> &StaticResolver {
        match self {
            Backend::Static(http) | Backend::Rendered { http, .. } => http,
        }
    }

    fn pages(&self) -> &dyn ContentResolver {
        match self {
            Backend::Static(http) => http,
            Backend::Rendered { session, .. } => session,
        }
    }

    fn session(&self) -> Option<&RenderSession> {
        match self {
            Backend::Static(_) => None,
            Backend::Rendered { session, .. } => Some(session),
        }
    }

    async fn paginate(&self, collection_url: &str, limits: PageLimits) -> Vec<ProductStub> {
        match self {
            Backend::Static(http) => paginate_static(http, collection_url, limits).await,
            Backend::Rendered { session, .. } => paginate_rendered(session, collection_url, limits).await,
        }
    }

    async fn close(self) {
        if let Backend::Rendered { session, .. } = self {
            session.close().await;
        }
    }
}

pub struct Harvester {
    config: HarvestConfig,
    fetcher: Arc<dyn Fetcher>,
    launcher: Option<Arc<dyn ControllerLauncher>>,
    status: StatusBoard,
}

impl Harvester {
    pub fn new(
        config: HarvestConfig,
        fetcher: Arc<dyn Fetcher>,
        launcher: Option<Arc<dyn ControllerLauncher>>,
        status: StatusBoard,
    ) -> Self {
        Self {
            config,
            fetcher,
            launcher,
            status,
        }
    }

    /// Static harvester over a [`ReqwestFetcher`] built from `config.fetch`.
    pub fn with_http(config: HarvestConfig, status: StatusBoard) -> Self {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
        Self::new(config, fetcher, None, status)
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Handle to the shared status record.
    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Run one harvest over `collection_urls`.
    ///
    /// Refused with [`HarvestError::AlreadyRunning`] while another harvest
    /// holds the board. Per-collection and per-product problems never fail
    /// the call; they are logged or recorded on the affected product.
    pub async fn harvest(&self, collection_urls: &[String]) -> Result<HarvestResult, HarvestError> {
        let permit = self.status.try_begin()?;
        match self.run(collection_urls).await {
            Ok(result) => {
                permit.complete(&result);
                Ok(result)
            }
            Err(err) => {
                catalog_error!("Harvest failed: {}", err);
                permit.fail(&err);
                Err(err)
            }
        }
    }

    async fn run(&self, collection_urls: &[String]) -> Result<HarvestResult, HarvestError> {
        validate_collection_urls(collection_urls)?;
        let backend = self.open_backend().await?;
        let products = self.collect(&backend, collection_urls).await;
        backend.close().await;

        let result = HarvestResult::assemble(collection_urls.to_vec(), products, (self.config.clock)());
        catalog_info!(
            "Harvest complete: {} products from {} collections, {} with prices",
            result.total_products,
            result.total_collections,
            result.products_with_prices()
        );
        Ok(result)
    }

    async fn open_backend(&self) -> Result<Backend, HarvestError> {
        let http = StaticResolver::new(Arc::clone(&self.fetcher));
        match self.config.mode {
            HarvestMode::Static => Ok(Backend::Static(http)),
            HarvestMode::Rendered => {
                let launcher = self.launcher.as_ref().ok_or_else(|| {
                    HarvestError::SessionStart(ControllerError::Session(
                        "no page controller launcher configured".to_string(),
                    ))
                })?;
                let controller = launcher.launch().await.map_err(HarvestError::SessionStart)?;
                let session = RenderSession::new(controller, self.config.render.clone());
                Ok(Backend::Rendered { http, session })
            }
        }
    }

    async fn collect(&self, backend: &Backend, collection_urls: &[String]) -> Vec<ProductDetail> {
        let resolver = DetailResolver {
            http: backend.http(),
            pages: backend.pages(),
            session: backend.session(),
            currency_symbol: &self.config.currency_symbol,
        };
        let delay = self.config.politeness_delay.max(MIN_POLITENESS_DELAY);

        let mut products = Vec::new();
        for collection_url in collection_urls {
            catalog_info!("Scraping collection: {}", collection_url);
            let stubs = backend.paginate(collection_url, self.config.limits).await;
            if stubs.is_empty() {
                catalog_warn!("No products found in collection {}", collection_url);
                continue;
            }
            catalog_info!("Found {} products in {}", stubs.len(), collection_url);

            let total = stubs.len();
            for (index, stub) in stubs.iter().enumerate() {
                if !products.is_empty() {
                    tokio::time::sleep(delay).await;
                }
                catalog_info!("Processing product {}/{}: {}", index + 1, total, stub.name);
                products.push(resolver.resolve(stub).await);
            }
        }
        products
    }
}

fn validate_collection_urls(collection_urls: &[String]) -> Result<(), HarvestError> {
    if collection_urls.is_empty() {
        return Err(HarvestError::InvalidInput("no collection urls given".to_string()));
    }
    for raw in collection_urls {
        let url = Url::parse(raw)
            .map_err(|err| HarvestError::InvalidInput(format!("{raw}: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(HarvestError::InvalidInput(format!(
                "{raw}: unsupported scheme {}",
                url.scheme()
            )));
        }
    }
    Ok(())
}
