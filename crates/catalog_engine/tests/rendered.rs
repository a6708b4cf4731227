//! Rendered mode against a scripted in-memory page controller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use catalog_core::{SizePriceCombination, StatusBoard};
use catalog_engine::{
    paginate_rendered, Control, ControllerError, ControllerLauncher, FailureKind, FetchError,
    FetchOutput, Fetcher, HarvestConfig, HarvestError, HarvestMode, Harvester, Locator,
    PageController, PageLimits, RenderSession, RenderSettings, SIZE_LABEL_SELECTOR,
};
use pretty_assertions::assert_eq;

const COLLECTION: &str = "https://shop.example/collections/hair";
const COLLECTION_PAGE_2: &str = "https://shop.example/collections/hair?page=2";

struct Product {
    shown_price: String,
    sizes: Vec<(String, String)>,
}

#[derive(Default)]
struct Site {
    collections: HashMap<String, String>,
    /// Collection page -> (target, enabled) of its "Next" control.
    next: HashMap<String, (String, bool)>,
    products: HashMap<String, Product>,
}

impl Site {
    fn shop() -> Self {
        let mut site = Site::default();
        site.collections.insert(
            COLLECTION.to_string(),
            grid(&[("/products/oil", "Argan Oil"), ("/products/mask", "Hair Mask")]),
        );
        site.collections
            .insert(COLLECTION_PAGE_2.to_string(), grid(&[("/products/comb", "Wide Comb")]));
        site.next
            .insert(COLLECTION.to_string(), (COLLECTION_PAGE_2.to_string(), true));
        site.next
            .insert(COLLECTION_PAGE_2.to_string(), (COLLECTION.to_string(), false));
        site.products.insert(
            "https://shop.example/products/oil".to_string(),
            Product {
                shown_price: "$10.00".to_string(),
                sizes: vec![
                    ("50ml".to_string(), "$10.00".to_string()),
                    ("Sample 50ml".to_string(), "$10.00".to_string()),
                    ("200ml".to_string(), "$20.00".to_string()),
                ],
            },
        );
        site.products.insert(
            "https://shop.example/products/mask".to_string(),
            Product {
                shown_price: "$15.50".to_string(),
                sizes: Vec::new(),
            },
        );
        site.products.insert(
            "https://shop.example/products/comb".to_string(),
            Product {
                shown_price: "$4.00".to_string(),
                sizes: vec![
                    ("Broken".to_string(), "$1.00".to_string()),
                    ("One size".to_string(), "$4.00".to_string()),
                ],
            },
        );
        site
    }
}

fn grid(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(href, name)| format!(r#"<li><a href="{href}">{name}</a></li>"#))
        .collect();
    format!(r#"<html><body><ul id="product-grid">{items}</ul></body></html>"#)
}

#[derive(Debug, Default)]
struct Journal {
    navigations: Vec<String>,
    activations: Vec<String>,
    closed: bool,
}

struct ScriptedController {
    site: Arc<Site>,
    journal: Arc<Mutex<Journal>>,
    current: Option<String>,
    selected_price: Option<String>,
}

impl ScriptedController {
    fn new(site: Arc<Site>, journal: Arc<Mutex<Journal>>) -> Self {
        Self {
            site,
            journal,
            current: None,
            selected_price: None,
        }
    }

    fn current(&self) -> Result<&str, ControllerError> {
        self.current
            .as_deref()
            .ok_or_else(|| ControllerError::Navigation("no page loaded".to_string()))
    }

    fn go(&mut self, url: &str) -> Result<(), ControllerError> {
        self.journal.lock().unwrap().navigations.push(url.to_string());
        if !self.site.collections.contains_key(url) && !self.site.products.contains_key(url) {
            return Err(ControllerError::Navigation(format!("{url} did not load")));
        }
        self.current = Some(url.to_string());
        self.selected_price = None;
        Ok(())
    }
}

#[async_trait]
impl PageController for ScriptedController {
    async fn navigate(&mut self, url: &str) -> Result<(), ControllerError> {
        self.go(url)
    }

    async fn current_url(&mut self) -> Result<String, ControllerError> {
        self.current().map(str::to_string)
    }

    async fn current_html(&mut self) -> Result<String, ControllerError> {
        let current = self.current()?;
        if let Some(page) = self.site.collections.get(current) {
            return Ok(page.clone());
        }
        let product = &self.site.products[current];
        let price = self.selected_price.as_deref().unwrap_or(&product.shown_price);
        let labels: String = product
            .sizes
            .iter()
            .map(|(label, _)| format!("<label>{label}</label>"))
            .collect();
        Ok(format!(
            r#"<html><body><div class="price__container"><span>{price}</span></div>
            <fieldset class="js product-form__input">{labels}</fieldset></body></html>"#
        ))
    }

    async fn find_control(&mut self, locator: &Locator) -> Result<Option<Control>, ControllerError> {
        let current = self.current()?;
        match (locator, self.site.next.get(current)) {
            (Locator::AriaLabel(label), Some((target, enabled))) if label == "Next" => Ok(Some(Control {
                handle: target.clone(),
                text: "Next".to_string(),
                enabled: *enabled,
            })),
            _ => Err(ControllerError::NotFound(locator.to_string())),
        }
    }

    async fn find_controls(&mut self, locator: &Locator) -> Result<Vec<Control>, ControllerError> {
        let current = self.current()?;
        let Some(product) = self.site.products.get(current) else {
            return Ok(Vec::new());
        };
        if *locator != Locator::css(SIZE_LABEL_SELECTOR) {
            return Ok(Vec::new());
        }
        Ok(product
            .sizes
            .iter()
            .enumerate()
            .map(|(index, (label, _))| Control {
                handle: format!("size:{index}"),
                text: format!(" {label} "),
                enabled: true,
            })
            .collect())
    }

    async fn scroll_into_view(&mut self, control: &Control) -> Result<(), ControllerError> {
        if control.text.trim() == "Broken" {
            return Err(ControllerError::NotFound("label detached".to_string()));
        }
        Ok(())
    }

    async fn activate(&mut self, control: &Control) -> Result<(), ControllerError> {
        self.journal
            .lock()
            .unwrap()
            .activations
            .push(control.text.trim().to_string());
        match control.handle.strip_prefix("size:") {
            Some(index) => {
                let current = self.current()?.to_string();
                let index: usize = index.parse().unwrap();
                self.selected_price = Some(self.site.products[&current].sizes[index].1.clone());
                Ok(())
            }
            None => {
                let target = control.handle.clone();
                self.go(&target)
            }
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ControllerError> {
        self.journal.lock().unwrap().closed = true;
        Ok(())
    }
}

struct ScriptedLauncher {
    site: Arc<Site>,
    journal: Arc<Mutex<Journal>>,
}

#[async_trait]
impl ControllerLauncher for ScriptedLauncher {
    async fn launch(&self) -> Result<Box<dyn PageController>, ControllerError> {
        Ok(Box::new(ScriptedController::new(
            Arc::clone(&self.site),
            Arc::clone(&self.journal),
        )))
    }
}

struct BrokenLauncher;

#[async_trait]
impl ControllerLauncher for BrokenLauncher {
    async fn launch(&self) -> Result<Box<dyn PageController>, ControllerError> {
        Err(ControllerError::Session("driver not installed".to_string()))
    }
}

/// HTTP side for sites without a structured endpoint.
struct NoEndpoint;

#[async_trait]
impl Fetcher for NoEndpoint {
    async fn get(&self, url: &str) -> Result<FetchOutput, FetchError> {
        Err(FetchError {
            kind: FailureKind::HttpStatus(404),
            message: format!("{url} not found"),
        })
    }
}

fn rendered_harvester(launcher: Arc<dyn ControllerLauncher>, status: StatusBoard) -> Harvester {
    let config = HarvestConfig {
        mode: HarvestMode::Rendered,
        ..HarvestConfig::default()
    };
    Harvester::new(config, Arc::new(NoEndpoint), Some(launcher), status)
}

fn combo(size: &str, price: &str) -> SizePriceCombination {
    SizePriceCombination::new(size, price)
}

#[tokio::test(start_paused = true)]
async fn rendered_pagination_follows_next_until_it_is_disabled() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let controller = ScriptedController::new(Arc::new(Site::shop()), Arc::clone(&journal));
    let session = RenderSession::new(Box::new(controller), RenderSettings::default());

    let stubs = paginate_rendered(&session, COLLECTION, PageLimits::default()).await;
    session.close().await;

    let urls: Vec<&str> = stubs.iter().map(|stub| stub.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            "https://shop.example/products/oil",
            "https://shop.example/products/mask",
            "https://shop.example/products/comb",
        ]
    );
    let journal = journal.lock().unwrap();
    assert_eq!(journal.navigations, vec![COLLECTION, COLLECTION_PAGE_2]);
    assert!(journal.closed);
}

#[tokio::test(start_paused = true)]
async fn rendered_pagination_respects_page_limit() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let controller = ScriptedController::new(Arc::new(Site::shop()), Arc::clone(&journal));
    let session = RenderSession::new(Box::new(controller), RenderSettings::default());

    let limits = PageLimits {
        max_pages: Some(1),
        max_products: None,
    };
    let stubs = paginate_rendered(&session, COLLECTION, limits).await;

    assert_eq!(stubs.len(), 2);
    assert!(journal.lock().unwrap().activations.is_empty());
}

#[tokio::test(start_paused = true)]
async fn size_labels_are_clicked_and_priced() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let launcher = Arc::new(ScriptedLauncher {
        site: Arc::new(Site::shop()),
        journal: Arc::clone(&journal),
    });
    let status = StatusBoard::new();
    let harvester = rendered_harvester(launcher, status.clone());

    let result = harvester
        .harvest(&[COLLECTION.to_string()])
        .await
        .expect("harvest ok");

    assert_eq!(result.total_products, 3);
    let oil = &result.products[0];
    assert_eq!(
        oil.size_price_combinations,
        vec![combo("50ml", "$10,00"), combo("200ml", "$20,00")]
    );
    let mask = &result.products[1];
    assert_eq!(mask.size_price_combinations, vec![combo("Standard", "$15,50")]);
    let comb = &result.products[2];
    assert_eq!(comb.error, None);
    assert_eq!(comb.size_price_combinations, vec![combo("One size", "$4,00")]);

    let journal = journal.lock().unwrap();
    assert!(journal.closed);
    assert!(!journal.activations.contains(&"Broken".to_string()));
    assert!(!status.is_running());
}

#[tokio::test(start_paused = true)]
async fn session_is_closed_when_nothing_loads() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let launcher = Arc::new(ScriptedLauncher {
        site: Arc::new(Site::default()),
        journal: Arc::clone(&journal),
    });
    let harvester = rendered_harvester(launcher, StatusBoard::new());

    let result = harvester
        .harvest(&[COLLECTION.to_string()])
        .await
        .expect("harvest ok");

    assert_eq!(result.total_products, 0);
    assert!(journal.lock().unwrap().closed);
}

#[tokio::test(start_paused = true)]
async fn launch_failure_aborts_the_harvest() {
    let status = StatusBoard::new();
    let harvester = rendered_harvester(Arc::new(BrokenLauncher), status.clone());

    let err = harvester
        .harvest(&[COLLECTION.to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, HarvestError::SessionStart(ControllerError::Session(_))));
    let snapshot = status.snapshot();
    assert!(!snapshot.is_running);
    assert!(snapshot.last_error.unwrap().contains("driver not installed"));
}

fn collection_page(number: u32) -> String {
    if number == 1 {
        COLLECTION.to_string()
    } else {
        format!("{COLLECTION}?page={number}")
    }
}

/// A collection whose "Next" control never runs out.
fn endless_site(pages: u32) -> Site {
    let mut site = Site::default();
    for number in 1..=pages {
        let href = format!("/products/item-{number}");
        let name = format!("Item {number}");
        site.collections
            .insert(collection_page(number), grid(&[(href.as_str(), name.as_str())]));
        site.next
            .insert(collection_page(number), (collection_page(number + 1), true));
    }
    site
}

#[tokio::test(start_paused = true)]
async fn rendered_pagination_stops_at_fifty_pages() {
    let journal = Arc::new(Mutex::new(Journal::default()));
    let controller = ScriptedController::new(Arc::new(endless_site(60)), Arc::clone(&journal));
    let session = RenderSession::new(Box::new(controller), RenderSettings::default());

    let stubs = paginate_rendered(&session, COLLECTION, PageLimits::default()).await;

    assert_eq!(stubs.len(), 50);
    assert_eq!(
        stubs.last().map(|stub| stub.url.as_str()),
        Some("https://shop.example/products/item-50")
    );
    let journal = journal.lock().unwrap();
    assert_eq!(journal.activations.len(), 49);
    assert_eq!(journal.navigations.len(), 50);
    assert_eq!(journal.navigations.last(), Some(&collection_page(50)));
    assert!(!journal.navigations.contains(&collection_page(51)));
}

#[tokio::test(start_paused = true)]
async fn missing_grid_after_first_page_keeps_earlier_stubs() {
    let mut site = Site::shop();
    site.collections.insert(
        COLLECTION_PAGE_2.to_string(),
        "<html><body><p>Nothing here</p></body></html>".to_string(),
    );
    let journal = Arc::new(Mutex::new(Journal::default()));
    let controller = ScriptedController::new(Arc::new(site), Arc::clone(&journal));
    let session = RenderSession::new(Box::new(controller), RenderSettings::default());

    let stubs = paginate_rendered(&session, COLLECTION, PageLimits::default()).await;

    let urls: Vec<&str> = stubs.iter().map(|stub| stub.url.as_str()).collect();
    assert_eq!(
        urls,
        vec!["https://shop.example/products/oil", "https://shop.example/products/mask"]
    );
    assert_eq!(journal.lock().unwrap().navigations, vec![COLLECTION, COLLECTION_PAGE_2]);
}
