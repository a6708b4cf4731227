//! Collection pagination: walk a collection's pages and collect product stubs.

use std::collections::HashSet;

use catalog_core::ProductStub;
use catalog_logging::{catalog_debug, catalog_info, catalog_warn};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::controller::{Control, ControllerError, Locator};
use crate::document::{element_text, resolve_href, ParsedDocument};
use crate::resolver::{ContentResolver, RenderPage, RenderSession};

/// Hard stop for "next" driven pagination, whatever the caller's limits.
pub const RENDERED_PAGE_CEILING: u32 = 50;

const GRID_SELECTORS: [&str; 4] = [
    "ul#product-grid",
    "ul.product-grid",
    "div#product-grid",
    "div.product-grid",
];

const NAME_SELECTORS: [&str; 6] = [
    ".product-title",
    ".product-name",
    "h2",
    "h3",
    "h4",
    ".title",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageLimits {
    pub max_pages: Option<u32>,
    pub max_products: Option<usize>,
}

impl PageLimits {
    fn pages_exhausted(&self, page: u32) -> bool {
        self.max_pages.is_some_and(|max| page > max)
    }

    fn products_exhausted(&self, collected: usize) -> bool {
        self.max_products.is_some_and(|max| collected >= max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no product grid on page")]
pub struct GridMissing;

/// Pull product stubs out of a collection page.
///
/// Each grid item contributes its first link; the name comes from the link
/// text or, failing that, from the first title-like element inside the link
/// or the item. Items missing a name or URL are skipped.
pub fn extract_stubs(doc: &ParsedDocument) -> Result<Vec<ProductStub>, GridMissing> {
    let html = doc.parse_html().ok_or(GridMissing)?;
    let grid = GRID_SELECTORS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .find_map(|sel| html.select(&sel).next())
        .ok_or(GridMissing)?;

    let (Some(li), Some(div), Some(anchor)) =
        (selector("li"), selector("div"), selector("a[href]"))
    else {
        return Ok(Vec::new());
    };

    let mut items: Vec<ElementRef<'_>> = grid.select(&li).collect();
    if items.is_empty() {
        items = grid.select(&div).collect();
    }

    let mut seen = HashSet::new();
    let mut stubs = Vec::new();
    for item in items {
        let Some(link) = item.select(&anchor).next() else {
            continue;
        };
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, &doc.url))
        else {
            continue;
        };
        let name = stub_name(link, item);
        if name.is_empty() {
            continue;
        }
        let url = url.to_string();
        if seen.insert(url.clone()) {
            stubs.push(ProductStub { name, url });
        }
    }
    Ok(stubs)
}

fn stub_name(link: ElementRef<'_>, item: ElementRef<'_>) -> String {
    let text = element_text(link);
    if !text.is_empty() {
        return text;
    }
    NAME_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .find_map(|sel| link.select(&sel).next().or_else(|| item.select(&sel).next()))
        .map(element_text)
        .unwrap_or_default()
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// URL of page `page` of a collection: page 1 is the collection URL itself,
/// later pages carry `page=N`, replacing any existing `page` parameter.
pub fn collection_page_url(collection_url: &str, page: u32) -> Result<String, url::ParseError> {
    let mut url = Url::parse(collection_url)?;
    if page <= 1 {
        return Ok(url.to_string());
    }
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "page")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

/// Append stubs not seen before, stopping at `max_products`. Returns how
/// many were added.
fn push_unique(
    stubs: &mut Vec<ProductStub>,
    seen: &mut HashSet<String>,
    page_stubs: Vec<ProductStub>,
    limits: &PageLimits,
) -> usize {
    let before = stubs.len();
    for stub in page_stubs {
        if limits.products_exhausted(stubs.len()) {
            break;
        }
        if seen.insert(stub.url.clone()) {
            stubs.push(stub);
        }
    }
    stubs.len() - before
}

/// Static pagination through the `page` query parameter.
///
/// Ends at the page limit, at the first page without a product grid, or at
/// the first page that contributes no new stubs. Fetch failures end the
/// collection; they are logged, never returned.
pub async fn paginate_static(
    resolver: &dyn ContentResolver,
    collection_url: &str,
    limits: PageLimits,
) -> Vec<ProductStub> {
    let mut stubs = Vec::new();
    let mut seen = HashSet::new();
    let mut page = 1;

    while !limits.pages_exhausted(page) {
        let page_url = match collection_page_url(collection_url, page) {
            Ok(url) => url,
            Err(err) => {
                catalog_warn!("Invalid collection url {}: {}", collection_url, err);
                break;
            }
        };

        let doc = match resolver.resolve(&page_url).await {
            Ok(doc) => doc,
            Err(err) if page == 1 => {
                catalog_warn!("Failed to load collection page 1 of {}: {}", collection_url, err);
                break;
            }
            Err(err) => {
                catalog_info!("Stopping at collection page {}: {}", page, err);
                break;
            }
        };

        let page_stubs = match extract_stubs(&doc) {
            Ok(found) => found,
            Err(GridMissing) if page == 1 => {
                catalog_warn!("Could not find product grid on first page of {}", collection_url);
                break;
            }
            Err(GridMissing) => {
                catalog_debug!("No product grid on page {}; end of collection", page);
                break;
            }
        };

        let added = push_unique(&mut stubs, &mut seen, page_stubs, &limits);
        catalog_info!("Found {} products on page {} of {}", added, page, collection_url);
        if added == 0 || limits.products_exhausted(stubs.len()) {
            break;
        }
        page += 1;
    }

    stubs
}

/// Ordered strategies for the "next page" control; the last one matches a
/// numbered link for the following page.
pub fn next_page_locators(page_number: u32) -> Vec<Locator> {
    vec![
        Locator::AriaLabel("Next".to_string()),
        Locator::Title("Next".to_string()),
        Locator::css("a.next"),
        Locator::css(".next a"),
        Locator::LinkTextContains("Next".to_string()),
        Locator::LinkTextContains(">".to_string()),
        Locator::LinkTextEquals((page_number + 1).to_string()),
    ]
}

async fn find_next_control(
    page: &mut RenderPage<'_>,
    page_number: u32,
) -> Result<Option<Control>, ControllerError> {
    for locator in next_page_locators(page_number) {
        if let Some(control) = page.find_control(&locator).await? {
            if control.enabled {
                catalog_debug!("Next page control found by {}", locator);
                return Ok(Some(control));
            }
        }
    }
    Ok(None)
}

/// Rendered pagination: scrape the live DOM, then follow the "next" control
/// until there is none, a limit is hit, or [`RENDERED_PAGE_CEILING`] pages
/// have been read. Controller failures end the collection with the stubs
/// gathered so far.
pub async fn paginate_rendered(
    session: &RenderSession,
    collection_url: &str,
    limits: PageLimits,
) -> Vec<ProductStub> {
    let mut stubs = Vec::new();
    let mut seen = HashSet::new();
    let mut page = session.page().await;

    if let Err(err) = page.open(collection_url).await {
        catalog_warn!("Failed to open collection {}: {}", collection_url, err);
        return stubs;
    }

    let mut page_number = 1;
    loop {
        let doc = match page.document().await {
            Ok(doc) => doc,
            Err(err) => {
                catalog_warn!("Failed to read collection page {}: {}", page_number, err);
                break;
            }
        };
        match extract_stubs(&doc) {
            Ok(found) => {
                let added = push_unique(&mut stubs, &mut seen, found, &limits);
                catalog_info!("Found {} products on page {}", added, page_number);
            }
            Err(GridMissing) if page_number == 1 => {
                catalog_warn!("Could not find product grid on first page of {}", collection_url);
                break;
            }
            Err(GridMissing) => {
                catalog_debug!("No product grid on page {}; end of collection", page_number);
                break;
            }
        }

        if limits.products_exhausted(stubs.len()) || limits.pages_exhausted(page_number + 1) {
            break;
        }
        if page_number >= RENDERED_PAGE_CEILING {
            catalog_warn!("Reached maximum page limit ({}), stopping", RENDERED_PAGE_CEILING);
            break;
        }

        let next = match find_next_control(&mut page, page_number).await {
            Ok(Some(control)) => control,
            Ok(None) => {
                catalog_info!("No more pages found after page {}", page_number);
                break;
            }
            Err(err) => {
                catalog_warn!("Next page lookup failed: {}", err);
                break;
            }
        };

        let followed = match page.click(&next).await {
            Ok(()) => page.lazy_scroll().await,
            Err(err) => Err(err),
        };
        if let Err(err) = followed {
            catalog_warn!("Error following next page control: {}", err);
            break;
        }
        page_number += 1;
    }

    stubs
}
