//! Product detail resolution: size/price combinations for one stub.

use catalog_core::{
    clean_size_label, dedupe_combinations, normalize_price, ProductDetail, ProductStub,
    SizePriceCombination, STANDARD_SIZE,
};
use catalog_logging::{catalog_debug, catalog_info, catalog_warn};

use crate::controller::{Control, ControllerError, Locator};
use crate::document::ParsedDocument;
use crate::resolver::{ContentResolver, RenderPage, RenderSession, StaticResolver};
use crate::variants::{
    combinations_from_product, embedded_product_json, product_payload, structured_data_url,
};
use crate::HarvestError;

/// Container of the price currently displayed on a product page.
pub const PRICE_SELECTOR: &str = ".price__container";
/// Size choices on a product form.
pub const SIZE_LABEL_SELECTOR: &str = "fieldset.js.product-form__input label";

/// Outcome of one detail tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Resolved(Vec<SizePriceCombination>),
    Continue,
}

impl Attempt {
    fn from_combinations(combinations: Vec<SizePriceCombination>) -> Self {
        if combinations.is_empty() {
            Attempt::Continue
        } else {
            Attempt::Resolved(combinations)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    StructuredEndpoint,
    EmbeddedJson,
    DisplayedPrice,
}

const TIERS: [Tier; 3] = [Tier::StructuredEndpoint, Tier::EmbeddedJson, Tier::DisplayedPrice];

/// Resolves stubs into details using the harvest's backend.
///
/// `http` always serves the structured endpoint; `pages` loads the product
/// page itself (plain HTTP or the rendered session). With a `session`, the
/// last tier drives the size selector in the live page.
pub struct DetailResolver<'a> {
    pub http: &'a StaticResolver,
    pub pages: &'a dyn ContentResolver,
    pub session: Option<&'a RenderSession>,
    pub currency_symbol: &'a str,
}

impl DetailResolver<'_> {
    /// Never fails: errors end up on the returned record.
    pub async fn resolve(&self, stub: &ProductStub) -> ProductDetail {
        match self.combinations(stub).await {
            Ok(combinations) => ProductDetail::resolved(stub, combinations),
            Err(err) => {
                catalog_warn!("Error scraping product details for {}: {}", stub.url, err);
                ProductDetail::failed(stub, err.to_string())
            }
        }
    }

    async fn combinations(&self, stub: &ProductStub) -> Result<Vec<SizePriceCombination>, HarvestError> {
        let mut product_page = None;
        for tier in TIERS {
            let attempt = match tier {
                Tier::StructuredEndpoint => self.structured_endpoint(stub).await,
                Tier::EmbeddedJson => self.embedded_json(stub, &mut product_page).await?,
                Tier::DisplayedPrice => self.displayed_price(stub, &mut product_page).await?,
            };
            if let Attempt::Resolved(combinations) = attempt {
                catalog_debug!("{} resolved through {:?}", stub.url, tier);
                return Ok(dedupe_combinations(combinations));
            }
        }
        catalog_info!("No prices found for {}", stub.url);
        Ok(Vec::new())
    }

    /// Failures here are expected on sites without the endpoint.
    async fn structured_endpoint(&self, stub: &ProductStub) -> Attempt {
        let Some(endpoint) = structured_data_url(&stub.url) else {
            return Attempt::Continue;
        };
        let doc = match self.http.resolve(&endpoint).await {
            Ok(doc) => doc,
            Err(err) => {
                catalog_debug!("No structured data at {}: {}", endpoint, err);
                return Attempt::Continue;
            }
        };
        let combinations = doc
            .as_json()
            .and_then(product_payload)
            .map(|product| combinations_from_product(product, self.currency_symbol))
            .unwrap_or_default();
        Attempt::from_combinations(combinations)
    }

    async fn embedded_json(
        &self,
        stub: &ProductStub,
        cache: &mut Option<ParsedDocument>,
    ) -> Result<Attempt, HarvestError> {
        let doc = self.product_page(stub, cache).await?;
        let combinations = embedded_product_json(doc)
            .map(|product| combinations_from_product(&product, self.currency_symbol))
            .unwrap_or_default();
        Ok(Attempt::from_combinations(combinations))
    }

    async fn displayed_price(
        &self,
        stub: &ProductStub,
        cache: &mut Option<ParsedDocument>,
    ) -> Result<Attempt, HarvestError> {
        let doc = self.product_page(stub, cache).await?;
        let reference = displayed_price(doc);
        match self.session {
            Some(session) => self.select_each_size(stub, session, reference).await,
            None => Ok(Attempt::from_combinations(
                reference
                    .map(|price| vec![SizePriceCombination::new(STANDARD_SIZE, price)])
                    .unwrap_or_default(),
            )),
        }
    }

    /// Click every size label in the live page and read the price it shows.
    /// With no label yielding a price, the price shown on load is recorded
    /// as the `Standard` size.
    async fn select_each_size(
        &self,
        stub: &ProductStub,
        session: &RenderSession,
        reference: Option<String>,
    ) -> Result<Attempt, HarvestError> {
        let mut page = session.page().await;
        let labels = page
            .find_controls(&Locator::css(SIZE_LABEL_SELECTOR))
            .await
            .map_err(|err| HarvestError::render(&stub.url, err))?;
        catalog_debug!("Found {} size labels on {}", labels.len(), stub.url);

        let mut combinations = Vec::new();
        for label in &labels {
            let size = clean_size_label(&label.text);
            let size = if size.is_empty() { STANDARD_SIZE.to_string() } else { size };
            match price_after_selecting(&mut page, label).await {
                Ok(Some(price)) => combinations.push(SizePriceCombination::new(size, price)),
                Ok(None) => catalog_debug!("No price shown after selecting {}", size),
                Err(err) => catalog_warn!("Error processing size {} on {}: {}", size, stub.url, err),
            }
        }

        if combinations.is_empty() {
            if let Some(price) = reference {
                combinations.push(SizePriceCombination::new(STANDARD_SIZE, price));
            }
        }
        Ok(Attempt::from_combinations(combinations))
    }

    async fn product_page<'c>(
        &self,
        stub: &ProductStub,
        cache: &'c mut Option<ParsedDocument>,
    ) -> Result<&'c ParsedDocument, HarvestError> {
        let doc = match cache.take() {
            Some(doc) => doc,
            None => self.pages.resolve(&stub.url).await?,
        };
        Ok(cache.insert(doc))
    }
}

fn displayed_price(doc: &ParsedDocument) -> Option<String> {
    doc.select_text(PRICE_SELECTOR)
        .and_then(|text| normalize_price(&text))
}

async fn price_after_selecting(
    page: &mut RenderPage<'_>,
    label: &Control,
) -> Result<Option<String>, ControllerError> {
    page.click(label).await?;
    let shown = page.read_text(PRICE_SELECTOR).await?;
    Ok(shown.and_then(|text| normalize_price(&text)))
}
