use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status string carried by every assembled [`HarvestResult`].
pub const COMPLETED: &str = "completed";

/// Minimal product reference discovered on a collection page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductStub {
    pub name: String,
    pub url: String,
}

impl ProductStub {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SizePriceCombination {
    pub size: String,
    pub price: String,
}

impl SizePriceCombination {
    pub fn new(size: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            size: size.into(),
            price: price.into(),
        }
    }
}

/// Outcome of resolving one [`ProductStub`].
///
/// A populated `error` marks a per-product failure; the combination list is
/// then empty and the rest of the harvest is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetail {
    pub name: String,
    pub url: String,
    pub size_price_combinations: Vec<SizePriceCombination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProductDetail {
    pub fn resolved(stub: &ProductStub, combinations: Vec<SizePriceCombination>) -> Self {
        Self {
            name: stub.name.clone(),
            url: stub.url.clone(),
            size_price_combinations: combinations,
            error: None,
        }
    }

    pub fn failed(stub: &ProductStub, error: impl Into<String>) -> Self {
        Self {
            name: stub.name.clone(),
            url: stub.url.clone(),
            size_price_combinations: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestResult {
    pub collection_urls: Vec<String>,
    pub total_collections: usize,
    pub total_products: usize,
    pub scraped_at: DateTime<Utc>,
    pub products: Vec<ProductDetail>,
    pub status: String,
}

impl HarvestResult {
    /// Assembles the final record; totals are derived from the inputs.
    pub fn assemble(
        collection_urls: Vec<String>,
        products: Vec<ProductDetail>,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            total_collections: collection_urls.len(),
            total_products: products.len(),
            collection_urls,
            scraped_at,
            products,
            status: COMPLETED.to_string(),
        }
    }

    /// Number of products that ended up with at least one size/price entry.
    pub fn products_with_prices(&self) -> usize {
        self.products
            .iter()
            .filter(|p| !p.size_price_combinations.is_empty())
            .count()
    }

    pub fn failed_products(&self) -> usize {
        self.products.iter().filter(|p| p.is_failed()).count()
    }
}
