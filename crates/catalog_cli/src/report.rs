use std::path::Path;

use catalog_core::{HarvestResult, ProductDetail};
use catalog_logging::{catalog_info, catalog_warn};

const SAMPLE_PRODUCTS: usize = 3;

pub fn log_summary(result: &HarvestResult, written_to: &Path) {
    catalog_info!(
        "Scraping completed! Saved {} products to {}",
        result.total_products,
        written_to.display()
    );
    catalog_info!(
        "Products with prices: {}/{}",
        result.products_with_prices(),
        result.total_products
    );
    let failed = result.failed_products();
    if failed > 0 {
        catalog_warn!("{} products could not be resolved", failed);
    }
    for product in result.products.iter().take(SAMPLE_PRODUCTS) {
        catalog_info!("  {}: {}", product.name, describe(product));
    }
}

fn describe(product: &ProductDetail) -> String {
    if let Some(error) = &product.error {
        return format!("error ({error})");
    }
    if product.size_price_combinations.is_empty() {
        return "no prices".to_string();
    }
    product
        .size_price_combinations
        .iter()
        .map(|combo| format!("{} {}", combo.size, combo.price))
        .collect::<Vec<_>>()
        .join(", ")
}
