//! Size/price combinations from structured product data.
//!
//! Storefront platforms describe a product as an object with an `options`
//! list (e.g. `[{"name": "Size"}]` or `["Size"]`) and a `variants` list
//! whose entries carry `option1..option3`, a `title` and a `price`. The same
//! shape shows up behind the `.json` product endpoint (wrapped in
//! `{"product": ...}`) and in product JSON embedded in theme scripts.

use catalog_core::{clean_size_label, format_minor_units, RawPrice, SizePriceCombination};
use scraper::Selector;
use serde_json::Value;
use url::Url;

use crate::document::ParsedDocument;

const OPTION_FIELDS: [&str; 3] = ["option1", "option2", "option3"];
const FALLBACK_SIZE: &str = "Variant";

/// `<product url>.json`, without query, fragment or trailing slash.
pub fn structured_data_url(product_url: &str) -> Option<String> {
    let mut url = Url::parse(product_url).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    let path = url.path().trim_end_matches('/').to_string();
    if path.is_empty() {
        return None;
    }
    if !path.ends_with(".json") {
        url.set_path(&format!("{path}.json"));
    }
    Some(url.to_string())
}

/// The product object inside a payload: either the payload itself when it
/// has a `variants` list, or its `product` member.
pub fn product_payload(value: &Value) -> Option<&Value> {
    if value.get("variants").is_some_and(Value::is_array) {
        return Some(value);
    }
    value
        .get("product")
        .filter(|product| product.get("variants").is_some_and(Value::is_array))
}

/// First product payload embedded in a `<script>` whose type mentions JSON.
pub fn embedded_product_json(doc: &ParsedDocument) -> Option<Value> {
    let html = doc.parse_html()?;
    let scripts = Selector::parse("script").ok()?;
    let found = html
        .select(&scripts)
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|kind| kind.to_ascii_lowercase().contains("json"))
        })
        .map(|script| script.text().collect::<String>())
        .filter(|raw| raw.contains("variants"))
        .filter_map(|raw| serde_json::from_str::<Value>(raw.trim()).ok())
        .find_map(|value| product_payload(&value).cloned());
    found
}

/// Build combinations from a product payload. Variants without a usable
/// price are skipped.
pub fn combinations_from_product(product: &Value, currency_symbol: &str) -> Vec<SizePriceCombination> {
    let size_slot = product.get("options").and_then(size_option_slot);
    product
        .get("variants")
        .and_then(Value::as_array)
        .map(|variants| {
            variants
                .iter()
                .filter_map(|variant| {
                    let price = variant_price(variant, currency_symbol)?;
                    Some(SizePriceCombination::new(variant_size(variant, size_slot), price))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Position of the option named "Size", if the product declares one.
fn size_option_slot(options: &Value) -> Option<usize> {
    options.as_array()?.iter().position(|option| {
        let name = match option {
            Value::String(name) => Some(name.as_str()),
            Value::Object(_) => option.get("name").and_then(Value::as_str),
            _ => None,
        };
        name.is_some_and(|name| name.trim().eq_ignore_ascii_case("size"))
    })
}

fn variant_size(variant: &Value, size_slot: Option<usize>) -> String {
    let text_field = |field: &str| {
        variant
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    };

    let declared = size_slot
        .and_then(|slot| OPTION_FIELDS.get(slot))
        .and_then(|field| text_field(field));
    let raw = declared
        .or_else(|| OPTION_FIELDS.iter().find_map(|field| text_field(field)))
        .or_else(|| text_field("title"))
        .unwrap_or(FALLBACK_SIZE);
    clean_size_label(raw)
}

fn variant_price(variant: &Value, currency_symbol: &str) -> Option<String> {
    let cents = ["price", "price_cents"]
        .iter()
        .filter_map(|field| variant.get(*field))
        .filter_map(RawPrice::from_json)
        .find_map(|raw| raw.to_minor_units())?;
    format_minor_units(cents, currency_symbol)
}
