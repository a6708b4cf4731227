//! Catalog core: pure data model, price normalization and harvest status.
mod model;
mod price;
mod status;
mod variant;

pub use model::{HarvestResult, ProductDetail, ProductStub, SizePriceCombination, COMPLETED};
pub use price::{
    format_minor_units, normalize_price, RawPrice, CURRENCY_SYMBOLS, DEFAULT_CURRENCY_SYMBOL,
    MINOR_UNITS_THRESHOLD,
};
pub use status::{AlreadyRunning, HarvestPermit, HarvestStatus, StatusBoard};
pub use variant::{clean_size_label, dedupe_combinations, STANDARD_SIZE};
