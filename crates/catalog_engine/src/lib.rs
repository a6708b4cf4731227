//! Catalog engine: page access, pagination, detail resolution and the
//! harvest orchestrator.
mod controller;
mod decode;
mod detail;
mod document;
mod fetch;
mod harvest;
mod paginate;
mod persist;
mod resolver;
mod types;
mod variants;

pub use controller::{Control, ControllerError, ControllerLauncher, Locator, PageController};
pub use decode::{decode_body, DecodeError, DecodedBody};
pub use detail::{Attempt, DetailResolver, PRICE_SELECTOR, SIZE_LABEL_SELECTOR};
pub use document::{DocumentBody, ParsedDocument};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use harvest::{Clock, HarvestConfig, HarvestMode, Harvester, MIN_POLITENESS_DELAY};
pub use paginate::{
    collection_page_url, extract_stubs, next_page_locators, paginate_rendered, paginate_static,
    GridMissing, PageLimits, RENDERED_PAGE_CEILING,
};
pub use persist::{ensure_output_dir, write_catalog, AtomicFileWriter, PersistError};
pub use resolver::{
    ContentResolver, RenderPage, RenderSession, RenderSettings, StaticResolver, MIN_SETTLE_DELAY,
};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, HarvestError};
pub use variants::{
    combinations_from_product, embedded_product_json, product_payload, structured_data_url,
};
