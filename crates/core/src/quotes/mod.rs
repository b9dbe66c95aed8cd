pub mod client;
pub mod constants;
pub mod errors;
pub mod model;
pub mod store;
pub mod sync;

pub use client::{BcbGateway, IndexerGateway, IndexerSeriesId, MarketDataGateway, YahooGateway};
pub use errors::MarketDataError;
pub use model::{CachedPrice, IndexerObservation, PriceBar, SymbolMetadata};
pub use store::{resolve_price, MemoryPriceStore, PriceStore};
pub use sync::{BulkFetchReport, FetchReport, FetchWindow, PriceSyncService};
