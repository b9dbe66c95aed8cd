pub mod model;
pub mod repository;

pub use model::{PriceBarDB, SymbolMetadataDB};
pub use repository::PriceRepository;
