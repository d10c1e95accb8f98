//! Item vocabularies and the fixed-price matrix the till looks prices up in.

pub mod matrix;
pub mod router;
pub mod service;
pub mod vocabulary;

pub use matrix::{GridError, PriceKey, PriceLookup, PriceMatrix, PriceMatrixEntry};
pub use router::catalog_router;
pub use service::{CatalogError, CatalogService, ImportSummary};
pub use vocabulary::{
    CustomCategory, Vocabulary, CATEGORIES, CONDITIONS, PRICE_LEVELS, RELEVANCE_LEVELS,
};
