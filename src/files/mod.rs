//! Static file serving
//!
//! The request pipeline behind every response: path resolution with
//! hidden-segment rejection and index fallback, conditional freshness checks,
//! selective gzip compression, and optional directory listings.

pub mod compress;
pub mod conditional;
pub mod dispatcher;
pub mod listing;
pub mod resolve;

pub use compress::{CompressionPolicy, CompressorPool, GzipCompressor};
pub use dispatcher::Dispatcher;
pub use resolve::{PathResolver, Resolution, ResourceMetadata};
