//! capsim-ingest — getting consumption metrics and prices into capsim.
//!
//! - [`csv`]: CloudWatch console CSV exports
//! - [`source`]: the async [`MetricsSource`] seam, JSON metric dumps,
//!   and minute gap filling
//! - [`pricing`]: the [`PriceLookup`] seam and a config-backed table

pub mod csv;
pub mod error;
pub mod pricing;
pub mod source;

pub use error::{IngestError, IngestResult};
pub use pricing::{PriceLookup, PriceTable};
pub use source::{JsonDumpSource, MetricsRequest, MetricsSource, fill_minute_gaps, write_dump};
