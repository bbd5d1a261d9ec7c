//! Streaming min/mean/max aggregation over large `key;value` files.
//!
//! The input is memory mapped and split into chunks on record boundaries.
//! Each chunk is parsed and aggregated into its own map on a rayon pool, and
//! the per-chunk maps are merged once all of them are done. Values are kept
//! as fixed-point integers throughout, so the result is bit-identical no
//! matter how the input was chunked.

pub mod aggregate;
pub mod chunks;
pub mod config;
pub mod error;
pub mod measurement;
pub mod merge;
pub mod output;
pub mod parse;
pub mod process;

pub use aggregate::{aggregate_chunk, PartialAggregate};
pub use chunks::{find_chunk_boundaries, ChunkBoundary, ChunkPlan, MappedInput};
pub use config::{Config, ErrorPolicy, DEFAULT_INPUT};
pub use error::{BrcError, FormatErrorKind, RecordError, Result};
pub use measurement::{Measurement, Summary};
pub use merge::{merge, Report};
pub use output::write_output;
pub use parse::{parse_fixed, Record, RecordFormat, Records};
pub use process::{aggregate, brc};
