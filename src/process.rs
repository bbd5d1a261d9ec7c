use log::{debug, info, warn};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::aggregate::{aggregate_chunk, PartialAggregate};
use crate::chunks::{find_chunk_boundaries, ChunkBoundary, MappedInput};
use crate::config::Config;
use crate::error::{BrcError, FormatErrorKind, Result};
use crate::merge::{merge, Report};

/// Maps the configured input and aggregates it.
pub fn brc(config: &Config) -> Result<Report> {
    let input = MappedInput::open(config.path())?;
    let report = aggregate(input.as_bytes(), config)?;

    info!(
        "{}: {} records, {} keys, {} skipped",
        input.path().display(),
        report.records,
        report.len(),
        report.skipped
    );
    Ok(report)
}

/// Aggregates an in-memory buffer. Chunks are processed on a dedicated pool
/// of `config.workers` threads; the join before the merge is the only point
/// where workers meet.
pub fn aggregate(input: &[u8], config: &Config) -> Result<Report> {
    config.validate()?;
    let format = config.format;
    let chunks = config.plan.chunk_count(input.len());

    let boundaries = match find_chunk_boundaries(input, chunks, format.separator) {
        Ok(boundaries) => boundaries,
        Err(BrcError::Format { kind: FormatErrorKind::NoRecordSeparator, .. }) => {
            debug!("no record separator in input, reading it as a single record");
            vec![ChunkBoundary::whole(input.len())]
        }
        Err(err) => return Err(err),
    };
    debug!("split {} bytes into {} chunks for {} workers", input.len(), boundaries.len(), config.workers);

    let pool = ThreadPoolBuilder::new().num_threads(config.workers).build()?;
    let parts: Vec<PartialAggregate> = pool
        .install(|| {
            boundaries
                .par_iter()
                .map(|boundary| aggregate_chunk(input, *boundary, format, config.policy))
                .collect::<std::result::Result<Vec<_>, _>>()
        })
        .map_err(|err| BrcError::format(input, err))?;

    let report = merge(&parts, format.decimals)?;
    if report.skipped > 0 {
        warn!("skipped {} malformed records", report.skipped);
    }
    Ok(report)
}
