use ahash::RandomState;
use hashbrown::HashMap;
use log::debug;

use crate::chunks::ChunkBoundary;
use crate::config::ErrorPolicy;
use crate::error::RecordError;
use crate::measurement::Measurement;
use crate::parse::{Record, RecordFormat, Records};

pub type MeasurementsMap<'a> = HashMap<&'a [u8], Measurement, RandomState>;

/// Statistics for one chunk, keyed by slices of the input it was read from.
#[derive(Debug, Default)]
pub struct PartialAggregate<'a> {
    measurements: MeasurementsMap<'a>,
    records: u64,
    skipped: u64,
}

impl<'a> PartialAggregate<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn update(&mut self, key: &'a [u8], value: i64) {
        self.measurements
            .entry(key)
            .and_modify(|measurement| measurement.update(value))
            .or_insert_with(|| Measurement::new(value));
        self.records += 1;
    }

    /// Folds every record of `records` in. Under [`ErrorPolicy::Abort`] the
    /// first malformed record is returned and nothing after it is folded.
    pub fn consume(&mut self, records: Records<'a>, policy: ErrorPolicy) -> Result<(), RecordError> {
        for record in records {
            match record {
                Ok(Record { key, value, .. }) => self.update(key, value),
                Err(err) => match policy {
                    ErrorPolicy::Abort => return Err(err),
                    ErrorPolicy::Skip => {
                        debug!("skipping record at byte {}: {}", err.offset, err.kind);
                        self.skipped += 1;
                    }
                },
            }
        }
        Ok(())
    }

    pub fn measurements(&self) -> &MeasurementsMap<'a> {
        &self.measurements
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// Parses and aggregates a single chunk of `input`.
pub fn aggregate_chunk<'a>(
    input: &'a [u8],
    boundary: ChunkBoundary,
    format: RecordFormat,
    policy: ErrorPolicy,
) -> Result<PartialAggregate<'a>, RecordError> {
    let mut partial = PartialAggregate::new();
    partial.consume(Records::new(boundary.slice(input), boundary.start, format), policy)?;
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatErrorKind;

    fn get<'m>(partial: &'m PartialAggregate, key: &str) -> &'m Measurement {
        &partial.measurements()[key.as_bytes()]
    }

    #[test]
    fn test_aggregate_chunk() {
        let input = b"A;1.0\nB;-3.5\nA;2.0\nA;3.0\n";
        let partial = aggregate_chunk(input, ChunkBoundary::whole(input.len()), RecordFormat::default(), ErrorPolicy::Abort).unwrap();

        assert_eq!(partial.records(), 4);
        assert_eq!(partial.skipped(), 0);
        assert_eq!(partial.measurements().len(), 2);
        assert_eq!(*get(&partial, "A"), Measurement { count: 3, sum: 60, minimum: 10, maximum: 30 });
        assert_eq!(*get(&partial, "B"), Measurement::new(-35));
    }

    #[test]
    fn test_only_the_chunk_is_read() {
        let input = b"A;1.0\nB;2.0\nC;3.0\n";
        let boundary = ChunkBoundary { start: 6, end: 12 };
        let partial = aggregate_chunk(input, boundary, RecordFormat::default(), ErrorPolicy::Abort).unwrap();

        assert_eq!(partial.records(), 1);
        assert_eq!(*get(&partial, "B"), Measurement::new(20));
    }

    #[test]
    fn test_abort_policy_stops_at_first_error() {
        let input = b"A;1.0\nB;abc\nC;x\n";
        let err = aggregate_chunk(input, ChunkBoundary::whole(input.len()), RecordFormat::default(), ErrorPolicy::Abort).unwrap_err();
        assert_eq!(err, RecordError { offset: 6, kind: FormatErrorKind::InvalidNumber });
    }

    #[test]
    fn test_skip_policy_counts_errors() {
        let input = b"A;1.0\nB;abc\nno delimiter\nA;5.0\n";
        let partial = aggregate_chunk(input, ChunkBoundary::whole(input.len()), RecordFormat::default(), ErrorPolicy::Skip).unwrap();

        assert_eq!(partial.records(), 2);
        assert_eq!(partial.skipped(), 2);
        assert!(!partial.measurements().contains_key(&b"B"[..]));
        assert_eq!(*get(&partial, "A"), Measurement { count: 2, sum: 60, minimum: 10, maximum: 50 });
    }
}
