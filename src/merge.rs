use std::collections::BTreeMap;

use ahash::RandomState;
use hashbrown::HashMap;

use crate::aggregate::PartialAggregate;
use crate::error::{BrcError, Result};
use crate::measurement::{Measurement, Summary};

pub type SortedSummaries = BTreeMap<Box<[u8]>, Summary>;

/// Globally merged statistics, sorted by key bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub summaries: SortedSummaries,
    pub records: u64,
    pub skipped: u64,
}

impl Report {
    pub fn get(&self, key: &[u8]) -> Option<&Summary> {
        self.summaries.get(key)
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

/// Combines per-chunk partials into one report. The result does not depend
/// on the order of `partials`.
pub fn merge<'p, 'a: 'p>(
    partials: impl IntoIterator<Item = &'p PartialAggregate<'a>>,
    decimals: u32,
) -> Result<Report> {
    let mut merged: HashMap<&'a [u8], Measurement, RandomState> = HashMap::default();
    let mut records = 0;
    let mut skipped = 0;

    for partial in partials {
        records += partial.records();
        skipped += partial.skipped();
        for (&key, measurement) in partial.measurements() {
            merged
                .entry(key)
                .and_modify(|existing| existing.merge(measurement))
                .or_insert(*measurement);
        }
    }

    let mut summaries = SortedSummaries::new();
    for (key, measurement) in merged {
        if measurement.count == 0 {
            return Err(BrcError::Internal(format!(
                "key {:?} reached the merge with no measurements",
                bstr::BStr::new(key)
            )));
        }
        summaries.insert(key.into(), Summary::new(measurement, decimals));
    }

    Ok(Report { summaries, records, skipped })
}
