use std::path::{Path, PathBuf};

use crate::chunks::ChunkPlan;
use crate::error::{BrcError, Result};
use crate::parse::RecordFormat;

pub const DEFAULT_INPUT: &str = "data/measurements.txt";

/// Chunks handed to each worker by default, so that work stealing can even
/// out ragged chunks.
pub const CHUNKS_PER_WORKER: usize = 4;

const MAX_DECIMALS: u32 = 9;

/// What to do with a record that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the whole run on the first malformed record.
    #[default]
    Abort,
    /// Leave the record out of the statistics and count it.
    Skip,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub path: PathBuf,
    pub format: RecordFormat,
    pub workers: usize,
    pub plan: ChunkPlan,
    pub policy: ErrorPolicy,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let workers: usize = std::thread::available_parallelism().map_or(1, usize::from);

        Self {
            path: path.into(),
            format: RecordFormat::default(),
            workers,
            plan: ChunkPlan::Count(workers * CHUNKS_PER_WORKER),
            policy: ErrorPolicy::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets the worker count. The default chunk plan follows it.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self.plan = ChunkPlan::Count(workers * CHUNKS_PER_WORKER);
        self
    }

    pub fn with_plan(mut self, plan: ChunkPlan) -> Self {
        self.plan = plan;
        self
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.format.delimiter = delimiter;
        self
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.format.decimals = decimals;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let RecordFormat { delimiter, separator, decimals } = self.format;

        if self.workers == 0 {
            return Err(BrcError::Config("worker count must be at least 1".into()));
        }
        match self.plan {
            ChunkPlan::Count(0) => return Err(BrcError::Config("chunk count must be at least 1".into())),
            ChunkPlan::Size(0) => return Err(BrcError::Config("chunk size must be at least 1 byte".into())),
            _ => {}
        }
        if !delimiter.is_ascii() || !separator.is_ascii() {
            return Err(BrcError::Config("delimiter and separator must be ASCII".into()));
        }
        if delimiter == separator {
            return Err(BrcError::Config("delimiter and separator must differ".into()));
        }
        if matches!(delimiter, b'0'..=b'9' | b'.' | b'-' | b'+') {
            return Err(BrcError::Config(format!("delimiter {:?} can appear in a number", delimiter as char)));
        }
        if decimals > MAX_DECIMALS {
            return Err(BrcError::Config(format!("at most {MAX_DECIMALS} decimals are supported")));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT)
    }
}
