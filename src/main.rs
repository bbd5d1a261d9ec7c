use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use brc::{ChunkPlan, Config, ErrorPolicy, DEFAULT_INPUT};

#[derive(Debug, Parser)]
#[command(version, about = "Per-key min/mean/max over a `key;value` file", long_about = None)]
struct Args {
    /// Input file, one `key;value` record per line
    #[arg(default_value = DEFAULT_INPUT)]
    path: PathBuf,

    /// Leave malformed records out and report how many there were
    #[arg(long)]
    skip_malformed: bool,

    /// Worker threads (defaults to the available parallelism)
    #[arg(long)]
    workers: Option<usize>,

    /// Number of chunks to split the input into
    #[arg(long, conflicts_with = "chunk_size")]
    chunks: Option<usize>,

    /// Target chunk size in bytes
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Field delimiter between key and value
    #[arg(long, default_value_t = ';')]
    delimiter: char,

    /// Fractional digits carried by the values
    #[arg(long, default_value_t = 1)]
    decimals: u32,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        if !self.delimiter.is_ascii() {
            bail!("delimiter {:?} is not ASCII", self.delimiter);
        }

        let mut config = Config::new(self.path)
            .with_delimiter(self.delimiter as u8)
            .with_decimals(self.decimals);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(chunks) = self.chunks {
            config = config.with_plan(ChunkPlan::Count(chunks));
        }
        if let Some(size) = self.chunk_size {
            config = config.with_plan(ChunkPlan::Size(size));
        }
        if self.skip_malformed {
            config = config.with_policy(ErrorPolicy::Skip);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Args::parse().into_config()?;
    let timer = Instant::now();

    let report = brc::brc(&config)
        .with_context(|| format!("could not aggregate {}", config.path().display()))?;

    let stdout = std::io::stdout();
    brc::write_output(&report, BufWriter::new(stdout.lock()))?;

    info!("finished in {:?}", timer.elapsed());
    Ok(())
}
