use std::io::{self, Write};

use bstr::ByteSlice;

use crate::merge::Report;

/// Writes one `key=min/mean/max` line per key, in key order.
pub fn write_output<W: Write>(report: &Report, mut writer: W) -> io::Result<()> {
    for (station, summary) in &report.summaries {
        writeln!(writer, "{}={summary}", station.as_bstr())?;
    }
    writer.flush()
}
