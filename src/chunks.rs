use std::fs::File;
use std::path::{Path, PathBuf};

use bstr::ByteSlice;
use log::debug;
use memmap2::{Mmap, MmapOptions};

use crate::error::{BrcError, FormatErrorKind, Result};

/// Shortest possible record: one key byte, the delimiter, one digit and the
/// separator.
const MIN_RECORD_LEN: usize = 4;
const MAX_CHUNKS: usize = 1 << 16;

/// Half-open byte range `[start, end)` that starts and ends on a record
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkBoundary {
    pub start: usize,
    pub end: usize,
}

impl ChunkBoundary {
    pub fn whole(len: usize) -> Self {
        Self { start: 0, end: len }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start..self.end]
    }
}

/// How the input is divided before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkPlan {
    Count(usize),
    Size(usize),
}

impl ChunkPlan {
    pub fn chunk_count(&self, file_size: usize) -> usize {
        match *self {
            ChunkPlan::Count(count) => count.max(1),
            ChunkPlan::Size(size) => file_size.div_ceil(size.max(1)).max(1),
        }
    }
}

/// Read-only view of the input file. Empty files are not mapped.
pub struct MappedInput {
    path: PathBuf,
    mmap: Option<Mmap>,
}

impl MappedInput {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file: File = File::open(path).map_err(|err| BrcError::io(path, err))?;
        let file_size = file.metadata().map_err(|err| BrcError::io(path, err))?.len();

        let mmap = match file_size {
            0 => None,
            _ => Some(unsafe { MmapOptions::new().map(&file) }.map_err(|err| BrcError::io(path, err))?),
        };

        debug!("mapped {} ({file_size} bytes)", path.display());
        Ok(Self { path: path.to_path_buf(), mmap })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.mmap.as_deref().unwrap_or(&[])
    }
}

/// Splits `buffer` into at most `chunks` ranges, each ending just past a
/// `separator` (or at the end of the buffer). The ranges cover the buffer
/// with no gaps and no overlaps. The count is capped at one chunk per
/// shortest possible record and at `MAX_CHUNKS`.
pub fn find_chunk_boundaries(buffer: &[u8], chunks: usize, separator: u8) -> Result<Vec<ChunkBoundary>> {
    let size = buffer.len();
    if size == 0 {
        return Ok(vec![ChunkBoundary::whole(0)]);
    }
    if buffer.find_byte(separator).is_none() {
        return Err(BrcError::Format { offset: 0, line: 1, kind: FormatErrorKind::NoRecordSeparator });
    }

    let limit = (size / MIN_RECORD_LEN).clamp(1, MAX_CHUNKS);
    let chunks = chunks.clamp(1, limit);
    let mut starts: Vec<usize> = Vec::with_capacity(chunks);
    starts.push(0);
    for i in 1..chunks {
        let naive = (i as u128 * size as u128 / chunks as u128) as usize;
        let start = align_to_record(buffer, naive, separator);
        if start > *starts.last().unwrap_or(&0) && start < size {
            starts.push(start);
        }
    }

    let mut ends: Vec<usize> = starts[1..].to_vec();
    ends.push(size);

    Ok(starts
        .into_iter()
        .zip(ends)
        .map(|(start, end)| ChunkBoundary { start, end })
        .collect())
}

/// First record start at or after `offset`.
fn align_to_record(buffer: &[u8], offset: usize, separator: u8) -> usize {
    if offset == 0 {
        return 0;
    }
    match buffer[(offset - 1)..].find_byte(separator) {
        Some(position) => offset + position,
        None => buffer.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{RecordFormat, Records, NEWLINE};

    const SAMPLE: &str = "Hamburg;12.0\nBulawayo;8.9\nPalembang;38.8\nSt. John's;15.2\nCracow;12.6\n\
                          Bridgetown;26.9\nIstanbul;6.2\nRoseau;34.4\nConakry;31.2\nIstanbul;23.0\n";

    fn assert_covers(buffer: &[u8], boundaries: &[ChunkBoundary]) {
        assert_eq!(boundaries.first().map(|b| b.start), Some(0));
        assert_eq!(boundaries.last().map(|b| b.end), Some(buffer.len()));
        for pair in boundaries.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        for boundary in boundaries {
            assert!(!boundary.is_empty());
            assert!(boundary.start == 0 || buffer[boundary.start - 1] == NEWLINE);
        }
    }

    #[test]
    fn test_boundaries_for_every_chunk_count() {
        let buffer = SAMPLE.as_bytes();
        let lines = buffer.iter().filter(|&&c| c == NEWLINE).count();

        for chunks in 1..=buffer.len() + 3 {
            let boundaries = find_chunk_boundaries(buffer, chunks, NEWLINE).unwrap();
            assert!(boundaries.len() <= chunks);
            assert_covers(buffer, &boundaries);

            let records: usize = boundaries
                .iter()
                .map(|b| Records::new(b.slice(buffer), b.start, RecordFormat::default()).count())
                .sum();
            assert_eq!(records, lines, "chunk count {chunks}");
        }
    }

    #[test]
    fn test_aligned_offset_stays_put() {
        let buffer = b"A;1.0\nB;2.0\n";
        // naive offset 6 is already the start of the second record
        let boundaries = find_chunk_boundaries(buffer, 2, NEWLINE).unwrap();
        assert_eq!(boundaries, vec![ChunkBoundary { start: 0, end: 6 }, ChunkBoundary { start: 6, end: 12 }]);
    }

    #[test]
    fn test_mid_record_offset_moves_forward() {
        let buffer = b"Abcdefgh;1.0\nB;2.0\n";
        let boundaries = find_chunk_boundaries(buffer, 3, NEWLINE).unwrap();
        assert_eq!(boundaries, vec![ChunkBoundary { start: 0, end: 13 }, ChunkBoundary { start: 13, end: 19 }]);
    }

    #[test]
    fn test_missing_trailing_separator() {
        let buffer = b"A;1.0\nB;2.0\nC;3.0";
        let boundaries = find_chunk_boundaries(buffer, 4, NEWLINE).unwrap();
        assert_covers(buffer, &boundaries);
    }

    #[test]
    fn test_chunk_count_is_capped() {
        let buffer = SAMPLE.as_bytes();
        let boundaries = find_chunk_boundaries(buffer, usize::MAX, NEWLINE).unwrap();
        assert!(boundaries.len() <= buffer.len() / MIN_RECORD_LEN);
        assert_covers(buffer, &boundaries);

        let large = SAMPLE.repeat(2_000);
        let boundaries = find_chunk_boundaries(large.as_bytes(), large.len(), NEWLINE).unwrap();
        assert!(boundaries.len() <= MAX_CHUNKS);
        assert_covers(large.as_bytes(), &boundaries);
    }

    #[test]
    fn test_empty_input_is_one_chunk() {
        assert_eq!(find_chunk_boundaries(b"", 8, NEWLINE).unwrap(), vec![ChunkBoundary::whole(0)]);
    }

    #[test]
    fn test_no_separator_is_an_error() {
        match find_chunk_boundaries(b"X;5.5", 4, NEWLINE) {
            Err(BrcError::Format { kind, .. }) => assert_eq!(kind, FormatErrorKind::NoRecordSeparator),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_chunk_plan() {
        assert_eq!(ChunkPlan::Count(0).chunk_count(100), 1);
        assert_eq!(ChunkPlan::Count(17).chunk_count(0), 17);
        assert_eq!(ChunkPlan::Size(10).chunk_count(100), 10);
        assert_eq!(ChunkPlan::Size(30).chunk_count(100), 4);
        assert_eq!(ChunkPlan::Size(30).chunk_count(0), 1);
    }
}
