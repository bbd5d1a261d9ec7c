use bstr::ByteSlice;

use crate::error::{FormatErrorKind, RecordError};

pub const NEWLINE: u8 = 10;
pub const SEMICOLON: u8 = 59;
const CARRIAGE_RETURN: u8 = 13;
const MINUS: u8 = 45;
const PLUS: u8 = 43;
const PERIOD: u8 = 46;

/// Shape of one record: `key<delimiter>value<separator>`, with the value
/// carrying at most `decimals` fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordFormat {
    pub delimiter: u8,
    pub separator: u8,
    pub decimals: u32,
}

impl Default for RecordFormat {
    fn default() -> Self {
        Self { delimiter: SEMICOLON, separator: NEWLINE, decimals: 1 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: i64,
    pub offset: usize,
}

/// Lazy single-pass iterator over the records of one chunk.
///
/// `base` is the absolute offset of `buffer` in the input so that errors can
/// point at the offending record. A malformed record is yielded as an error
/// and iteration carries on with the next one.
pub struct Records<'a> {
    buffer: &'a [u8],
    base: usize,
    position: usize,
    format: RecordFormat,
}

impl<'a> Records<'a> {
    pub fn new(buffer: &'a [u8], base: usize, format: RecordFormat) -> Self {
        Self { buffer, base, position: 0, format }
    }

    fn parse_line(&self, line: &'a [u8], offset: usize) -> Result<Record<'a>, RecordError> {
        let error = |kind| RecordError { offset, kind };

        let name_end = line
            .find_byte(self.format.delimiter)
            .ok_or_else(|| error(FormatErrorKind::MissingDelimiter))?;
        let key = &line[..name_end];
        if key.is_empty() {
            return Err(error(FormatErrorKind::EmptyKey));
        }

        let value = parse_fixed(&line[(name_end + 1)..], self.format.decimals).map_err(error)?;
        Ok(Record { key, value, offset })
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<Record<'a>, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        let line_start = self.position;
        if line_start >= self.buffer.len() {
            return None;
        }

        let line_end = match self.buffer[line_start..].find_byte(self.format.separator) {
            Some(position) => line_start + position,
            None => self.buffer.len(),
        };
        self.position = line_end + 1;

        let mut line = &self.buffer[line_start..line_end];
        if let [body @ .., CARRIAGE_RETURN] = line {
            line = body;
        }

        Some(self.parse_line(line, self.base + line_start))
    }
}

/// Parses a decimal such as `-12.3` into `value * 10^decimals`.
///
/// Accepts an optional sign, at least one integer digit and an optional
/// fraction of 1..=`decimals` digits. Shorter fractions are zero padded.
pub fn parse_fixed(field: &[u8], decimals: u32) -> Result<i64, FormatErrorKind> {
    if field.is_empty() {
        return Err(FormatErrorKind::EmptyValue);
    }

    let (is_neg, digits) = match field {
        [MINUS, rest @ ..] => (true, rest),
        [PLUS, rest @ ..] => (false, rest),
        _ => (false, field),
    };

    let (integer, fraction) = match digits.find_byte(PERIOD) {
        Some(position) => (&digits[..position], &digits[(position + 1)..]),
        None => (digits, &[][..]),
    };
    let has_period = integer.len() < digits.len();

    if integer.is_empty() || (has_period && fraction.is_empty()) {
        return Err(FormatErrorKind::InvalidNumber);
    }
    if fraction.len() > decimals as usize {
        return if fraction.iter().all(u8::is_ascii_digit) {
            Err(FormatErrorKind::TooManyFractionDigits)
        } else {
            Err(FormatErrorKind::InvalidNumber)
        };
    }

    let mut acc: i64 = 0;
    for &val in integer.iter().chain(fraction) {
        if !val.is_ascii_digit() {
            return Err(FormatErrorKind::InvalidNumber);
        }
        acc = acc
            .checked_mul(10)
            .and_then(|acc| acc.checked_add((val - b'0') as i64))
            .ok_or(FormatErrorKind::NumberOutOfRange)?;
    }

    let padding = decimals - fraction.len() as u32;
    acc = acc
        .checked_mul(10_i64.pow(padding))
        .ok_or(FormatErrorKind::NumberOutOfRange)?;

    match is_neg {
        true => Ok(-acc),
        false => Ok(acc),
    }
}
