use std::fmt::{Display, Formatter};

/// Running statistics for one key within one chunk. Values are fixed-point
/// integers in units of `10^-decimals`. The sum is kept in `i128` so that
/// adding up `i64` values cannot wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub count: u64,
    pub sum: i128,
    pub minimum: i64,
    pub maximum: i64,
}

impl Measurement {
    pub fn new(value: i64) -> Self {
        Self { count: 1, sum: value as i128, minimum: value, maximum: value }
    }

    #[inline]
    pub fn update(&mut self, value: i64) {
        self.minimum = self.minimum.min(value);
        self.maximum = self.maximum.max(value);
        self.count += 1;
        self.sum += value as i128;
    }

    #[inline]
    pub fn merge(&mut self, other: &Self) {
        self.minimum = self.minimum.min(other.minimum);
        self.maximum = self.maximum.max(other.maximum);
        self.count += other.count;
        self.sum += other.sum;
    }
}

/// Globally merged statistics for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub count: u64,
    pub sum: i128,
    pub minimum: i64,
    pub maximum: i64,
    pub decimals: u32,
}

impl Summary {
    /// Callers guarantee `measurement.count > 0`.
    pub(crate) fn new(measurement: Measurement, decimals: u32) -> Self {
        Self {
            count: measurement.count,
            sum: measurement.sum,
            minimum: measurement.minimum,
            maximum: measurement.maximum,
            decimals,
        }
    }

    pub fn min(&self) -> f64 {
        self.minimum as f64 / scale(self.decimals) as f64
    }

    pub fn max(&self) -> f64 {
        self.maximum as f64 / scale(self.decimals) as f64
    }

    pub fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64 / scale(self.decimals) as f64
    }

    /// Mean in fixed-point units, rounded half up (toward positive infinity).
    pub fn rounded_mean(&self) -> i64 {
        let count = self.count as i128;
        (2 * self.sum + count).div_euclid(2 * count) as i64
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let min = Fixed::new(self.minimum, self.decimals);
        let mean = Fixed::new(self.rounded_mean(), self.decimals);
        let max = Fixed::new(self.maximum, self.decimals);

        write!(f, "{min}/{mean}/{max}")
    }
}

/// Renders a fixed-point integer as a decimal without going through floats.
#[derive(Debug, Clone, Copy)]
pub struct Fixed {
    value: i64,
    decimals: u32,
}

impl Fixed {
    pub fn new(value: i64, decimals: u32) -> Self {
        Self { value, decimals }
    }
}

impl Display for Fixed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let magnitude = self.value.unsigned_abs();

        if self.decimals == 0 {
            return write!(f, "{sign}{magnitude}");
        }

        let scale = scale(self.decimals) as u64;
        let width = self.decimals as usize;
        write!(f, "{sign}{}.{:0width$}", magnitude / scale, magnitude % scale)
    }
}

pub(crate) fn scale(decimals: u32) -> i64 {
    10_i64.pow(decimals)
}
