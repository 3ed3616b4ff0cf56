use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean step change (°C per sample) that must be exceeded to report a direction.
/// Smaller movements are treated as sensor noise.
pub const TREND_NOISE_BAND: f64 = 0.1;

/// Direction of a device's temperature over its retained history
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Rising,
    Falling,
    /// Flat, or not enough samples to tell
    Flat,
}

impl Trend {
    /// Classify the mean of consecutive differences across all samples
    ///
    /// Fewer than two samples always yields `Trend::Flat`.
    pub fn from_samples<I>(samples: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        match mean_step(samples) {
            Some(avg) if avg > TREND_NOISE_BAND => Trend::Rising,
            Some(avg) if avg < -TREND_NOISE_BAND => Trend::Falling,
            _ => Trend::Flat,
        }
    }

    /// Arrow shown next to a reading; empty when flat
    pub fn symbol(self) -> &'static str {
        match self {
            Trend::Rising => "↑",
            Trend::Falling => "↓",
            Trend::Flat => "",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Mean of `x[i] - x[i-1]`, or `None` with fewer than two samples
pub fn mean_step<I>(samples: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let mut iter = samples.into_iter();
    let mut previous = iter.next()?;
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in iter {
        sum += value - previous;
        count += 1;
        previous = value;
    }

    (count > 0).then(|| sum / count as f64)
}
