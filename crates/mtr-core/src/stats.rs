//! Per-hop latency and loss statistics
//!
//! The numbers here must match what `mtr --report` prints for the same run,
//! so the arithmetic is deliberately literal:
//!
//! - loss is an integer percentage, truncated
//! - the mean divides every sample by the count before summing, in whole
//!   nanoseconds, so each term truncates on its own
//! - standard deviation is the sample (n − 1) form around that mean

use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::time::Duration;

/// Derived statistics for one hop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopStats {
    /// Probe rounds sent
    pub sent: u32,
    /// Samples received
    pub received: u32,
    /// Loss percentage, 0–100
    pub loss: u8,
    #[serde(with = "duration_nanos")]
    pub last: Duration,
    #[serde(with = "duration_nanos")]
    pub avg: Duration,
    #[serde(with = "duration_nanos")]
    pub best: Duration,
    #[serde(with = "duration_nanos")]
    pub worst: Duration,
    #[serde(with = "duration_nanos")]
    pub stddev: Duration,
}

/// Summarize one hop's samples against the number of rounds sent
pub fn summarize(samples: &[Duration], sent: NonZeroU32) -> HopStats {
    let received = u32::try_from(samples.len()).unwrap_or(u32::MAX);

    let (Some(&first), Some(&last)) = (samples.first(), samples.last()) else {
        return HopStats {
            sent: sent.get(),
            received: 0,
            loss: 100,
            ..HopStats::default()
        };
    };

    let mut avg = Duration::ZERO;
    let mut best = first;
    let mut worst = first;
    for &sample in samples {
        avg += sample / received;
        best = best.min(sample);
        worst = worst.max(sample);
    }

    HopStats {
        sent: sent.get(),
        received,
        loss: loss_percent(sent, received),
        last,
        avg,
        best,
        worst,
        stddev: std_dev(samples, avg),
    }
}

/// `floor(100 × (sent − received) / sent)`, saturating at 0 when more
/// samples arrived than rounds were sent
pub fn loss_percent(sent: NonZeroU32, received: u32) -> u8 {
    let sent = u64::from(sent.get());
    let lost = sent.saturating_sub(u64::from(received));
    // lost <= sent, so the quotient is at most 100
    (100 * lost / sent) as u8
}

/// Sample standard deviation around `avg`; zero below two samples
pub fn std_dev(samples: &[Duration], avg: Duration) -> Duration {
    if samples.len() < 2 {
        return Duration::ZERO;
    }
    let mean = avg.as_nanos() as f64;
    let total: f64 = samples
        .iter()
        .map(|s| (s.as_nanos() as f64 - mean).powi(2))
        .sum();
    let variance = total / (samples.len() - 1) as f64;
    Duration::from_nanos(variance.sqrt() as u64)
}

/// Serde helper: durations as integer nanoseconds
pub(crate) mod duration_nanos {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        u64::try_from(duration.as_nanos())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
