//! Fixed-capacity time series backing the live charts.

use std::collections::VecDeque;

use serde::Serialize;

/// One aligned sample: a label plus a value per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<const N: usize> {
    pub label: String,
    pub values: [f64; N],
}

impl<const N: usize> Sample<N> {
    pub fn new(label: impl Into<String>, values: [f64; N]) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }

    /// A sample with every channel at zero.
    pub fn zero(label: impl Into<String>) -> Self {
        Self::new(label, [0.0; N])
    }
}

/// Immutable copy of a buffer's contents, split into parallel arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot<const N: usize> {
    pub labels: Vec<String>,
    #[serde(with = "channels_serde")]
    pub channels: [Vec<f64>; N],
}

impl<const N: usize> SeriesSnapshot<N> {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

mod channels_serde {
    use serde::ser::SerializeSeq;
    use serde::Serializer;

    pub fn serialize<S: Serializer, const N: usize>(
        channels: &[Vec<f64>; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(N))?;
        for channel in channels {
            seq.serialize_element(channel)?;
        }
        seq.end()
    }
}

/// Rolling FIFO of `N`-channel samples.
///
/// Samples are stored whole, so labels and every channel share one length
/// at all times. Pushing past capacity evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct RollingBuffer<const N: usize> {
    capacity: usize,
    samples: VecDeque<Sample<N>>,
}

impl<const N: usize> RollingBuffer<N> {
    /// Create an empty buffer. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Replace the contents wholesale, keeping the most recent `capacity`
    /// samples.
    pub fn seed<I>(&mut self, samples: I)
    where
        I: IntoIterator<Item = Sample<N>>,
    {
        let mut fresh: VecDeque<Sample<N>> = samples.into_iter().collect();
        let excess = fresh.len().saturating_sub(self.capacity);
        fresh.drain(..excess);
        self.samples = fresh;
    }

    /// Append one sample, evicting the oldest when full.
    pub fn push(&mut self, label: impl Into<String>, values: [f64; N]) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample::new(label, values));
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn latest(&self) -> Option<&Sample<N>> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<N>> {
        self.samples.iter()
    }

    pub fn snapshot(&self) -> SeriesSnapshot<N> {
        let labels = self.samples.iter().map(|s| s.label.clone()).collect();
        let channels =
            std::array::from_fn(|c| self.samples.iter().map(|s| s.values[c]).collect());
        SeriesSnapshot { labels, channels }
    }

    /// Chart points `(x, y)` for one channel, limited to the newest `limit`
    /// samples. `x` counts from zero at the oldest visible sample.
    pub fn points(&self, channel: usize, limit: usize) -> Vec<(f64, f64)> {
        if channel >= N {
            return Vec::new();
        }
        let skip = self.samples.len().saturating_sub(limit);
        self.samples
            .iter()
            .skip(skip)
            .enumerate()
            .map(|(i, s)| (i as f64, s.values[channel]))
            .collect()
    }

    /// Largest value across all channels, for axis bounds.
    pub fn max_value(&self) -> f64 {
        self.samples
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}
