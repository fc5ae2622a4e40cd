//! Weighted, evidence-accumulating guesses about one hidden fact.

use serde::{Deserialize, Serialize};

/// Ordered list of `(candidate, certainty samples)` pairs for one subject.
///
/// Samples are in `[0.0, 1.0]`. A candidate that received a zero sample is
/// considered excluded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hypotheses<V> {
    entries: Vec<(V, Vec<f64>)>,
}

impl<V> Default for Hypotheses<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V: Copy + PartialEq> Hypotheses<V> {
    /// Creates an empty hypothesis list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample for `candidate`, creating the pair if absent.
    pub fn push(&mut self, candidate: V, certainty: f64) {
        match self.entries.iter_mut().find(|(c, _)| *c == candidate) {
            Some((_, samples)) => samples.push(certainty),
            None => self.entries.push((candidate, vec![certainty])),
        }
    }

    /// Samples recorded for `candidate`.
    #[must_use]
    pub fn samples(&self, candidate: V) -> &[f64] {
        self.entries
            .iter()
            .find(|(c, _)| *c == candidate)
            .map_or(&[], |(_, s)| s.as_slice())
    }

    /// Candidates in insertion order.
    pub fn candidates(&self) -> impl Iterator<Item = V> + '_ {
        self.entries.iter().map(|(c, _)| *c)
    }

    /// Candidates with their samples, in candidate order.
    pub fn iter(&self) -> impl Iterator<Item = (V, &[f64])> + '_ {
        self.entries.iter().map(|(c, s)| (*c, s.as_slice()))
    }

    /// Returns true if `candidate` has been ruled out by a zero sample.
    #[must_use]
    pub fn is_excluded(&self, candidate: V) -> bool {
        self.samples(candidate).iter().any(|s| *s <= 0.0)
    }

    /// Total number of samples over all candidates.
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.len()).sum()
    }

    /// Returns true if no sample was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sample_count() == 0
    }

    /// Evidence-weighted estimate that the hidden value is `queried`.
    ///
    /// Every sample of every candidate contributes once: the sample itself
    /// when the candidate is `queried`, otherwise its complement. The result
    /// is the arithmetic mean of all contributions, or `None` without samples.
    #[must_use]
    pub fn estimate(&self, queried: V) -> Option<f64> {
        let mut total = 0.0;
        let mut count = 0usize;
        for (candidate, samples) in &self.entries {
            for sample in samples {
                total += if *candidate == queried { *sample } else { 1.0 - *sample };
                count += 1;
            }
        }
        if count == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = total / count as f64;
        Some(mean.clamp(0.0, 1.0))
    }
}
