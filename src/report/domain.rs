//! Per-domain aggregation of test results.

use crate::core::scales::NormScale;
use crate::report::result::TestResult;

/// An insertion-ordered collection of test results sharing one cognitive
/// domain label.
///
/// Order is preserved for display; aggregation never errors, returning `None`
/// when no entry qualifies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainAggregate {
    name: String,
    tests: Vec<TestResult>,
}

/// Mean scale score within a domain, with the permissive-aggregation skip
/// count made observable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreAverage {
    /// Mean over usable matching scores, `None` when nothing qualified.
    pub mean: Option<f64>,
    /// Entries on the requested scale that carried no usable numeric score
    /// and were skipped silently.
    pub skipped: usize,
}

impl DomainAggregate {
    /// Create an empty aggregate for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
        }
    }

    /// Domain name; the unique key within a battery.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The contained results, in insertion order.
    pub fn tests(&self) -> &[TestResult] {
        &self.tests
    }

    /// Number of contained results.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Whether the aggregate holds no results. An empty aggregate is the
    /// owning battery's signal to evict it.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Append a result. Duplicate names are legal and additive.
    pub fn add_test(&mut self, test: TestResult) {
        self.tests.push(test);
    }

    /// Remove every entry named `name`; a no-op if none match. Returns the
    /// number removed.
    pub fn remove_test(&mut self, name: &str) -> usize {
        let before = self.tests.len();
        self.tests.retain(|t| t.name() != name);
        before - self.tests.len()
    }

    /// Arithmetic mean of the qualifying percentiles, `None` when no entry
    /// qualifies (distinct from a genuine average of zero).
    pub fn average_percentile(&self) -> Option<f64> {
        let percentiles: Vec<f64> = self
            .tests
            .iter()
            .filter_map(TestResult::percentile_for_average)
            .collect();

        if percentiles.is_empty() {
            return None;
        }
        Some(percentiles.iter().sum::<f64>() / percentiles.len() as f64)
    }

    /// Mean scale score over entries reported on exactly `scale`.
    ///
    /// Entries on other scales are ignored entirely; entries on the requested
    /// scale without a usable numeric score are skipped silently and counted
    /// in [`ScoreAverage::skipped`].
    pub fn average_score(&self, scale: NormScale) -> ScoreAverage {
        let mut scores = Vec::new();
        let mut skipped = 0;

        for test in self.tests.iter().filter(|t| t.scale() == scale) {
            match test.score().filter(|s| s.is_finite()) {
                Some(score) => scores.push(score),
                None => skipped += 1,
            }
        }

        let mean = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        ScoreAverage { mean, skipped }
    }
}
