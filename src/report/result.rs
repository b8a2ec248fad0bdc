//! A single measured test result.
//!
//! `TestResult` is an immutable value: the derived fields (percentile from
//! scale score, descriptor from percentile) are computed exactly once when the
//! builder finishes, and never recomputed afterward. Code that wants to change
//! a raw input builds a new value. This keeps the domain and battery statistics
//! stable between the table and chart consumers.

use crate::core::convert::{self, Descriptor, PercentileBand};
use crate::core::scales::NormScale;

/// One measured data point: a named test inside a cognitive domain, with its
/// raw and derived scores.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    name: String,
    domain: String,
    raw_score: Option<String>,
    scale: NormScale,
    score: Option<f64>,
    percentile: Option<f64>,
    descriptor: Option<String>,
    notes: Option<String>,
}

impl TestResult {
    /// Start building a result for `name` within `domain`.
    pub fn builder(name: impl Into<String>, domain: impl Into<String>) -> TestResultBuilder {
        TestResultBuilder {
            name: name.into(),
            domain: domain.into(),
            raw_score: None,
            scale: NormScale::default(),
            score: None,
            percentile: None,
            descriptor: None,
            notes: None,
        }
    }

    /// Test name (usually from the catalog, but freeform is legal).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cognitive domain label this result is grouped under.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Raw score as entered; opaque display text, never used in computation.
    pub fn raw_score(&self) -> Option<&str> {
        self.raw_score.as_deref()
    }

    /// Norm scale the scale score was reported on.
    pub fn scale(&self) -> NormScale {
        self.scale
    }

    /// Scale score, if one was recorded and parsed.
    pub fn score(&self) -> Option<f64> {
        self.score
    }

    /// Percentile rank, supplied directly or derived once at build time.
    pub fn percentile(&self) -> Option<f64> {
        self.percentile
    }

    /// Qualitative descriptor text, supplied or derived once at build time.
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }

    /// Free-text note.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Display color band for chart renderers.
    pub fn band(&self) -> PercentileBand {
        PercentileBand::classify(self.percentile)
    }

    /// The percentile as counted by aggregate statistics.
    ///
    /// A missing percentile and a stored zero are both excluded from averages;
    /// zero-is-missing is preserved from legacy report data, where an exact
    /// zero never occurs as a computed rank.
    pub fn percentile_for_average(&self) -> Option<f64> {
        self.percentile.filter(|p| p.is_finite() && *p != 0.0)
    }
}

/// Builder for [`TestResult`], performing the one-shot derivation at
/// [`build`](TestResultBuilder::build).
#[derive(Debug, Clone)]
pub struct TestResultBuilder {
    name: String,
    domain: String,
    raw_score: Option<String>,
    scale: NormScale,
    score: Option<f64>,
    percentile: Option<f64>,
    descriptor: Option<String>,
    notes: Option<String>,
}

impl TestResultBuilder {
    /// Set the raw score display text.
    pub fn raw_score(mut self, raw: impl Into<String>) -> Self {
        self.raw_score = Some(raw.into());
        self
    }

    /// Set an optional raw score, keeping the field absent for `None`.
    pub fn maybe_raw_score(mut self, raw: Option<String>) -> Self {
        self.raw_score = raw;
        self
    }

    /// Set the norm scale (defaults to T).
    pub fn scale(mut self, scale: NormScale) -> Self {
        self.scale = scale;
        self
    }

    /// Set the scale score.
    pub fn score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    /// Set an optional scale score, keeping the field absent for `None`.
    pub fn maybe_score(mut self, score: Option<f64>) -> Self {
        self.score = score;
        self
    }

    /// Supply the percentile directly, suppressing derivation from the score.
    pub fn percentile(mut self, percentile: f64) -> Self {
        self.percentile = Some(percentile);
        self
    }

    /// Set an optional percentile, keeping the field absent for `None`.
    pub fn maybe_percentile(mut self, percentile: Option<f64>) -> Self {
        self.percentile = percentile;
        self
    }

    /// Supply descriptor text directly, suppressing derivation.
    pub fn descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    /// Set an optional descriptor, keeping the field absent for `None`.
    pub fn maybe_descriptor(mut self, descriptor: Option<String>) -> Self {
        self.descriptor = descriptor;
        self
    }

    /// Set the free-text note.
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set an optional free-text note.
    pub fn maybe_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Finish the result, applying the one-shot derivation:
    ///
    /// 1. score present and percentile absent → derive percentile;
    /// 2. percentile present (input or step 1) and descriptor absent →
    ///    derive descriptor text.
    ///
    /// Conversion failures are recovered as "no data" (the field stays
    /// absent), never raised.
    pub fn build(self) -> TestResult {
        let percentile = match (self.score, self.percentile) {
            (Some(score), None) => convert::to_percentile(score, self.scale).ok().flatten(),
            (_, supplied) => supplied,
        };

        let descriptor = match (self.descriptor, percentile) {
            (None, Some(_)) => {
                Descriptor::from_percentile(percentile).map(|d| d.as_str().to_string())
            }
            (supplied, _) => supplied,
        };

        TestResult {
            name: self.name,
            domain: self.domain,
            raw_score: self.raw_score,
            scale: self.scale,
            score: self.score,
            percentile,
            descriptor,
            notes: self.notes,
        }
    }
}
