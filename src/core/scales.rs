//! Norm scale registry.
//!
//! The registry is the closed set of scale identifiers the engine understands,
//! each mapped to exactly one parameter pair. It is fixed at process start:
//! nothing can register a new scale, and anything outside the set resolves to
//! an [`UnknownScale`](crate::NeuronormError::UnknownScale) error at the parse
//! boundary.
//!
//! Four of the identifiers (`GE`, `Freq`, `Cum%`, `--`) are annotation-only
//! tags offered by data-entry UIs: a result may carry one, but no percentile
//! can be derived from it. Those resolve to [`ScaleParams::Annotation`], the
//! "no data" derivation path, never to an error.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::core::errors::{NeuronormError, Result};

/// A standardized norm scale identifier.
///
/// Serialized as the literal UI token (`T`, `SS`, `Scaled`, `Z`, `Percentile`,
/// `GE`, `Freq`, `Cum%`, `--`), so persisted documents round-trip exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormScale {
    /// T-score: mean 50, SD 10
    T,
    /// Standard Score: mean 100, SD 15
    #[serde(rename = "SS")]
    StandardScore,
    /// Scaled score: mean 10, SD 3
    Scaled,
    /// Z-score: mean 0, SD 1
    Z,
    /// Percentile rank, already on the canonical 0–100 scale
    Percentile,
    /// Grade equivalent, annotation only
    #[serde(rename = "GE")]
    GradeEquivalent,
    /// Frequency of occurrence, annotation only
    #[serde(rename = "Freq")]
    Frequency,
    /// Cumulative percentage, annotation only
    #[serde(rename = "Cum%")]
    CumulativePercent,
    /// No scale recorded
    #[serde(rename = "--")]
    Unscored,
}

/// What a scale contributes to score conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleParams {
    /// Normally distributed with fixed population parameters
    Parametric {
        /// Population mean
        mean: f64,
        /// Population standard deviation
        std_dev: f64,
    },
    /// Input is already a percentile rank; conversion is the identity
    Identity,
    /// Display-only tag; nothing can be derived from it
    Annotation,
}

/// Registry order, as presented by data-entry UIs.
static REGISTRY: [NormScale; 9] = [
    NormScale::T,
    NormScale::StandardScore,
    NormScale::Scaled,
    NormScale::Z,
    NormScale::Percentile,
    NormScale::GradeEquivalent,
    NormScale::Frequency,
    NormScale::CumulativePercent,
    NormScale::Unscored,
];

/// Token → scale lookup table, built once at first use.
static TOKEN_TABLE: Lazy<HashMap<&'static str, NormScale>> =
    Lazy::new(|| REGISTRY.iter().map(|s| (s.token(), *s)).collect());

impl NormScale {
    /// All registered scales, in registry order.
    pub fn all() -> &'static [NormScale] {
        &REGISTRY
    }

    /// The literal identifier token used in documents and UIs.
    pub fn token(&self) -> &'static str {
        match self {
            Self::T => "T",
            Self::StandardScore => "SS",
            Self::Scaled => "Scaled",
            Self::Z => "Z",
            Self::Percentile => "Percentile",
            Self::GradeEquivalent => "GE",
            Self::Frequency => "Freq",
            Self::CumulativePercent => "Cum%",
            Self::Unscored => "--",
        }
    }

    /// Resolve an identifier token against the registry.
    ///
    /// Unknown tokens are an [`UnknownScale`](NeuronormError::UnknownScale)
    /// error; callers are expected to treat this as a non-fatal per-field
    /// failure, not a process abort.
    pub fn parse(token: &str) -> Result<Self> {
        TOKEN_TABLE
            .get(token)
            .copied()
            .ok_or_else(|| NeuronormError::unknown_scale(token))
    }

    /// Conversion parameters for this scale.
    pub fn params(&self) -> ScaleParams {
        match self {
            Self::T => ScaleParams::Parametric {
                mean: 50.0,
                std_dev: 10.0,
            },
            Self::StandardScore => ScaleParams::Parametric {
                mean: 100.0,
                std_dev: 15.0,
            },
            Self::Scaled => ScaleParams::Parametric {
                mean: 10.0,
                std_dev: 3.0,
            },
            Self::Z => ScaleParams::Parametric {
                mean: 0.0,
                std_dev: 1.0,
            },
            Self::Percentile => ScaleParams::Identity,
            Self::GradeEquivalent | Self::Frequency | Self::CumulativePercent | Self::Unscored => {
                ScaleParams::Annotation
            }
        }
    }

    /// Whether this scale is a display-only annotation tag.
    pub fn is_annotation(&self) -> bool {
        matches!(self.params(), ScaleParams::Annotation)
    }
}

impl Default for NormScale {
    /// T is the default entry scale, matching data-entry conventions.
    fn default() -> Self {
        Self::T
    }
}

impl fmt::Display for NormScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for NormScale {
    type Err = NeuronormError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
