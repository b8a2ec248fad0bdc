//! Score conversion between norm scales, percentile rank, and qualitative
//! classifications.
//!
//! Percentile rank is the canonical representation: a parametric scale score is
//! mapped through the standard normal CDF, and every other scale view is the
//! inverse mapping from percentile space. Annotation-only scales convert to
//! `None` ("no data"), the non-error path the report layer already understands.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::core::errors::{NeuronormError, Result};
use crate::core::scales::{NormScale, ScaleParams};

/// Lower clamp applied before the inverse CDF; `Φ⁻¹(0)` is −∞.
///
/// These two literals are part of the numerical contract: persisted batteries
/// produced by earlier builds depend on them exactly.
pub const PERCENTILE_FLOOR: f64 = 0.01;

/// Upper clamp applied before the inverse CDF; `Φ⁻¹(1)` is +∞.
pub const PERCENTILE_CEILING: f64 = 99.99;

/// Display marker for a missing percentile or descriptor.
pub const NO_DATA: &str = "--";

/// Standard normal distribution, built once.
static STANDARD_NORMAL: Lazy<Normal> =
    Lazy::new(|| Normal::new(0.0, 1.0).expect("standard normal parameters are valid"));

/// Convert a score on `scale` to a percentile rank in `[0, 100]`.
///
/// Annotation scales yield `Ok(None)`: there is nothing to derive, and that is
/// not an error. A non-finite score is rejected with
/// [`InvalidScore`](NeuronormError::InvalidScore).
pub fn to_percentile(score: f64, scale: NormScale) -> Result<Option<f64>> {
    if !score.is_finite() {
        return Err(NeuronormError::invalid_score(format!(
            "score {score} is not a finite number"
        )));
    }

    match scale.params() {
        ScaleParams::Parametric { mean, std_dev } => {
            let z = (score - mean) / std_dev;
            Ok(Some(STANDARD_NORMAL.cdf(z) * 100.0))
        }
        ScaleParams::Identity => Ok(Some(score)),
        ScaleParams::Annotation => Ok(None),
    }
}

/// Convert a percentile rank back to a score on `scale`.
///
/// The percentile is clamped to `[PERCENTILE_FLOOR, PERCENTILE_CEILING]`
/// first, keeping the inverse CDF away from its singularities at the tails.
/// The `Percentile` scale is the identity after clamping. Annotation scales
/// yield `Ok(None)`.
pub fn from_percentile(percentile: f64, scale: NormScale) -> Result<Option<f64>> {
    if !percentile.is_finite() {
        return Err(NeuronormError::invalid_score(format!(
            "percentile {percentile} is not a finite number"
        )));
    }

    let clamped = if percentile <= 0.0 {
        PERCENTILE_FLOOR
    } else if percentile >= 100.0 {
        PERCENTILE_CEILING
    } else {
        percentile
    };

    match scale.params() {
        ScaleParams::Parametric { mean, std_dev } => {
            let z = STANDARD_NORMAL.inverse_cdf(clamped / 100.0);
            Ok(Some(mean + std_dev * z))
        }
        ScaleParams::Identity => Ok(Some(clamped)),
        ScaleParams::Annotation => Ok(None),
    }
}

/// AACN-style qualitative descriptor for a percentile rank.
///
/// Seven ordered bands with inclusive lower bounds, evaluated top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Descriptor {
    /// Percentile ≥ 98
    #[serde(rename = "Exceptionally High")]
    ExceptionallyHigh,
    /// Percentile ≥ 91
    #[serde(rename = "Above Average")]
    AboveAverage,
    /// Percentile ≥ 75
    #[serde(rename = "High Average")]
    HighAverage,
    /// Percentile ≥ 25
    #[serde(rename = "Average")]
    Average,
    /// Percentile ≥ 9
    #[serde(rename = "Low Average")]
    LowAverage,
    /// Percentile ≥ 2
    #[serde(rename = "Below Average")]
    BelowAverage,
    /// Percentile < 2
    #[serde(rename = "Exceptionally Low")]
    ExceptionallyLow,
}

impl Descriptor {
    /// Classify a percentile rank. `None` (or a non-finite value) means "no
    /// data" and classifies to `None`, not to an error.
    pub fn from_percentile(percentile: Option<f64>) -> Option<Self> {
        let p = percentile.filter(|p| p.is_finite())?;

        Some(if p >= 98.0 {
            Self::ExceptionallyHigh
        } else if p >= 91.0 {
            Self::AboveAverage
        } else if p >= 75.0 {
            Self::HighAverage
        } else if p >= 25.0 {
            Self::Average
        } else if p >= 9.0 {
            Self::LowAverage
        } else if p >= 2.0 {
            Self::BelowAverage
        } else {
            Self::ExceptionallyLow
        })
    }

    /// Classify a score on a scale, going through the percentile conversion.
    pub fn from_score(score: f64, scale: NormScale) -> Option<Self> {
        let percentile = to_percentile(score, scale).ok().flatten();
        Self::from_percentile(percentile)
    }

    /// The descriptor text as it appears in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExceptionallyHigh => "Exceptionally High",
            Self::AboveAverage => "Above Average",
            Self::HighAverage => "High Average",
            Self::Average => "Average",
            Self::LowAverage => "Low Average",
            Self::BelowAverage => "Below Average",
            Self::ExceptionallyLow => "Exceptionally Low",
        }
    }

    /// Descriptor text for a possibly-missing percentile, using the `--`
    /// sentinel for missing data.
    pub fn label_for(percentile: Option<f64>) -> &'static str {
        Self::from_percentile(percentile).map_or(NO_DATA, |d| d.as_str())
    }
}

impl std::fmt::Display for Descriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color band for a percentile rank, consumed by chart renderers.
///
/// Same seven cut-points as [`Descriptor`], plus an eighth class for missing
/// data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PercentileBand {
    /// Percentile < 2
    ExceptionallyLow,
    /// Percentile < 9
    BelowAverage,
    /// Percentile < 25
    LowAverage,
    /// Percentile < 75
    Average,
    /// Percentile < 91
    HighAverage,
    /// Percentile < 98
    AboveAverage,
    /// Percentile ≥ 98
    ExceptionallyHigh,
    /// No percentile available
    MissingData,
}

impl PercentileBand {
    /// Classify a possibly-missing percentile into its display band.
    pub fn classify(percentile: Option<f64>) -> Self {
        let p = match percentile.filter(|p| p.is_finite()) {
            Some(p) => p,
            None => return Self::MissingData,
        };

        if p < 2.0 {
            Self::ExceptionallyLow
        } else if p < 9.0 {
            Self::BelowAverage
        } else if p < 25.0 {
            Self::LowAverage
        } else if p < 75.0 {
            Self::Average
        } else if p < 91.0 {
            Self::HighAverage
        } else if p < 98.0 {
            Self::AboveAverage
        } else {
            Self::ExceptionallyHigh
        }
    }

    /// The fixed display color for this band.
    pub fn hex_color(&self) -> &'static str {
        match self {
            Self::ExceptionallyLow => "#FF4444",
            Self::BelowAverage => "#FFAA00",
            Self::LowAverage => "#FFD700",
            Self::Average => "#44FF44",
            Self::HighAverage => "#66CCFF",
            Self::AboveAverage => "#4444FF",
            Self::ExceptionallyHigh => "#0000AA",
            Self::MissingData => "#CCCCCC",
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_t_score_to_percentile() {
        // T = 60 is one SD above the mean
        let p = to_percentile(60.0, NormScale::T).unwrap().unwrap();
        assert_relative_eq!(p, 84.1345, epsilon = 1e-3);

        // the mean of any parametric scale is the 50th percentile
        let p = to_percentile(100.0, NormScale::StandardScore).unwrap().unwrap();
        assert_relative_eq!(p, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_percentile_scale_is_identity() {
        let p = to_percentile(37.5, NormScale::Percentile).unwrap().unwrap();
        assert_relative_eq!(p, 37.5);
    }

    #[test]
    fn test_annotation_scales_derive_nothing() {
        for scale in [
            NormScale::GradeEquivalent,
            NormScale::Frequency,
            NormScale::CumulativePercent,
            NormScale::Unscored,
        ] {
            assert_eq!(to_percentile(4.2, scale).unwrap(), None);
            assert_eq!(from_percentile(50.0, scale).unwrap(), None);
        }
    }

    #[test]
    fn test_non_finite_score_is_invalid() {
        assert!(to_percentile(f64::NAN, NormScale::T).is_err());
        assert!(to_percentile(f64::INFINITY, NormScale::Z).is_err());
        assert!(from_percentile(f64::NAN, NormScale::T).is_err());
    }

    #[test]
    fn test_round_trip_within_tolerance() {
        for (scale, score) in [
            (NormScale::T, 35.0),
            (NormScale::StandardScore, 112.0),
            (NormScale::Scaled, 7.0),
            (NormScale::Z, -1.25),
        ] {
            let p = to_percentile(score, scale).unwrap().unwrap();
            let back = from_percentile(p, scale).unwrap().unwrap();
            assert_relative_eq!(back, score, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_clamp_is_exact_at_both_tails() {
        let at_zero = from_percentile(0.0, NormScale::T).unwrap().unwrap();
        let at_floor = from_percentile(PERCENTILE_FLOOR, NormScale::T)
            .unwrap()
            .unwrap();
        assert_eq!(at_zero, at_floor);

        let at_hundred = from_percentile(100.0, NormScale::StandardScore)
            .unwrap()
            .unwrap();
        let at_ceiling = from_percentile(PERCENTILE_CEILING, NormScale::StandardScore)
            .unwrap()
            .unwrap();
        assert_eq!(at_hundred, at_ceiling);

        // negative and >100 inputs clamp to the same bounds
        let below = from_percentile(-12.0, NormScale::T).unwrap().unwrap();
        assert_eq!(below, at_floor);
        let above = from_percentile(250.0, NormScale::StandardScore)
            .unwrap()
            .unwrap();
        assert_eq!(above, at_ceiling);
    }

    #[test]
    fn test_percentile_identity_clamps() {
        let p = from_percentile(-3.0, NormScale::Percentile).unwrap().unwrap();
        assert_eq!(p, PERCENTILE_FLOOR);
        let p = from_percentile(100.0, NormScale::Percentile).unwrap().unwrap();
        assert_eq!(p, PERCENTILE_CEILING);
    }

    #[test]
    fn test_descriptor_boundaries_inclusive_lower() {
        use Descriptor::*;

        let cases = [
            (98.0, ExceptionallyHigh),
            (97.999, AboveAverage),
            (91.0, AboveAverage),
            (90.999, HighAverage),
            (75.0, HighAverage),
            (74.999, Average),
            (25.0, Average),
            (24.999, LowAverage),
            (9.0, LowAverage),
            (8.999, BelowAverage),
            (2.0, BelowAverage),
            (1.999, ExceptionallyLow),
            (0.0, ExceptionallyLow),
            (100.0, ExceptionallyHigh),
        ];
        for (p, expected) in cases {
            assert_eq!(
                Descriptor::from_percentile(Some(p)),
                Some(expected),
                "percentile {p}"
            );
        }
    }

    #[test]
    fn test_descriptor_no_data_sentinel() {
        assert_eq!(Descriptor::from_percentile(None), None);
        assert_eq!(Descriptor::from_percentile(Some(f64::NAN)), None);
        assert_eq!(Descriptor::label_for(None), NO_DATA);
        assert_eq!(Descriptor::label_for(Some(50.0)), "Average");
    }

    #[test]
    fn test_descriptor_from_score() {
        assert_eq!(
            Descriptor::from_score(60.0, NormScale::T),
            Some(Descriptor::HighAverage)
        );
        assert_eq!(Descriptor::from_score(3.0, NormScale::GradeEquivalent), None);
    }

    #[test]
    fn test_band_boundaries_match_descriptor_cut_points() {
        use PercentileBand::*;

        let cases = [
            (1.999, ExceptionallyLow),
            (2.0, BelowAverage),
            (8.999, BelowAverage),
            (9.0, LowAverage),
            (24.999, LowAverage),
            (25.0, Average),
            (74.999, Average),
            (75.0, HighAverage),
            (90.999, HighAverage),
            (91.0, AboveAverage),
            (97.999, AboveAverage),
            (98.0, ExceptionallyHigh),
        ];
        for (p, expected) in cases {
            assert_eq!(PercentileBand::classify(Some(p)), expected, "percentile {p}");
        }

        assert_eq!(PercentileBand::classify(None), MissingData);
    }

    #[test]
    fn test_band_colors_are_fixed() {
        assert_eq!(PercentileBand::ExceptionallyLow.hex_color(), "#FF4444");
        assert_eq!(PercentileBand::Average.hex_color(), "#44FF44");
        assert_eq!(PercentileBand::ExceptionallyHigh.hex_color(), "#0000AA");
        assert_eq!(PercentileBand::MissingData.hex_color(), "#CCCCCC");
    }

    #[test]
    fn test_monotonic_in_score() {
        for scale in [
            NormScale::T,
            NormScale::StandardScore,
            NormScale::Scaled,
            NormScale::Z,
        ] {
            let mut last = f64::NEG_INFINITY;
            let mut score = -5.0;
            while score <= 150.0 {
                let p = to_percentile(score, scale).unwrap().unwrap();
                assert!(p >= last, "{scale} not monotonic at score {score}");
                last = p;
                score += 2.5;
            }
        }
    }
}
