//! # Neuronorm: Score Normalization & Aggregation Engine
//!
//! Core engine for assembling neuropsychological test results into a scored,
//! normalized report. The library provides:
//!
//! - **Norm scale registry**: the standardized scales (T, SS, Scaled, Z,
//!   Percentile) and their population parameters
//! - **Score conversion**: any registered scale ⇄ percentile rank, plus
//!   qualitative descriptors and chart color bands
//! - **Hierarchical aggregation**: test results rolled up into per-domain and
//!   whole-battery summary statistics
//! - **Persistence**: lossless whole-document JSON save/load of a battery
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  Report Layer                           │
//! │  • TestResult   • DomainAggregate   • Battery           │
//! │  • ReportSession (current battery + file binding)       │
//! ├─────────────────────────────────────────────────────────┤
//! │   Core Engine            │   I/O & Storage              │
//! │  • Scale registry        │  • JSON persistence          │
//! │  • Score converter       │                              │
//! │  • Errors                │                              │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Percentile rank is the single canonical representation: every other scale is
//! a view derived from it, and all cross-scale comparison and aggregation happen
//! in percentile space. Derived values (percentile, descriptor) are computed
//! exactly once when a [`TestResult`] is built and are never silently
//! recomputed afterward.
//!
//! ## Quick Start
//!
//! ```rust
//! use neuronorm::{Battery, NormScale, TestResult};
//!
//! let mut battery = Battery::new("Dementia Workup", "Doe, Jane");
//! battery.add_test(
//!     TestResult::builder("WAIS-IV Digit Span", "Attention")
//!         .scale(NormScale::Scaled)
//!         .score(12.0)
//!         .build(),
//! );
//!
//! let overall = battery.overall_mean_percentile();
//! assert!(overall.is_some());
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core conversion engine modules
pub mod core {
    //! Scale registry, score conversion, and error types.

    pub mod convert;
    pub mod errors;
    pub mod scales;
}

// Report object model
pub mod report {
    //! Test results, domain aggregates, batteries, and session state.

    pub mod battery;
    pub mod domain;
    pub mod result;
    pub mod session;
}

// I/O and persistence
pub mod io {
    //! Whole-document battery persistence.

    pub mod persistence;
}

// Re-export primary types for convenience
pub use crate::core::convert::{Descriptor, PercentileBand};
pub use crate::core::errors::{NeuronormError, Result};
pub use crate::core::scales::{NormScale, ScaleParams};
pub use crate::report::battery::Battery;
pub use crate::report::domain::DomainAggregate;
pub use crate::report::result::TestResult;
pub use crate::report::session::ReportSession;

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
