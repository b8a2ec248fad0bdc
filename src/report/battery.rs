//! The complete report battery and its persisted document schema.
//!
//! A `Battery` owns every domain aggregate and test result it contains; nothing
//! is shared across batteries. Domains are stored in insertion order — display
//! layers that want lexicographic order use [`Battery::sorted_domains`], a
//! presentation concern the storage never imposes.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::core::convert;
use crate::core::errors::{NeuronormError, Result};
use crate::core::scales::NormScale;
use crate::report::domain::DomainAggregate;
use crate::report::result::TestResult;

/// A complete assessment battery: domains of test results, a premorbid
/// estimate, and whole-battery summary statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    /// Battery name (e.g. "Dementia Workup").
    pub name: String,
    /// Patient identifier.
    pub patient_name: String,
    /// Free-text note attached to the whole report.
    pub notes: String,
    date_created: DateTime<Utc>,
    domains: IndexMap<String, DomainAggregate>,
    premorbid_score: Option<f64>,
    premorbid_percentile: Option<f64>,
}

impl Battery {
    /// Create an empty battery with the current timestamp.
    pub fn new(name: impl Into<String>, patient_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            patient_name: patient_name.into(),
            notes: String::new(),
            date_created: Utc::now(),
            domains: IndexMap::new(),
            premorbid_score: None,
            premorbid_percentile: None,
        }
    }

    /// Creation timestamp.
    pub fn date_created(&self) -> DateTime<Utc> {
        self.date_created
    }

    /// The domain aggregates, in insertion order.
    pub fn domains(&self) -> &IndexMap<String, DomainAggregate> {
        &self.domains
    }

    /// Look up one domain aggregate by name.
    pub fn domain(&self, name: &str) -> Option<&DomainAggregate> {
        self.domains.get(name)
    }

    /// Domain aggregates sorted lexicographically by name, for display.
    pub fn sorted_domains(&self) -> Vec<&DomainAggregate> {
        let mut domains: Vec<&DomainAggregate> = self.domains.values().collect();
        domains.sort_by(|a, b| a.name().cmp(b.name()));
        domains
    }

    /// Total number of test results across all domains.
    pub fn test_count(&self) -> usize {
        self.domains.values().map(DomainAggregate::len).sum()
    }

    /// Route a test result to the domain aggregate named by its domain label,
    /// creating the aggregate on first use.
    pub fn add_test(&mut self, test: TestResult) {
        self.domains
            .entry(test.domain().to_string())
            .or_insert_with(|| DomainAggregate::new(test.domain()))
            .add_test(test);
    }

    /// Remove every result named `test_name` from `domain_name`, evicting the
    /// domain aggregate entirely once it is empty. Returns the number removed.
    pub fn remove_test(&mut self, domain_name: &str, test_name: &str) -> usize {
        let Some(domain) = self.domains.get_mut(domain_name) else {
            return 0;
        };

        let removed = domain.remove_test(test_name);
        if domain.is_empty() {
            self.domains.shift_remove(domain_name);
        }
        removed
    }

    /// Unweighted mean percentile over every qualifying test result flattened
    /// across all domains.
    ///
    /// Domains with more tests contribute proportionally more weight; this is
    /// the defined behavior, not the mean of the per-domain averages. `None`
    /// when no result qualifies.
    pub fn overall_mean_percentile(&self) -> Option<f64> {
        let percentiles: Vec<f64> = self
            .domains
            .values()
            .flat_map(|d| d.tests())
            .filter_map(TestResult::percentile_for_average)
            .collect();

        if percentiles.is_empty() {
            return None;
        }
        Some(percentiles.iter().sum::<f64>() / percentiles.len() as f64)
    }

    /// Snapshot of each domain's average percentile, keyed by domain name in
    /// insertion order.
    pub fn domain_averages(&self) -> IndexMap<String, Option<f64>> {
        self.domains
            .iter()
            .map(|(name, domain)| (name.clone(), domain.average_percentile()))
            .collect()
    }

    /// Record the premorbid estimate from a score on `scale`.
    ///
    /// The percentile is derived here, once; the scale itself is consumed and
    /// not stored (the document schema carries only score and percentile). A
    /// conversion failure leaves the percentile absent.
    pub fn set_premorbid(&mut self, score: f64, scale: NormScale) {
        self.premorbid_score = Some(score);
        self.premorbid_percentile = convert::to_percentile(score, scale).ok().flatten();
    }

    /// Clear the premorbid estimate.
    pub fn clear_premorbid(&mut self) {
        self.premorbid_score = None;
        self.premorbid_percentile = None;
    }

    /// Premorbid scale score, if recorded.
    pub fn premorbid_score(&self) -> Option<f64> {
        self.premorbid_score
    }

    /// Premorbid percentile derived when the estimate was recorded.
    pub fn premorbid_percentile(&self) -> Option<f64> {
        self.premorbid_percentile
    }

    /// Replace this battery's name and domain aggregates with `source`'s,
    /// leaving patient identity, notes, the premorbid estimate, and the
    /// creation timestamp untouched. This is the template-application path.
    pub fn adopt_structure(&mut self, source: Battery) {
        self.name = source.name;
        self.domains = source.domains;
    }

    /// A template copy: same name and domains, patient identifier, notes, and
    /// premorbid estimate cleared, timestamp reset.
    pub fn template(&self) -> Battery {
        Battery {
            name: self.name.clone(),
            patient_name: String::new(),
            notes: String::new(),
            date_created: Utc::now(),
            domains: self.domains.clone(),
            premorbid_score: None,
            premorbid_percentile: None,
        }
    }

    /// Serialize to the persisted document form. Lossless; empty domains are
    /// never emitted.
    pub fn to_doc(&self) -> BatteryDoc {
        BatteryDoc {
            name: self.name.clone(),
            patient_name: self.patient_name.clone(),
            date_created: Some(self.date_created),
            premorbid_score: self.premorbid_score,
            premorbid_percentile: self.premorbid_percentile,
            notes: self.notes.clone(),
            domains: self
                .domains
                .iter()
                .filter(|(_, domain)| !domain.is_empty())
                .map(|(key, domain)| {
                    (
                        key.clone(),
                        DomainDoc {
                            name: domain.name().to_string(),
                            tests: domain.tests().iter().map(test_to_doc).collect(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Reconstruct a battery from its document form.
    ///
    /// Optional keys take their documented defaults (missing timestamp ⇒
    /// current time); per-field recoveries (unknown scale token, unparsable
    /// stored score) downgrade the field, never the document.
    pub fn from_doc(doc: BatteryDoc) -> Battery {
        let mut domains = IndexMap::new();
        for (key, domain_doc) in doc.domains {
            let mut aggregate = DomainAggregate::new(domain_doc.name);
            for test_doc in domain_doc.tests {
                aggregate.add_test(test_from_doc(test_doc));
            }
            domains.insert(key, aggregate);
        }

        Battery {
            name: doc.name,
            patient_name: doc.patient_name,
            notes: doc.notes,
            date_created: doc.date_created.unwrap_or_else(Utc::now),
            domains,
            premorbid_score: doc.premorbid_score,
            premorbid_percentile: doc.premorbid_percentile,
        }
    }

    /// Serialize the battery to a pretty-printed JSON document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_doc())?)
    }

    /// Reconstruct a battery from a JSON document.
    ///
    /// Missing required structure (test `name`/`domain`, domain `name`/
    /// `tests`, or non-JSON input) is a
    /// [`MalformedDocument`](NeuronormError::MalformedDocument) error.
    pub fn from_json(json: &str) -> Result<Battery> {
        let doc: BatteryDoc = serde_json::from_str(json)
            .map_err(|e| NeuronormError::malformed_document(e.to_string()))?;
        Ok(Self::from_doc(doc))
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self::new("", "")
    }
}

/// Persisted document form of a [`Battery`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatteryDoc {
    /// Battery name.
    #[serde(default)]
    pub name: String,
    /// Patient identifier.
    #[serde(default)]
    pub patient_name: String,
    /// ISO-8601 creation timestamp; absent in legacy documents.
    #[serde(default, deserialize_with = "de_opt_datetime")]
    pub date_created: Option<DateTime<Utc>>,
    /// Premorbid scale score.
    #[serde(default)]
    pub premorbid_score: Option<f64>,
    /// Premorbid percentile derived at entry time.
    #[serde(default)]
    pub premorbid_percentile: Option<f64>,
    /// Free-text note.
    #[serde(default)]
    pub notes: String,
    /// Domain name → domain document, in storage order.
    #[serde(default)]
    pub domains: IndexMap<String, DomainDoc>,
}

/// Persisted document form of a [`DomainAggregate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainDoc {
    /// Domain name.
    pub name: String,
    /// Test documents in insertion order.
    pub tests: Vec<TestDoc>,
}

/// Persisted document form of a [`TestResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDoc {
    /// Test name.
    pub name: String,
    /// Domain label.
    pub domain: String,
    /// Raw score display text.
    #[serde(default)]
    pub raw_score: Option<String>,
    /// Norm scale token; kept as text so unrecognized legacy tokens fail
    /// per-field instead of failing the document.
    #[serde(default = "default_norm_type")]
    pub norm_type: String,
    /// Scale score; legacy documents may store it as a numeric string.
    #[serde(default, deserialize_with = "de_opt_number")]
    pub norm_score: Option<f64>,
    /// Percentile rank.
    #[serde(default, deserialize_with = "de_opt_number")]
    pub percentile: Option<f64>,
    /// Qualitative descriptor text.
    #[serde(default)]
    pub descriptor: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_norm_type() -> String {
    NormScale::T.token().to_string()
}

fn test_to_doc(test: &TestResult) -> TestDoc {
    TestDoc {
        name: test.name().to_string(),
        domain: test.domain().to_string(),
        raw_score: test.raw_score().map(str::to_string),
        norm_type: test.scale().token().to_string(),
        norm_score: test.score(),
        percentile: test.percentile(),
        descriptor: test.descriptor().map(str::to_string),
        notes: test.notes().map(str::to_string),
    }
}

fn test_from_doc(doc: TestDoc) -> TestResult {
    let scale = NormScale::parse(&doc.norm_type).unwrap_or_else(|_| {
        warn!(
            test = %doc.name,
            token = %doc.norm_type,
            "unrecognized norm scale token in document, loading as unscored"
        );
        NormScale::Unscored
    });

    TestResult::builder(doc.name, doc.domain)
        .maybe_notes(doc.notes)
        .maybe_descriptor(doc.descriptor)
        .maybe_percentile(doc.percentile)
        .maybe_score(doc.norm_score)
        .scale(scale)
        .maybe_raw_score(doc.raw_score)
        .build()
}

/// Accept a number, a numeric string, or null. An unparsable string is a
/// per-field recovery to `None`, matching the permissive-aggregation policy
/// for legacy stored scores.
fn de_opt_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => {
            let parsed = s.trim().parse::<f64>().ok();
            if parsed.is_none() && !s.trim().is_empty() {
                warn!(value = %s, "skipping unparsable stored score");
            }
            parsed
        }
        _ => None,
    })
}

/// Accept an RFC 3339 timestamp, a naive `datetime.isoformat()` value from
/// legacy documents, or null.
fn de_opt_datetime<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                    .map(|naive| naive.and_utc())
                    .ok()
            })
    }))
}
