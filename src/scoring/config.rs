use serde::{Deserialize, Serialize};

/// Scoring configuration.
///
/// Example YAML:
/// ```yaml
/// scoring:
///   as_of_year: 2024
///   invalid_records: skip
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Year ages are measured against. Falls back to the current year.
    #[serde(default)]
    pub as_of_year: Option<i32>,

    /// What to do with records that fail validation (default: fail)
    #[serde(default)]
    pub invalid_records: Option<InvalidRecordPolicy>,
}

/// How records with unparseable or out-of-domain values are treated.
///
/// Missing fields, empty labels and duplicate graft types abort scoring
/// under either policy.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Abort on the first invalid record
    #[default]
    Fail,
    /// Exclude invalid records and report them alongside the scores
    Skip,
}
