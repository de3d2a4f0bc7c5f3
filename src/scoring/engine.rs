use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

use super::config::InvalidRecordPolicy;
use super::error::ScoreError;
use super::record::{GraftRecord, RawRecord};
use super::validation::validate_record;

/// Intermediate factors of a Lindy score, in the order they are multiplied.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    pub age: f64,
    pub clinical_assessment: f64,
    pub success_metrics: f64,
    pub complication_factor: f64,
    pub biomechanical_factor: f64,
    pub citation_factor: f64,
}

impl ScoreBreakdown {
    /// (label, value) pairs for display
    pub fn factors(&self) -> [(&'static str, f64); 6] {
        [
            ("Age", self.age),
            ("Clinical assessment", self.clinical_assessment),
            ("Success metrics", self.success_metrics),
            ("Complication factor", self.complication_factor),
            ("Biomechanical factor", self.biomechanical_factor),
            ("Citation factor", self.citation_factor),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LindyScore {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredGraft {
    pub record: GraftRecord,
    pub lindy: LindyScore,
}

impl ScoredGraft {
    pub fn graft_type(&self) -> &str {
        &self.record.graft_type
    }

    pub fn score(&self) -> f64 {
        self.lindy.score
    }
}

/// Lindy scores keyed by graft type, one entry per valid record.
///
/// Entries keep input order. Serializes as a JSON object mapping graft type
/// to score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreResult {
    entries: Vec<ScoredGraft>,
}

impl ScoreResult {
    pub fn get(&self, graft_type: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| e.graft_type() == graft_type)
            .map(ScoredGraft::score)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredGraft> {
        self.entries.iter()
    }

    /// Entries sorted by score descending, ties by graft type
    pub fn ranked(&self) -> Vec<&ScoredGraft> {
        let mut ranked: Vec<_> = self.entries.iter().collect();
        ranked.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.graft_type().cmp(b.graft_type()))
        });
        ranked
    }
}

impl Serialize for ScoreResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.graft_type(), &entry.score())?;
        }
        map.end()
    }
}

/// Scores plus the records excluded under `InvalidRecordPolicy::Skip`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreReport {
    pub result: ScoreResult,
    pub skipped: Vec<ScoreError>,
}

/// Compute the Lindy score of a single validated record.
///
/// `age <= 0` is allowed and yields a non-positive score. The complication
/// denominator is checked even though validation already rejects negative
/// complication counts, since callers may build records directly.
pub fn lindy_score(record: &GraftRecord, as_of_year: i32) -> Result<LindyScore, ScoreError> {
    let denominator = 1.0 + record.complications;
    if denominator == 0.0 {
        return Err(ScoreError::DivisionByZero(record.graft_type.clone()));
    }

    let breakdown = ScoreBreakdown {
        age: f64::from(as_of_year) - f64::from(record.introduced),
        clinical_assessment: (record.pro + record.lysholm_score + record.lsi) / 3.0,
        success_metrics: (record.rts + record.long_term_success) / 2.0,
        complication_factor: 1.0 / denominator,
        biomechanical_factor: record.biomechanical_studies / 1000.0,
        citation_factor: record.citation_count / 100.0,
    };

    let score = breakdown.age
        * breakdown.clinical_assessment
        * breakdown.success_metrics
        * breakdown.complication_factor
        * breakdown.biomechanical_factor
        * breakdown.citation_factor;

    Ok(LindyScore { score, breakdown })
}

/// Validate and score every record, failing fast on the first error.
pub fn compute_scores(records: &[RawRecord], as_of_year: i32) -> Result<ScoreResult, ScoreError> {
    compute_scores_with(records, as_of_year, InvalidRecordPolicy::Fail).map(|report| report.result)
}

/// Validate and score every record under the given invalid-record policy.
pub fn compute_scores_with(
    records: &[RawRecord],
    as_of_year: i32,
    policy: InvalidRecordPolicy,
) -> Result<ScoreReport, ScoreError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for raw in records {
        let record = match validate_record(raw, as_of_year) {
            Ok(record) => record,
            Err(e) if policy == InvalidRecordPolicy::Skip && e.is_skippable() => {
                skipped.push(e);
                continue;
            }
            Err(e) => return Err(e),
        };

        if !seen.insert(record.graft_type.clone()) {
            return Err(ScoreError::DuplicateKey(record.graft_type));
        }

        let lindy = lindy_score(&record, as_of_year)?;
        entries.push(ScoredGraft { record, lindy });
    }

    Ok(ScoreReport {
        result: ScoreResult { entries },
        skipped,
    })
}
