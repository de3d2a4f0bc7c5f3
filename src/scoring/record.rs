use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Column that carries the unique graft-type label of each row.
pub const GRAFT_TYPE_COLUMN: &str = "graft_type";

/// A required numeric column of the graft table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Introduced,
    Pro,
    LysholmScore,
    Lsi,
    Rts,
    LongTermSuccess,
    Complications,
    BiomechanicalStudies,
    CitationCount,
}

impl Field {
    /// All required fields, in declaration order.
    pub const ALL: [Field; 9] = [
        Field::Introduced,
        Field::Pro,
        Field::LysholmScore,
        Field::Lsi,
        Field::Rts,
        Field::LongTermSuccess,
        Field::Complications,
        Field::BiomechanicalStudies,
        Field::CitationCount,
    ];

    /// Column name as it appears in the CSV header
    pub fn column(self) -> &'static str {
        match self {
            Field::Introduced => "introduced",
            Field::Pro => "PRO",
            Field::LysholmScore => "lysholm_score",
            Field::Lsi => "LSI",
            Field::Rts => "RTS",
            Field::LongTermSuccess => "long_term_success",
            Field::Complications => "complications",
            Field::BiomechanicalStudies => "biomechanical_studies",
            Field::CitationCount => "citation_count",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A candidate row as handed over by a record source, before validation.
///
/// Values are kept as text; blank values count as missing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRecord {
    pub graft_type: String,
    pub values: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(graft_type: impl Into<String>) -> Self {
        Self {
            graft_type: graft_type.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder-style setter, mostly for fixtures and tests
    pub fn with(mut self, column: impl Into<String>, value: impl ToString) -> Self {
        self.values.insert(column.into(), value.to_string());
        self
    }

    /// Trimmed, non-blank value of a column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .get(column)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Graft records in source order, plus the column order of the source table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// A validated graft record. Every required field is present and parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraftRecord {
    pub graft_type: String,
    pub introduced: i32,
    #[serde(rename = "PRO")]
    pub pro: f64,
    pub lysholm_score: f64,
    #[serde(rename = "LSI")]
    pub lsi: f64,
    #[serde(rename = "RTS")]
    pub rts: f64,
    pub long_term_success: f64,
    pub complications: f64,
    pub biomechanical_studies: f64,
    pub citation_count: f64,
}
