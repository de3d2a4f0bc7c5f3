use thiserror::Error;

use super::record::Field;

/// Errors raised while validating or scoring graft records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("graft '{graft_type}' is missing required field(s): {}", join_fields(.fields))]
    MissingField {
        graft_type: String,
        fields: Vec<Field>,
    },

    #[error("duplicate graft type '{0}'")]
    DuplicateKey(String),

    #[error("graft '{0}': complication factor divides by zero (complications = -1)")]
    DivisionByZero(String),

    #[error("graft '{graft_type}': {field} value '{value}' is not a valid number")]
    InvalidValue {
        graft_type: String,
        field: Field,
        value: String,
    },

    #[error("graft '{graft_type}': {field} {reason}")]
    OutOfDomain {
        graft_type: String,
        field: Field,
        reason: String,
    },

    #[error("record has an empty graft_type label")]
    EmptyGraftType,
}

impl ScoreError {
    /// Whether the `skip` policy may exclude the offending record instead of
    /// aborting. Structural problems (missing fields, duplicate or empty keys)
    /// always abort.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ScoreError::InvalidValue { .. } | ScoreError::OutOfDomain { .. }
        )
    }

    /// Graft type the error refers to, when there is one
    pub fn graft_type(&self) -> Option<&str> {
        match self {
            ScoreError::MissingField { graft_type, .. }
            | ScoreError::InvalidValue { graft_type, .. }
            | ScoreError::OutOfDomain { graft_type, .. } => Some(graft_type),
            ScoreError::DuplicateKey(g) | ScoreError::DivisionByZero(g) => Some(g),
            ScoreError::EmptyGraftType => None,
        }
    }
}

fn join_fields(fields: &[Field]) -> String {
    fields
        .iter()
        .map(|f| f.column())
        .collect::<Vec<_>>()
        .join(", ")
}
