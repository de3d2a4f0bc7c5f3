pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod validation;

pub use config::*;
pub use engine::{
    compute_scores, compute_scores_with, lindy_score, LindyScore, ScoreBreakdown, ScoreReport,
    ScoreResult, ScoredGraft,
};
pub use error::ScoreError;
pub use record::{Field, GraftRecord, RawRecord, RawTable, GRAFT_TYPE_COLUMN};
pub use validation::validate_record;
