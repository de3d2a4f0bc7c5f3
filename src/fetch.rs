use anyhow::Result;
use chrono::Datelike;

use crate::scoring::{compute_scores_with, InvalidRecordPolicy, RawTable, ScoreReport};
use crate::source::{load_table, FetchOptions, Source};

/// Calendar year of the local clock. Only the application boundary reads
/// the clock; scoring always receives the year explicitly.
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

/// Everything needed to turn a source into scores.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub source: Source,
    pub fetch: FetchOptions,
    pub policy: InvalidRecordPolicy,
}

/// Output of one fetch-and-score run.
#[derive(Debug, Clone)]
pub struct Scored {
    pub table: RawTable,
    pub report: ScoreReport,
}

impl Pipeline {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            fetch: FetchOptions::default(),
            policy: InvalidRecordPolicy::default(),
        }
    }

    /// Fetch the graft table and score it against `as_of_year`.
    ///
    /// Returns `Ok(None)` when the table has no rows. Scoring failures are
    /// returned as `ScoreError` inside the `anyhow::Error`, so callers can
    /// tell data problems from source problems with `downcast_ref`.
    pub async fn fetch_and_score(&self, as_of_year: i32) -> Result<Option<Scored>> {
        let table = load_table(&self.source, &self.fetch).await?;
        if table.is_empty() {
            tracing::warn!(source = %self.source, "Graft table is empty");
            return Ok(None);
        }

        let report = compute_scores_with(&table.rows, as_of_year, self.policy)?;

        for skipped in &report.skipped {
            tracing::warn!(error = %skipped, "Skipped invalid graft record");
        }
        tracing::debug!(
            scored = report.result.len(),
            skipped = report.skipped.len(),
            as_of_year,
            "Scored graft table"
        );

        Ok(Some(Scored { table, report }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreError;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const HEADER: &str = "graft_type,introduced,PRO,lysholm_score,LSI,RTS,long_term_success,complications,biomechanical_studies,citation_count\n";

    #[tokio::test]
    async fn test_fixture_pipeline() {
        let scored = Pipeline::new(Source::Fixture)
            .fetch_and_score(2024)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scored.table.len(), 4);
        assert_eq!(scored.report.result.len(), 4);
        assert!(scored.report.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_empty_table_is_none() {
        let file = write_csv(HEADER);
        let pipeline = Pipeline::new(Source::File(file.path().to_path_buf()));
        assert!(pipeline.fetch_and_score(2024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_score_error_is_downcastable() {
        let csv = format!(
            "{}hamstring,1990,85,90,92,80,88,5,2500,150\nhamstring,1990,85,90,92,80,88,5,2500,150\n",
            HEADER
        );
        let file = write_csv(&csv);
        let pipeline = Pipeline::new(Source::File(file.path().to_path_buf()));

        let err = pipeline.fetch_and_score(2024).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ScoreError>(),
            Some(&ScoreError::DuplicateKey("hamstring".to_string()))
        );
    }

    #[tokio::test]
    async fn test_skip_policy_reports_skipped() {
        let csv = format!(
            "{}hamstring,1990,85,90,92,80,88,5,2500,150\nfuture,2099,85,90,92,80,88,5,2500,150\n",
            HEADER
        );
        let file = write_csv(&csv);
        let mut pipeline = Pipeline::new(Source::File(file.path().to_path_buf()));
        pipeline.policy = InvalidRecordPolicy::Skip;

        let scored = pipeline.fetch_and_score(2024).await.unwrap().unwrap();
        assert_eq!(scored.report.result.len(), 1);
        assert_eq!(scored.report.skipped.len(), 1);
    }
}
