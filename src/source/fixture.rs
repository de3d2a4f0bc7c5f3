use crate::scoring::{Field, RawRecord, RawTable, GRAFT_TYPE_COLUMN};

// (graft_type, introduced, PRO, lysholm, LSI, RTS, long_term_success,
//  complications, biomechanical_studies, citation_count)
const SAMPLE_ROWS: [(&str, [u32; 9]); 4] = [
    ("hamstring", [1990, 85, 90, 92, 80, 88, 5, 2500, 150]),
    ("quadricep", [2000, 80, 85, 88, 75, 85, 7, 2400, 120]),
    ("patellar", [1980, 90, 95, 95, 85, 92, 6, 2600, 200]),
    ("achilles_allograft", [2010, 75, 80, 85, 70, 80, 10, 2300, 100]),
];

/// Built-in sample graft table, used by the `fixture` source.
pub fn sample_table() -> RawTable {
    let mut columns = vec![GRAFT_TYPE_COLUMN.to_string()];
    columns.extend(Field::ALL.iter().map(|f| f.column().to_string()));

    let rows = SAMPLE_ROWS
        .iter()
        .map(|(graft_type, values)| {
            Field::ALL
                .iter()
                .zip(values)
                .fold(RawRecord::new(*graft_type), |record, (field, value)| {
                    record.with(field.column(), value)
                })
        })
        .collect();

    RawTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::compute_scores;

    #[test]
    fn test_sample_table_shape() {
        let table = sample_table();
        assert_eq!(table.len(), 4);
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.columns[0], "graft_type");
        assert_eq!(table.rows[2].graft_type, "patellar");
        assert_eq!(table.rows[2].get("citation_count"), Some("200"));
    }

    #[test]
    fn test_sample_table_scores_cleanly() {
        let result = compute_scores(&sample_table().rows, 2024).unwrap();
        assert_eq!(result.len(), 4);
        let ranked = result.ranked();
        assert_eq!(ranked[0].graft_type(), "patellar");
    }
}
