pub mod file;
pub mod formatter;

pub use file::write_output;
pub use formatter::{
    format_breakdown, format_data_table, format_json, format_score, format_scored_table,
    format_tsv, should_use_colors,
};
