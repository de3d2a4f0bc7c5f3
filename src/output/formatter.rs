use std::io::IsTerminal;
use owo_colors::OwoColorize;
use terminal_size::{Width, terminal_size};

use crate::scoring::{RawTable, ScoreResult, ScoredGraft, GRAFT_TYPE_COLUMN};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score in compact notation (1.5k, 2.3M, 847)
pub fn format_score(score: f64) -> String {
    let formatted = if score >= 1_000_000.0 {
        format!("{:.1}M", score / 1_000_000.0)
    } else if score >= 1_000.0 {
        format!("{:.1}k", score / 1_000.0)
    } else {
        format!("{:.0}", score)
    };

    // Trim trailing .0 (e.g., "1.0k" -> "1k")
    formatted
        .replace(".0M", "M")
        .replace(".0k", "k")
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate a label to fit available width, accounting for Unicode
fn truncate_label(label: &str, max_width: usize) -> String {
    let chars: Vec<char> = label.chars().collect();
    if chars.len() <= max_width {
        label.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

/// Format scores as a ranked table: Index, Score, Graft type.
/// Highest score first. Score column is right-aligned, 8 chars wide.
pub fn format_scored_table(result: &ScoreResult, use_colors: bool) -> String {
    if result.is_empty() {
        return "No graft data available.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = 3;
    let score_width = 8;
    let separator = "  ";
    let fixed_width = index_width + 1 + score_width + separator.len();

    result
        .ranked()
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_padded = format!("{:>width$}", format_score(entry.score()), width = score_width);

            let label = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_label(entry.graft_type(), width - fixed_width)
                }
                Some(_) => truncate_label(entry.graft_type(), 20),
                None => entry.graft_type().to_string(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}",
                    index_str.dimmed(),
                    score_padded.bold(),
                    separator,
                    label.cyan()
                )
            } else {
                format!("{} {}{}{}", index_str, score_padded, separator, label)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format one scored graft with its factor breakdown (for verbose mode)
pub fn format_breakdown(entry: &ScoredGraft, use_colors: bool) -> String {
    let mut lines = Vec::new();
    let header = format!("{}  (introduced {})", entry.graft_type(), entry.record.introduced);
    if use_colors {
        lines.push(header.bold().to_string());
    } else {
        lines.push(header);
    }

    for (label, value) in entry.lindy.breakdown.factors() {
        lines.push(format!("  {:<22}{:>12.4}", format!("{}:", label), value));
    }

    let total = format!("  {:<22}{:>12.2}", "Lindy score:", entry.score());
    if use_colors {
        lines.push(total.green().to_string());
    } else {
        lines.push(total);
    }

    lines.join("\n")
}

/// Format scores as tab-separated values for scripting
/// Columns: graft_type, score (two decimals), ranked, no headers, no colors
pub fn format_tsv(result: &ScoreResult) -> String {
    result
        .ranked()
        .iter()
        .map(|entry| format!("{}\t{:.2}", entry.graft_type(), entry.score()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format scores as a JSON object mapping graft type to score
pub fn format_json(result: &ScoreResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

/// Format the raw graft table as loaded, with aligned columns and a header row
pub fn format_data_table(table: &RawTable, use_colors: bool) -> String {
    if table.is_empty() {
        return "No graft data available.".to_string();
    }

    let cells: Vec<Vec<&str>> = table
        .rows
        .iter()
        .map(|row| {
            table
                .columns
                .iter()
                .map(|column| {
                    if column == GRAFT_TYPE_COLUMN {
                        row.graft_type.as_str()
                    } else {
                        row.get(column).unwrap_or("")
                    }
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (value, width))| {
                // Label column left-aligned, numbers right-aligned
                if i == 0 {
                    format!("{:<width$}", value, width = *width)
                } else {
                    format!("{:>width$}", value, width = *width)
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let header = render(table.columns.iter().map(String::as_str).collect());
    let mut lines = vec![if use_colors {
        header.bold().to_string()
    } else {
        header
    }];
    lines.extend(cells.into_iter().map(render));
    lines.join("\n")
}
