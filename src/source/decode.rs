use anyhow::{bail, Context, Result};
use std::io::{Cursor, Read};

use crate::scoring::{RawRecord, RawTable, GRAFT_TYPE_COLUMN};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Decode downloaded bytes into a raw graft table.
///
/// Zip archives are detected by their local-header magic; the first file
/// member matching `entry` (or simply the first file member) is parsed as CSV.
/// The extracted member may not exceed `max_bytes`.
pub fn decode_table(
    bytes: &[u8],
    entry: Option<&glob::Pattern>,
    max_bytes: usize,
) -> Result<RawTable> {
    if bytes.starts_with(ZIP_MAGIC) {
        let csv = extract_entry(bytes, entry, max_bytes)?;
        parse_csv(&csv)
    } else {
        parse_csv(bytes)
    }
}

fn extract_entry(
    bytes: &[u8],
    entry: Option<&glob::Pattern>,
    max_bytes: usize,
) -> Result<Vec<u8>> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to open zip archive")?;

    for index in 0..archive.len() {
        let mut file = archive
            .by_index(index)
            .with_context(|| format!("Failed to read zip member #{}", index))?;
        if file.is_dir() {
            continue;
        }
        if let Some(pattern) = entry {
            if !pattern.matches(file.name()) {
                continue;
            }
        }

        let name = file.name().to_string();
        tracing::debug!(member = %name, size = file.size(), "Extracting zip member");
        if file.size() > max_bytes as u64 {
            bail!(
                "Zip member {} is {} bytes, over the {} byte limit",
                name,
                file.size(),
                max_bytes
            );
        }

        // The header size is untrusted; cap the actual read as well
        let mut content = Vec::new();
        file.by_ref()
            .take(max_bytes as u64 + 1)
            .read_to_end(&mut content)
            .with_context(|| format!("Failed to extract {} from zip archive", name))?;
        if content.len() > max_bytes {
            bail!("Zip member {} expands past the {} byte limit", name, max_bytes);
        }
        return Ok(content);
    }

    match entry {
        Some(pattern) => bail!("Zip archive has no member matching '{}'", pattern),
        None => bail!("Zip archive contains no files"),
    }
}

/// Parse CSV text with a header row into a raw table.
///
/// Headers and fields are whitespace-trimmed. The `graft_type` column is
/// required; every other column is carried through as text.
pub fn parse_csv(data: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let Some(key_index) = columns.iter().position(|c| c == GRAFT_TYPE_COLUMN) else {
        bail!(
            "CSV has no '{}' column (found: {})",
            GRAFT_TYPE_COLUMN,
            columns.join(", ")
        );
    };

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        // +2: one-based, after the header
        let record = result.with_context(|| format!("Failed to parse CSV row {}", line + 2))?;

        let mut raw = RawRecord::new(record.get(key_index).unwrap_or_default());
        for (index, column) in columns.iter().enumerate() {
            if index == key_index {
                continue;
            }
            if let Some(value) = record.get(index) {
                raw.values.insert(column.clone(), value.to_string());
            }
        }
        rows.push(raw);
    }

    Ok(RawTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const CSV: &str = "graft_type,introduced,PRO,lysholm_score,LSI,RTS,long_term_success,complications,biomechanical_studies,citation_count\n\
hamstring,1990,85,90,92,80,88,5,2500,150\n\
patellar,1980,90,95,95,85,92,6,2600,200\n";

    const LIMIT: usize = 1024 * 1024;

    fn zip_of(members: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_plain_csv() {
        let table = decode_table(CSV.as_bytes(), None, LIMIT).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.rows[0].graft_type, "hamstring");
        assert_eq!(table.rows[0].get("LSI"), Some("92"));
        assert_eq!(table.rows[1].get("citation_count"), Some("200"));
    }

    #[test]
    fn test_headers_and_fields_are_trimmed() {
        let csv = " graft_type , PRO ,LSI\n hamstring , 85 ,92\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.columns, vec!["graft_type", "PRO", "LSI"]);
        assert_eq!(table.rows[0].graft_type, "hamstring");
        assert_eq!(table.rows[0].get("PRO"), Some("85"));
    }

    #[test]
    fn test_missing_key_column() {
        let csv = "name,PRO\nhamstring,85\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("graft_type"));
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let csv = "graft_type,introduced,PRO\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_blank_cells_are_missing() {
        let csv = "graft_type,PRO,LSI\nhamstring,,92\n";
        let table = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(table.rows[0].get("PRO"), None);
    }

    #[test]
    fn test_ragged_row_is_error() {
        let csv = "graft_type,PRO,LSI\nhamstring,85\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_zip_first_member() {
        let bytes = zip_of(&[("grafts.csv", CSV), ("notes.txt", "ignore me")]);
        let table = decode_table(&bytes, None, LIMIT).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_zip_entry_pattern_selects_member() {
        let bytes = zip_of(&[("README.txt", "not a table"), ("data/grafts.csv", CSV)]);
        let pattern = glob::Pattern::new("*.csv").unwrap();
        let table = decode_table(&bytes, Some(&pattern), LIMIT).unwrap();
        assert_eq!(table.rows[1].graft_type, "patellar");
    }

    #[test]
    fn test_zip_without_matching_member() {
        let bytes = zip_of(&[("README.txt", "not a table")]);
        let pattern = glob::Pattern::new("*.csv").unwrap();
        let err = decode_table(&bytes, Some(&pattern), LIMIT).unwrap_err();
        assert!(err.to_string().contains("*.csv"));
    }

    #[test]
    fn test_zip_member_over_limit() {
        let bytes = zip_of(&[("grafts.csv", CSV)]);
        let err = decode_table(&bytes, None, 64).unwrap_err();
        assert!(err.to_string().contains("over the 64 byte limit"));
    }

    #[test]
    fn test_compressed_member_checked_after_expansion() {
        let mut csv = String::from(CSV);
        for _ in 0..4000 {
            csv.push_str("hamstring,1990,85,90,92,80,88,5,2500,150\n");
        }
        let bytes = zip_of(&[("grafts.csv", csv.as_str())]);
        let limit = 50_000;
        assert!(bytes.len() < limit);
        assert!(csv.len() > limit);
        assert!(decode_table(&bytes, None, limit).is_err());
    }
}
