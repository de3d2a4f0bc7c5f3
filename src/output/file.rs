use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::Write;
use std::path::Path;

/// Write rendered output to a file atomically
///
/// The file is never left half-written: readers see either the old contents
/// or the new ones. A trailing newline is added.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .and_then(|_| file.write_all(b"\n"))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    file.commit()
        .with_context(|| format!("Failed to save {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_output_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");

        write_output(&path, "{\"old\": 1.0}").unwrap();
        write_output(&path, "{\"hamstring\": 158865.0}").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"hamstring\": 158865.0}\n");
    }

    #[test]
    fn test_write_output_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("scores.json");
        assert!(write_output(&path, "{}").is_err());
    }
}
