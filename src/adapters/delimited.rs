use crate::core::{RowRecord, TabularReader};
use crate::utils::error::{MergeError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const SNIFFED_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Reads CSV/TSV style files. The first non-empty line is the header.
#[derive(Debug, Clone)]
pub struct DelimitedReader {
    path: PathBuf,
    delimiter: Option<u8>,
}

impl DelimitedReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            delimiter: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Explicit delimiter, then extension, then a guess from the header line.
    fn delimiter_for(&self, content: &str) -> u8 {
        if let Some(delimiter) = self.delimiter {
            return delimiter;
        }
        match self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") => b'\t',
            Some("csv") => b',',
            _ => sniff_delimiter(content),
        }
    }

    pub fn parse(&self, content: &str) -> Result<Vec<RowRecord>> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let delimiter = self.delimiter_for(content);
        tracing::debug!(
            "Parsing {} with delimiter {:?}",
            self.path.display(),
            delimiter as char
        );

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        check_headers(&headers)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() != headers.len() {
                return Err(MergeError::DatasetFormat {
                    line,
                    message: format!(
                        "expected {} fields but found {}",
                        headers.len(),
                        record.len()
                    ),
                });
            }
            let values: Vec<String> = record.iter().map(str::to_string).collect();
            rows.push(RowRecord::from_header(&headers, &values));
        }

        Ok(rows)
    }
}

#[async_trait]
impl TabularReader for DelimitedReader {
    async fn read_rows(&self) -> Result<Vec<RowRecord>> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| MergeError::io(&self.path, e))?;
        let content = String::from_utf8(bytes).map_err(|e| MergeError::DatasetFormat {
            line: 0,
            message: format!("dataset is not valid UTF-8: {}", e),
        })?;
        self.parse(&content)
    }
}

fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    SNIFFED_DELIMITERS
        .iter()
        .copied()
        .map(|d| (d, header.bytes().filter(|b| *b == d).count()))
        .filter(|(_, count)| *count > 0)
        .max_by_key(|(_, count)| *count)
        .map(|(d, _)| d)
        .unwrap_or(b',')
}

fn check_headers(headers: &[String]) -> Result<()> {
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(MergeError::DatasetFormat {
            line: 1,
            message: "dataset has no header row".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (column, header) in headers.iter().enumerate() {
        if header.is_empty() {
            return Err(MergeError::DatasetFormat {
                line: 1,
                message: format!("column {} has an empty header", column + 1),
            });
        }
        if !seen.insert(header.as_str()) {
            return Err(MergeError::DatasetFormat {
                line: 1,
                message: format!("duplicate column '{}'", header),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_csv_rows() {
        let reader = DelimitedReader::new("data.csv");
        let rows = reader
            .parse("FileName,Name,Amount\ninvoice1,Ana,9.99\ninvoice2,\"Bo, Jr.\",1.00\n")
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("FileName"), Some("invoice1"));
        assert_eq!(rows[1].get("Name"), Some("Bo, Jr."));
        assert_eq!(rows[1].get("Amount"), Some("1.00"));
    }

    #[test]
    fn test_parse_tsv_by_extension() {
        let reader = DelimitedReader::new("data.tsv");
        let rows = reader.parse("Name\tCode\nAna\t42\n").unwrap();
        assert_eq!(rows[0].get("Code"), Some("42"));
    }

    #[test]
    fn test_sniff_semicolon_and_strip_bom() {
        let reader = DelimitedReader::new("data.txt");
        let rows = reader
            .parse("\u{feff}Dateiname;Betrag\nrechnung1;9,99\n")
            .unwrap();
        assert_eq!(rows[0].get("Dateiname"), Some("rechnung1"));
        assert_eq!(rows[0].get("Betrag"), Some("9,99"));
    }

    #[test]
    fn test_explicit_delimiter_wins() {
        let reader = DelimitedReader::new("data.csv").with_delimiter(b'|');
        let rows = reader.parse("A|B\n1|2\n").unwrap();
        assert_eq!(rows[0].get("B"), Some("2"));
    }

    #[test]
    fn test_headers_are_trimmed_and_blank_lines_skipped() {
        let reader = DelimitedReader::new("data.csv");
        let rows = reader.parse(" Name , Code \n\nAna,42\n\n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Name"), Some("Ana"));
        assert_eq!(rows[0].get("Code"), Some("42"));
    }

    #[test]
    fn test_ragged_row_is_rejected() {
        let reader = DelimitedReader::new("data.csv");
        let err = reader.parse("A,B\n1,2\n3\n").unwrap_err();
        match err {
            MergeError::DatasetFormat { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 2"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bad_headers_are_rejected() {
        let reader = DelimitedReader::new("data.csv");
        assert!(matches!(
            reader.parse(""),
            Err(MergeError::DatasetFormat { .. })
        ));
        assert!(matches!(
            reader.parse("A,,C\n1,2,3\n"),
            Err(MergeError::DatasetFormat { .. })
        ));
        assert!(matches!(
            reader.parse("A,A\n1,2\n"),
            Err(MergeError::DatasetFormat { .. })
        ));
    }

    #[tokio::test]
    async fn test_read_rows_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "Name,Code\r\nAna,42\r\n").unwrap();

        let rows = DelimitedReader::new(&path).read_rows().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Code"), Some("42"));
    }

    #[tokio::test]
    async fn test_read_rows_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = DelimitedReader::new(dir.path().join("none.csv"))
            .read_rows()
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::Io { .. }));
    }
}
