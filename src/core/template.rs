use crate::core::substitutor;
use crate::utils::error::{MergeError, Result};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Handle on a template file. Nothing is cached: every call to [`lines`]
/// opens the file again.
///
/// [`lines`]: TemplateDocument::lines
#[derive(Debug, Clone)]
pub struct TemplateDocument {
    path: PathBuf,
}

impl TemplateDocument {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Self { path }),
            Ok(_) => Err(MergeError::TemplateNotFound { path }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MergeError::TemplateNotFound { path })
            }
            Err(e) => Err(MergeError::io(path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn lines(&self) -> Result<TemplateLines> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| MergeError::io(&self.path, e))?;
        Ok(TemplateLines {
            path: self.path.clone(),
            reader: BufReader::new(file),
            buf: String::new(),
        })
    }

    pub async fn placeholders(&self) -> Result<Vec<String>> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| MergeError::io(&self.path, e))?;
        Ok(substitutor::placeholders(&text))
    }
}

/// One template line with its original terminator split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub content: String,
    pub ending: &'static str,
}

pub struct TemplateLines {
    path: PathBuf,
    reader: BufReader<File>,
    buf: String,
}

impl TemplateLines {
    pub async fn next_line(&mut self) -> Result<Option<Line>> {
        self.buf.clear();
        let read = self
            .reader
            .read_line(&mut self.buf)
            .await
            .map_err(|e| MergeError::io(&self.path, e))?;
        if read == 0 {
            return Ok(None);
        }

        let (content, ending) = if let Some(stripped) = self.buf.strip_suffix("\r\n") {
            (stripped, "\r\n")
        } else if let Some(stripped) = self.buf.strip_suffix('\n') {
            (stripped, "\n")
        } else {
            (self.buf.as_str(), "")
        };

        Ok(Some(Line {
            content: content.to_string(),
            ending,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = TemplateDocument::open(dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, MergeError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_open_directory_is_not_a_template() {
        let dir = TempDir::new().unwrap();
        let err = TemplateDocument::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, MergeError::TemplateNotFound { .. }));
    }

    #[tokio::test]
    async fn test_lines_keep_their_endings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "first\r\nsecond\n\nlast").unwrap();

        let template = TemplateDocument::open(&path).await.unwrap();
        let mut lines = template.lines().await.unwrap();
        let mut collected = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            collected.push(line);
        }

        assert_eq!(
            collected,
            vec![
                Line { content: "first".into(), ending: "\r\n" },
                Line { content: "second".into(), ending: "\n" },
                Line { content: "".into(), ending: "\n" },
                Line { content: "last".into(), ending: "" },
            ]
        );
    }

    #[tokio::test]
    async fn test_placeholders_scan_whole_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "Hello {{Name}}\nCode: {{Code}}\nBye {{Name}}\n").unwrap();

        let template = TemplateDocument::open(&path).await.unwrap();
        assert_eq!(
            template.placeholders().await.unwrap(),
            vec!["Name".to_string(), "Code".to_string()]
        );
    }
}
