use crate::domain::model::{DestinationMode, RowRecord};
use crate::utils::error::{MergeError, Result};
use std::path::{Path, PathBuf};

/// Fields consulted, in order, for the output base name in `FromRecord` mode.
pub const FILE_NAME_KEYS: [&str; 2] = ["FileName", "Dateiname"];

/// Computes the destination path of one row.
///
/// The directory is `output_dir` when given, the template's directory otherwise.
/// The extension always comes from the template.
pub fn resolve(
    template_path: &Path,
    row: &RowRecord,
    mode: DestinationMode,
    output_dir: Option<&Path>,
    row_index: usize,
) -> Result<PathBuf> {
    let base_name = match mode {
        DestinationMode::Fixed => template_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .ok_or_else(|| MergeError::InvalidDestinationName {
                value: template_path.display().to_string(),
                reason: "template path has no file name".to_string(),
            })?,
        DestinationMode::FromRecord => {
            let value = FILE_NAME_KEYS
                .iter()
                .find_map(|key| row.get(key))
                .ok_or_else(|| MergeError::MissingField {
                    tried: FILE_NAME_KEYS.iter().map(|k| k.to_string()).collect(),
                    row: row_index,
                })?;
            check_base_name(value)?;
            value.to_string()
        }
    };

    let file_name = match template_path.extension() {
        Some(ext) => format!("{}.{}", base_name, ext.to_string_lossy()),
        None => base_name,
    };

    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => template_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    Ok(dir.join(file_name))
}

fn check_base_name(value: &str) -> Result<()> {
    let reason = if value.trim().is_empty() {
        Some("file name is empty")
    } else if value.contains('/') || value.contains('\\') {
        Some("file name contains a path separator")
    } else if value == "." || value == ".." {
        Some("file name refers to a directory")
    } else if value.contains('\0') {
        Some("file name contains null bytes")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(MergeError::InvalidDestinationName {
            value: value.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
