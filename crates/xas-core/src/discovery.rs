use crate::config::COLUMN_CONFIG_FILE;
use crate::domain::{XasError, XasResult};
use globset::Glob;
use std::fs;
use std::path::{Path, PathBuf};

/// Regular files directly inside `source_dir` whose name matches
/// `filename_pattern`, sorted by file name. The column configuration file
/// is never listed.
pub fn files_list(source_dir: &Path, filename_pattern: &str) -> XasResult<Vec<PathBuf>> {
    let matcher = Glob::new(filename_pattern)
        .map_err(|source| {
            XasError::input_validation(
                "INPUT.DISCOVERY_PATTERN",
                format!("invalid file pattern '{}': {}", filename_pattern, source),
            )
        })?
        .compile_matcher();

    let entries = fs::read_dir(source_dir).map_err(|source| {
        XasError::io_system(
            "IO.DISCOVERY_READ_DIR",
            format!(
                "failed to list directory '{}': {}",
                source_dir.display(),
                source
            ),
        )
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| {
            XasError::io_system(
                "IO.DISCOVERY_ENTRY",
                format!(
                    "failed to read entry in '{}': {}",
                    source_dir.display(),
                    source
                ),
            )
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if name == COLUMN_CONFIG_FILE {
            continue;
        }
        if matcher.is_match(Path::new(name)) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
