use crate::domain::{XafsGroup, XasError, XasResult};
use std::fs;
use std::path::Path;

pub const NORM_CSV_HEADER: [&str; 3] = ["index", "energy", "norm"];

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> XasResult<()> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        XasError::io_system(
            "IO.ARTIFACT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Writes `index,energy,norm` rows for a normalized group.
pub fn write_norm_csv(path: &Path, group: &XafsGroup) -> XasResult<()> {
    let norm = group.norm().ok_or_else(|| {
        XasError::computation(
            "RUN.CSV_NOT_NORMALIZED",
            format!("'{}' has no normalized absorption to export", group.label),
        )
    })?;

    let csv_error = |source: csv::Error| {
        XasError::io_system(
            "IO.CSV_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(NORM_CSV_HEADER).map_err(csv_error)?;
    for (index, (energy, value)) in group.energy.iter().zip(norm).enumerate() {
        writer
            .write_record([index.to_string(), energy.to_string(), value.to_string()])
            .map_err(csv_error)?;
    }
    writer.flush().map_err(|source| {
        XasError::io_system(
            "IO.CSV_WRITE",
            format!("failed to flush '{}': {}", path.display(), source),
        )
    })
}
