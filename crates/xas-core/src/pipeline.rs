//! Batch processing of a data directory.
//!
//! A run discovers files, clusters them into batches and then processes one
//! batch at a time: read every member, normalize it, plot it, merge the
//! members, and write the merged CSV, figure and project bundle. The first
//! failure stops the run; outputs already written stay on disk.

use crate::ascii::read_ascii;
use crate::config::{ColumnConfig, ColumnMapping, ConfigSource, load_column_config};
use crate::discovery::{file_name_string, files_list};
use crate::domain::{XafsGroup, XasError, XasResult};
use crate::engine::{AnalysisSession, calc_with_defaults};
use crate::grouping::group_files;
use crate::merge::merge_groups;
use crate::plot::{plot_group, plot_merge};
use crate::project::{PROJECT_EXTENSION, Project};
use crate::serialization::write_norm_csv;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

pub const DEFAULT_OUTPUT_SUBDIR: &str = "processed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    pub data_dir: PathBuf,
    pub pattern: String,
    pub grouped: bool,
    pub output_dir: PathBuf,
}

impl BatchConfig {
    pub fn new(data_dir: impl Into<PathBuf>, pattern: impl Into<String>, grouped: bool) -> Self {
        let data_dir = data_dir.into();
        let output_dir = data_dir.join(DEFAULT_OUTPUT_SUBDIR);
        Self {
            data_dir,
            pattern: pattern.into(),
            grouped,
            output_dir,
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

/// Files processed and merged together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Batch {
    pub key: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    FilePlot,
    MergePlot,
    NormCsv,
    Project,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputArtifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub key: String,
    pub members: Vec<String>,
    pub artifacts: Vec<OutputArtifact>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub files_found: usize,
    pub column_config: Option<PathBuf>,
    pub batches: Vec<BatchOutcome>,
}

/// Splits a sorted file listing into batches.
///
/// Grouped mode clusters by filename and then gives every file no cluster
/// claimed its own batch, keyed by file name. Ungrouped mode makes every
/// file a singleton. File names rather than stems keep scans such as
/// `Fe.000` and `Fe.100` apart.
pub fn plan_batches(files: &[PathBuf], grouped: bool) -> Vec<Batch> {
    let singleton = |path: &PathBuf| Batch {
        key: file_name_string(path),
        files: vec![path.clone()],
    };

    if !grouped {
        return files.iter().map(singleton).collect();
    }

    let names: Vec<String> = files.iter().map(|path| file_name_string(path)).collect();
    let groups = group_files(&names);
    let path_for = |name: &str| {
        names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| files[index].clone())
    };

    let mut batches: Vec<Batch> = groups
        .iter()
        .map(|group| Batch {
            key: group.key.clone(),
            files: group
                .files
                .iter()
                .filter_map(|name| path_for(name.as_str()))
                .collect(),
        })
        .collect();

    for (name, path) in names.iter().zip(files) {
        if !groups.grouped_files().any(|grouped| grouped == name.as_str()) {
            info!(file = %name, "file matched no group, processing on its own");
            batches.push(singleton(path));
        }
    }

    batches
}

pub fn run_batch(session: &AnalysisSession, config: &BatchConfig) -> XasResult<BatchReport> {
    let files = files_list(&config.data_dir, &config.pattern)?;
    info!(
        dir = %config.data_dir.display(),
        pattern = %config.pattern,
        count = files.len(),
        "discovered data files"
    );

    let ColumnConfig { mapping, source } = load_column_config(&config.data_dir)?;
    let column_config = match source {
        ConfigSource::File(path) => Some(path),
        ConfigSource::Default => None,
    };

    let batches = plan_batches(&files, config.grouped);
    for batch in &batches {
        let members: Vec<String> = batch.files.iter().map(|path| file_name_string(path)).collect();
        info!(key = %batch.key, ?members, "batch planned");
    }

    ensure_dir(&config.output_dir)?;
    let mut outcomes = Vec::with_capacity(batches.len());
    for batch in &batches {
        let span = info_span!("batch", key = %batch.key);
        let _entered = span.enter();
        outcomes.push(process_batch(session, &mapping, batch, &config.output_dir)?);
        info!("batch complete");
    }

    info!(batches = outcomes.len(), "run complete");
    Ok(BatchReport {
        files_found: files.len(),
        column_config,
        batches: outcomes,
    })
}

fn process_batch(
    session: &AnalysisSession,
    mapping: &ColumnMapping,
    batch: &Batch,
    output_root: &Path,
) -> XasResult<BatchOutcome> {
    let batch_dir = output_root.join(sanitize_key(&batch.key));
    ensure_dir(&batch_dir)?;

    let mut artifacts = Vec::new();
    let mut groups = Vec::with_capacity(batch.files.len());
    for path in &batch.files {
        let table = read_ascii(path)?;
        let name = file_name_string(path);
        let mut group = XafsGroup::from_table(&name, Some(path.clone()), &table, mapping)?;
        calc_with_defaults(session, &mut group)?;

        let plot_path = batch_dir.join(format!("{}.svg", sanitize_key(&name)));
        plot_group(&plot_path, &group)?;
        artifacts.push(OutputArtifact {
            kind: ArtifactKind::FilePlot,
            path: plot_path,
        });
        groups.push(group);
    }

    let merged_label = format!("{}_merged", sanitize_key(&batch.key));
    let mut merged = merge_groups(&merged_label, &groups)?;
    calc_with_defaults(session, &mut merged)?;

    let merge_plot = batch_dir.join(format!("{}.svg", merged_label));
    plot_merge(&merge_plot, &groups, &merged)?;
    artifacts.push(OutputArtifact {
        kind: ArtifactKind::MergePlot,
        path: merge_plot,
    });

    let csv_path = batch_dir.join(format!("{}.csv", sanitize_key(&batch.key)));
    write_norm_csv(&csv_path, &merged)?;
    artifacts.push(OutputArtifact {
        kind: ArtifactKind::NormCsv,
        path: csv_path,
    });

    let members = groups.iter().map(|group| group.label.clone()).collect();
    let mut project = Project::new(batch.key.clone());
    for group in groups {
        project.add_group(group);
    }
    project.add_group(merged);
    let project_path = batch_dir.join(format!("{}.{}", sanitize_key(&batch.key), PROJECT_EXTENSION));
    project.save(&project_path)?;
    artifacts.push(OutputArtifact {
        kind: ArtifactKind::Project,
        path: project_path,
    });

    Ok(BatchOutcome {
        key: batch.key.clone(),
        members,
        artifacts,
    })
}

/// Group keys are arbitrary filename fragments; keep them usable as path
/// components.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_matches('.');
    if trimmed.is_empty() {
        "group".to_string()
    } else {
        trimmed.to_string()
    }
}

fn ensure_dir(path: &Path) -> XasResult<()> {
    fs::create_dir_all(path).map_err(|source| {
        XasError::io_system(
            "IO.OUTPUT_DIR",
            format!(
                "failed to create output directory '{}': {}",
                path.display(),
                source
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::{BatchConfig, plan_batches, sanitize_key};
    use std::path::{Path, PathBuf};

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| Path::new("/data").join(name)).collect()
    }

    #[test]
    fn ungrouped_mode_makes_singletons() {
        let batches = plan_batches(&paths(&["a_1.dat", "a_2.dat"]), false);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].key, "a_1.dat");
        assert_eq!(batches[1].files, [PathBuf::from("/data/a_2.dat")]);
    }

    #[test]
    fn grouped_mode_adds_leftover_files_as_singletons() {
        let batches = plan_batches(
            &paths(&["sample1_rep1.txt", "sample1_rep2.txt", "sample2_rep1.txt"]),
            true,
        );

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].key, "sample1_rep");
        assert_eq!(
            batches[0].files,
            paths(&["sample1_rep1.txt", "sample1_rep2.txt"])
        );
        assert_eq!(batches[1].key, "sample2_rep1.txt");
        assert_eq!(batches[1].files, paths(&["sample2_rep1.txt"]));
    }

    #[test]
    fn scans_sharing_a_stem_get_distinct_singleton_keys() {
        let files = paths(&[
            "Fe_lepidocrocite.000",
            "Fe_lepidocrocite.100",
            "Fe_lepidocrocite.200",
        ]);
        let keys: Vec<String> = plan_batches(&files, false)
            .into_iter()
            .map(|batch| batch.key)
            .collect();
        assert_eq!(
            keys,
            [
                "Fe_lepidocrocite.000",
                "Fe_lepidocrocite.100",
                "Fe_lepidocrocite.200"
            ]
        );
    }

    #[test]
    fn empty_listing_plans_nothing() {
        assert!(plan_batches(&[], true).is_empty());
        assert!(plan_batches(&[], false).is_empty());
    }

    #[test]
    fn default_output_dir_is_under_data_dir() {
        let config = BatchConfig::new("/data", "*.dat", true);
        assert_eq!(config.output_dir, PathBuf::from("/data/processed"));
        let config = config.with_output_dir("/tmp/out");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn keys_are_made_path_safe() {
        assert_eq!(sanitize_key("Fe lepi/doc"), "Fe_lepi_doc");
        assert_eq!(sanitize_key(".dat"), "dat");
        assert_eq!(sanitize_key(".."), "group");
    }
}
