use super::CliError;
use super::logging::init_logging;
use anyhow::Context;
use clap::builder::BoolishValueParser;
use std::path::PathBuf;
use tracing::debug;
use xas_core::discovery::{file_name_string, files_list};
use xas_core::engine::AnalysisSession;
use xas_core::grouping::group_files;
use xas_core::pipeline::{BatchConfig, BatchReport, run_batch};

const PROCESS_ARGUMENTS: &str = "<dir> <pattern> [group]";
const GROUPS_ARGUMENTS: &str = "<dir> <pattern>";

#[derive(clap::Args)]
pub(super) struct ProcessArgs {
    /// Directory holding the data files
    #[arg(value_name = "dir")]
    dir: Option<PathBuf>,

    /// Glob matched against file names, e.g. '*.dat'
    #[arg(value_name = "pattern")]
    pattern: Option<String>,

    /// Group files by shared filename substrings (true/false/yes/no/1/0)
    #[arg(
        value_name = "group",
        default_value = "true",
        action = clap::ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    group: bool,

    /// Output directory [default: <dir>/processed]
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub(super) struct GroupsArgs {
    /// Directory holding the data files
    #[arg(value_name = "dir")]
    dir: Option<PathBuf>,

    /// Glob matched against file names, e.g. '*.dat'
    #[arg(value_name = "pattern")]
    pattern: Option<String>,
}

impl ProcessArgs {
    fn into_config(self) -> Option<BatchConfig> {
        let (dir, pattern) = (self.dir?, self.pattern?);
        let config = BatchConfig::new(dir, pattern, self.group);
        Some(match self.output {
            Some(output) => config.with_output_dir(output),
            None => config,
        })
    }
}

pub(super) fn run_process_command(args: ProcessArgs) -> Result<i32, CliError> {
    let Some(config) = args.into_config() else {
        println!("{}", missing_arguments_message("process", PROCESS_ARGUMENTS));
        return Ok(0);
    };

    init_logging(Some(&config.output_dir))?;
    let session = AnalysisSession::default();
    debug!(?session, ?config, "analysis session ready");
    let report = run_batch(&session, &config).map_err(CliError::Compute)?;
    println!("{}", render_batch_summary(&report));
    println!("Outputs: {}", config.output_dir.display());
    Ok(0)
}

pub(super) fn run_groups_command(args: GroupsArgs) -> Result<i32, CliError> {
    let (Some(dir), Some(pattern)) = (args.dir, args.pattern) else {
        println!("{}", missing_arguments_message("groups", GROUPS_ARGUMENTS));
        return Ok(0);
    };

    init_logging(None)?;
    let files = files_list(&dir, &pattern).map_err(CliError::Compute)?;
    let names: Vec<String> = files.iter().map(|path| file_name_string(path)).collect();
    let groups = group_files(&names);
    let rendered =
        serde_json::to_string_pretty(&groups).context("failed to serialize file groups")?;
    println!("{}", rendered);
    Ok(0)
}

fn missing_arguments_message(command: &str, expected: &str) -> String {
    format!(
        "missing arguments; expected: xas-batch {} {}",
        command, expected
    )
}

fn render_batch_summary(report: &BatchReport) -> String {
    let mut lines = vec![format!(
        "Processed {} file(s) in {} batch(es)",
        report.files_found,
        report.batches.len()
    )];
    if let Some(path) = &report.column_config {
        lines.push(format!("Column configuration: {}", path.display()));
    }
    for batch in &report.batches {
        lines.push(format!(
            "  {}: {} member(s), {} artifact(s)",
            batch.key,
            batch.members.len(),
            batch.artifacts.len()
        ));
    }
    lines.join("\n")
}
