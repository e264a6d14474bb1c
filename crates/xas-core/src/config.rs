//! Column configuration for a data directory.
//!
//! A directory may carry an `xas_columns.toml` file saying which column of
//! each data file holds which signal:
//!
//! ```toml
//! [columns]
//! energy = 0
//! i0 = 1
//! it = 2
//! ir = 3
//! ```
//!
//! Without the file the default layout is energy, time, i0, it, ir in
//! columns 0 to 4; only energy must exist.

use crate::domain::{XasError, XasResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const COLUMN_CONFIG_FILE: &str = "xas_columns.toml";

/// Where a channel is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnSlot {
    #[default]
    Absent,
    /// The column must exist.
    Required(usize),
    /// Read the column if the file has it.
    IfPresent(usize),
}

impl ColumnSlot {
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::Absent => None,
            Self::Required(index) | Self::IfPresent(index) => Some(index),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub energy: usize,
    pub time: ColumnSlot,
    pub i0: ColumnSlot,
    pub it: ColumnSlot,
    pub ir: ColumnSlot,
    pub mu: ColumnSlot,
    pub mu_ref: ColumnSlot,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            energy: 0,
            time: ColumnSlot::IfPresent(1),
            i0: ColumnSlot::IfPresent(2),
            it: ColumnSlot::IfPresent(3),
            ir: ColumnSlot::IfPresent(4),
            mu: ColumnSlot::Absent,
            mu_ref: ColumnSlot::Absent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConfig {
    pub mapping: ColumnMapping,
    pub source: ConfigSource,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnConfigFile {
    columns: ColumnTable,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnTable {
    energy: usize,
    time: Option<usize>,
    i0: Option<usize>,
    it: Option<usize>,
    ir: Option<usize>,
    mu: Option<usize>,
    mu_ref: Option<usize>,
}

impl From<ColumnTable> for ColumnMapping {
    fn from(table: ColumnTable) -> Self {
        let slot = |index: Option<usize>| index.map_or(ColumnSlot::Absent, ColumnSlot::Required);
        Self {
            energy: table.energy,
            time: slot(table.time),
            i0: slot(table.i0),
            it: slot(table.it),
            ir: slot(table.ir),
            mu: slot(table.mu),
            mu_ref: slot(table.mu_ref),
        }
    }
}

/// Channels named in a configuration file are required; the rest are absent.
pub fn parse_column_config(source: &str) -> XasResult<ColumnMapping> {
    toml::from_str::<ColumnConfigFile>(source)
        .map(|file| ColumnMapping::from(file.columns))
        .map_err(|error| {
            XasError::input_validation(
                "INPUT.COLUMN_CONFIG",
                format!("invalid column configuration: {}", error.message()),
            )
        })
}

pub fn load_column_config(data_dir: &Path) -> XasResult<ColumnConfig> {
    let path = data_dir.join(COLUMN_CONFIG_FILE);
    if !path.is_file() {
        warn!(
            path = %path.display(),
            "column configuration missing, using default column layout"
        );
        return Ok(ColumnConfig {
            mapping: ColumnMapping::default(),
            source: ConfigSource::Default,
        });
    }

    let source = fs::read_to_string(&path).map_err(|error| {
        XasError::io_system(
            "IO.COLUMN_CONFIG_READ",
            format!("failed to read '{}': {}", path.display(), error),
        )
    })?;
    let mapping = parse_column_config(&source).map_err(|error| {
        XasError::input_validation(
            error.placeholder(),
            format!("{} ({})", error.message(), path.display()),
        )
    })?;
    info!(path = %path.display(), ?mapping, "loaded column configuration");

    Ok(ColumnConfig {
        mapping,
        source: ConfigSource::File(path),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        COLUMN_CONFIG_FILE, ColumnMapping, ColumnSlot, ConfigSource, load_column_config,
        parse_column_config,
    };
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn configured_channels_become_required() {
        let mapping = parse_column_config(
            "[columns]\nenergy = 0\ntime = 1\ni0 = 2\nit = 3\nir = 4\n",
        )
        .expect("config should parse");

        assert_eq!(mapping.energy, 0);
        assert_eq!(mapping.time, ColumnSlot::Required(1));
        assert_eq!(mapping.it, ColumnSlot::Required(3));
        assert_eq!(mapping.mu, ColumnSlot::Absent);
        assert_eq!(mapping.ir.index(), Some(4));
    }

    #[test]
    fn default_layout_is_energy_time_i0_it_ir() {
        let mapping = ColumnMapping::default();
        assert_eq!(mapping.energy, 0);
        assert_eq!(mapping.time, ColumnSlot::IfPresent(1));
        assert_eq!(mapping.i0, ColumnSlot::IfPresent(2));
        assert_eq!(mapping.it, ColumnSlot::IfPresent(3));
        assert_eq!(mapping.ir, ColumnSlot::IfPresent(4));
        assert_eq!(mapping.mu, ColumnSlot::Absent);
        assert_eq!(mapping.mu_ref, ColumnSlot::Absent);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let error = parse_column_config("[columns]\nenergy = 0\nflux = 3\n")
            .expect_err("flux is not a channel");
        assert_eq!(error.placeholder(), "INPUT.COLUMN_CONFIG");
    }

    #[test]
    fn energy_is_mandatory() {
        assert!(parse_column_config("[columns]\ni0 = 1\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().expect("tempdir should be created");
        let config = load_column_config(temp.path()).expect("defaults");
        assert_eq!(config.source, ConfigSource::Default);
        assert_eq!(config.mapping, ColumnMapping::default());
    }

    #[test]
    fn present_file_is_loaded() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join(COLUMN_CONFIG_FILE);
        fs::write(&path, "[columns]\nenergy = 1\nmu = 2\n").expect("config write");

        let config = load_column_config(temp.path()).expect("config should load");
        assert_eq!(config.source, ConfigSource::File(path));
        assert_eq!(config.mapping.energy, 1);
        assert_eq!(config.mapping.mu, ColumnSlot::Required(2));
        assert_eq!(config.mapping.i0, ColumnSlot::Absent);
    }

    #[test]
    fn malformed_file_is_an_input_error() {
        let temp = TempDir::new().expect("tempdir should be created");
        fs::write(temp.path().join(COLUMN_CONFIG_FILE), "[columns\nenergy = ")
            .expect("config write");
        let error = load_column_config(temp.path()).expect_err("malformed");
        assert_eq!(error.exit_code(), 2);
    }
}
