pub mod errors;

pub use errors::{XasError, XasErrorCategory, XasResult};

use crate::ascii::DataTable;
use crate::config::{ColumnMapping, ColumnSlot};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Semantic meaning of a data column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnField {
    Energy,
    Time,
    I0,
    It,
    Ir,
    Mu,
    MuRef,
}

impl ColumnField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Energy => "energy",
            Self::Time => "time",
            Self::I0 => "i0",
            Self::It => "it",
            Self::Ir => "ir",
            Self::Mu => "mu",
            Self::MuRef => "mu_ref",
        }
    }
}

impl Display for ColumnField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Output of the pre-edge stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub e0: f64,
    pub edge_step: f64,
    pub pre_edge: Vec<f64>,
    pub post_edge: Vec<f64>,
    pub norm: Vec<f64>,
    pub flat: Vec<f64>,
}

/// Output of the background-removal stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    pub bkg: Vec<f64>,
    pub k: Vec<f64>,
    pub chi: Vec<f64>,
}

/// Output of the forward Fourier transform stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RSpace {
    pub r: Vec<f64>,
    pub chir: Vec<Complex64>,
    pub chir_mag: Vec<f64>,
}

impl RSpace {
    pub fn from_complex(r: Vec<f64>, chir: Vec<Complex64>) -> Self {
        let chir_mag = chir.iter().map(|value| value.norm()).collect();
        Self { r, chir, chir_mag }
    }
}

/// One measured spectrum and everything computed from it.
///
/// `energy` and `mu` always exist; each analysis stage fills its own
/// optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XafsGroup {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub energy: Vec<f64>,
    pub mu: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i0: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ir: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mu_ref: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalization: Option<Normalization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<RSpace>,
}

impl XafsGroup {
    pub fn new(label: impl Into<String>, energy: Vec<f64>, mu: Vec<f64>) -> XasResult<Self> {
        let label = label.into();
        if energy.len() != mu.len() {
            return Err(XasError::input_validation(
                "INPUT.GROUP_LENGTH",
                format!(
                    "group '{}' has {} energy points but {} mu points",
                    label,
                    energy.len(),
                    mu.len()
                ),
            ));
        }
        if energy.is_empty() {
            return Err(XasError::input_validation(
                "INPUT.GROUP_EMPTY",
                format!("group '{}' has no data points", label),
            ));
        }

        Ok(Self {
            label,
            path: None,
            energy,
            mu,
            time: None,
            i0: None,
            it: None,
            ir: None,
            mu_ref: None,
            normalization: None,
            background: None,
            transform: None,
        })
    }

    /// Builds a group from a parsed data file.
    ///
    /// `mu` is taken from its mapped column when there is one, otherwise it
    /// is `ln|i0/it|`. `mu_ref` falls back to `ln|it/ir|` when a reference
    /// channel was read.
    pub fn from_table(
        label: impl Into<String>,
        path: Option<PathBuf>,
        table: &DataTable,
        mapping: &ColumnMapping,
    ) -> XasResult<Self> {
        let label = label.into();
        let energy_slot = ColumnSlot::Required(mapping.energy);
        let energy = select_column(&label, table, ColumnField::Energy, energy_slot)?
            .ok_or_else(|| {
                XasError::internal("SYS.COLUMN_ENERGY", "energy column resolved to nothing")
            })?;
        let time = select_column(&label, table, ColumnField::Time, mapping.time)?;
        let i0 = select_column(&label, table, ColumnField::I0, mapping.i0)?;
        let it = select_column(&label, table, ColumnField::It, mapping.it)?;
        let ir = select_column(&label, table, ColumnField::Ir, mapping.ir)?;

        let mu = match select_column(&label, table, ColumnField::Mu, mapping.mu)? {
            Some(mu) => mu,
            None => match (&i0, &it) {
                (Some(i0), Some(it)) => absorbance(i0, it),
                _ => {
                    return Err(XasError::input_validation(
                        "INPUT.MU_SOURCE",
                        format!(
                            "'{}' maps no mu column and lacks i0/it to compute it",
                            label
                        ),
                    ));
                }
            },
        };

        let mu_ref = match select_column(&label, table, ColumnField::MuRef, mapping.mu_ref)? {
            Some(mu_ref) => Some(mu_ref),
            None => match (&it, &ir) {
                (Some(it), Some(ir)) => Some(absorbance(it, ir)),
                _ => None,
            },
        };

        let mut group = Self::new(label, energy, mu)?;
        group.path = path;
        group.time = time;
        group.i0 = i0;
        group.it = it;
        group.ir = ir;
        group.mu_ref = mu_ref;
        Ok(group)
    }

    pub fn len(&self) -> usize {
        self.energy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energy.is_empty()
    }

    pub fn norm(&self) -> Option<&[f64]> {
        self.normalization
            .as_ref()
            .map(|normalization| normalization.norm.as_slice())
    }

    /// Copy of the raw arrays under a new label, with every stage cleared.
    pub fn relabeled(&self, label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            normalization: None,
            background: None,
            transform: None,
            ..self.clone()
        }
    }
}

/// `ln|numerator / denominator|`, elementwise.
pub fn absorbance(numerator: &[f64], denominator: &[f64]) -> Vec<f64> {
    numerator
        .iter()
        .zip(denominator)
        .map(|(n, d)| (n / d).abs().ln())
        .collect()
}

fn select_column(
    label: &str,
    table: &DataTable,
    field: ColumnField,
    slot: ColumnSlot,
) -> XasResult<Option<Vec<f64>>> {
    let (index, required) = match slot {
        ColumnSlot::Absent => return Ok(None),
        ColumnSlot::Required(index) => (index, true),
        ColumnSlot::IfPresent(index) => (index, false),
    };

    match table.column(index) {
        Some(values) => Ok(Some(values.to_vec())),
        None if required => Err(XasError::input_validation(
            "INPUT.COLUMN_RANGE",
            format!(
                "column {} requested for '{}' but '{}' has {} columns",
                index,
                field,
                label,
                table.column_count()
            ),
        )),
        None => Ok(None),
    }
}
