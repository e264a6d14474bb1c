//! Reader for plain column-oriented spectra.
//!
//! Beamline files are a block of `#` comment lines followed by rows of
//! numbers separated by whitespace or commas. The last comment line, when
//! it has one token per column, names the columns.

use crate::domain::{XasError, XasResult};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AsciiParseError {
    #[error("line {line}: expected {expected} columns, found {found}")]
    RowWidth {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: '{token}' is not a number")]
    NotANumber { line: usize, token: String },
    #[error("no data rows found")]
    NoData,
}

impl AsciiParseError {
    fn placeholder(&self) -> &'static str {
        match self {
            Self::RowWidth { .. } => "INPUT.ASCII_ROW_WIDTH",
            Self::NotANumber { .. } => "INPUT.ASCII_NUMBER",
            Self::NoData => "INPUT.ASCII_EMPTY",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    pub header: Vec<String>,
    pub labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl DataTable {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn column_by_label(&self, label: &str) -> Option<&[f64]> {
        let index = self
            .labels
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(label))?;
        self.column(index)
    }
}

pub fn read_ascii(path: &Path) -> XasResult<DataTable> {
    let source = fs::read_to_string(path).map_err(|source| {
        XasError::io_system(
            "IO.ASCII_READ",
            format!("failed to read data file '{}': {}", path.display(), source),
        )
    })?;

    parse_ascii(&source).map_err(|error| {
        XasError::input_validation(
            error.placeholder(),
            format!("failed to parse '{}': {}", path.display(), error),
        )
    })
}

pub fn parse_ascii(source: &str) -> Result<DataTable, AsciiParseError> {
    let mut header = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for (index, raw_line) in source.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            header.push(comment.trim().to_string());
            continue;
        }

        let row = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| AsciiParseError::NotANumber {
                        line: line_number,
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                return Err(AsciiParseError::RowWidth {
                    line: line_number,
                    expected: first.len(),
                    found: row.len(),
                });
            }
        }
        rows.push(row);
    }

    let width = rows.first().map(Vec::len).ok_or(AsciiParseError::NoData)?;
    let mut columns = vec![Vec::with_capacity(rows.len()); width];
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value);
        }
    }

    let labels = header
        .last()
        .map(|line| line.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .filter(|tokens| tokens.len() == width)
        .unwrap_or_else(|| (1..=width).map(|index| format!("col{}", index)).collect());

    Ok(DataTable {
        header,
        labels,
        columns,
    })
}
