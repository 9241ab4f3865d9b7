use crate::error::{MachineSurferError, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub const NOT_FOUND_PLACEHOLDER: &str = "FNF";
pub const READ_ERROR_PLACEHOLDER: &str = "ERR";

/// A value pulled out of a worksheet cell, or a placeholder for a cell that
/// could not be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    /// Excel serial date number.
    DateTime(f64),
    /// The unit directory did not exist.
    NotFound,
    /// The workbook or unit could not be read and the run kept going.
    ReadError,
}

impl CellValue {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CellValue::NotFound | CellValue::ReadError)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) | CellValue::DateTime(n) => write!(f, "{}", n),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::NotFound => write!(f, "{}", NOT_FOUND_PLACEHOLDER),
            CellValue::ReadError => write!(f, "{}", READ_ERROR_PLACEHOLDER),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(e.to_string()),
        }
    }
}

/// The non-empty cells of one worksheet, keyed by absolute zero-based
/// `(row, column)`.
#[derive(Debug, Clone, Default)]
pub struct CellGrid {
    cells: HashMap<(usize, usize), CellValue>,
}

impl CellGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_range(range: &Range<Data>) -> Self {
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        let cells = range
            .used_cells()
            .map(|(row, col, data)| ((start_row + row, start_col + col), CellValue::from(data)))
            .collect();

        Self { cells }
    }

    /// Build a grid from rows starting at A1. Mostly useful for fakes.
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let mut grid = Self::new();
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                grid.set(row, col, value);
            }
        }
        grid
    }

    pub fn set(&mut self, row: usize, col: usize, value: CellValue) {
        if value == CellValue::Empty {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), value);
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.cells.get(&(row, col))
    }

    /// Value at a position; anything outside the used area is blank.
    pub fn value_at(&self, row: usize, col: usize) -> CellValue {
        self.get(row, col).cloned().unwrap_or(CellValue::Empty)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Reads one named worksheet of a workbook file into a [`CellGrid`].
pub trait SheetReader: Send + Sync {
    fn read_sheet(&self, path: &Path, sheet_name: &str) -> Result<CellGrid>;
}

/// [`SheetReader`] backed by calamine; the format is picked from the file
/// extension (xlsm, xlsx, xlsb, xls, ods).
#[derive(Debug, Clone, Copy, Default)]
pub struct CalamineReader;

impl SheetReader for CalamineReader {
    fn read_sheet(&self, path: &Path, sheet_name: &str) -> Result<CellGrid> {
        let mut workbook =
            open_workbook_auto(path).map_err(|e| MachineSurferError::SpreadsheetRead {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        if !workbook.sheet_names().iter().any(|name| name == sheet_name) {
            return Err(MachineSurferError::SheetNotFound {
                path: path.display().to_string(),
                sheet: sheet_name.to_string(),
            });
        }

        let range =
            workbook
                .worksheet_range(sheet_name)
                .map_err(|e| MachineSurferError::SpreadsheetRead {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;

        Ok(CellGrid::from_range(&range))
    }
}
