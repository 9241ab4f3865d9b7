use crate::config::{ReadErrorPolicy, SearchConfig};
use crate::error::{MachineSurferError, Result};
use crate::extractor::engine::{ExtractionStats, ResultTable};
use crate::extractor::workbook::CellValue;
use chrono::{DateTime, Utc};
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SHEET_NAME: &str = "Results";
const SERIAL_HEADER: &str = "SN";
const PATH_HEADER: &str = "Directory";

/// Serializable account of a finished run, written next to the workbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub output_file: PathBuf,
    pub summary: RunSummary,
    pub errors: Vec<String>,
    pub rejected_cells: Vec<String>,
    pub config_used: ConfigSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub units_processed: usize,
    pub units_not_found: usize,
    pub files_read: usize,
    pub rows_written: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub root: PathBuf,
    pub first_serial: u32,
    pub last_serial: u32,
    pub keyword: String,
    pub sheet_name: String,
    pub extensions: Vec<String>,
    pub cells: Vec<String>,
    pub on_read_error: ReadErrorPolicy,
}

impl From<&SearchConfig> for ConfigSnapshot {
    fn from(config: &SearchConfig) -> Self {
        Self {
            root: config.root.clone(),
            first_serial: config.first_serial,
            last_serial: config.last_serial,
            keyword: config.keyword.clone(),
            sheet_name: config.sheet_name.clone(),
            extensions: config.extensions.clone(),
            cells: config.cells.iter().map(|c| c.to_string()).collect(),
            on_read_error: config.on_read_error,
        }
    }
}

impl RunReport {
    pub fn new(
        output_file: PathBuf,
        stats: &ExtractionStats,
        rejected_cells: Vec<String>,
        config: &SearchConfig,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            output_file,
            summary: RunSummary {
                units_processed: stats.units_processed,
                units_not_found: stats.units_not_found,
                files_read: stats.files_read,
                rows_written: stats.rows,
                elapsed: stats.elapsed(),
            },
            errors: stats.errors.clone(),
            rejected_cells,
            config_used: ConfigSnapshot::from(config),
        }
    }
}

/// Writes the aggregated table once, at the end of a run.
pub struct ReportWriter {
    output_directory: PathBuf,
    file_name: String,
    include_header: bool,
}

impl ReportWriter {
    pub fn new<P: Into<PathBuf>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.into(),
            file_name: "output.xlsx".to_string(),
            include_header: true,
        }
    }

    pub fn with_file_name<S: Into<String>>(mut self, file_name: S) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn with_header(mut self, include_header: bool) -> Self {
        self.include_header = include_header;
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_directory.join(&self.file_name)
    }

    pub fn report_path(&self) -> PathBuf {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        self.output_directory.join(format!("{}_report.json", stem))
    }

    /// Columns: serial, path, then one per configured cell.
    pub fn write_table(&self, table: &ResultTable) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_directory)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
        let mut row_num: RowNum = 0;

        if self.include_header {
            let bold = Format::new().set_bold();
            worksheet.write_string_with_format(0, 0, SERIAL_HEADER, &bold)?;
            worksheet.write_string_with_format(0, 1, PATH_HEADER, &bold)?;
            for (i, label) in table.columns().iter().enumerate() {
                worksheet.write_string_with_format(0, value_column(i)?, label, &bold)?;
            }
            row_num += 1;
        }

        for row in table.rows() {
            worksheet.write_number(row_num, 0, row.serial)?;
            worksheet.write_string(row_num, 1, &row.path)?;
            for (i, value) in row.values.iter().enumerate() {
                write_value(worksheet, row_num, value_column(i)?, value, &date_format)?;
            }
            row_num += 1;
        }

        let path = self.output_path();
        workbook.save(&path)?;
        Ok(path)
    }

    pub fn write_run_report(&self, report: &RunReport) -> Result<PathBuf> {
        let path = self.report_path();
        let json_content =
            serde_json::to_string_pretty(report).map_err(|e| MachineSurferError::Report {
                message: format!("Failed to serialize run report to JSON: {}", e),
            })?;

        fs::create_dir_all(&self.output_directory)?;
        fs::write(&path, json_content)?;
        Ok(path)
    }
}

fn value_column(index: usize) -> Result<ColNum> {
    ColNum::try_from(index + 2).map_err(|_| MachineSurferError::Report {
        message: format!("Too many cell columns: {}", index + 1),
    })
}

fn write_value(
    worksheet: &mut Worksheet,
    row: RowNum,
    col: ColNum,
    value: &CellValue,
    date_format: &Format,
) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        }
        CellValue::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(serial) => {
            worksheet.write_number_with_format(row, col, *serial, date_format)?;
        }
        CellValue::NotFound | CellValue::ReadError => {
            worksheet.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}
