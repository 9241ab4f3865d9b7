use crate::config::{ReadErrorPolicy, SearchConfig};
use crate::error::{MachineSurferError, Result};
use crate::extractor::workbook::{CellValue, SheetReader};
use crate::scanner::{UnitLocator, UnitLookup};
use crate::ui::GracefulShutdown;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One line of the report: a matched workbook, or a placeholder for a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub serial: u32,
    pub path: String,
    pub values: Vec<CellValue>,
}

impl ResultRow {
    fn placeholder(serial: u32, path: &Path, value: CellValue, cell_count: usize) -> Self {
        Self {
            serial,
            path: path.display().to_string(),
            values: vec![value; cell_count],
        }
    }
}

/// All rows of a run, in append order, plus the configured cell labels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: ResultRow) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Handed to the progress callback before each unit is processed.
#[derive(Debug, Clone)]
pub struct UnitProgress {
    /// 1-based position of the unit in the range.
    pub index: usize,
    pub total: usize,
    pub serial: u32,
    pub unit_prefix: String,
}

impl UnitProgress {
    pub fn status_line(&self) -> String {
        format!(
            "Processing: {} of {}: {}{}",
            self.index, self.total, self.unit_prefix, self.serial
        )
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionStats {
    pub units_processed: usize,
    pub total_units: usize,
    pub rows: usize,
    pub units_not_found: usize,
    pub files_read: usize,
    pub errors: Vec<String>,
    pub start_time: Instant,
    finished: Option<Duration>,
}

impl ExtractionStats {
    pub fn new(total_units: usize) -> Self {
        Self {
            units_processed: 0,
            total_units,
            rows: 0,
            units_not_found: 0,
            files_read: 0,
            errors: Vec::new(),
            start_time: Instant::now(),
            finished: None,
        }
    }

    pub fn add_error<S: Into<String>>(&mut self, error: S) {
        self.errors.push(error.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.finished.unwrap_or_else(|| self.start_time.elapsed())
    }

    fn finish(&mut self) {
        self.finished = Some(self.start_time.elapsed());
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Finished: {} directories processed in {:.2}s",
            self.total_units,
            self.elapsed().as_secs_f64()
        )
    }
}

pub struct ExtractionResult {
    pub table: ResultTable,
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    fn absorb(&mut self, outcome: UnitOutcome) {
        self.stats.units_processed += 1;
        self.stats.files_read += outcome.files_read;
        self.stats.rows += outcome.rows.len();
        if outcome.not_found {
            self.stats.units_not_found += 1;
        }
        self.stats.errors.extend(outcome.errors);
        for row in outcome.rows {
            self.table.push(row);
        }
    }
}

pub type ProgressCallback<'a> = &'a (dyn Fn(&UnitProgress) + Sync);

/// Rows and bookkeeping produced by a single unit.
#[derive(Default)]
struct UnitOutcome {
    rows: Vec<ResultRow>,
    not_found: bool,
    files_read: usize,
    errors: Vec<String>,
}

pub struct ExtractionEngine {
    config: SearchConfig,
    locator: UnitLocator,
    reader: Arc<dyn SheetReader>,
    shutdown: Option<GracefulShutdown>,
}

impl ExtractionEngine {
    pub fn new(config: SearchConfig, reader: Arc<dyn SheetReader>) -> Self {
        let locator = UnitLocator::new(&config);
        Self {
            config,
            locator,
            reader,
            shutdown: None,
        }
    }

    pub fn with_shutdown(mut self, shutdown: GracefulShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Units are folded into the result as they finish, so memory follows
    /// the rows produced rather than the size of the serial range.
    pub fn run(&self, progress_callback: Option<ProgressCallback<'_>>) -> Result<ExtractionResult> {
        let columns = self.config.cells.iter().map(|c| c.to_string()).collect();
        let mut result = ExtractionResult {
            table: ResultTable::new(columns),
            stats: ExtractionStats::new(self.config.unit_count()),
        };

        self.process_units(progress_callback, &mut result)?;

        result.stats.finish();
        Ok(result)
    }

    #[cfg(not(feature = "parallel"))]
    fn process_units(
        &self,
        progress_callback: Option<ProgressCallback<'_>>,
        result: &mut ExtractionResult,
    ) -> Result<()> {
        for (offset, serial) in self.config.serials().enumerate() {
            self.check_shutdown()?;
            if let Some(callback) = progress_callback {
                callback(&self.unit_progress(offset, serial));
            }
            result.absorb(self.process_unit(serial)?);
        }

        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn process_units(
        &self,
        progress_callback: Option<ProgressCallback<'_>>,
        result: &mut ExtractionResult,
    ) -> Result<()> {
        use rayon::prelude::*;
        use std::sync::Mutex;

        const UNITS_PER_WORKER: usize = 4;

        let threads = if self.config.threads == 0 {
            num_cpus::get()
        } else {
            self.config.threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| MachineSurferError::Config {
                message: format!("Failed to start worker pool: {}", e),
            })?;

        let completed = Mutex::new(0usize);
        let mut serials = self.config.serials();

        loop {
            let batch: Vec<u32> = serials.by_ref().take(threads * UNITS_PER_WORKER).collect();
            if batch.is_empty() {
                return Ok(());
            }

            // collect() on an indexed parallel iterator keeps serial order
            let outcomes: Vec<UnitOutcome> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|&serial| -> Result<UnitOutcome> {
                        self.check_shutdown()?;
                        let outcome = self.process_unit(serial)?;
                        if let Some(callback) = progress_callback {
                            let mut done = completed.lock().unwrap_or_else(|e| e.into_inner());
                            callback(&self.unit_progress(*done, serial));
                            *done += 1;
                        }
                        Ok(outcome)
                    })
                    .collect::<Result<Vec<_>>>()
            })?;

            for outcome in outcomes {
                result.absorb(outcome);
            }
        }
    }

    fn unit_progress(&self, offset: usize, serial: u32) -> UnitProgress {
        UnitProgress {
            index: offset + 1,
            total: self.config.unit_count(),
            serial,
            unit_prefix: self.config.unit_prefix.clone(),
        }
    }

    fn check_shutdown(&self) -> Result<()> {
        match self.shutdown {
            Some(ref shutdown) => shutdown.check_shutdown(),
            None => Ok(()),
        }
    }

    fn process_unit(&self, serial: u32) -> Result<UnitOutcome> {
        let cell_count = self.config.cells.len();
        let mut outcome = UnitOutcome::default();

        let files = match self.locator.locate(serial) {
            Ok(UnitLookup::Found { files, .. }) => files,
            Ok(UnitLookup::NotFound { unit_dir }) => {
                outcome.rows.push(ResultRow::placeholder(
                    serial,
                    &unit_dir,
                    CellValue::NotFound,
                    cell_count,
                ));
                outcome.not_found = true;
                return Ok(outcome);
            }
            Err(e) => {
                let unit_dir = self.locator.unit_directory(serial);
                self.handle_read_fault(e, serial, &unit_dir, &mut outcome)?;
                return Ok(outcome);
            }
        };

        for file in files {
            match self.extract_row(serial, &file) {
                Ok(row) => {
                    outcome.files_read += 1;
                    outcome.rows.push(row);
                }
                Err(e) => self.handle_read_fault(e, serial, &file, &mut outcome)?,
            }
        }

        Ok(outcome)
    }

    fn extract_row(&self, serial: u32, file: &Path) -> Result<ResultRow> {
        let grid = self.reader.read_sheet(file, &self.config.sheet_name)?;

        let values = self
            .config
            .cells
            .iter()
            .map(|cell| match cell.grid_position() {
                Some((row, col)) => grid.value_at(row, col),
                None => CellValue::Empty,
            })
            .collect();

        Ok(ResultRow {
            serial,
            path: file.display().to_string(),
            values,
        })
    }

    fn handle_read_fault(
        &self,
        error: MachineSurferError,
        serial: u32,
        path: &Path,
        outcome: &mut UnitOutcome,
    ) -> Result<()> {
        if !error.is_read_fault() || self.config.on_read_error == ReadErrorPolicy::Abort {
            return Err(error);
        }

        outcome.errors.push(error.to_string());
        outcome.rows.push(ResultRow::placeholder(
            serial,
            path,
            CellValue::ReadError,
            self.config.cells.len(),
        ));
        Ok(())
    }
}
