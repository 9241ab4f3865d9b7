pub mod cli;
pub mod config;
pub mod error;
pub mod scanner;
pub mod extractor;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, ReadErrorPolicy, SearchConfig};
pub use error::{MachineSurferError, Result, UserFriendlyError};

// Core functionality re-exports
pub use scanner::{FileFilter, UnitLocator, UnitLookup};
pub use extractor::{
    CalamineReader, CellAddress, CellValue, ExtractionEngine, ExtractionStats, ReportWriter,
    ResultTable, RunReport, SheetReader, UnitProgress,
};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task;

/// What a dry run found for one unit.
#[derive(Debug)]
pub enum UnitPlanStatus {
    Missing,
    Found(Vec<PathBuf>),
    Unreadable(String),
}

#[derive(Debug)]
pub struct UnitPlan {
    pub serial: u32,
    pub directory: PathBuf,
    pub status: UnitPlanStatus,
}

/// Main library interface: one configured extraction run.
pub struct MachineSurfer {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl MachineSurfer {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// No signal handler is registered, so several instances can coexist in tests.
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(config, output_mode, verbose, quiet, GracefulShutdown::new_for_test())
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        // bars would interleave with json/plain lines
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Walk the serial range, read every matching workbook and write the
    /// aggregated table. Nothing is written if the run is cancelled or aborts.
    pub async fn run_search(&self) -> Result<RunReport> {
        self.shutdown.check_shutdown()?;

        let search = self.resolve_search_config();
        self.output_formatter.start_operation(&format!(
            "Searching {} units under {}",
            search.unit_count(),
            search.root.display()
        ));

        let result = self.extract(search.clone()).await?;
        let stats = result.stats;

        for error in &stats.errors {
            self.output_formatter.warning(&format!("Recorded read error: {}", error));
        }

        let writer = ReportWriter::new(&search.output_directory)
            .with_file_name(self.config.output.file_name.clone())
            .with_header(self.config.output.include_header);

        let spinner = self
            .progress_manager
            .create_spinner(&format!("Writing {}", writer.output_path().display()));
        let output_file = writer.write_table(&result.table).map_err(into_report_error)?;
        spinner.finish_and_clear();

        self.output_formatter
            .success(&format!("Wrote {} rows to {}", stats.rows, output_file.display()));

        let rejected = self.rejected_cells();
        let report = RunReport::new(output_file, &stats, rejected, &search);

        if self.config.output.generate_report {
            let report_path = writer.write_run_report(&report).map_err(into_report_error)?;
            self.output_formatter
                .info(&format!("Run report saved to {}", report_path.display()));
        }

        self.output_formatter.print_run_summary(&stats);

        Ok(report)
    }

    async fn extract(&self, search: SearchConfig) -> Result<extractor::ExtractionResult> {
        let unit_progress = self
            .progress_manager
            .create_unit_progress(search.unit_count() as u64);

        let engine = ExtractionEngine::new(search, Arc::new(CalamineReader))
            .with_shutdown(self.shutdown.clone());
        let pb = unit_progress.clone();
        let formatter = self.output_formatter.clone();

        let outcome = task::spawn_blocking(move || {
            let callback = move |progress: &UnitProgress| {
                ui::progress::update_unit_progress(&pb, progress);
                formatter.progress(&progress.status_line());
            };
            engine.run(Some(&callback))
        })
        .await
        .map_err(|e| MachineSurferError::Config {
            message: format!("Extraction task failed: {}", e),
        })?;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                unit_progress.abandon();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &unit_progress,
            &result.stats.summary_line(),
            result.stats.elapsed(),
        );

        Ok(result)
    }

    /// Resolve the search settings and warn about skipped cell addresses.
    fn resolve_search_config(&self) -> SearchConfig {
        let (search, rejected) = self.config.search_config();
        for input in &rejected {
            self.output_formatter
                .warning(&format!("Skipping invalid cell address: {:?}", input));
        }
        self.output_formatter.debug(&format!(
            "Cells: {}",
            search
                .cells
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
        search
    }

    fn rejected_cells(&self) -> Vec<String> {
        self.config.search_config().1
    }

    /// What each unit in the range would contribute, without reading
    /// workbooks. Units are looked up as the iterator is advanced.
    pub fn plan(&self) -> impl Iterator<Item = UnitPlan> {
        let (search, _) = self.config.search_config();
        let locator = UnitLocator::new(&search);

        search.serials().map(move |serial| {
            let directory = locator.unit_directory(serial);
            let status = match locator.locate(serial) {
                Ok(UnitLookup::Found { files, .. }) => UnitPlanStatus::Found(files),
                Ok(UnitLookup::NotFound { .. }) => UnitPlanStatus::Missing,
                Err(e) => UnitPlanStatus::Unreadable(e.to_string()),
            };
            UnitPlan {
                serial,
                directory,
                status,
            }
        })
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    pub fn handle_error(&self, error: &MachineSurferError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

fn into_report_error(error: MachineSurferError) -> MachineSurferError {
    match error {
        MachineSurferError::Report { .. } => error,
        other => MachineSurferError::Report {
            message: other.to_string(),
        },
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
