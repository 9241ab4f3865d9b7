use crate::config::{CliOverrides, Config, ReadErrorPolicy};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "machine-surfer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract cells from per-machine spreadsheets into one report")]
#[command(
    long_about = "Machine Surfer walks a range of serial-numbered machine directories \
                  (ROOT/SN<serial>), finds the spreadsheets whose names contain a keyword, \
                  reads a fixed list of cells from one sheet of each, and writes everything \
                  to a single output.xlsx."
)]
#[command(after_help = "EXAMPLES:\n  \
    machine-surfer --root /mnt/machines --output-dir ~/reports\n  \
    machine-surfer --first 33700 --last 33726 --keyword cal --sheet Summary\n  \
    machine-surfer --cells A34,B4,E2,E3 --on-read-error abort\n  \
    machine-surfer --config surfer.toml --dry-run")]
pub struct Cli {
    /// Directory holding one SN<serial> folder per machine
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Directory the output workbook is written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// First serial number (inclusive)
    #[arg(long)]
    pub first: Option<u32>,

    /// Last serial number (inclusive)
    #[arg(long)]
    pub last: Option<u32>,

    /// Keyword matched case-insensitively against folder paths and file names
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Worksheet to read from every matching workbook
    #[arg(short, long)]
    pub sheet: Option<String>,

    /// Cells to extract (comma-separated, e.g. A34,B4,E2)
    #[arg(short = 'c', long, value_delimiter = ',')]
    pub cells: Option<Vec<String>>,

    /// Spreadsheet extensions to accept (comma-separated)
    #[arg(long, help = "File extensions to accept (e.g., xlsm,xlsx)")]
    pub extensions: Option<String>,

    /// Prefix of unit directory names
    #[arg(long, help = "Unit directory prefix (default: SN)")]
    pub prefix: Option<String>,

    /// What to do with workbooks that cannot be read
    #[arg(long, value_enum)]
    pub on_read_error: Option<ReadErrorPolicy>,

    /// Leave the header row out of the output workbook
    #[arg(long)]
    pub no_header: bool,

    /// Also write a JSON run report next to the workbook
    #[arg(long)]
    pub report: bool,

    /// Configuration file path
    #[arg(short = 'C', long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be read without reading it)
    #[arg(long, help = "List units and matching files without reading or writing workbooks")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_root(self.root.clone())
            .with_output_dir(self.output_dir.clone())
            .with_serial_range(self.first, self.last)
            .with_keyword(self.keyword.clone())
            .with_sheet_name(self.sheet.clone())
            .with_unit_prefix(self.prefix.clone())
            .with_cells(self.cells.clone())
            .with_extensions(self.extensions.clone())
            .with_read_error_policy(self.on_read_error)
            .with_no_header(self.no_header)
            .with_report(self.report)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "machine-surfer",
            "--root",
            "/machines",
            "-o",
            "/reports",
            "--first",
            "100",
            "--last",
            "102",
            "-k",
            "cal",
            "-s",
            "Summary",
            "-c",
            "A1,B2",
            "--on-read-error",
            "abort",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.root, Some(PathBuf::from("/machines")));
        assert_eq!(cli.first, Some(100));
        assert_eq!(cli.last, Some(102));
        assert_eq!(cli.cells, Some(vec!["A1".to_string(), "B2".to_string()]));
        assert_eq!(cli.on_read_error, Some(ReadErrorPolicy::Abort));
        assert_eq!(cli.verbosity_level(), 2);
    }

    #[test]
    fn test_invalid_serial_is_rejected() {
        let result = Cli::try_parse_from(["machine-surfer", "--first", "33a00"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["machine-surfer", "--last", "-5"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["machine-surfer", "-q", "-v"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_applied_over_defaults() {
        let cli = Cli::try_parse_from([
            "machine-surfer",
            "--first",
            "5",
            "--sheet",
            "Cal Data",
            "--no-header",
        ])
        .unwrap();

        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides());

        assert_eq!(config.search.first_serial, 5);
        assert_eq!(config.search.last_serial, 33726);
        assert_eq!(config.search.sheet_name, "Cal Data");
        assert!(!config.output.include_header);
        assert_eq!(config.cells.addresses.len(), 16);
    }
}
