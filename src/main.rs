use clap::Parser;
use machine_surfer::ui::signals::INTERRUPTED_EXIT_CODE;
use machine_surfer::{
    Cli, MachineSurfer, MachineSurferError, OutputFormatter, OutputMode, UnitPlanStatus,
    UserFriendlyError,
};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let surfer = match MachineSurfer::from_cli(&cli) {
        Ok(surfer) => surfer,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&surfer);
    }

    match surfer.run_search().await {
        Ok(report) => {
            surfer.output_formatter().print_run_report(&report);

            if report.errors.is_empty() {
                0
            } else {
                2 // finished, but some workbooks were recorded as ERR
            }
        }
        Err(e) => {
            surfer.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &MachineSurferError) -> i32 {
    match error {
        MachineSurferError::Cancelled => INTERRUPTED_EXIT_CODE,
        MachineSurferError::Config { .. } | MachineSurferError::InvalidCellAddress { .. } => 3,
        MachineSurferError::SheetNotFound { .. }
        | MachineSurferError::SpreadsheetRead { .. }
        | MachineSurferError::Scan { .. } => 4,
        MachineSurferError::Report { .. } => 5,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "machine-surfer.toml".to_string());

    match MachineSurfer::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  machine-surfer --config {}", config_path);
            println!("\nEdit the file to set the machine root, serial range and cells.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(surfer: &MachineSurfer) -> i32 {
    let formatter = surfer.output_formatter();
    let config = surfer.config();

    formatter.info("DRY RUN MODE - No workbooks will be read or written");
    formatter.print_separator();

    println!("  Root: {}", config.search.root.display());
    println!(
        "  Serials: {}{} to {}{}",
        config.search.unit_prefix,
        config.search.first_serial,
        config.search.unit_prefix,
        config.search.last_serial
    );
    println!("  Keyword: {}", config.search.keyword);
    println!("  Sheet: {}", config.search.sheet_name);
    println!("  Extensions: {}", config.search.extensions.join(", "));
    println!("  Cells: {}", config.cells.addresses.join(", "));
    println!("  On read error: {:?}", config.extraction.on_read_error);
    println!("  Output: {}", config.output_path().display());

    formatter.print_separator();

    let mut units = 0;
    let mut files = 0;
    for unit in surfer.plan() {
        units += 1;
        match &unit.status {
            UnitPlanStatus::Missing => {
                println!("  {}: not found (FNF)", unit.directory.display());
            }
            UnitPlanStatus::Found(paths) => {
                files += paths.len();
                println!("  {}: {} matching file(s)", unit.directory.display(), paths.len());
                for path in paths {
                    formatter.debug(&path.display().to_string());
                }
            }
            UnitPlanStatus::Unreadable(message) => {
                formatter.warning(&format!("{}: {}", unit.directory.display(), message));
            }
        }
    }

    formatter.print_separator();
    formatter.success(&format!(
        "Dry run completed: {} units, {} workbooks would be read",
        units,
        files
    ));
    formatter.info("Run without --dry-run to write the output workbook");

    0
}

fn print_startup_error(error: &MachineSurferError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use machine_surfer::Config;
    use std::fs;
    use tempfile::TempDir;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["machine-surfer"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = cli(&["--generate-config", "--config", config_path.to_str().unwrap()]);

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[search]"));
        assert!(Config::load_from_file(&config_path).is_ok());
    }

    #[test]
    fn test_dry_run_mode() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("SN2")).unwrap();

        let mut config = Config::default();
        config.search.root = temp_dir.path().to_path_buf();
        config.search.first_serial = 1;
        config.search.last_serial = 3;
        let surfer = MachineSurfer::new(config, OutputMode::Plain, 0, true).unwrap();

        assert_eq!(handle_dry_run(&surfer), 0);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&MachineSurferError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&MachineSurferError::Config {
                message: "bad".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&MachineSurferError::SheetNotFound {
                path: "a.xlsm".to_string(),
                sheet: "Summary".to_string()
            }),
            4
        );
        assert_eq!(
            exit_code_for(&MachineSurferError::Report {
                message: "disk full".to_string()
            }),
            5
        );
        assert_eq!(
            exit_code_for(&MachineSurferError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk gone"
            ))),
            1
        );
    }
}
