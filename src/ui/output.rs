use crate::error::{MachineSurferError, UserFriendlyError};
use crate::extractor::{ExtractionStats, RunReport};
use console::{style, Emoji, Term};

use super::progress::format_duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Debug,
    Info,
    Operation,
    Progress,
    Warning,
    Success,
    Error,
    Suggestion,
}

impl Level {
    /// Lowest `-v` count at which the level shows. `None` means it shows
    /// even with `-q`.
    fn threshold(self) -> Option<u8> {
        match self {
            Level::Debug => Some(2),
            Level::Info => Some(1),
            Level::Operation | Level::Progress | Level::Warning => Some(0),
            Level::Success | Level::Error | Level::Suggestion => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Operation => "operation_start",
            Level::Progress => "progress",
            Level::Warning => "warning",
            Level::Success => "success",
            Level::Error => "error",
            Level::Suggestion => "suggestion",
        }
    }
}

/// Console messages in one of three shapes: styled text for people, one
/// JSON object per line, or `LEVEL: message` lines for scripts.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        self.emit(Level::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.emit(Level::Error, message);
    }

    /// Skipped cells and recorded read errors; hidden only by `-q`.
    pub fn warning(&self, message: &str) {
        self.emit(Level::Warning, message);
    }

    pub fn info(&self, message: &str) {
        self.emit(Level::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.emit(Level::Debug, message);
    }

    /// Per-unit status line. Human mode shows it on the progress bar instead.
    pub fn progress(&self, status: &str) {
        self.emit(Level::Progress, status);
    }

    pub fn start_operation(&self, operation: &str) {
        self.emit(Level::Operation, operation);
    }

    pub fn print_user_friendly_error(&self, error: &MachineSurferError) {
        self.emit(Level::Error, &error.user_message());

        if let Some(suggestion) = error.suggestion() {
            self.emit(Level::Suggestion, &suggestion);
        }
    }

    /// The final status line plus counts, printed once per run.
    pub fn print_run_summary(&self, stats: &ExtractionStats) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => self.print_human_summary(stats),
            OutputMode::Json => self.print_json_summary(stats),
            OutputMode::Plain => self.print_plain_summary(stats),
        }
    }

    pub fn print_run_report(&self, report: &RunReport) {
        match self.mode {
            OutputMode::Human | OutputMode::Plain => {
                if self.quiet {
                    return;
                }
                println!("Output: {}", report.output_file.display());
                if !report.errors.is_empty() {
                    println!("Issues encountered:");
                    for error in &report.errors {
                        println!("  - {}", error);
                    }
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet || self.mode == OutputMode::Json {
            return;
        }

        if self.use_colors {
            println!("{}", style("─".repeat(60)).dim());
        } else {
            println!("{}", "-".repeat(60));
        }
    }

    fn is_visible(&self, level: Level) -> bool {
        match level.threshold() {
            None => true,
            Some(min) => !self.quiet && self.verbose_level >= min,
        }
    }

    fn emit(&self, level: Level, message: &str) {
        if !self.is_visible(level) {
            return;
        }

        let line = match self.mode {
            OutputMode::Human => self.human_line(level, message),
            OutputMode::Json => Some(json_line(level, message)),
            OutputMode::Plain => Some(plain_line(level, message)),
        };

        match line {
            Some(line) if level == Level::Error => eprintln!("{}", line),
            Some(line) => println!("{}", line),
            None => {}
        }
    }

    fn human_line(&self, level: Level, message: &str) -> Option<String> {
        if level == Level::Progress {
            return None;
        }

        if !self.use_colors {
            let prefix = match level {
                Level::Success => "✓ ",
                Level::Error => "✗ ",
                Level::Warning => "! ",
                Level::Info => "i ",
                Level::Debug => "  DEBUG: ",
                Level::Operation => "> ",
                Level::Suggestion => "\nSuggestion: ",
                Level::Progress => "",
            };
            return Some(format!("{}{}", prefix, message));
        }

        let line = match level {
            Level::Success => format!("{}{}", CHECKMARK, style(message).green().bold()),
            Level::Error => format!("{}{}", CROSS, style(message).red().bold()),
            Level::Warning => format!("{}{}", WARNING, style(message).yellow().bold()),
            Level::Info => format!("{}{}", INFO, style(message).cyan()),
            Level::Debug => format!("  {}", style(message).dim()),
            Level::Operation => format!("{}{}", ROCKET, style(message).bold()),
            Level::Suggestion => format!(
                "\n{}{}",
                INFO,
                style(format!("Suggestion: {}", message)).cyan()
            ),
            Level::Progress => return None,
        };
        Some(line)
    }

    fn highlight(&self, value: String) -> String {
        if self.use_colors {
            style(value).cyan().bold().to_string()
        } else {
            value
        }
    }

    fn print_human_summary(&self, stats: &ExtractionStats) {
        println!();
        self.print_separator();

        if self.use_colors {
            println!("{} {}", style(stats.summary_line()).green().bold(), CHECKMARK);
        } else {
            println!("✓ {}", stats.summary_line());
        }

        println!();
        println!("  Units processed: {}", self.highlight(stats.units_processed.to_string()));
        println!("  Units not found: {}", self.highlight(stats.units_not_found.to_string()));
        println!("  Files read:      {}", self.highlight(stats.files_read.to_string()));
        println!("  Rows:            {}", self.highlight(stats.rows.to_string()));
        println!(
            "  Time taken:      {}",
            self.highlight(format_duration(stats.elapsed()))
        );

        if !stats.errors.is_empty() {
            println!("  Errors:          {}", stats.errors.len());
        }

        self.print_separator();
    }

    fn print_json_summary(&self, stats: &ExtractionStats) {
        let summary = serde_json::json!({
            "type": "summary",
            "message": stats.summary_line(),
            "units_processed": stats.units_processed,
            "units_not_found": stats.units_not_found,
            "files_read": stats.files_read,
            "rows": stats.rows,
            "duration_ms": stats.elapsed().as_millis(),
            "errors": stats.errors.len(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        println!(
            "{}",
            serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_plain_summary(&self, stats: &ExtractionStats) {
        println!("{}", stats.summary_line());
        println!("Units not found: {}", stats.units_not_found);
        println!("Files read: {}", stats.files_read);
        println!("Rows: {}", stats.rows);
        if !stats.errors.is_empty() {
            println!("Errors: {}", stats.errors.len());
        }
    }
}

fn json_line(level: Level, message: &str) -> String {
    let object = serde_json::json!({
        "type": "message",
        "level": level.name(),
        "message": message,
        "timestamp": chrono::Utc::now().to_rfc3339()
    });
    serde_json::to_string(&object).unwrap_or_else(|_| "{}".to_string())
}

fn plain_line(level: Level, message: &str) -> String {
    match level {
        Level::Progress => message.to_string(),
        Level::Operation => format!("STARTING: {}", message),
        _ => format!("{}: {}", level.name().to_uppercase(), message),
    }
}
