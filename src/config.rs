use crate::error::{MachineSurferError, Result};
use crate::extractor::cell_address::{parse_cell_list, CellAddress};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CELLS: [&str; 16] = [
    "A34", "B4", "E2", "E3", "B20", "B21", "B22", "B23", "C20", "C21", "C22", "C23", "F20",
    "G20", "H20", "I20",
];

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchSettings,
    pub cells: CellSettings,
    pub output: OutputSettings,
    pub extraction: ExtractionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchSettings {
    pub root: PathBuf,
    pub unit_prefix: String,
    pub first_serial: u32,
    pub last_serial: u32,
    pub keyword: String,
    pub sheet_name: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CellSettings {
    pub addresses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub file_name: String,
    pub include_header: bool,
    pub generate_report: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub on_read_error: ReadErrorPolicy,
    /// Worker threads for the `parallel` feature; 0 means one per CPU.
    pub threads: usize,
}

/// What to do when a matched workbook (or a unit listing) cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    /// Stop the run; nothing is written.
    Abort,
    /// Record an ERR row for the file and keep going.
    #[default]
    Record,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("C:\\Machines"),
            unit_prefix: "SN".to_string(),
            first_serial: 33700,
            last_serial: 33726,
            keyword: "cal".to_string(),
            sheet_name: "Summary".to_string(),
            extensions: vec!["xlsm".to_string()],
        }
    }
}

impl Default for CellSettings {
    fn default() -> Self {
        Self {
            addresses: DEFAULT_CELLS.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("C:\\Desktop"),
            file_name: "output.xlsx".to_string(),
            include_header: true,
            generate_report: false,
        }
    }
}

/// Everything one extraction run needs, resolved and validated up front.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub root: PathBuf,
    pub output_directory: PathBuf,
    pub unit_prefix: String,
    pub first_serial: u32,
    pub last_serial: u32,
    pub keyword: String,
    pub sheet_name: String,
    pub extensions: Vec<String>,
    pub cells: Vec<CellAddress>,
    pub on_read_error: ReadErrorPolicy,
    pub threads: usize,
}

impl SearchConfig {
    /// Serial numbers in the run, ascending. Empty when first > last.
    pub fn serials(&self) -> std::ops::RangeInclusive<u32> {
        self.first_serial..=self.last_serial
    }

    pub fn unit_count(&self) -> usize {
        if self.last_serial < self.first_serial {
            0
        } else {
            ((self.last_serial - self.first_serial) as usize).saturating_add(1)
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MachineSurferError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MachineSurferError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| MachineSurferError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["machine-surfer.toml", ".machine-surfer.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref root) = cli_args.root {
            self.search.root = root.clone();
        }

        if let Some(ref output_dir) = cli_args.output_dir {
            self.output.directory = output_dir.clone();
        }

        if let Some(first) = cli_args.first_serial {
            self.search.first_serial = first;
        }

        if let Some(last) = cli_args.last_serial {
            self.search.last_serial = last;
        }

        if let Some(ref keyword) = cli_args.keyword {
            self.search.keyword = keyword.clone();
        }

        if let Some(ref sheet) = cli_args.sheet_name {
            self.search.sheet_name = sheet.clone();
        }

        if let Some(ref prefix) = cli_args.unit_prefix {
            self.search.unit_prefix = prefix.clone();
        }

        if let Some(ref cells) = cli_args.cells {
            self.cells.addresses = cells
                .iter()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect();
        }

        if let Some(ref extensions) = cli_args.extensions {
            self.search.extensions = extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(policy) = cli_args.on_read_error {
            self.extraction.on_read_error = policy;
        }

        if cli_args.no_header {
            self.output.include_header = false;
        }

        if cli_args.report {
            self.output.generate_report = true;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.search.sheet_name.trim().is_empty() {
            return Err(MachineSurferError::Config {
                message: "A sheet name must be specified".to_string(),
            });
        }

        if self.search.extensions.is_empty() {
            return Err(MachineSurferError::Config {
                message: "At least one spreadsheet extension must be specified".to_string(),
            });
        }

        if self.search.unit_prefix.contains(['/', '\\']) {
            return Err(MachineSurferError::Config {
                message: format!(
                    "Unit prefix must not contain path separators: {}",
                    self.search.unit_prefix
                ),
            });
        }

        let file_name = Path::new(&self.output.file_name);
        if file_name.components().count() != 1
            || !file_name
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
        {
            return Err(MachineSurferError::Config {
                message: format!(
                    "Output file name must be a plain .xlsx file name: {}",
                    self.output.file_name
                ),
            });
        }

        Ok(())
    }

    /// Resolve the run configuration. Cell strings that are not addresses
    /// are returned separately so the caller can warn about them.
    pub fn search_config(&self) -> (SearchConfig, Vec<String>) {
        let cell_list = parse_cell_list(&self.cells.addresses);

        let search = SearchConfig {
            root: self.search.root.clone(),
            output_directory: self.output.directory.clone(),
            unit_prefix: self.search.unit_prefix.clone(),
            first_serial: self.search.first_serial,
            last_serial: self.search.last_serial,
            keyword: self.search.keyword.to_lowercase(),
            sheet_name: self.search.sheet_name.clone(),
            extensions: self
                .search
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            cells: cell_list.cells,
            on_read_error: self.extraction.on_read_error,
            threads: self.extraction.threads,
        };

        (search, cell_list.rejected)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output.directory.join(&self.output.file_name)
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub root: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub first_serial: Option<u32>,
    pub last_serial: Option<u32>,
    pub keyword: Option<String>,
    pub sheet_name: Option<String>,
    pub unit_prefix: Option<String>,
    pub cells: Option<Vec<String>>,
    pub extensions: Option<String>,
    pub on_read_error: Option<ReadErrorPolicy>,
    pub no_header: bool,
    pub report: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: Option<PathBuf>) -> Self {
        self.root = root;
        self
    }

    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn with_serial_range(mut self, first: Option<u32>, last: Option<u32>) -> Self {
        self.first_serial = first;
        self.last_serial = last;
        self
    }

    pub fn with_keyword(mut self, keyword: Option<String>) -> Self {
        self.keyword = keyword;
        self
    }

    pub fn with_sheet_name(mut self, sheet_name: Option<String>) -> Self {
        self.sheet_name = sheet_name;
        self
    }

    pub fn with_unit_prefix(mut self, prefix: Option<String>) -> Self {
        self.unit_prefix = prefix;
        self
    }

    pub fn with_cells(mut self, cells: Option<Vec<String>>) -> Self {
        self.cells = cells;
        self
    }

    pub fn with_extensions(mut self, extensions: Option<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_read_error_policy(mut self, policy: Option<ReadErrorPolicy>) -> Self {
        self.on_read_error = policy;
        self
    }

    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    pub fn with_report(mut self, report: bool) -> Self {
        self.report = report;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.first_serial, 33700);
        assert_eq!(config.search.last_serial, 33726);
        assert_eq!(config.search.keyword, "cal");
        assert_eq!(config.search.sheet_name, "Summary");
        assert_eq!(config.cells.addresses.len(), 16);
        assert_eq!(config.cells.addresses[0], "A34");
        assert_eq!(config.extraction.on_read_error, ReadErrorPolicy::Record);
        assert_eq!(config.output_path().file_name().unwrap(), "output.xlsx");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.search.extensions.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.file_name = "report.csv".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.search.unit_prefix = "SN/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.search.first_serial = 100;
        config.extraction.on_read_error = ReadErrorPolicy::Abort;
        let temp_file = NamedTempFile::new().unwrap();

        std::fs::write(temp_file.path(), toml::to_string_pretty(&config).unwrap()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.search.first_serial, 100);
        assert_eq!(loaded_config.extraction.on_read_error, ReadErrorPolicy::Abort);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "[search]\nkeyword = \"light\"\n\n[extraction]\non_read_error = \"abort\"\n",
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.search.keyword, "light");
        assert_eq!(config.search.sheet_name, "Summary");
        assert_eq!(config.cells.addresses.len(), 16);
        assert_eq!(config.extraction.on_read_error, ReadErrorPolicy::Abort);
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(MachineSurferError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_serial_range(Some(100), Some(102))
            .with_keyword(Some("CAL".to_string()))
            .with_cells(Some(vec!["A1".to_string(), " B2 ".to_string(), "".to_string()]))
            .with_extensions(Some(".XLSM, xlsx".to_string()))
            .with_no_header(true);

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.search.first_serial, 100);
        assert_eq!(config.search.last_serial, 102);
        assert_eq!(config.cells.addresses, vec!["A1", "B2"]);
        assert_eq!(config.search.extensions, vec!["xlsm", "xlsx"]);
        assert!(!config.output.include_header);
        // untouched values keep their defaults
        assert_eq!(config.search.sheet_name, "Summary");
    }

    #[test]
    fn test_search_config_resolution() {
        let mut config = Config::default();
        config.search.keyword = "CaL".to_string();
        config.cells.addresses = vec!["b20".to_string(), "20B".to_string(), "C3".to_string()];

        let (search, rejected) = config.search_config();
        assert_eq!(search.keyword, "cal");
        assert_eq!(search.cells.len(), 2);
        assert_eq!(rejected, vec!["20B"]);
    }

    #[test]
    fn test_unit_count() {
        let mut config = Config::default();
        let (search, _) = config.search_config();
        assert_eq!(search.unit_count(), 27);

        config.search.first_serial = 10;
        config.search.last_serial = 5;
        let (search, _) = config.search_config();
        assert_eq!(search.unit_count(), 0);
        assert_eq!(search.serials().count(), 0);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(sample.contains("[search]"));
        assert!(sample.contains("[cells]"));
        assert!(sample.contains("[output]"));
        assert!(sample.contains("[extraction]"));
    }
}
