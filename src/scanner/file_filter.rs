use crate::config::SearchConfig;
use std::path::Path;

/// Case-insensitive keyword and extension matching for unit contents.
pub struct FileFilter {
    keyword: String,
    extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(config: &SearchConfig) -> Self {
        Self::with_keyword(&config.keyword, &config.extensions)
    }

    pub fn with_keyword<S: AsRef<str>>(keyword: &str, extensions: &[S]) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Directories are matched on their full path, not just the last component.
    pub fn matches_directory(&self, path: &Path) -> bool {
        path.to_string_lossy().to_lowercase().contains(&self.keyword)
    }

    pub fn matches_file(&self, path: &Path) -> bool {
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            return false;
        };

        if is_lock_file(filename) {
            return false;
        }

        filename.to_lowercase().contains(&self.keyword) && self.has_spreadsheet_extension(path)
    }

    pub fn has_spreadsheet_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn get_extensions(&self) -> &Vec<String> {
        &self.extensions
    }
}

/// Excel leaves `~$name.xlsm` owner files next to open workbooks.
fn is_lock_file(filename: &str) -> bool {
    filename.starts_with("~$")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_filter() -> FileFilter {
        FileFilter::with_keyword("CAL", &["xlsm"])
    }

    #[test]
    fn test_directory_matching_uses_full_path() {
        let filter = create_test_filter();

        assert!(filter.matches_directory(Path::new("/machines/SN1/Calibration")));
        assert!(filter.matches_directory(Path::new("/machines/SN1/light_CAL")));
        assert!(!filter.matches_directory(Path::new("/machines/SN1/Service")));
        // the keyword may sit anywhere in the path
        assert!(filter.matches_directory(Path::new("/local/SN1/Service")));
    }

    #[test]
    fn test_file_matching() {
        let filter = create_test_filter();

        assert!(filter.matches_file(Path::new("SN1_cal_test.xlsm")));
        assert!(filter.matches_file(Path::new("SN1_CAL_TEST.XLSM")));
        assert!(!filter.matches_file(Path::new("SN1_cal_test.xlsx")));
        assert!(!filter.matches_file(Path::new("SN1_service.xlsm")));
        assert!(!filter.matches_file(Path::new("cal.xlsm.bak")));
        assert!(!filter.matches_file(Path::new("calibration")));
    }

    #[test]
    fn test_lock_files_are_skipped() {
        let filter = create_test_filter();
        assert!(!filter.matches_file(Path::new("~$SN1_cal.xlsm")));
    }

    #[test]
    fn test_extension_normalization() {
        let filter = FileFilter::with_keyword("cal", &[".XLSM", "xlsx"]);
        assert_eq!(filter.get_extensions(), &vec!["xlsm", "xlsx"]);
        assert!(filter.has_spreadsheet_extension(Path::new("a.Xlsx")));
        assert_eq!(filter.keyword(), "cal");
    }

    #[test]
    fn test_empty_keyword_matches_everything() {
        let filter = FileFilter::with_keyword("", &["xlsm"]);
        assert!(filter.matches_directory(Path::new("anything")));
        assert!(filter.matches_file(Path::new("whatever.xlsm")));
    }
}
