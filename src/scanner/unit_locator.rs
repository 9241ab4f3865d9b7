use crate::config::SearchConfig;
use crate::error::{MachineSurferError, Result};
use crate::scanner::file_filter::FileFilter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// What a unit directory holds. A missing unit is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitLookup {
    NotFound { unit_dir: PathBuf },
    Found { unit_dir: PathBuf, files: Vec<PathBuf> },
}

impl UnitLookup {
    pub fn unit_dir(&self) -> &Path {
        match self {
            UnitLookup::NotFound { unit_dir } | UnitLookup::Found { unit_dir, .. } => unit_dir,
        }
    }
}

/// Finds the spreadsheets belonging to one serial-numbered unit:
/// `root/<prefix><serial>/<dir matching keyword>/<file matching keyword>`.
pub struct UnitLocator {
    root: PathBuf,
    unit_prefix: String,
    filter: FileFilter,
}

impl UnitLocator {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            root: config.root.clone(),
            unit_prefix: config.unit_prefix.clone(),
            filter: FileFilter::new(config),
        }
    }

    pub fn unit_directory(&self, serial: u32) -> PathBuf {
        self.root.join(format!("{}{}", self.unit_prefix, serial))
    }

    /// Matching files in discovery order (subdirectory name, then file name).
    /// A unit with nothing matching is `Found` with no files.
    pub fn locate(&self, serial: u32) -> Result<UnitLookup> {
        let unit_dir = self.unit_directory(serial);

        if !unit_dir.is_dir() {
            return Ok(UnitLookup::NotFound { unit_dir });
        }

        let mut files = Vec::new();
        for directory in self.matching_directories(&unit_dir)? {
            files.extend(self.matching_files(&directory)?);
        }

        Ok(UnitLookup::Found { unit_dir, files })
    }

    fn matching_directories(&self, unit_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut directories = Vec::new();

        for entry in list_entries(unit_dir) {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() && self.filter.matches_directory(path) {
                directories.push(path.to_path_buf());
            }
        }

        Ok(directories)
    }

    fn matching_files(&self, directory: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in list_entries(directory) {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && self.filter.matches_file(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

/// Immediate children of `dir`, sorted by name.
fn list_entries(dir: &Path) -> impl Iterator<Item = Result<walkdir::DirEntry>> + '_ {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .map(move |entry| {
            entry.map_err(|err| MachineSurferError::Scan {
                path: err
                    .path()
                    .unwrap_or(dir)
                    .display()
                    .to_string(),
                message: err.to_string(),
            })
        })
}
