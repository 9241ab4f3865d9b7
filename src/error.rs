use thiserror::Error;

#[derive(Error, Debug)]
pub enum MachineSurferError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid cell address: {input:?}")]
    InvalidCellAddress { input: String },

    #[error("Sheet {sheet:?} not found in {path}")]
    SheetNotFound { path: String, sheet: String },

    #[error("Failed to read spreadsheet {path}: {message}")]
    SpreadsheetRead { path: String, message: String },

    #[error("Failed to scan {path}: {message}")]
    Scan { path: String, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to write report: {message}")]
    Report { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

impl MachineSurferError {
    /// Faults that the read-error policy may turn into placeholder rows.
    pub fn is_read_fault(&self) -> bool {
        matches!(
            self,
            MachineSurferError::SheetNotFound { .. }
                | MachineSurferError::SpreadsheetRead { .. }
                | MachineSurferError::Scan { .. }
        )
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for MachineSurferError {
    fn user_message(&self) -> String {
        match self {
            MachineSurferError::InvalidCellAddress { input } => {
                format!("{:?} is not a cell address", input)
            }
            MachineSurferError::SheetNotFound { path, sheet } => {
                format!("Workbook {} has no sheet named {:?}", path, sheet)
            }
            MachineSurferError::SpreadsheetRead { path, message } => {
                format!("Could not read {}: {}", path, message)
            }
            MachineSurferError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            MachineSurferError::Report { message } => {
                format!("Could not write the output workbook: {}", message)
            }
            MachineSurferError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            MachineSurferError::InvalidCellAddress { .. } => Some(
                "Cell addresses are one column letter followed by a row number, e.g. B20.".to_string()
            ),
            MachineSurferError::SheetNotFound { .. } => Some(
                "Check the sheet name with --sheet, or use --on-read-error record to keep going past files without it.".to_string()
            ),
            MachineSurferError::SpreadsheetRead { .. } => Some(
                "The file may be open in Excel or damaged. Use --on-read-error record to skip unreadable files.".to_string()
            ),
            MachineSurferError::Scan { .. } => Some(
                "Ensure you have read permission on the search directory.".to_string()
            ),
            MachineSurferError::Config { .. } => Some(
                "Check your configuration file syntax and the values passed on the command line.".to_string()
            ),
            MachineSurferError::Report { .. } => Some(
                "Make sure the output directory is writable and output.xlsx is not open in another program.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for MachineSurferError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        MachineSurferError::Report {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MachineSurferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = MachineSurferError::InvalidCellAddress {
            input: "20B".to_string(),
        };
        assert!(error.user_message().contains("20B"));
        assert!(error.suggestion().is_some());

        let error = MachineSurferError::SheetNotFound {
            path: "cal.xlsm".to_string(),
            sheet: "Summary".to_string(),
        };
        assert!(error.user_message().contains("Summary"));
    }

    #[test]
    fn test_read_fault_classification() {
        assert!(MachineSurferError::SpreadsheetRead {
            path: "a".to_string(),
            message: "bad zip".to_string(),
        }
        .is_read_fault());
        assert!(!MachineSurferError::Cancelled.is_read_fault());
        // output and config-file IO failures are never turned into ERR rows
        assert!(!MachineSurferError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ))
        .is_read_fault());
        assert!(!MachineSurferError::Config {
            message: "x".to_string()
        }
        .is_read_fault());
    }
}
