pub mod cell_address;
pub mod engine;
pub mod report;
pub mod workbook;

pub use cell_address::{parse_cell_list, CellAddress, CellList};
pub use engine::{ExtractionEngine, ExtractionResult, ExtractionStats, ResultRow, ResultTable, UnitProgress};
pub use report::{ConfigSnapshot, ReportWriter, RunReport};
pub use workbook::{CalamineReader, CellGrid, CellValue, SheetReader};
