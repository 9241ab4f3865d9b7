pub mod file_filter;
pub mod unit_locator;

pub use file_filter::FileFilter;
pub use unit_locator::{UnitLocator, UnitLookup};
