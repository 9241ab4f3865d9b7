use crate::error::{MachineSurferError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn cell_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][0-9]+$").expect("cell address pattern is valid"))
}

/// A single-letter-column cell reference such as `B20`.
///
/// The row is kept as the 1-based label the user typed. Conversion to a
/// 0-based grid row happens only in [`CellAddress::grid_position`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellAddress {
    source: String,
    column_index: usize,
    row_label: u32,
}

impl CellAddress {
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || MachineSurferError::InvalidCellAddress {
            input: input.to_string(),
        };

        if !cell_pattern().is_match(input) {
            return Err(invalid());
        }

        let mut chars = input.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let row_label: u32 = chars.as_str().parse().map_err(|_| invalid())?;

        Ok(Self {
            source: input.to_string(),
            column_index: column_letter_to_index(letter),
            row_label,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn column_index(&self) -> usize {
        self.column_index
    }

    pub fn row_label(&self) -> u32 {
        self.row_label
    }

    /// Zero-based `(row, column)` in a cell grid. Row label 0 has no grid row.
    pub fn grid_position(&self) -> Option<(usize, usize)> {
        let row = (self.row_label as usize).checked_sub(1)?;
        Some((row, self.column_index))
    }
}

impl FromStr for CellAddress {
    type Err = MachineSurferError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source.to_ascii_uppercase())
    }
}

fn column_letter_to_index(letter: char) -> usize {
    (letter.to_ascii_lowercase() as u8 - b'a') as usize
}

/// Parsed cell list plus the inputs that were not cell addresses.
#[derive(Debug, Clone, Default)]
pub struct CellList {
    pub cells: Vec<CellAddress>,
    pub rejected: Vec<String>,
}

/// Empty inputs are skipped outright; anything else that fails to parse is
/// dropped from the active list and reported in `rejected`.
pub fn parse_cell_list<S: AsRef<str>>(inputs: &[S]) -> CellList {
    let mut list = CellList::default();

    for input in inputs {
        let input = input.as_ref();
        if input.is_empty() {
            continue;
        }

        match CellAddress::parse(input) {
            Ok(cell) => list.cells.push(cell),
            Err(_) => list.rejected.push(input.to_string()),
        }
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_addresses() {
        let cell = CellAddress::parse("B20").unwrap();
        assert_eq!(cell.column_index(), 1);
        assert_eq!(cell.row_label(), 20);
        assert_eq!(cell.grid_position(), Some((19, 1)));

        let cell = CellAddress::parse("A1").unwrap();
        assert_eq!(cell.grid_position(), Some((0, 0)));

        let cell = CellAddress::parse("z999").unwrap();
        assert_eq!(cell.column_index(), 25);
        assert_eq!(cell.row_label(), 999);
    }

    #[test]
    fn test_column_is_case_insensitive() {
        let lower = CellAddress::parse("b20").unwrap();
        let upper = CellAddress::parse("B20").unwrap();
        assert_eq!(lower.column_index(), upper.column_index());
        assert_eq!(lower.to_string(), "B20");
        assert_eq!(lower.source(), "b20");
    }

    #[test]
    fn test_parse_rejects_non_addresses() {
        for input in ["", "20B", "AB1", "B", "B2C", " B2", "B-2", "1", "Ä1", "B١"] {
            assert!(
                matches!(
                    CellAddress::parse(input),
                    Err(MachineSurferError::InvalidCellAddress { .. })
                ),
                "Should reject: {:?}",
                input
            );
        }
    }

    #[test]
    fn test_row_overflow_is_rejected() {
        assert!(CellAddress::parse("A99999999999").is_err());
    }

    #[test]
    fn test_row_label_zero_has_no_grid_position() {
        let cell = CellAddress::parse("A0").unwrap();
        assert_eq!(cell.row_label(), 0);
        assert_eq!(cell.grid_position(), None);
    }

    #[test]
    fn test_from_str() {
        let cell: CellAddress = "E3".parse().unwrap();
        assert_eq!(cell.grid_position(), Some((2, 4)));
    }

    #[test]
    fn test_cell_list_filters_invalid_entries() {
        let inputs = ["A34", "", "B4", "nope", "e2", "4E"];
        let list = parse_cell_list(&inputs);

        assert_eq!(list.cells.len(), 3);
        assert_eq!(
            list.cells.iter().map(|c| c.source()).collect::<Vec<_>>(),
            vec!["A34", "B4", "e2"]
        );
        assert_eq!(list.rejected, vec!["nope", "4E"]);
    }

    #[test]
    fn test_cell_list_count_matches_valid_inputs() {
        let inputs: Vec<String> = (0..40)
            .map(|i| if i % 3 == 0 { format!("{}Q", i) } else { format!("C{}", i) })
            .collect();
        let valid = inputs.iter().filter(|s| CellAddress::parse(s).is_ok()).count();

        let list = parse_cell_list(&inputs);
        assert_eq!(list.cells.len(), valid);
        assert_eq!(list.cells.len() + list.rejected.len(), inputs.len());
    }
}
