//! A1 ranges.

use serde::{Deserialize, Serialize};

/// A rectangular block of one sheet tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRange {
    /// Tab name.
    pub sheet_name: String,
    /// First row, 1-based, inclusive.
    pub start_row: u32,
    /// Last row, 1-based, inclusive.
    pub end_row: u32,
    /// First column letter(s), e.g. "A".
    pub start_column: String,
    /// Last column letter(s), e.g. "AD".
    pub end_column: String,
}

impl Default for SheetRange {
    fn default() -> Self {
        Self {
            sheet_name: "78ds17".to_string(),
            start_row: 15,
            end_row: 1000,
            start_column: "A".to_string(),
            end_column: "AD".to_string(),
        }
    }
}

impl SheetRange {
    /// Default rows and columns on another tab.
    pub fn for_sheet(sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            ..Default::default()
        }
    }

    /// Check that the range is well formed.
    pub fn validate(&self) -> Result<(), String> {
        if self.sheet_name.trim().is_empty() {
            return Err("sheet name is empty".to_string());
        }
        if self.start_row == 0 || self.end_row < self.start_row {
            return Err(format!(
                "invalid row range {}..{}",
                self.start_row, self.end_row
            ));
        }
        for column in [&self.start_column, &self.end_column] {
            if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(format!("invalid column '{}'", column));
            }
        }
        Ok(())
    }

    /// Render as A1 notation, quoting the tab name when needed.
    pub fn to_a1(&self) -> String {
        let plain = self
            .sheet_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
        let sheet = if plain {
            self.sheet_name.clone()
        } else {
            format!("'{}'", self.sheet_name.replace('\'', "''"))
        };
        format!(
            "{}!{}{}:{}{}",
            sheet,
            self.start_column.to_ascii_uppercase(),
            self.start_row,
            self.end_column.to_ascii_uppercase(),
            self.end_row
        )
    }
}
