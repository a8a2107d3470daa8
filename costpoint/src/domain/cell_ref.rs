use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One hours cell in the timesheet grid.
///
/// Rows are 0-based (charge code rows), columns are 1-based (pay period days). The host
/// addresses the cell's input as `DAY<column>_HRS-_<row>_E`, which is what `Display`
/// renders and `FromStr` parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    pub row: u32,
    pub column: u32,
}

impl CellRef {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn element_id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DAY{}_HRS-_{}_E", self.column, self.row)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("not an hours cell id: {0}")]
pub struct ParseCellRefError(String);

impl FromStr for CellRef {
    type Err = ParseCellRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCellRefError(s.to_string());

        let rest = s.strip_prefix("DAY").ok_or_else(err)?;
        let (column, rest) = rest.split_once("_HRS-_").ok_or_else(err)?;
        let row = rest.strip_suffix("_E").ok_or_else(err)?;

        Ok(Self {
            row: row.parse().map_err(|_| err())?,
            column: column.parse().map_err(|_| err())?,
        })
    }
}
