use serde::Serialize;

use super::{CellRef, TimeEntry};

/// One write the sequencer will apply to the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateInstruction {
    pub cell: CellRef,
    pub hours: String,
    pub note: String,
}

impl UpdateInstruction {
    pub fn write(cell: CellRef, entry: &TimeEntry) -> Self {
        Self {
            cell,
            hours: entry.hours_text(),
            note: entry.notes.clone(),
        }
    }

    /// Empties a cell the automation wrote on an earlier run.
    pub fn clear(cell: CellRef) -> Self {
        Self {
            cell,
            hours: String::new(),
            note: String::new(),
        }
    }

    pub fn is_clear(&self) -> bool {
        self.hours.is_empty() && self.note.is_empty()
    }
}
