use serde::Serialize;
use thiserror::Error;

use super::CellRef;

/// Why an entry or cell was deliberately left alone.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no visible column for date {0}")]
    UnmappedDate(String),
    #[error("no row for charge code {0}")]
    UnmappedChargeCode(String),
    #[error("hours cell {0} is not on the page")]
    CellMissing(CellRef),
    #[error("cell holds hours or a note entered by hand")]
    UserOwned,
    #[error("cell already shows this entry")]
    Unchanged,
    #[error("a later entry targets the same cell")]
    Superseded,
}

/// The step at which writing a cell broke off.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("hours input not found")]
    HoursInputMissing,
    #[error("comment trigger not found")]
    CommentTriggerMissing,
    #[error("note icon not found")]
    NoteIconMissing,
    #[error("note editor did not open")]
    NoteEditorMissing,
    #[error("note confirm button not found")]
    ConfirmButtonMissing,
    #[error("page error: {0}")]
    Page(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Applied,
    Skipped { skipped: SkipReason },
    Failed { failed: FailureReason },
}

impl Outcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { skipped: reason }
    }

    pub fn failed(reason: FailureReason) -> Self {
        Self::Failed { failed: reason }
    }
}

/// What a report line is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Subject {
    Entry { date: String, charge_code: String },
    Write { cell: CellRef },
    Clear { cell: CellRef },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportItem {
    pub subject: Subject,
    pub outcome: Outcome,
}

/// Everything one automation run did, in the order it happened.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunReport {
    pub fetched: usize,
    pub items: Vec<ReportItem>,
}

impl RunReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    /// Cells the run cleared successfully.
    pub fn cleared(&self) -> Vec<CellRef> {
        self.items
            .iter()
            .filter_map(|item| match (&item.subject, &item.outcome) {
                (Subject::Clear { cell }, Outcome::Applied) => Some(*cell),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }
}
