use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::{
    hours_match, CellRef, Outcome, ReportItem, SkipReason, Subject, TimeEntry, UpdateInstruction,
};
use crate::grid::GridLayout;
use crate::page::{HostPage, PageError};

/// What the page shows for one hours cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellState {
    pub hours: String,
    pub note: String,
    pub automated: bool,
}

impl CellState {
    fn is_blank(&self) -> bool {
        self.hours.trim().is_empty() && self.note.trim().is_empty()
    }

    fn shows(&self, entry: &TimeEntry) -> bool {
        hours_match(&self.hours, entry.hours) && self.note.trim() == entry.notes.trim()
    }
}

/// The slice of page state reconciliation looks at.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    /// Cells the entries resolve to. A resolved cell absent here is not on the page.
    pub cells: HashMap<CellRef, CellState>,
    /// Every cell carrying the automation marker.
    pub marked: BTreeSet<CellRef>,
}

/// Reads the cells the entries point at plus every marked cell.
pub async fn read_page_state<P>(
    page: &P,
    layout: &GridLayout,
    entries: &[TimeEntry],
    marker_class: &str,
) -> Result<PageState, PageError>
where
    P: HostPage + ?Sized,
{
    let mut state = PageState::default();

    for element in page.elements_with_class(marker_class).await? {
        match element.id.parse::<CellRef>() {
            Ok(cell) => {
                state.marked.insert(cell);
            }
            Err(e) => warn!(error = %e, "Marker found on an element that is not an hours cell"),
        }
    }

    let targets: BTreeSet<CellRef> = entries
        .iter()
        .filter_map(|entry| layout.cell_for(entry).ok())
        .collect();

    for cell in targets {
        let id = cell.element_id();
        let Some(hours) = page.input_value(&id).await? else {
            continue;
        };
        let note = page.cell_note(&id).await?.unwrap_or_default();
        let automated = page.has_class(&id, marker_class).await?;

        state.cells.insert(
            cell,
            CellState {
                hours,
                note,
                automated,
            },
        );
    }

    Ok(state)
}

/// Instructions for the sequencer plus the entries reconciliation left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePlan {
    pub instructions: Vec<UpdateInstruction>,
    pub skipped: Vec<ReportItem>,
}

impl UpdatePlan {
    pub fn writes(&self) -> impl Iterator<Item = &UpdateInstruction> {
        self.instructions.iter().filter(|i| !i.is_clear())
    }

    pub fn clears(&self) -> impl Iterator<Item = &UpdateInstruction> {
        self.instructions.iter().filter(|i| i.is_clear())
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Decides which cells to write and which to clear.
///
/// A cell is written when the automation owns it (it carries the marker) or when it is
/// blank; hand-entered hours or notes are never overwritten. Owned cells that already
/// show their entry are left as they are. Marked cells no entry resolves to any more are
/// cleared. Writes come first, in entry order, then clears.
pub fn plan_updates(entries: &[TimeEntry], layout: &GridLayout, state: &PageState) -> UpdatePlan {
    let mut plan = UpdatePlan::default();

    let mut resolved: Vec<(CellRef, &TimeEntry)> = Vec::with_capacity(entries.len());
    let mut positions: HashMap<CellRef, usize> = HashMap::new();

    for entry in entries {
        let cell = match layout.cell_for(entry) {
            Ok(cell) => cell,
            Err(reason) => {
                warn!(date = %entry.date, charge_code = %entry.charge_code, %reason, "Skipping entry");
                plan.skipped.push(entry_item(entry, reason));
                continue;
            }
        };

        if let Some(&position) = positions.get(&cell) {
            warn!(%cell, "Several entries target the same cell, keeping the last");
            let earlier = std::mem::replace(&mut resolved[position].1, entry);
            plan.skipped.push(entry_item(earlier, SkipReason::Superseded));
        } else {
            positions.insert(cell, resolved.len());
            resolved.push((cell, entry));
        }
    }

    for (cell, entry) in &resolved {
        let Some(current) = state.cells.get(cell) else {
            warn!(%cell, "Hours cell not found on the page");
            plan.skipped.push(entry_item(entry, SkipReason::CellMissing(*cell)));
            continue;
        };

        if current.automated {
            if current.shows(entry) {
                debug!(%cell, "Cell already up to date");
                plan.skipped.push(entry_item(entry, SkipReason::Unchanged));
                continue;
            }
        } else if !current.is_blank() {
            debug!(%cell, "Cell holds user data");
            plan.skipped.push(entry_item(entry, SkipReason::UserOwned));
            continue;
        }

        plan.instructions.push(UpdateInstruction::write(*cell, entry));
    }

    for cell in &state.marked {
        if !positions.contains_key(cell) {
            debug!(%cell, "Marked cell no longer has an entry");
            plan.instructions.push(UpdateInstruction::clear(*cell));
        }
    }

    plan
}

fn entry_item(entry: &TimeEntry, reason: SkipReason) -> ReportItem {
    ReportItem {
        subject: Subject::Entry {
            date: entry.date.clone(),
            charge_code: entry.charge_code.clone(),
        },
        outcome: Outcome::skipped(reason),
    }
}
