use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::{
    HostPage, InputElement, PageError, TextElement, COMMENT_TRIGGER_CLASS, DATE_HEADER_CLASS,
    NOTE_CONFIRM_ID, NOTE_EDITOR_ID,
};

const TRIGGER_SUFFIX: &str = "_CMT";
const ICON_SUFFIX: &str = "_ICON";

/// Serializable picture of a timesheet grid: what a capture of the host page holds and
/// what [`GridPage`] hands back after a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GridSnapshot {
    #[serde(default)]
    pub headers: Vec<TextElement>,
    #[serde(default)]
    pub charge_codes: Vec<InputElement>,
    #[serde(default)]
    pub cells: Vec<CellSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub id: String,
    #[serde(default)]
    pub hours: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(default = "default_true")]
    pub comment_trigger: bool,
}

fn default_true() -> bool {
    true
}

impl CellSnapshot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            comment_trigger: true,
            ..Default::default()
        }
    }

    pub fn with_hours(mut self, hours: impl Into<String>) -> Self {
        self.hours = hours.into();
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn without_comment_trigger(mut self) -> Self {
        self.comment_trigger = false;
        self
    }
}

/// Side effects the host would observe, recorded in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    HoursCommitted { cell: String, hours: String },
    NoteCommitted { cell: String, note: String },
    /// A click the host swallowed without acting on it.
    ClickIgnored(String),
}

#[derive(Debug)]
struct Cell {
    id: String,
    hours: String,
    pending: Option<String>,
    note: Option<String>,
    classes: BTreeSet<String>,
    has_trigger: bool,
    trigger_visible: bool,
}

#[derive(Debug)]
struct Overlay {
    cell: String,
    text: String,
    opened_at: Instant,
}

#[derive(Debug)]
struct GridState {
    headers: Vec<TextElement>,
    charge_codes: Vec<InputElement>,
    cells: Vec<Cell>,
    focused: Option<String>,
    armed: Option<String>,
    overlay: Option<Overlay>,
    events: Vec<PageEvent>,
}

impl GridState {
    fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.iter().find(|c| c.id == id)
    }

    fn cell_mut(&mut self, id: &str) -> Result<&mut Cell, PageError> {
        self.cells
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| PageError::ElementNotFound(id.to_string()))
    }

    /// The cell owning a decorated id such as a trigger or an icon.
    fn owner(&self, id: &str, suffix: &str) -> Option<&Cell> {
        id.strip_suffix(suffix).and_then(|cell_id| self.cell(cell_id))
    }
}

/// In-memory host page that follows Costpoint's note editor protocol.
///
/// Hours only reach the host when the cell loses focus. The note editor opens when the
/// cell's comment trigger has been shown and clicked and then the note icon next to the
/// cell is clicked; the overlay's controls appear `overlay_latency` after that and the
/// confirm button commits the text to the cell that opened it. A trigger click while
/// the overlay is still open is swallowed and closes the overlay.
#[derive(Debug)]
pub struct GridPage {
    state: Mutex<GridState>,
    overlay_latency: Duration,
}

impl GridPage {
    pub fn new(snapshot: GridSnapshot) -> Self {
        let cells = snapshot
            .cells
            .into_iter()
            .map(|c| Cell {
                id: c.id,
                hours: c.hours,
                pending: None,
                note: c.note,
                classes: c.classes.into_iter().collect(),
                has_trigger: c.comment_trigger,
                trigger_visible: false,
            })
            .collect();

        Self {
            state: Mutex::new(GridState {
                headers: snapshot.headers,
                charge_codes: snapshot.charge_codes,
                cells,
                focused: None,
                armed: None,
                overlay: None,
                events: Vec::new(),
            }),
            overlay_latency: Duration::ZERO,
        }
    }

    pub fn with_overlay_latency(mut self, latency: Duration) -> Self {
        self.overlay_latency = latency;
        self
    }

    pub fn snapshot(&self) -> GridSnapshot {
        let state = self.lock();
        GridSnapshot {
            headers: state.headers.clone(),
            charge_codes: state.charge_codes.clone(),
            cells: state
                .cells
                .iter()
                .map(|c| CellSnapshot {
                    id: c.id.clone(),
                    hours: c.hours.clone(),
                    note: c.note.clone(),
                    classes: c.classes.iter().cloned().collect(),
                    comment_trigger: c.has_trigger,
                })
                .collect(),
        }
    }

    pub fn events(&self) -> Vec<PageEvent> {
        self.lock().events.clone()
    }

    fn lock(&self) -> MutexGuard<'_, GridState> {
        // A panic while holding the lock leaves plain data behind, still usable.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn overlay_ready(&self, state: &GridState) -> bool {
        state
            .overlay
            .as_ref()
            .is_some_and(|o| o.opened_at.elapsed() >= self.overlay_latency)
    }
}

#[async_trait]
impl HostPage for GridPage {
    async fn elements_with_class(&self, class: &str) -> Result<Vec<TextElement>, PageError> {
        let state = self.lock();

        if class == DATE_HEADER_CLASS {
            return Ok(state.headers.clone());
        }

        if class == COMMENT_TRIGGER_CLASS {
            return Ok(state
                .cells
                .iter()
                .filter(|c| c.has_trigger)
                .map(|c| TextElement {
                    id: format!("{}{}", c.id, TRIGGER_SUFFIX),
                    text: String::new(),
                })
                .collect());
        }

        Ok(state
            .cells
            .iter()
            .filter(|c| c.classes.contains(class))
            .map(|c| TextElement {
                id: c.id.clone(),
                text: c.hours.clone(),
            })
            .collect())
    }

    async fn inputs(&self) -> Result<Vec<InputElement>, PageError> {
        let state = self.lock();
        let mut inputs = state.charge_codes.clone();

        inputs.extend(state.cells.iter().map(|c| InputElement {
            id: c.id.clone(),
            value: c.hours.clone(),
        }));

        if self.overlay_ready(&state) {
            if let Some(overlay) = &state.overlay {
                inputs.push(InputElement {
                    id: NOTE_EDITOR_ID.to_string(),
                    value: overlay.text.clone(),
                });
            }
        }

        Ok(inputs)
    }

    async fn element_exists(&self, id: &str) -> Result<bool, PageError> {
        let state = self.lock();

        if id == NOTE_EDITOR_ID || id == NOTE_CONFIRM_ID {
            return Ok(self.overlay_ready(&state));
        }

        Ok(state.headers.iter().any(|h| h.id == id)
            || state.charge_codes.iter().any(|i| i.id == id)
            || state.cell(id).is_some()
            || state.owner(id, ICON_SUFFIX).is_some()
            || state.owner(id, TRIGGER_SUFFIX).is_some_and(|c| c.has_trigger))
    }

    async fn input_value(&self, id: &str) -> Result<Option<String>, PageError> {
        let state = self.lock();

        if id == NOTE_EDITOR_ID {
            if !self.overlay_ready(&state) {
                return Ok(None);
            }
            return Ok(state.overlay.as_ref().map(|o| o.text.clone()));
        }

        if let Some(cell) = state.cell(id) {
            return Ok(Some(cell.hours.clone()));
        }

        Ok(state
            .charge_codes
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.value.clone()))
    }

    async fn cell_note(&self, cell_id: &str) -> Result<Option<String>, PageError> {
        let state = self.lock();
        state
            .cell(cell_id)
            .map(|c| c.note.clone())
            .ok_or_else(|| PageError::ElementNotFound(cell_id.to_string()))
    }

    async fn has_class(&self, id: &str, class: &str) -> Result<bool, PageError> {
        let state = self.lock();
        state
            .cell(id)
            .map(|c| c.classes.contains(class))
            .ok_or_else(|| PageError::ElementNotFound(id.to_string()))
    }

    async fn add_class(&self, id: &str, class: &str) -> Result<(), PageError> {
        self.lock().cell_mut(id)?.classes.insert(class.to_string());
        Ok(())
    }

    async fn remove_class(&self, id: &str, class: &str) -> Result<(), PageError> {
        self.lock().cell_mut(id)?.classes.remove(class);
        Ok(())
    }

    async fn focus(&self, id: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        state.cell_mut(id)?;
        state.focused = Some(id.to_string());
        Ok(())
    }

    async fn blur(&self, id: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        if state.focused.as_deref() != Some(id) {
            return Ok(());
        }
        state.focused = None;

        let cell = state.cell_mut(id)?;
        if let Some(value) = cell.pending.take() {
            cell.hours = value.clone();
            state.events.push(PageEvent::HoursCommitted {
                cell: id.to_string(),
                hours: value,
            });
        }
        Ok(())
    }

    async fn set_value(&self, id: &str, value: &str) -> Result<(), PageError> {
        let mut state = self.lock();

        if id == NOTE_EDITOR_ID {
            if !self.overlay_ready(&state) {
                return Err(PageError::ElementNotFound(id.to_string()));
            }
            if let Some(overlay) = state.overlay.as_mut() {
                overlay.text = value.to_string();
            }
            return Ok(());
        }

        if let Some(input) = state.charge_codes.iter_mut().find(|i| i.id == id) {
            input.value = value.to_string();
            return Ok(());
        }

        state.cell_mut(id)?.pending = Some(value.to_string());
        Ok(())
    }

    async fn comment_trigger(&self, cell_id: &str) -> Result<Option<String>, PageError> {
        let state = self.lock();
        Ok(state
            .cell(cell_id)
            .filter(|c| c.has_trigger)
            .map(|c| format!("{}{}", c.id, TRIGGER_SUFFIX)))
    }

    async fn next_sibling(&self, id: &str) -> Result<Option<String>, PageError> {
        let state = self.lock();
        Ok(state.cell(id).map(|c| format!("{}{}", c.id, ICON_SUFFIX)))
    }

    async fn show(&self, id: &str) -> Result<(), PageError> {
        let mut state = self.lock();
        let cell_id = id
            .strip_suffix(TRIGGER_SUFFIX)
            .ok_or_else(|| PageError::ElementNotFound(id.to_string()))?
            .to_string();
        let cell = state.cell_mut(&cell_id)?;
        if !cell.has_trigger {
            return Err(PageError::ElementNotFound(id.to_string()));
        }
        cell.trigger_visible = true;
        Ok(())
    }

    async fn click(&self, id: &str) -> Result<(), PageError> {
        let mut state = self.lock();

        if id == NOTE_CONFIRM_ID {
            if !self.overlay_ready(&state) {
                return Err(PageError::ElementNotFound(id.to_string()));
            }
            if let Some(overlay) = state.overlay.take() {
                let cell = state.cell_mut(&overlay.cell)?;
                cell.note = (!overlay.text.is_empty()).then(|| overlay.text.clone());
                state.events.push(PageEvent::NoteCommitted {
                    cell: overlay.cell,
                    note: overlay.text,
                });
            }
            return Ok(());
        }

        if let Some(cell_id) = state.owner(id, TRIGGER_SUFFIX).map(|c| c.id.clone()) {
            let cell = state.cell_mut(&cell_id)?;
            if !cell.has_trigger {
                return Err(PageError::ElementNotFound(id.to_string()));
            }
            if !cell.trigger_visible {
                return Err(PageError::NotInteractable(id.to_string()));
            }
            if state.overlay.take().is_some() {
                state.armed = None;
                state.events.push(PageEvent::ClickIgnored(id.to_string()));
                return Ok(());
            }
            state.armed = Some(cell_id);
            return Ok(());
        }

        if let Some(cell_id) = state.owner(id, ICON_SUFFIX).map(|c| c.id.clone()) {
            if state.armed.as_deref() == Some(cell_id.as_str()) && state.overlay.is_none() {
                let text = state.cell(&cell_id).and_then(|c| c.note.clone());
                state.armed = None;
                state.overlay = Some(Overlay {
                    cell: cell_id,
                    text: text.unwrap_or_default(),
                    opened_at: Instant::now(),
                });
            } else {
                state.events.push(PageEvent::ClickIgnored(id.to_string()));
            }
            return Ok(());
        }

        if state.cell(id).is_some()
            || state.headers.iter().any(|h| h.id == id)
            || state.charge_codes.iter().any(|i| i.id == id)
        {
            return Ok(());
        }

        Err(PageError::ElementNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> GridPage {
        GridPage::new(GridSnapshot {
            headers: vec![],
            charge_codes: vec![InputElement {
                id: "UDT02_ID-_0_E".to_string(),
                value: "ADMIN".to_string(),
            }],
            cells: vec![
                CellSnapshot::new("DAY1_HRS-_0_E"),
                CellSnapshot::new("DAY2_HRS-_0_E").with_note("existing"),
            ],
        })
    }

    async fn open_editor(page: &GridPage, cell: &str) {
        let trigger = page.comment_trigger(cell).await.unwrap().unwrap();
        page.show(&trigger).await.unwrap();
        page.click(&trigger).await.unwrap();
        let icon = page.next_sibling(cell).await.unwrap().unwrap();
        page.click(&icon).await.unwrap();
    }

    #[tokio::test]
    async fn hours_commit_on_blur() {
        let page = page();

        page.focus("DAY1_HRS-_0_E").await.unwrap();
        page.set_value("DAY1_HRS-_0_E", "4.00").await.unwrap();
        assert_eq!(
            page.input_value("DAY1_HRS-_0_E").await.unwrap(),
            Some(String::new())
        );

        page.blur("DAY1_HRS-_0_E").await.unwrap();
        assert_eq!(
            page.input_value("DAY1_HRS-_0_E").await.unwrap(),
            Some("4.00".to_string())
        );
    }

    #[tokio::test]
    async fn hidden_trigger_is_not_clickable() {
        let page = page();
        let err = page.click("DAY1_HRS-_0_E_CMT").await.unwrap_err();
        assert!(matches!(err, PageError::NotInteractable(_)));
    }

    #[tokio::test]
    async fn icon_without_armed_trigger_is_ignored() {
        let page = page();

        page.click("DAY1_HRS-_0_E_ICON").await.unwrap();

        assert!(!page.element_exists(NOTE_EDITOR_ID).await.unwrap());
        assert_eq!(
            page.events(),
            vec![PageEvent::ClickIgnored("DAY1_HRS-_0_E_ICON".to_string())]
        );
    }

    #[tokio::test]
    async fn editor_commits_note_to_opening_cell() {
        let page = page();

        open_editor(&page, "DAY2_HRS-_0_E").await;
        assert_eq!(
            page.input_value(NOTE_EDITOR_ID).await.unwrap(),
            Some("existing".to_string())
        );
        page.set_value(NOTE_EDITOR_ID, "replaced").await.unwrap();
        page.click(NOTE_CONFIRM_ID).await.unwrap();

        assert_eq!(
            page.cell_note("DAY2_HRS-_0_E").await.unwrap(),
            Some("replaced".to_string())
        );
        assert!(!page.element_exists(NOTE_EDITOR_ID).await.unwrap());
    }

    #[tokio::test]
    async fn empty_confirmation_removes_note() {
        let page = page();

        open_editor(&page, "DAY2_HRS-_0_E").await;
        page.set_value(NOTE_EDITOR_ID, "").await.unwrap();
        page.click(NOTE_CONFIRM_ID).await.unwrap();

        assert_eq!(page.cell_note("DAY2_HRS-_0_E").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_appears_after_latency() {
        let page = page().with_overlay_latency(Duration::from_millis(300));

        open_editor(&page, "DAY1_HRS-_0_E").await;
        assert!(!page.element_exists(NOTE_EDITOR_ID).await.unwrap());

        tokio::time::advance(Duration::from_millis(300)).await;
        assert!(page.element_exists(NOTE_EDITOR_ID).await.unwrap());
    }

    #[tokio::test]
    async fn trigger_click_while_overlay_open_is_swallowed() {
        let page = page();

        open_editor(&page, "DAY1_HRS-_0_E").await;
        page.show("DAY2_HRS-_0_E_CMT").await.unwrap();
        page.click("DAY2_HRS-_0_E_CMT").await.unwrap();

        assert!(!page.element_exists(NOTE_EDITOR_ID).await.unwrap());
        page.click("DAY2_HRS-_0_E_ICON").await.unwrap();
        assert!(!page.element_exists(NOTE_EDITOR_ID).await.unwrap());
    }

    #[test]
    fn snapshot_keeps_cells_and_classes() {
        let snapshot = GridSnapshot {
            headers: vec![TextElement {
                id: "hdr0".to_string(),
                text: "01/16/24".to_string(),
            }],
            charge_codes: vec![],
            cells: vec![CellSnapshot::new("DAY1_HRS-_0_E")
                .with_hours("1.00")
                .with_class("automated")],
        };

        assert_eq!(GridPage::new(snapshot.clone()).snapshot(), snapshot);
    }
}
