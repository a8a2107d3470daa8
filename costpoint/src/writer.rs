use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::{FailureReason, Outcome, UpdateInstruction};
use crate::page::{HostPage, PageError, NOTE_CONFIRM_ID, NOTE_EDITOR_ID};

/// How the writer waits for the host's note editor to catch up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStrategy {
    /// Sleep, then look once. Matches the delays the host was originally tuned for.
    Fixed(Duration),
    /// Look every `interval` until the element shows up or `timeout` passes.
    Poll { interval: Duration, timeout: Duration },
}

impl Default for WaitStrategy {
    fn default() -> Self {
        Self::Fixed(Duration::from_millis(500))
    }
}

/// Writes hours and a note into one cell and keeps the automation marker in step.
pub struct CellWriter<'a, P: ?Sized> {
    page: &'a P,
    wait: WaitStrategy,
    marker_class: &'a str,
}

impl<'a, P> CellWriter<'a, P>
where
    P: HostPage + ?Sized,
{
    pub fn new(page: &'a P, wait: WaitStrategy, marker_class: &'a str) -> Self {
        Self {
            page,
            wait,
            marker_class,
        }
    }

    /// Applies one instruction. The hours and the note are written independently: a
    /// broken note editor does not undo the hours, and the first failure is reported.
    ///
    /// A written cell is marked once its hours are in. A cleared cell loses the marker
    /// only when both its hours and its note are gone, so a half-cleared cell stays
    /// with the automation.
    pub async fn apply(&self, instruction: &UpdateInstruction) -> Outcome {
        let cell_id = instruction.cell.element_id();

        let hours = self.write_hours(&cell_id, &instruction.hours).await;
        if let Err(reason) = &hours {
            warn!(cell = %cell_id, %reason, "Hours write failed");
        }

        let note = self.write_note(&cell_id, &instruction.note).await;
        if let Err(reason) = &note {
            warn!(cell = %cell_id, %reason, "Note write abandoned");
        }

        let marker = match (&hours, &note) {
            (Ok(()), _) if !instruction.is_clear() => self
                .page
                .add_class(&cell_id, self.marker_class)
                .await
                .map_err(page_failure),
            (Ok(()), Ok(())) => self
                .page
                .remove_class(&cell_id, self.marker_class)
                .await
                .map_err(page_failure),
            _ => Ok(()),
        };

        match (hours, note, marker) {
            (Ok(()), Ok(()), Ok(())) => Outcome::Applied,
            (Err(reason), _, _) | (_, Err(reason), _) | (_, _, Err(reason)) => {
                Outcome::failed(reason)
            }
        }
    }

    async fn write_hours(&self, cell_id: &str, hours: &str) -> Result<(), FailureReason> {
        if self.page.input_value(cell_id).await.map_err(page_failure)?.is_none() {
            return Err(FailureReason::HoursInputMissing);
        }

        self.page.focus(cell_id).await.map_err(page_failure)?;
        self.page.set_value(cell_id, hours).await.map_err(page_failure)?;
        self.page.blur(cell_id).await.map_err(page_failure)?;
        debug!(cell = %cell_id, hours, "Hours written");

        Ok(())
    }

    async fn write_note(&self, cell_id: &str, note: &str) -> Result<(), FailureReason> {
        let trigger = self
            .page
            .comment_trigger(cell_id)
            .await
            .map_err(page_failure)?
            .ok_or(FailureReason::CommentTriggerMissing)?;

        self.page.show(&trigger).await.map_err(page_failure)?;
        self.page.click(&trigger).await.map_err(page_failure)?;

        let icon = self
            .page
            .next_sibling(cell_id)
            .await
            .map_err(page_failure)?
            .ok_or(FailureReason::NoteIconMissing)?;
        if !self.wait_for(&icon).await.map_err(page_failure)? {
            return Err(FailureReason::NoteIconMissing);
        }
        self.page.click(&icon).await.map_err(page_failure)?;

        if !self.wait_for(NOTE_EDITOR_ID).await.map_err(page_failure)? {
            return Err(FailureReason::NoteEditorMissing);
        }
        if !self.page.element_exists(NOTE_CONFIRM_ID).await.map_err(page_failure)? {
            return Err(FailureReason::ConfirmButtonMissing);
        }

        self.page.set_value(NOTE_EDITOR_ID, note).await.map_err(page_failure)?;
        self.page.click(NOTE_CONFIRM_ID).await.map_err(page_failure)?;
        debug!(cell = %cell_id, "Note confirmed");

        Ok(())
    }

    /// Whether `id` is on the page once the wait is over.
    async fn wait_for(&self, id: &str) -> Result<bool, PageError> {
        match self.wait {
            WaitStrategy::Fixed(delay) => {
                tokio::time::sleep(delay).await;
                self.page.element_exists(id).await
            }
            WaitStrategy::Poll { interval, timeout } => {
                let deadline = tokio::time::Instant::now() + timeout;
                loop {
                    if self.page.element_exists(id).await? {
                        return Ok(true);
                    }
                    if tokio::time::Instant::now() >= deadline {
                        debug!(id, ?timeout, "Gave up waiting for element");
                        return Ok(false);
                    }
                    tokio::time::sleep(interval).await;
                }
            }
        }
    }
}

fn page_failure(e: PageError) -> FailureReason {
    FailureReason::Page(e.to_string())
}
