use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::client::{EntrySource, FetchError};
use crate::domain::{RunReport, TimeEntry};
use crate::grid::{resolve_layout, GridLayout};
use crate::page::{HostPage, PageError, DEFAULT_MARKER_CLASS};
use crate::reconcile::{plan_updates, read_page_state, UpdatePlan};
use crate::sequencer::{Sequencer, Sequencing};
use crate::writer::{CellWriter, WaitStrategy};

#[derive(Debug, Clone)]
pub struct AutomationConfig {
    pub sequencing: Sequencing,
    pub wait: WaitStrategy,
    pub marker_class: String,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            sequencing: Sequencing::default(),
            wait: WaitStrategy::default(),
            marker_class: DEFAULT_MARKER_CLASS.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AutomationError {
    #[error("an automation run is already in progress")]
    AlreadyRunning,
    #[error("no date headers found on the page")]
    NoDateHeaders,
    #[error("failed to fetch time entries: {0}")]
    Fetch(#[from] FetchError),
    #[error("page error: {0}")]
    Page(#[from] PageError),
}

/// A plan computed against the page without touching it.
#[derive(Debug, Clone)]
pub struct PlannedRun {
    pub layout: GridLayout,
    pub entries: Vec<TimeEntry>,
    pub plan: UpdatePlan,
}

/// Fills the timesheet on `page` from `source`, one run at a time.
///
/// Each run reads the grid layout afresh, fetches the entries, reconciles them with
/// what the page shows and applies the result. A run requested while another is in
/// flight is rejected with [`AutomationError::AlreadyRunning`].
pub struct Automation<S, P> {
    source: S,
    page: P,
    config: AutomationConfig,
    running: Mutex<()>,
}

impl<S, P> Automation<S, P>
where
    S: EntrySource,
    P: HostPage,
{
    pub fn new(source: S, page: P, config: AutomationConfig) -> Self {
        Self {
            source,
            page,
            config,
            running: Mutex::new(()),
        }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn into_page(self) -> P {
        self.page
    }

    /// Resolves, fetches and reconciles, leaving the page untouched.
    pub async fn plan(&self) -> Result<PlannedRun, AutomationError> {
        let _guard = self
            .running
            .try_lock()
            .map_err(|_| AutomationError::AlreadyRunning)?;

        self.prepare().await
    }

    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<RunReport, AutomationError> {
        let _guard = self.running.try_lock().map_err(|_| {
            warn!("Run requested while another is in progress");
            AutomationError::AlreadyRunning
        })?;

        let PlannedRun { entries, plan, .. } = self.prepare().await?;

        let writer = CellWriter::new(&self.page, self.config.wait, &self.config.marker_class);
        let sequencer = Sequencer::new(writer, self.config.sequencing);
        let applied = sequencer.apply_all(&plan.instructions).await;

        let mut report = RunReport {
            fetched: entries.len(),
            items: plan.skipped,
        };
        report.items.extend(applied);

        info!(
            fetched = report.fetched,
            applied = report.applied(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Automation run finished"
        );

        Ok(report)
    }

    async fn prepare(&self) -> Result<PlannedRun, AutomationError> {
        let layout = resolve_layout(&self.page).await?;
        if layout.dates.is_empty() {
            warn!("No date headers on the page, nothing to map entries onto");
            return Err(AutomationError::NoDateHeaders);
        }

        let entries = self.source.fetch_entries().await?;

        let state =
            read_page_state(&self.page, &layout, &entries, &self.config.marker_class).await?;
        let plan = plan_updates(&entries, &layout, &state);

        info!(
            writes = plan.writes().count(),
            clears = plan.clears().count(),
            skipped = plan.skipped.len(),
            "Reconciled entries with page"
        );

        Ok(PlannedRun {
            layout,
            entries,
            plan,
        })
    }
}
