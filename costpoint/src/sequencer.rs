use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, info};

use crate::domain::{Outcome, ReportItem, Subject, UpdateInstruction};
use crate::page::HostPage;
use crate::writer::CellWriter;

/// Order and pacing used to push instructions through the note editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequencing {
    /// Write `i`, pause, write `i` again, write `i + 1` (wrapping to the first), pause.
    ///
    /// The host's note editor sometimes swallows the click meant for the next cell;
    /// re-applying every instruction and overlapping neighbours was found to get every
    /// cell written on that host. Every write is idempotent, so the repeats are harmless.
    Paired { pause: Duration },
    /// Write each instruction once and rely on the writer's waits.
    Sequential,
}

impl Default for Sequencing {
    fn default() -> Self {
        Self::Paired {
            pause: Duration::from_millis(500),
        }
    }
}

pub struct Sequencer<'a, P: ?Sized> {
    writer: CellWriter<'a, P>,
    sequencing: Sequencing,
}

impl<'a, P> Sequencer<'a, P>
where
    P: HostPage + ?Sized,
{
    pub fn new(writer: CellWriter<'a, P>, sequencing: Sequencing) -> Self {
        Self { writer, sequencing }
    }

    /// Applies every instruction in list order and reports, per instruction, the
    /// outcome of its last application.
    pub async fn apply_all(&self, instructions: &[UpdateInstruction]) -> Vec<ReportItem> {
        let outcomes: Vec<Outcome> = match self.sequencing {
            Sequencing::Sequential => {
                let mut outcomes = Vec::with_capacity(instructions.len());
                for instruction in instructions {
                    outcomes.push(self.writer.apply(instruction).await);
                }
                outcomes
            }
            Sequencing::Paired { pause } => {
                let n = instructions.len();
                let mut latest = BTreeMap::new();
                for i in 0..n {
                    let next = (i + 1) % n;
                    debug!(current = i, next, "Applying pair");

                    latest.insert(i, self.writer.apply(&instructions[i]).await);
                    tokio::time::sleep(pause).await;
                    latest.insert(i, self.writer.apply(&instructions[i]).await);
                    latest.insert(next, self.writer.apply(&instructions[next]).await);
                    tokio::time::sleep(pause).await;
                }
                latest.into_values().collect()
            }
        };

        let items: Vec<ReportItem> = instructions
            .iter()
            .zip(outcomes)
            .map(|(instruction, outcome)| ReportItem {
                subject: if instruction.is_clear() {
                    Subject::Clear {
                        cell: instruction.cell,
                    }
                } else {
                    Subject::Write {
                        cell: instruction.cell,
                    }
                },
                outcome,
            })
            .collect();

        info!(
            instructions = instructions.len(),
            failed = items
                .iter()
                .filter(|i| matches!(i.outcome, Outcome::Failed { .. }))
                .count(),
            "Applied updates"
        );

        items
    }
}
