//! Progress notifications for long parse runs.

/// Stages of a parse run, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Header,
    Events,
    StoringLines,
    Done,
}

/// Observer invoked by [`LogParser`](crate::LogParser) at phase transitions
/// and every `progress_interval` lines.
pub trait ProgressObserver {
    fn on_phase(&self, _phase: Phase) {}

    fn on_progress(&self, _phase: Phase, _processed: usize, _total: usize) {}
}

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Reports progress through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_phase(&self, phase: Phase) {
        log::info!("Phase: {:?}", phase);
    }

    fn on_progress(&self, phase: Phase, processed: usize, total: usize) {
        match phase {
            Phase::StoringLines => log::info!("Stored {}/{} log lines...", processed, total),
            _ => log::info!("Processed {}/{} lines...", processed, total),
        }
    }
}
