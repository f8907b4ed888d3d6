use super::worker::TaskOutcome;
use std::sync::Mutex;

/// How a single (query, model) pair ended, as seen by progress front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairStatus {
    Scored,
    Failed,
    TimedOut,
}

impl From<TaskOutcome> for PairStatus {
    fn from(outcome: TaskOutcome) -> Self {
        match outcome {
            TaskOutcome::Scored(_) => PairStatus::Scored,
            TaskOutcome::Failed => PairStatus::Failed,
            TaskOutcome::TimedOut => PairStatus::TimedOut,
        }
    }
}

/// Running counts of finished pairs for the query being screened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairTally {
    pub scored: u64,
    pub failed: u64,
    pub timed_out: u64,
}

impl PairTally {
    pub fn record(&mut self, status: PairStatus) {
        match status {
            PairStatus::Scored => self.scored += 1,
            PairStatus::Failed => self.failed += 1,
            PairStatus::TimedOut => self.timed_out += 1,
        }
    }

    pub fn finished(&self) -> u64 {
        self.scored + self.failed + self.timed_out
    }

    /// Short note on unsuccessful pairs, `None` while every pair has scored.
    pub fn problems(&self) -> Option<String> {
        match (self.failed, self.timed_out) {
            (0, 0) => None,
            (failed, 0) => Some(format!("{failed} failed")),
            (0, timed_out) => Some(format!("{timed_out} timed out")),
            (failed, timed_out) => Some(format!("{failed} failed, {timed_out} timed out")),
        }
    }
}

/// Events emitted while a workflow runs.
///
/// Scoring emits one `TaskStart` per query, one `TaskIncrement` per finished
/// (query, model) pair carrying how it ended, and a closing `TaskFinish`.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement(PairStatus),
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Shared by reference across scoring threads.
///
/// Besides forwarding events to the optional callback, the reporter keeps a
/// [`PairTally`] for the current scoring task, reset by every `TaskStart`.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
    tally: Mutex<PairTally>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
            tally: Mutex::default(),
        }
    }

    pub fn report(&self, event: Progress) {
        match &event {
            Progress::TaskStart { .. } => self.update_tally(|tally| *tally = PairTally::default()),
            Progress::TaskIncrement(status) => self.update_tally(|tally| tally.record(*status)),
            _ => {}
        }
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Convenience for scoring workers: records `outcome` as one finished pair.
    pub fn pair_finished(&self, outcome: TaskOutcome) {
        self.report(Progress::TaskIncrement(outcome.into()));
    }

    pub fn tally(&self) -> PairTally {
        self.tally.lock().map(|tally| *tally).unwrap_or_default()
    }

    fn update_tally(&self, apply: impl FnOnce(&mut PairTally)) {
        if let Ok(mut tally) = self.tally.lock() {
            apply(&mut tally);
        }
    }
}
