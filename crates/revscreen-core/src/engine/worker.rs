use crate::core::models::query::{PayloadKind, Query};
use crate::core::scoring::error::ScoringError;
use crate::core::scoring::model::{ModelLoader, PharmacophoreModel};
use crate::core::scoring::weights::WeightConfig;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;
use tracing::{error, trace, warn};

/// Score recorded for a (query, model) pair whose scoring failed.
pub const FAILED_SCORE: f64 = -1.0;

/// One (query, model) score as it flows from the dispatcher into ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub query_name: String,
    pub model_path: PathBuf,
    pub score: f64,
}

impl ScoreResult {
    /// True for the failure sentinel and for scores that are not a number.
    pub fn is_failure(&self) -> bool {
        self.score == FAILED_SCORE || self.score.is_nan()
    }
}

/// Per-run parameters shared by every scoring task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskParams {
    pub num_conformers: usize,
    pub weights: WeightConfig,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutcome {
    Scored(f64),
    Failed,
    TimedOut,
}

impl TaskOutcome {
    pub fn score(self) -> f64 {
        match self {
            TaskOutcome::Scored(score) => score,
            TaskOutcome::Failed | TaskOutcome::TimedOut => FAILED_SCORE,
        }
    }
}

/// Number of timed-out scoring threads that are still running.
///
/// A timed-out task cannot be killed, only abandoned, so its thread keeps using
/// a CPU until the scorer returns. The dispatcher subtracts this count from the
/// worker pool it builds for the next query.
#[derive(Debug, Clone, Default)]
pub struct AbandonedTasks(Arc<AtomicUsize>);

impl AbandonedTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn hold(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Loads the model at `model_path` and scores `query` against it.
pub fn score_pair<L: ModelLoader>(
    loader: &L,
    model_path: &Path,
    query: &Query,
    params: &TaskParams,
) -> Result<f64, ScoringError> {
    let model = loader.load(model_path)?;
    match query.kind() {
        PayloadKind::Smiles => {
            model.score_against_notation(query.payload(), params.num_conformers, &params.weights)
        }
        PayloadKind::StructureFile => {
            model.score_against_structure(Path::new(query.payload()), &params.weights)
        }
    }
}

/// Runs one scoring task with failure isolation.
///
/// Errors, panics and non-finite scores are logged with the model path and
/// reported as [`TaskOutcome::Failed`]. With a timeout configured, the task runs
/// on its own thread and is abandoned once the timeout elapses; the thread is
/// tracked in `abandoned` until it returns.
pub fn run_task<L: ModelLoader + 'static>(
    loader: &Arc<L>,
    model_path: &Path,
    query: &Query,
    params: &TaskParams,
    abandoned: &AbandonedTasks,
) -> TaskOutcome {
    let result = match params.timeout {
        None => guarded(|| score_pair(loader.as_ref(), model_path, query, params)),
        Some(timeout) => run_with_timeout(loader, model_path, query, params, timeout, abandoned),
    };

    match result {
        Ok(score) if !score.is_finite() => {
            error!(
                "Error processing {}: scorer returned a non-finite score ({})",
                model_path.display(),
                score
            );
            TaskOutcome::Failed
        }
        Ok(score) => {
            trace!(model = %model_path.display(), query = query.name(), score, "Task finished.");
            TaskOutcome::Scored(score)
        }
        Err(e @ ScoringError::TimedOut(_)) => {
            error!("Error processing {}: {}", model_path.display(), e);
            TaskOutcome::TimedOut
        }
        Err(e) => {
            error!("Error processing {}: {}", model_path.display(), e);
            TaskOutcome::Failed
        }
    }
}

fn guarded<F>(task: F) -> Result<f64, ScoringError>
where
    F: FnOnce() -> Result<f64, ScoringError>,
{
    panic::catch_unwind(AssertUnwindSafe(task))
        .unwrap_or_else(|payload| Err(ScoringError::Panicked(panic_message(payload.as_ref()))))
}

fn run_with_timeout<L: ModelLoader + 'static>(
    loader: &Arc<L>,
    model_path: &Path,
    query: &Query,
    params: &TaskParams,
    timeout: Duration,
    abandoned: &AbandonedTasks,
) -> Result<f64, ScoringError> {
    let (tx, rx) = mpsc::channel();
    // Set under the lock when the caller gives up, so the thread and the caller
    // agree on who owns the abandoned-task slot.
    let given_up = Arc::new(Mutex::new(false));
    let loader = Arc::clone(loader);
    let path = model_path.to_path_buf();
    let query = query.clone();
    let params = *params;
    let thread_given_up = Arc::clone(&given_up);
    let thread_abandoned = abandoned.clone();

    thread::Builder::new()
        .name("revscreen-task".to_string())
        .spawn(move || {
            let result = guarded(|| score_pair(loader.as_ref(), &path, &query, &params));
            let Ok(flag) = thread_given_up.lock() else {
                return;
            };
            if *flag {
                thread_abandoned.release();
                trace!(model = %path.display(), "Abandoned task finished.");
            } else {
                let _ = tx.send(result);
            }
        })
        .map_err(|e| ScoringError::Other(format!("failed to spawn scoring thread: {e}")))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            let Ok(mut flag) = given_up.lock() else {
                return Err(ScoringError::TimedOut(timeout));
            };
            if let Ok(result) = rx.try_recv() {
                return result;
            }
            *flag = true;
            abandoned.hold();
            warn!(
                "Scoring {} exceeded {:?}; its thread keeps running in the background.",
                model_path.display(),
                timeout
            );
            Err(ScoringError::TimedOut(timeout))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(ScoringError::Panicked(
            "scoring thread exited without a result".to_string(),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
