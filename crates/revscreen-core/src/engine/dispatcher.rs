use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use super::worker::{AbandonedTasks, ScoreResult, TaskOutcome, TaskParams, run_task};
use crate::core::models::query::Query;
use crate::core::scoring::model::ModelLoader;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Dispatching,
    Collecting,
    Done,
}

/// All scores of one query, in model-enumeration order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryBatch {
    pub query_name: String,
    pub results: Vec<ScoreResult>,
    pub failed: usize,
    pub timed_out: usize,
}

/// Fans one query at a time out over the model database.
///
/// Each call to [`Dispatcher::dispatch`] builds a fresh worker pool, blocks until
/// every (query, model) task has finished, and tears the pool down again. Scoring
/// threads abandoned after a timeout still occupy a CPU, so they are subtracted
/// from the size of later pools (never below one worker).
pub struct Dispatcher<'m, L> {
    loader: Arc<L>,
    models: &'m [PathBuf],
    params: TaskParams,
    concurrency: usize,
    abandoned: AbandonedTasks,
    state: DispatchState,
}

impl<'m, L: ModelLoader + 'static> Dispatcher<'m, L> {
    pub fn new(loader: Arc<L>, models: &'m [PathBuf], params: TaskParams, concurrency: usize) -> Self {
        Self {
            loader,
            models,
            params,
            concurrency: concurrency.max(1),
            abandoned: AbandonedTasks::new(),
            state: DispatchState::Idle,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Timed-out scoring threads that have not returned yet.
    pub fn abandoned_tasks(&self) -> usize {
        self.abandoned.count()
    }

    /// Pool size for the next query.
    pub fn worker_count(&self) -> usize {
        self.concurrency
            .saturating_sub(self.abandoned.count())
            .max(1)
    }

    #[instrument(skip_all, name = "dispatch", fields(query = query.name()))]
    pub fn dispatch(
        &mut self,
        query: &Query,
        reporter: &ProgressReporter,
    ) -> Result<QueryBatch, EngineError> {
        if self.state != DispatchState::Idle {
            return Err(EngineError::Internal(format!(
                "dispatch called while dispatcher is {:?}",
                self.state
            )));
        }

        self.transition(DispatchState::Dispatching);
        info!(
            "Screening '{}' against {} protein models...",
            query.name(),
            self.models.len()
        );

        let workers = self.worker_count();
        if workers < self.concurrency {
            warn!(
                "{} timed-out task(s) still running; using {} of {} workers.",
                self.abandoned.count(),
                workers,
                self.concurrency
            );
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("revscreen-worker-{i}"))
            .build()?;

        reporter.report(Progress::TaskStart {
            total_steps: self.models.len() as u64,
        });
        let loader = &self.loader;
        let params = &self.params;
        let abandoned = &self.abandoned;
        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            self.models
                .par_iter()
                .map(|path| {
                    let outcome = run_task(loader, path, query, params, abandoned);
                    reporter.pair_finished(outcome);
                    outcome
                })
                .collect()
        });
        reporter.report(Progress::TaskFinish);

        self.transition(DispatchState::Collecting);
        let mut failed = 0;
        let mut timed_out = 0;
        let results = self
            .models
            .iter()
            .zip(outcomes)
            .map(|(path, outcome)| {
                match outcome {
                    TaskOutcome::Scored(_) => {}
                    TaskOutcome::Failed => failed += 1,
                    TaskOutcome::TimedOut => timed_out += 1,
                }
                ScoreResult {
                    query_name: query.name().to_string(),
                    model_path: path.clone(),
                    score: outcome.score(),
                }
            })
            .collect();

        self.transition(DispatchState::Idle);
        Ok(QueryBatch {
            query_name: query.name().to_string(),
            results,
            failed,
            timed_out,
        })
    }

    /// Marks the dispatcher as finished; later dispatches are rejected.
    pub fn finish(&mut self) {
        self.transition(DispatchState::Done);
    }

    fn transition(&mut self, next: DispatchState) {
        debug!("Dispatcher state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::worker::FAILED_SCORE;
    use crate::engine::worker::test_support::{StubBehavior, StubLoader, params};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    fn models(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("db").join(n)).collect()
    }

    fn loader() -> Arc<StubLoader> {
        Arc::new(StubLoader::new([
            ("A.pm", StubBehavior::Score(1.5)),
            ("B.pm", StubBehavior::Score(3.0)),
            ("C.pm", StubBehavior::Score(2.0)),
            ("D.pm", StubBehavior::Panic),
            ("E.pm", StubBehavior::Sleep(Duration::from_millis(400), 5.0)),
            ("N.pm", StubBehavior::Score(f64::NAN)),
        ]))
    }

    #[test]
    fn results_follow_enumeration_order_for_any_pool_size() {
        let db = models(&["A.pm", "B.pm", "C.pm"]);
        for workers in [1, 2, 8] {
            let mut dispatcher = Dispatcher::new(loader(), &db, params(None), workers);
            let batch = dispatcher
                .dispatch(&Query::smiles("Query", "CCO"), &ProgressReporter::new())
                .unwrap();
            let scores: Vec<f64> = batch.results.iter().map(|r| r.score).collect();
            assert_eq!(scores, vec![1.5, 3.0, 2.0]);
            assert_eq!(batch.results[1].model_path, db[1]);
            assert_eq!(batch.failed, 0);
        }
    }

    #[test]
    fn failing_models_do_not_stop_the_batch() {
        let db = models(&["A.pm", "corrupt.pm", "D.pm", "C.pm"]);
        let mut dispatcher = Dispatcher::new(loader(), &db, params(None), 2);
        let batch = dispatcher
            .dispatch(&Query::smiles("Query", "CCO"), &ProgressReporter::new())
            .unwrap();
        let scores: Vec<f64> = batch.results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![1.5, FAILED_SCORE, FAILED_SCORE, 2.0]);
        assert_eq!(batch.failed, 2);
    }

    #[test]
    fn timed_out_tasks_are_counted_separately() {
        let db = models(&["A.pm", "E.pm"]);
        let mut dispatcher =
            Dispatcher::new(loader(), &db, params(Some(Duration::from_millis(20))), 2);
        let batch = dispatcher
            .dispatch(&Query::smiles("Query", "CCO"), &ProgressReporter::new())
            .unwrap();
        assert_eq!(batch.timed_out, 1);
        assert_eq!(batch.failed, 0);
        assert_eq!(batch.results[1].score, FAILED_SCORE);
    }

    #[test]
    fn non_finite_score_is_counted_as_failed() {
        let db = models(&["N.pm", "A.pm"]);
        let mut dispatcher = Dispatcher::new(loader(), &db, params(None), 2);
        let batch = dispatcher
            .dispatch(&Query::smiles("Query", "CCO"), &ProgressReporter::new())
            .unwrap();
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.timed_out, 0);
        assert_eq!(batch.results[0].score, FAILED_SCORE);
        assert_eq!(batch.results[1].score, 1.5);
    }

    #[test]
    fn one_increment_is_reported_per_model() {
        let db = models(&["A.pm", "corrupt.pm", "C.pm"]);
        let increments = AtomicU64::new(0);
        let total = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| match event {
            Progress::TaskStart { total_steps } => total.store(total_steps, Ordering::SeqCst),
            Progress::TaskIncrement(_) => {
                increments.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }));
        let mut dispatcher = Dispatcher::new(loader(), &db, params(None), 3);
        dispatcher.dispatch(&Query::smiles("Query", "CCO"), &reporter).unwrap();
        let tally = reporter.tally();
        drop(reporter);
        assert_eq!(total.load(Ordering::SeqCst), 3);
        assert_eq!(increments.load(Ordering::SeqCst), 3);
        assert_eq!(tally.scored, 2);
        assert_eq!(tally.failed, 1);
    }

    #[test]
    fn abandoned_threads_shrink_the_next_pool() {
        let db = models(&["E.pm", "A.pm"]);
        let mut dispatcher =
            Dispatcher::new(loader(), &db, params(Some(Duration::from_millis(20))), 2);
        assert_eq!(dispatcher.worker_count(), 2);

        let batch = dispatcher
            .dispatch(&Query::smiles("Query", "CCO"), &ProgressReporter::new())
            .unwrap();
        assert_eq!(batch.timed_out, 1);
        assert_eq!(dispatcher.abandoned_tasks(), 1);
        assert_eq!(dispatcher.worker_count(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while dispatcher.abandoned_tasks() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(dispatcher.worker_count(), 2);
    }

    #[test]
    fn state_machine_returns_to_idle_and_rejects_after_finish() {
        let db = models(&["A.pm"]);
        let mut dispatcher = Dispatcher::new(loader(), &db, params(None), 1);
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        let query = Query::smiles("Query", "CCO");
        dispatcher.dispatch(&query, &ProgressReporter::new()).unwrap();
        assert_eq!(dispatcher.state(), DispatchState::Idle);

        dispatcher.finish();
        assert_eq!(dispatcher.state(), DispatchState::Done);
        let err = dispatcher.dispatch(&query, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(err, EngineError::Internal(_)));
    }
}
