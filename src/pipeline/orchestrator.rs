//! Generation orchestrator: runs the stage pipeline for one snapshot
//!
//! Stages run strictly in order, one at a time. Each stage waits out its
//! delay on the injected clock; progress is published on a watch channel
//! after every stage. The finished analysis is inserted into the store
//! exactly once, and only when every stage has completed.

use super::clock::{StageClock, TokioClock};
use super::readiness::check_readiness;
use super::stage::{progress_after, Stage};
use crate::model::{Analysis, ConstructionState, ValidationError};
use crate::storage::{CollectionStore, StorageError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default simulated processing time per stage
pub const DEFAULT_STAGE_DELAY: Duration = Duration::from_millis(1500);

/// Errors that keep a run from starting or finishing
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("construction state is not ready: {0}")]
    NotReady(#[from] ValidationError),

    #[error("this orchestrator has already run")]
    AlreadyStarted,

    #[error("generation already in flight for session {0}")]
    AlreadyRunning(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("failed to store generated analysis: {0}")]
    Store(#[from] StorageError),
}

/// Where a run currently stands
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    /// `stage_index` stages have finished; `progress` is their share of 100
    Running { stage_index: usize, progress: u8 },
    Completed(Analysis),
    Abandoned,
}

impl PipelineState {
    /// The stage in flight, if any
    pub fn current_stage(&self) -> Option<Stage> {
        match self {
            Self::Running { stage_index, .. } => Stage::at(*stage_index),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<u8> {
        match self {
            Self::Running { progress, .. } => Some(*progress),
            Self::Completed(_) => Some(100),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Abandoned)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Completed(Analysis),
    /// Torn down before the final stage; `stage_index` stages had finished
    Abandoned { stage_index: usize },
}

impl GenerationOutcome {
    pub fn analysis(&self) -> Option<&Analysis> {
        match self {
            Self::Completed(analysis) => Some(analysis),
            Self::Abandoned { .. } => None,
        }
    }
}

/// Runs the fixed stage pipeline once and hands the result to the store
pub struct GenerationOrchestrator {
    store: Arc<dyn CollectionStore>,
    clock: Arc<dyn StageClock>,
    stage_delay: Duration,
    state: watch::Sender<PipelineState>,
}

impl GenerationOrchestrator {
    /// Create an orchestrator on the tokio clock with the default delay
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            store,
            clock: Arc::new(TokioClock),
            stage_delay: DEFAULT_STAGE_DELAY,
            state,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn StageClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stage_delay(mut self, delay: Duration) -> Self {
        self.stage_delay = delay;
        self
    }

    /// Follow state changes, e.g. to drive a progress bar
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// The current state
    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Run the pipeline over `snapshot`.
    ///
    /// The snapshot is owned by the run, so later edits to the caller's
    /// construction state cannot reach it. A snapshot that fails readiness
    /// is refused and the orchestrator stays idle. Cancelling `cancel`
    /// at any point before the last stage finishes abandons the run
    /// without touching the store.
    pub async fn run(
        &self,
        snapshot: ConstructionState,
        cancel: &CancellationToken,
    ) -> Result<GenerationOutcome, GenerationError> {
        check_readiness(&snapshot)?;
        let Some(period) = snapshot.period() else {
            return Err(ValidationError::MissingPeriod.into());
        };

        let started = self.state.send_if_modified(|state| match state {
            PipelineState::Idle => {
                *state = PipelineState::Running {
                    stage_index: 0,
                    progress: 0,
                };
                true
            }
            _ => false,
        });
        if !started {
            return Err(GenerationError::AlreadyStarted);
        }
        let _guard = AbandonOnDrop { state: &self.state };

        info!(
            name = snapshot.name(),
            period = %period,
            competitors = snapshot.competitors().len(),
            "generation started"
        );

        for stage in Stage::ALL {
            let index = stage.index();
            if cancel.is_cancelled() {
                return Ok(self.abandon(index));
            }
            debug!(stage = %stage, index, "stage started");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(self.abandon(index)),
                _ = self.clock.sleep(self.stage_delay) => {}
            }
            // A delay that elapses after teardown still counts as abandoned.
            if cancel.is_cancelled() {
                return Ok(self.abandon(index));
            }

            let progress = progress_after(index + 1);
            self.state.send_replace(PipelineState::Running {
                stage_index: index + 1,
                progress,
            });
            info!(stage = %stage, progress, "stage finished");
        }

        let analysis = Analysis::completed(
            snapshot.name(),
            snapshot.description(),
            period,
            snapshot.competitor_names(),
            self.clock.now(),
        );
        drop(snapshot);

        if let Err(err) = self.store.insert_analysis(&analysis) {
            warn!(error = %err, id = %analysis.id, "generated analysis rejected by store");
            self.state.send_replace(PipelineState::Abandoned);
            return Err(err.into());
        }

        info!(id = %analysis.id, name = %analysis.name, "generation completed");
        self.state
            .send_replace(PipelineState::Completed(analysis.clone()));
        Ok(GenerationOutcome::Completed(analysis))
    }

    fn abandon(&self, stage_index: usize) -> GenerationOutcome {
        info!(stage_index, "generation abandoned");
        self.state.send_replace(PipelineState::Abandoned);
        GenerationOutcome::Abandoned { stage_index }
    }
}

/// Publishes `Abandoned` if a run future is dropped while still running
struct AbandonOnDrop<'a> {
    state: &'a watch::Sender<PipelineState>,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| match state {
            PipelineState::Running { stage_index, .. } => {
                warn!(stage_index = *stage_index, "generation dropped mid-run");
                *state = PipelineState::Abandoned;
                true
            }
            _ => false,
        });
    }
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("stage_delay", &self.stage_delay)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisStatus, DataWarehouse, Period};
    use crate::pipeline::clock::InstantClock;
    use crate::storage::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn ready_state() -> ConstructionState {
        let mut state = ConstructionState::new();
        state.set_name("Q1 2024 Competitive Analysis");
        state.set_description("Peer benchmarking against regional banks");
        state.set_period(Period::Q1_2024);
        state.set_data_warehouse(DataWarehouse::Primary);
        state.attach_internal_documents(["internal-q1.pdf"]);
        for (i, name) in ["Wells Fargo", "Citibank"].iter().enumerate() {
            state.add_competitor(name);
            state.attach_competitor_documents(i, [format!("{}-10q.pdf", name)]);
        }
        state
    }

    fn orchestrator(store: Arc<MemoryStore>, clock: Arc<InstantClock>) -> GenerationOrchestrator {
        GenerationOrchestrator::new(store).with_clock(clock)
    }

    #[tokio::test]
    async fn test_run_completes_and_stores_analysis() {
        let store = Arc::new(MemoryStore::new());
        let finished_at = Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 0).unwrap();
        let clock = Arc::new(InstantClock::new().at(finished_at));
        let orch = orchestrator(store.clone(), clock.clone());

        let outcome = orch
            .run(ready_state(), &CancellationToken::new())
            .await
            .unwrap();

        let analysis = outcome.analysis().unwrap();
        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert_eq!(analysis.name, "Q1 2024 Competitive Analysis");
        assert_eq!(analysis.period, Period::Q1_2024);
        assert_eq!(analysis.competitors, vec!["Wells Fargo", "Citibank"]);
        assert_eq!(analysis.created_at, finished_at);

        assert_eq!(store.list_analyses().unwrap(), vec![analysis.clone()]);
        assert_eq!(orch.state(), PipelineState::Completed(analysis.clone()));
        assert_eq!(clock.sleep_count(), Stage::COUNT);
    }

    #[tokio::test]
    async fn test_every_stage_waits_the_configured_delay() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(InstantClock::new());
        let orch = orchestrator(store, clock.clone()).with_stage_delay(Duration::from_millis(250));

        orch.run(ready_state(), &CancellationToken::new()).await.unwrap();
        assert_eq!(clock.requested(), vec![Duration::from_millis(250); Stage::COUNT]);
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_and_ends_at_100() {
        let store = Arc::new(MemoryStore::new());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let slot: Arc<Mutex<Option<watch::Receiver<PipelineState>>>> = Arc::new(Mutex::new(None));
        let hook_slot = slot.clone();
        let hook_observed = observed.clone();
        let clock = Arc::new(InstantClock::new().with_hook(move |_| {
            if let Some(rx) = hook_slot.lock().unwrap().as_ref() {
                hook_observed.lock().unwrap().push(rx.borrow().clone());
            }
        }));
        let orch = orchestrator(store, clock);
        *slot.lock().unwrap() = Some(orch.subscribe());

        orch.run(ready_state(), &CancellationToken::new()).await.unwrap();

        let mut progress: Vec<u8> = observed
            .lock()
            .unwrap()
            .iter()
            .filter_map(PipelineState::progress)
            .collect();
        progress.push(orch.state().progress().unwrap());

        assert_eq!(progress, vec![0, 14, 29, 43, 57, 71, 86, 100]);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));

        let stages: Vec<_> = observed
            .lock()
            .unwrap()
            .iter()
            .filter_map(PipelineState::current_stage)
            .collect();
        assert_eq!(stages, Stage::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_unready_state_is_refused() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(InstantClock::new());
        let orch = orchestrator(store.clone(), clock.clone());

        let mut state = ready_state();
        state.add_competitor("PNC Bank");
        let err = orch.run(state, &CancellationToken::new()).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::NotReady(ValidationError::CompetitorWithoutDocuments(_))
        ));
        assert_eq!(orch.state(), PipelineState::Idle);
        assert_eq!(clock.sleep_count(), 0);
        assert!(store.list_analyses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orchestrator_runs_only_once() {
        let store = Arc::new(MemoryStore::new());
        let orch = orchestrator(store.clone(), Arc::new(InstantClock::new()));

        orch.run(ready_state(), &CancellationToken::new()).await.unwrap();
        let second = orch.run(ready_state(), &CancellationToken::new()).await;

        assert!(matches!(second, Err(GenerationError::AlreadyStarted)));
        assert_eq!(store.list_analyses().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_start_abandons_without_insert() {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(InstantClock::new());
        let orch = orchestrator(store.clone(), clock.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = orch.run(ready_state(), &cancel).await.unwrap();
        assert_eq!(outcome, GenerationOutcome::Abandoned { stage_index: 0 });
        assert_eq!(orch.state(), PipelineState::Abandoned);
        assert_eq!(clock.sleep_count(), 0);
        assert!(store.list_analyses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_during_any_stage_never_inserts() {
        for teardown_at in 0..Stage::COUNT {
            let store = Arc::new(MemoryStore::new());
            let cancel = CancellationToken::new();
            let hook_cancel = cancel.clone();
            let clock = Arc::new(InstantClock::new().with_hook(move |call| {
                if call == teardown_at {
                    hook_cancel.cancel();
                }
            }));
            let orch = orchestrator(store.clone(), clock);

            let outcome = orch.run(ready_state(), &cancel).await.unwrap();
            assert_eq!(
                outcome,
                GenerationOutcome::Abandoned {
                    stage_index: teardown_at
                }
            );
            assert!(store.list_analyses().unwrap().is_empty());
            assert_eq!(orch.state(), PipelineState::Abandoned);
        }
    }

    #[tokio::test]
    async fn test_cancel_wakes_a_pending_stage_delay() {
        let store = Arc::new(MemoryStore::new());
        let orch = Arc::new(
            GenerationOrchestrator::new(store.clone()).with_stage_delay(Duration::from_secs(3600)),
        );
        let cancel = CancellationToken::new();

        let handle = {
            let orch = orch.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { orch.run(ready_state(), &cancel).await })
        };
        tokio::task::yield_now().await;
        cancel.cancel();

        let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run should stop promptly")
            .unwrap()
            .unwrap();
        assert!(matches!(outcome, GenerationOutcome::Abandoned { .. }));
        assert!(store.list_analyses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_run_ends_abandoned() {
        let store = Arc::new(MemoryStore::new());
        let orch = GenerationOrchestrator::new(store.clone())
            .with_stage_delay(Duration::from_secs(3600));
        let mut updates = orch.subscribe();
        let cancel = CancellationToken::new();

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), orch.run(ready_state(), &cancel)).await;
        assert!(timed_out.is_err());

        assert_eq!(orch.state(), PipelineState::Abandoned);
        assert!(updates.has_changed().unwrap());
        assert_eq!(*updates.borrow_and_update(), PipelineState::Abandoned);
        assert!(store.list_analyses().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_is_isolated_from_later_edits() {
        let store = Arc::new(MemoryStore::new());
        let mut state = ready_state();
        let snapshot = state.clone();

        let orch = orchestrator(store, Arc::new(InstantClock::new()));
        let cancel = CancellationToken::new();
        let run = orch.run(snapshot, &cancel);

        state.set_name("Renamed after start");
        state.add_competitor("Capital One");

        let outcome = run.await.unwrap();
        let analysis = outcome.analysis().unwrap();
        assert_eq!(analysis.name, "Q1 2024 Competitive Analysis");
        assert_eq!(analysis.competitors.len(), 2);
    }
}
