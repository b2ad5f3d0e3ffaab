//! Live state for one model run and the control loop that drives it.
//!
//! Every run owns exactly one network connection and writes exactly one
//! entry in the shared state table, so runs never contend with each
//! other: one model stalling or failing cannot touch another model's
//! state. The presentation layer only ever reads snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;

use crate::cost;
use crate::frames::FrameReader;
use crate::interpret::{decode_frame, interpreter_for};
use crate::profile::{Pricing, WireFamily};
use crate::request::ProviderRequest;
use crate::transport::StreamTransport;
use crate::types::{Delta, Usage, UsageSnapshot};

// --- Error taxonomy ---

/// Why a run ended in `Errored`.
///
/// Scoped to a single run; there is no global error state. Per-frame
/// decode failures are deliberately absent here: they are recovered
/// inside the interpreter layer and never end a run.
#[derive(Debug, Clone, Error)]
pub enum RunError {
    #[error("invalid run configuration: {0}")]
    Validation(String),
    #[error("no credential configured for the {0} family")]
    MissingCredential(WireFamily),
    #[error("unknown model '{0}'")]
    UnknownModel(String),
    #[error("{0}")]
    Transport(String),
    #[error("cancelled")]
    Cancelled,
}

// --- Observable run state ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Complete,
    Errored,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Complete | RunStatus::Errored)
    }
}

/// The live, observable record of one run.
#[derive(Debug, Clone)]
pub struct ModelRunState {
    pub status: RunStatus,
    /// Append-only for the lifetime of the run.
    pub accumulated_text: String,
    pub usage: Option<Usage>,
    /// Live cost estimate; `None` while no usage or pricing is known.
    pub cost: Option<f64>,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
}

impl ModelRunState {
    fn with_status(status: RunStatus) -> Self {
        Self {
            status,
            accumulated_text: String::new(),
            usage: None,
            cost: None,
            elapsed_seconds: 0.0,
            error: None,
        }
    }

    fn idle() -> Self {
        Self::with_status(RunStatus::Idle)
    }

    fn running() -> Self {
        Self::with_status(RunStatus::Running)
    }
}

/// Emitted on every state mutation so the UI can re-render that model.
#[derive(Debug, Clone)]
pub struct RunUpdate {
    pub model_id: String,
}

// --- Shared state table ---

struct Entry {
    generation: u64,
    state: ModelRunState,
}

/// The model-id to run-state mapping, the single source of truth for
/// the comparison. Entries are replaced by key on resubmission; the
/// generation counter fences out writes from a superseded run's task.
pub(crate) struct StateTable {
    entries: Mutex<HashMap<String, Entry>>,
    events: UnboundedSender<RunUpdate>,
}

impl StateTable {
    pub(crate) fn new() -> (Arc<Self>, UnboundedReceiver<RunUpdate>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let table = Arc::new(Self {
            entries: Mutex::new(HashMap::new()),
            events,
        });
        (table, receiver)
    }

    /// Track a newly selected model as `Idle`. Does not disturb an
    /// entry that already exists.
    pub(crate) fn register_idle(&self, model_id: &str) {
        let inserted = {
            let mut entries = self.entries.lock().unwrap();
            if entries.contains_key(model_id) {
                false
            } else {
                entries.insert(
                    model_id.to_string(),
                    Entry {
                        generation: 0,
                        state: ModelRunState::idle(),
                    },
                );
                true
            }
        };
        if inserted {
            self.notify(model_id);
        }
    }

    /// Replace a model's entry with a fresh `Running` state, returning
    /// the generation that fences the new run's writes.
    pub(crate) fn begin(&self, model_id: &str) -> u64 {
        let generation = {
            let mut entries = self.entries.lock().unwrap();
            let entry = entries.entry(model_id.to_string()).or_insert(Entry {
                generation: 0,
                state: ModelRunState::running(),
            });
            entry.generation += 1;
            entry.state = ModelRunState::running();
            entry.generation
        };
        self.notify(model_id);
        generation
    }

    pub(crate) fn snapshot(&self, model_id: &str) -> Option<ModelRunState> {
        let entries = self.entries.lock().unwrap();
        entries.get(model_id).map(|e| e.state.clone())
    }

    pub(crate) fn snapshot_all(&self) -> Vec<(String, ModelRunState)> {
        let entries = self.entries.lock().unwrap();
        let mut all: Vec<_> = entries
            .iter()
            .map(|(id, e)| (id.clone(), e.state.clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    pub(crate) fn all_terminal(&self) -> bool {
        let entries = self.entries.lock().unwrap();
        entries.values().all(|e| e.state.status.is_terminal())
    }

    fn update(&self, model_id: &str, generation: u64, f: impl FnOnce(&mut ModelRunState)) {
        {
            let mut entries = self.entries.lock().unwrap();
            match entries.get_mut(model_id) {
                Some(entry) if entry.generation == generation => f(&mut entry.state),
                // A newer submission owns this entry now.
                _ => return,
            }
        }
        self.notify(model_id);
    }

    fn notify(&self, model_id: &str) {
        let _ = self.events.send(RunUpdate {
            model_id: model_id.to_string(),
        });
    }
}

// --- Per-run write handle ---

/// Write access to one run's entry, and nothing else.
pub(crate) struct RunSlot {
    model_id: String,
    generation: u64,
    table: Arc<StateTable>,
    pricing: Option<Pricing>,
    started: Instant,
}

impl RunSlot {
    pub(crate) fn new(
        model_id: String,
        generation: u64,
        table: Arc<StateTable>,
        pricing: Option<Pricing>,
    ) -> Self {
        Self {
            model_id,
            generation,
            table,
            pricing,
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn append_text(&self, fragment: &str) {
        let elapsed = self.elapsed();
        self.table.update(&self.model_id, self.generation, |state| {
            state.accumulated_text.push_str(fragment);
            state.elapsed_seconds = elapsed;
        });
    }

    fn apply_usage(&self, snapshot: &UsageSnapshot) {
        let elapsed = self.elapsed();
        let pricing = self.pricing;
        self.table.update(&self.model_id, self.generation, |state| {
            let usage = state.usage.get_or_insert_with(Usage::default);
            usage.apply(snapshot);
            state.cost = cost::estimate(usage, pricing.as_ref());
            state.elapsed_seconds = elapsed;
        });
    }

    fn complete(&self) {
        let elapsed = self.elapsed();
        tracing::debug!(model = %self.model_id, elapsed, "run complete");
        self.table.update(&self.model_id, self.generation, |state| {
            state.status = RunStatus::Complete;
            state.elapsed_seconds = elapsed;
        });
    }

    pub(crate) fn fail(&self, error: &RunError) {
        let elapsed = self.elapsed();
        tracing::warn!(model = %self.model_id, %error, "run failed");
        self.table.update(&self.model_id, self.generation, |state| {
            state.status = RunStatus::Errored;
            state.error = Some(error.to_string());
            state.elapsed_seconds = elapsed;
        });
    }
}

// --- Control loop ---

/// Drive one run from request to terminal state.
///
/// Suspends only at network reads, and every suspension point also
/// watches the cancellation signal so `cancel` or a resubmission
/// releases the connection deterministically. Returning drops the
/// stream, which closes the connection in every terminal path.
pub(crate) async fn drive_run(
    request: ProviderRequest,
    family: WireFamily,
    transport: Arc<dyn StreamTransport>,
    slot: RunSlot,
    cancel: Arc<Notify>,
) {
    let interpreter = interpreter_for(family);
    let mut cancelled = Box::pin(cancel.notified());

    let mut stream = tokio::select! {
        _ = &mut cancelled => {
            slot.fail(&RunError::Cancelled);
            return;
        }
        opened = transport.open(&request) => match opened {
            Ok(stream) => stream,
            Err(e) => {
                slot.fail(&e);
                return;
            }
        },
    };

    let mut reader = FrameReader::new();
    loop {
        let next = tokio::select! {
            _ = &mut cancelled => {
                slot.fail(&RunError::Cancelled);
                return;
            }
            next = stream.next() => next,
        };

        match next {
            Some(Ok(chunk)) => {
                for frame in reader.feed(&chunk) {
                    if apply_frame(interpreter, &frame, &slot) {
                        return;
                    }
                }
            }
            Some(Err(e)) => {
                slot.fail(&e);
                return;
            }
            None => {
                // Clean end of stream: flush any unterminated tail, then
                // the run is complete even without an explicit sentinel.
                if let Some(tail) = reader.finish() {
                    if apply_frame(interpreter, &tail, &slot) {
                        return;
                    }
                }
                slot.complete();
                return;
            }
        }
    }
}

/// Apply one frame's delta to the run state. Returns true when the run
/// reached its terminal state.
fn apply_frame(
    interpreter: &dyn crate::interpret::EventInterpreter,
    frame: &str,
    slot: &RunSlot,
) -> bool {
    match decode_frame(interpreter, frame) {
        Delta::Text(text) => {
            slot.append_text(&text);
            false
        }
        Delta::Usage(snapshot) => {
            slot.apply_usage(&snapshot);
            false
        }
        Delta::Terminal => {
            slot.complete();
            true
        }
        Delta::Ignorable => false,
    }
}
