//! The aggregation controller: one submission fans out into one
//! independent run per selected model.
//!
//! The controller owns the model-id to run-state mapping and the
//! per-run cancellation handles. Credential lookup and the transport
//! are injected at construction; nothing in a run's control loop
//! reaches for ambient state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

use crate::config::EndpointsConfig;
use crate::credentials::CredentialStore;
use crate::profile::ProfileCatalog;
use crate::request;
use crate::run::{self, ModelRunState, RunError, RunSlot, RunUpdate, StateTable};
use crate::transport::StreamTransport;
use crate::types::RunConfig;

pub struct AggregationController {
    catalog: ProfileCatalog,
    endpoints: EndpointsConfig,
    credentials: Arc<dyn CredentialStore>,
    transport: Arc<dyn StreamTransport>,
    table: Arc<StateTable>,
    cancels: Mutex<HashMap<String, Arc<Notify>>>,
}

impl AggregationController {
    /// Build a controller and the channel on which it announces every
    /// state mutation (one update per mutation, carrying the model id).
    pub fn new(
        catalog: ProfileCatalog,
        endpoints: EndpointsConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn StreamTransport>,
    ) -> (Self, UnboundedReceiver<RunUpdate>) {
        let (table, updates) = StateTable::new();
        let controller = Self {
            catalog,
            endpoints,
            credentials,
            transport,
            table,
            cancels: Mutex::new(HashMap::new()),
        };
        (controller, updates)
    }

    /// Register a model's panel ahead of any submission; its state
    /// starts as `Idle`.
    pub fn select(&self, model_id: &str) {
        self.table.register_idle(model_id);
    }

    /// Start one run per selection, all in parallel.
    ///
    /// A selection that fails validation or credential lookup lands in
    /// `Errored` before any network call and never blocks the others.
    /// Resubmitting a model cancels its previous run and fully replaces
    /// its state; old and new output are never merged.
    pub fn submit(&self, prompt: &str, selections: &[(String, RunConfig)]) -> Result<(), RunError> {
        if prompt.trim().is_empty() {
            return Err(RunError::Validation("prompt is empty".to_string()));
        }
        if selections.is_empty() {
            return Err(RunError::Validation("no models selected".to_string()));
        }

        for (model_id, config) in selections {
            self.start_run(prompt, model_id, config);
        }
        Ok(())
    }

    fn start_run(&self, prompt: &str, model_id: &str, config: &RunConfig) {
        // Release the previous run's connection before replacing it.
        self.cancel(model_id);

        let pricing = self
            .catalog
            .get(model_id)
            .and_then(|profile| profile.pricing);
        let generation = self.table.begin(model_id);
        let slot = RunSlot::new(model_id.to_string(), generation, self.table.clone(), pricing);

        let profile = match self.catalog.get(model_id) {
            Some(profile) => profile,
            None => {
                slot.fail(&RunError::UnknownModel(model_id.to_string()));
                return;
            }
        };
        if let Err(e) = config.validate(profile) {
            slot.fail(&e);
            return;
        }
        let api_key = match self.credentials.get(profile.wire_family) {
            Some(key) => key,
            None => {
                slot.fail(&RunError::MissingCredential(profile.wire_family));
                return;
            }
        };

        let request = request::build(
            profile,
            config,
            prompt,
            self.endpoints.base(profile.wire_family),
            &api_key,
        );

        let cancel = Arc::new(Notify::new());
        self.cancels
            .lock()
            .unwrap()
            .insert(model_id.to_string(), cancel.clone());

        tracing::debug!(model = %model_id, family = %profile.wire_family, "starting run");
        tokio::spawn(run::drive_run(
            request,
            profile.wire_family,
            self.transport.clone(),
            slot,
            cancel,
        ));
    }

    /// Release a run's resources; it lands in `Errored("cancelled")`.
    /// A no-op for models with no live run.
    pub fn cancel(&self, model_id: &str) {
        if let Some(cancel) = self.cancels.lock().unwrap().remove(model_id) {
            cancel.notify_one();
        }
    }

    /// Read-only snapshot of one model's run state.
    pub fn state(&self, model_id: &str) -> Option<ModelRunState> {
        self.table.snapshot(model_id)
    }

    /// Snapshots of every tracked run, ordered by model id.
    pub fn snapshot_all(&self) -> Vec<(String, ModelRunState)> {
        self.table.snapshot_all()
    }

    pub fn all_terminal(&self) -> bool {
        self.table.all_terminal()
    }
}
