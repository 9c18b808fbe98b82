//! High-level runtime orchestrator.
//!
//! The runtime owns the graph store, the plan resolver, the event bus and
//! one worker per open session, and exposes a builder-based API for clients.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dialogue_core::{GraphModel, SessionState};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::analytics::BatchSimulator;
use crate::api::{Result, RuntimeError, SessionHandle};
use crate::config::{RuntimeConfig, SolverBackend};
use crate::events::{Event, EventBus, SessionEvent, SessionId, Topic};
use crate::graph_store::GraphStore;
use crate::resolver::{BuiltinSolver, ExternalSolver, PlanResolver, SolveBudget, Solver};
use crate::workers::SessionWorker;

struct SessionEntry {
    handle: SessionHandle,
    worker: JoinHandle<()>,
}

/// Main runtime that hosts conversation sessions
///
/// Sessions are independent; the graph is shared read-only and replaced
/// wholesale on reload.
pub struct Runtime {
    config: RuntimeConfig,
    store: Arc<GraphStore>,
    resolver: Arc<PlanResolver>,
    events: EventBus,
    sessions: Mutex<HashMap<SessionId, SessionEntry>>,
    next_session: AtomicU64,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Current graph snapshot.
    pub fn graph(&self) -> Arc<GraphModel> {
        self.store.load()
    }

    pub fn resolver(&self) -> &Arc<PlanResolver> {
        &self.resolver
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    /// Opens a session at the start context of `character`.
    pub async fn open_session(&self, character: &str) -> Result<SessionHandle> {
        let graph = self.store.load();
        let character_id = graph
            .character_id(character)
            .map_err(|_| RuntimeError::UnknownCharacter(character.to_owned()))?;
        let state = SessionState::new(&graph, character_id)?;

        let id = SessionId(self.next_session.fetch_add(1, Ordering::Relaxed));
        let (command_tx, command_rx) = mpsc::channel(self.config.command_buffer_size.max(1));
        let worker = SessionWorker::new(
            id,
            self.config.planner.agent.clone(),
            Arc::clone(&self.store),
            graph,
            state,
            command_rx,
            self.events.clone(),
        );
        let worker = tokio::spawn(worker.run());

        let handle = SessionHandle::new(
            id,
            command_tx,
            Arc::clone(&self.resolver),
            self.config.planner.clone(),
            self.events.clone(),
        );
        self.sessions().insert(
            id,
            SessionEntry {
                handle: handle.clone(),
                worker,
            },
        );

        tracing::info!(session = %id, character, "session opened");
        self.events.publish(Event::Session(SessionEvent::Opened {
            session: id,
            character: character.to_owned(),
        }));
        Ok(handle)
    }

    pub fn session(&self, id: SessionId) -> Result<SessionHandle> {
        self.sessions()
            .get(&id)
            .map(|entry| entry.handle.clone())
            .ok_or(RuntimeError::UnknownSession(id))
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.sessions().keys().copied().collect();
        ids.sort();
        ids
    }

    /// Stops the session worker. Outstanding handles fail afterwards.
    pub async fn close_session(&self, id: SessionId) -> Result<()> {
        let entry = self
            .sessions()
            .remove(&id)
            .ok_or(RuntimeError::UnknownSession(id))?;
        entry.handle.shutdown().await;
        entry.worker.await.map_err(RuntimeError::WorkerJoin)?;

        tracing::info!(session = %id, "session closed");
        self.events
            .publish(Event::Session(SessionEvent::Closed { session: id }));
        Ok(())
    }

    /// Publishes `graph` as the next generation. Sessions rebind on their
    /// next command; plans already in flight finish on the old snapshot.
    pub fn reload_graph(&self, graph: GraphModel) -> u64 {
        let generation = self.store.replace(graph).generation();
        self.events
            .publish(Event::Session(SessionEvent::GraphReloaded { generation }));
        generation
    }

    /// Cancels in-flight solves and closes every session.
    pub async fn shutdown(self) -> Result<()> {
        self.resolver.shutdown();
        for id in self.session_ids() {
            self.close_session(id).await?;
        }
        Ok(())
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, SessionEntry>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    graph: Option<GraphModel>,
    solver: Option<Arc<dyn Solver>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            graph: None,
            solver: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required graph model
    pub fn graph(mut self, graph: GraphModel) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Use `solver` instead of the one named by the configuration.
    pub fn solver(mut self, solver: Arc<dyn Solver>) -> Self {
        self.solver = Some(solver);
        self
    }

    /// Build the runtime
    pub async fn build(self) -> Result<Runtime> {
        let graph = self.graph.ok_or(RuntimeError::MissingGraph)?;
        let config = self.config;

        let solver = self.solver.unwrap_or_else(|| solver_for(&config.solver));
        let budget = SolveBudget {
            timeout: config.planner.solver_timeout(),
            max_states: config.planner.max_search_states,
        };
        let simulator = BatchSimulator::new(config.simulation_threads)?;
        let resolver = PlanResolver::new(solver, budget, config.plan_cache_capacity, simulator);

        tracing::info!(
            solver = resolver.solver_name(),
            characters = graph.characters().len(),
            "runtime ready"
        );

        Ok(Runtime {
            store: Arc::new(GraphStore::new(graph)),
            resolver: Arc::new(resolver),
            events: EventBus::with_capacity(config.event_buffer_size),
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
            config,
        })
    }
}

fn solver_for(backend: &SolverBackend) -> Arc<dyn Solver> {
    match backend {
        SolverBackend::Builtin => Arc::new(BuiltinSolver::new()),
        SolverBackend::External {
            program,
            args,
            plan_file,
        } => {
            let solver = ExternalSolver::new(program.clone()).args(args.iter().cloned());
            match plan_file {
                Some(name) => Arc::new(solver.plan_file(name.clone())),
                None => Arc::new(solver),
            }
        }
    }
}
