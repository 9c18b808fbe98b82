//! Session worker that owns one conversation's [`SessionState`].
//!
//! All reads and writes of a session go through this actor, so transitions
//! for one session are strictly sequential while different sessions run in
//! parallel. Graph reloads are picked up lazily: before every command the
//! worker compares generations and rebinds its state by name.

use std::sync::Arc;

use dialogue_core::{
    DialogueError, GraphModel, Move, SessionState, SystemAction, Transition, TransitionEngine,
    valid_moves,
};
use planner::PlanStep;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::api::{Result, RuntimeError};
use crate::events::{Event, EventBus, SessionEvent, SessionId};
use crate::graph_store::GraphStore;

/// Legal moves together with the graph generation their indices refer to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveList {
    pub generation: u64,
    pub moves: Vec<Move>,
}

/// A committed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    pub step: PlanStep,
    pub transition: Transition,
}

/// Consistent view of a session: the graph its state is bound to, the
/// state and every move committed since the last restart.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub graph: Arc<GraphModel>,
    pub state: SessionState,
    pub history: Vec<PlanStep>,
}

impl SessionSnapshot {
    /// Context shifts taken since the last restart.
    pub fn context_shifts(&self) -> usize {
        self.history
            .iter()
            .filter(|step| step.kind() == Some(dialogue_core::MoveKind::ShiftContext))
            .count()
    }
}

/// Commands that can be sent to a session worker
pub enum Command {
    ValidMoves {
        reply: oneshot::Sender<Result<MoveList>>,
    },
    /// Apply a move listed against `generation`.
    Apply {
        mv: Move,
        generation: u64,
        reply: oneshot::Sender<Result<AppliedMove>>,
    },
    /// Apply a move given by name.
    ApplyStep {
        step: PlanStep,
        reply: oneshot::Sender<Result<AppliedMove>>,
    },
    System {
        action: SystemAction,
        generation: u64,
        reply: oneshot::Sender<Result<Transition>>,
    },
    Snapshot {
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    /// Restart at the start context of the current character.
    Reset {
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    SwitchCharacter {
        character: String,
        reply: oneshot::Sender<Result<SessionSnapshot>>,
    },
    Shutdown,
}

pub struct SessionWorker {
    id: SessionId,
    agent: String,
    store: Arc<GraphStore>,
    graph: Arc<GraphModel>,
    state: SessionState,
    history: Vec<PlanStep>,
    command_rx: mpsc::Receiver<Command>,
    events: EventBus,
}

impl SessionWorker {
    pub fn new(
        id: SessionId,
        agent: String,
        store: Arc<GraphStore>,
        graph: Arc<GraphModel>,
        state: SessionState,
        command_rx: mpsc::Receiver<Command>,
        events: EventBus,
    ) -> Self {
        Self {
            id,
            agent,
            store,
            graph,
            state,
            history: Vec::new(),
            command_rx,
            events,
        }
    }

    /// Main worker loop. Ends on [`Command::Shutdown`] or when every handle
    /// is dropped.
    pub async fn run(mut self) {
        while let Some(cmd) = self.command_rx.recv().await {
            if matches!(cmd, Command::Shutdown) {
                break;
            }
            self.handle_command(cmd);
        }
        debug!(session = %self.id, "session worker stopped");
    }

    fn handle_command(&mut self, cmd: Command) {
        let refreshed = self.refresh();
        match cmd {
            Command::ValidMoves { reply } => {
                let result = refreshed.map(|()| self.list_moves());
                respond(reply, result, "ValidMoves");
            }
            Command::Apply {
                mv,
                generation,
                reply,
            } => {
                let result = refreshed
                    .and_then(|()| self.check_generation(generation))
                    .and_then(|()| self.apply(&mv));
                respond(reply, result, "Apply");
            }
            Command::ApplyStep { step, reply } => {
                let result = refreshed
                    .and_then(|()| step.to_move_as(&self.graph, &self.agent).map_err(RuntimeError::from))
                    .and_then(|mv| self.apply(&mv));
                respond(reply, result, "ApplyStep");
            }
            Command::System {
                action,
                generation,
                reply,
            } => {
                let result = refreshed
                    .and_then(|()| self.check_generation(generation))
                    .and_then(|()| self.apply_system(&action));
                respond(reply, result, "System");
            }
            Command::Snapshot { reply } => {
                let result = refreshed.map(|()| self.snapshot());
                respond(reply, result, "Snapshot");
            }
            // Restarts discard the old state, so a failed rebind does not block them.
            Command::Reset { reply } => {
                if let Err(err) = refreshed {
                    debug!(session = %self.id, %err, "restarting a session that could not rebind");
                }
                let result = self
                    .graph
                    .require_character(self.state.character)
                    .map(|def| def.name.clone())
                    .map_err(RuntimeError::from)
                    .and_then(|character| self.restart(&character));
                respond(reply, result, "Reset");
            }
            Command::SwitchCharacter { character, reply } => {
                let result = self.restart(&character);
                respond(reply, result, "SwitchCharacter");
            }
            Command::Shutdown => {}
        }
    }

    /// Rebinds the session to the newest graph if one was published.
    fn refresh(&mut self) -> Result<()> {
        let latest = self.store.load();
        if latest.generation() == self.graph.generation() {
            return Ok(());
        }
        let state = self.state.rebind(&self.graph, &latest)?;
        debug!(
            session = %self.id,
            from = self.graph.generation(),
            to = latest.generation(),
            "session rebound"
        );
        self.graph = latest;
        self.state = state;
        Ok(())
    }

    fn check_generation(&self, generation: u64) -> Result<()> {
        if generation == self.graph.generation() {
            Ok(())
        } else {
            Err(RuntimeError::GraphReloaded {
                generation: self.graph.generation(),
            })
        }
    }

    fn list_moves(&self) -> MoveList {
        MoveList {
            generation: self.graph.generation(),
            moves: valid_moves(&self.graph, &self.state),
        }
    }

    fn apply(&mut self, mv: &Move) -> Result<AppliedMove> {
        let outcome = PlanStep::from_move(&self.graph, &self.agent, mv)
            .map_err(RuntimeError::from)
            .and_then(|step| {
                let transition = TransitionEngine::new(&self.graph).apply(&self.state, mv)?;
                Ok(AppliedMove { step, transition })
            });

        match outcome {
            Ok(applied) => {
                self.state = applied.transition.state.clone();
                self.history.push(applied.step.clone());
                self.events.publish(Event::Session(SessionEvent::MoveApplied {
                    session: self.id,
                    step: applied.step.clone(),
                    delta: applied.transition.delta.clone(),
                    nonce: self.state.nonce,
                }));
                Ok(applied)
            }
            Err(err) => {
                warn!(
                    session = %self.id,
                    action = %mv.describe(&self.graph),
                    code = err.error_code(),
                    "move rejected"
                );
                self.events.publish(Event::Session(SessionEvent::MoveRejected {
                    session: self.id,
                    code: err.error_code().to_owned(),
                    error: err.to_string(),
                }));
                Err(err)
            }
        }
    }

    fn apply_system(&mut self, action: &SystemAction) -> Result<Transition> {
        let transition = TransitionEngine::new(&self.graph).apply_system(&self.state, action)?;
        self.state = transition.state.clone();
        Ok(transition)
    }

    /// Starts a fresh conversation on the newest graph. Nothing changes on
    /// error.
    fn restart(&mut self, character: &str) -> Result<SessionSnapshot> {
        let graph = self.store.load();
        let id = graph
            .character_id(character)
            .map_err(|_| RuntimeError::UnknownCharacter(character.to_owned()))?;
        let state = SessionState::new(&graph, id)?;
        self.graph = graph;
        self.state = state;
        self.history.clear();
        self.events.publish(Event::Session(SessionEvent::Restarted {
            session: self.id,
            character: character.to_owned(),
        }));
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            graph: Arc::clone(&self.graph),
            state: self.state.clone(),
            history: self.history.clone(),
        }
    }
}

fn respond<T>(reply: oneshot::Sender<Result<T>>, result: Result<T>, command: &'static str) {
    if reply.send(result).is_err() {
        debug!(command, "reply channel closed (caller dropped)");
    }
}
