//! Cloneable façade for one conversation session.
//!
//! [`SessionHandle`] hides channel plumbing. Moves go through the session
//! worker; planning, deviation and simulation run on a snapshot outside the
//! worker so a slow solver never blocks the conversation.
use std::sync::Arc;
use std::time::Instant;

use dialogue_core::{Move, PlannerConfig, SystemAction, Transition};
use planner::{Goal, PlanStep, SimulationResult, Synthesizer, TaskText};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::analytics::{Archetype, DeviationReport, MoveMix, QuestDifficulty};
use crate::events::{Event, EventBus, PlanningEvent, SessionId, Topic};
use crate::resolver::{PlanOutcome, PlanResolver};
use crate::workers::{AppliedMove, Command, MoveList, SessionSnapshot};

/// Client-facing handle to interact with one session
#[derive(Clone)]
pub struct SessionHandle {
    id: SessionId,
    command_tx: mpsc::Sender<Command>,
    resolver: Arc<PlanResolver>,
    planner: PlannerConfig,
    events: EventBus,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("solver", &self.resolver.solver_name())
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    pub(crate) fn new(
        id: SessionId,
        command_tx: mpsc::Sender<Command>,
        resolver: Arc<PlanResolver>,
        planner: PlannerConfig,
        events: EventBus,
    ) -> Self {
        Self {
            id,
            command_tx,
            resolver,
            planner,
            events,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> Command,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)?
    }

    /// Legal moves in the current state.
    pub async fn valid_moves(&self) -> Result<MoveList> {
        self.request(|reply| Command::ValidMoves { reply }).await
    }

    /// Applies a move taken from a [`MoveList`] of graph `generation`.
    ///
    /// Fails with [`RuntimeError::GraphReloaded`] if the graph changed since
    /// the list was produced.
    pub async fn apply(&self, mv: Move, generation: u64) -> Result<AppliedMove> {
        self.request(|reply| Command::Apply {
            mv,
            generation,
            reply,
        })
        .await
    }

    /// Applies a move named by a plan step, e.g. one taken from a plan.
    pub async fn apply_step(&self, step: PlanStep) -> Result<AppliedMove> {
        self.request(|reply| Command::ApplyStep { step, reply }).await
    }

    /// Applies an explicit mood or inventory change.
    pub async fn system(&self, action: SystemAction, generation: u64) -> Result<Transition> {
        self.request(|reply| Command::System {
            action,
            generation,
            reply,
        })
        .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Restarts at the current character's start context.
    pub async fn reset(&self) -> Result<SessionSnapshot> {
        self.request(|reply| Command::Reset { reply }).await
    }

    pub async fn switch_character(&self, character: impl Into<String>) -> Result<SessionSnapshot> {
        let character = character.into();
        self.request(|reply| Command::SwitchCharacter { character, reply })
            .await
    }

    /// Planning text for the current state.
    ///
    /// Object ids in `goal` must belong to the graph generation the session
    /// is bound to.
    pub async fn synthesize(&self, goal: &Goal) -> Result<TaskText> {
        let snapshot = self.snapshot().await?;
        self.render(&snapshot, goal)
    }

    fn render(&self, snapshot: &SessionSnapshot, goal: &Goal) -> Result<TaskText> {
        let task = Synthesizer::new(&snapshot.graph, &self.planner)
            .synthesize_default(&snapshot.state, goal)?;
        Ok(task.render())
    }

    /// Solves for `goal` from the current state.
    pub async fn plan(&self, goal: &Goal) -> Result<PlanOutcome> {
        let snapshot = self.snapshot().await?;
        self.plan_from(&snapshot, goal).await
    }

    async fn plan_from(&self, snapshot: &SessionSnapshot, goal: &Goal) -> Result<PlanOutcome> {
        let text = self.render(snapshot, goal)?;
        let started = Instant::now();
        let outcome = self.resolver.solve_default(&text).await?;

        self.events.publish(Event::Planning(PlanningEvent::PlanResolved {
            session: self.id,
            outcome: (&outcome).into(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }));
        Ok(outcome)
    }

    /// Compares the context shifts taken so far with the shortest route from
    /// here to the character's terminal context.
    pub async fn assess_deviation(&self) -> Result<DeviationReport> {
        let snapshot = self.snapshot().await?;
        let outcome = self.plan_from(&snapshot, &Goal::TerminalContext).await?;
        let report = DeviationReport::classify(
            &outcome,
            snapshot.context_shifts(),
            self.planner.deviation_threshold as usize,
        );

        tracing::info!(
            session = %self.id,
            status = ?report.status,
            l_opt = report.l_opt,
            l_actual = report.l_actual,
            "deviation assessed"
        );
        self.events.publish(Event::Planning(PlanningEvent::DeviationAssessed {
            session: self.id,
            report: report.clone(),
        }));
        Ok(report)
    }

    /// Grades `goal` by the length of the plan that reaches it. `None` when
    /// the solver timed out.
    pub async fn assess_quest(&self, goal: &Goal) -> Result<Option<QuestDifficulty>> {
        let outcome = self.plan(goal).await?;
        Ok(QuestDifficulty::assess(&outcome))
    }

    /// Archetype of the moves committed since the last restart.
    pub async fn archetype(&self) -> Result<Archetype> {
        let snapshot = self.snapshot().await?;
        Ok(MoveMix::from_trace(&snapshot.history).archetype())
    }

    /// Replays candidate traces from the current state towards the terminal
    /// context. The session itself is not touched.
    pub async fn simulate(&self, traces: Vec<Vec<PlanStep>>) -> Result<Vec<SimulationResult>> {
        let snapshot = self.snapshot().await?;
        let text = self.render(&snapshot, &Goal::TerminalContext)?;
        Ok(self.resolver.simulate_batch(&text, traces).await?)
    }

    /// Subscribe to events from a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.events.subscribe(topic)
    }

    pub(crate) async fn shutdown(&self) {
        if self.command_tx.send(Command::Shutdown).await.is_err() {
            tracing::debug!(session = %self.id, "session worker already stopped");
        }
    }
}
