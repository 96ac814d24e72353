//! Per-actor session context: the matchmaking state machine
//!
//! This module provides the core `SessionContext` that owns one actor's
//! matchmaking progress, active session, live message log, and session
//! history. Its four operations (`start_search`, `post_user_message`,
//! `end_session`, `leave_session`) are the entire mutation surface;
//! everything temporal runs through the generation-tagged scheduler so a
//! terminated session can never be mutated by a late timer.

use crate::chat::{pick_responder, CannedResponses, MessageLog, ResponseSource};
use crate::config::AppConfig;
use crate::directory::{CandidateProvider, IdentityProvider};
use crate::error::{Result, SessionError};
use crate::events::EventPublisher;
use crate::metrics::MetricsCollector;
use crate::scheduler::{Generation, RandomSource, TaskScheduler, ThreadRandomSource};
use crate::session::{Session, SessionHistory};
use crate::types::{
    ChatMessage, MatchmakingState, MemberLeft, MessageKind, MessagePosted, SessionFormed,
    SessionEnded, SessionId, UserId, UserProfile,
};
use crate::utils::{current_timestamp, generate_session_id};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// System message seeding every freshly formed session log
const WELCOME_MESSAGE: &str = "Welcome! Your group has been formed. Start collaborating!";

/// Mutable per-actor state, guarded by the context lock
///
/// Deferred task bodies mutate this only under the lock, so no two
/// deferred bodies interleave mid-execution.
#[derive(Debug)]
struct ContextState {
    matchmaking: MatchmakingState,
    active: Option<Session>,
    log: MessageLog,
    history: SessionHistory,
    /// Bumped on every session-ending transition; scheduled tasks carry
    /// the epoch they were created under and are discarded on mismatch
    epoch: Generation,
    search_started_at: Option<DateTime<Utc>>,
}

impl ContextState {
    fn new() -> Self {
        Self {
            matchmaking: MatchmakingState::Idle,
            active: None,
            log: MessageLog::new(),
            history: SessionHistory::new(),
            epoch: 0,
            search_started_at: None,
        }
    }
}

/// The per-actor session runtime
#[derive(Clone)]
pub struct SessionContext {
    /// Application configuration (search delay, responder window)
    config: AppConfig,
    /// Identity provider for the current actor
    identity: Arc<dyn IdentityProvider>,
    /// Candidate pool for roster formation
    candidates: Arc<dyn CandidateProvider>,
    /// Event publisher for session/message events
    publisher: Arc<dyn EventPublisher>,
    /// Responder text source
    responses: Arc<dyn ResponseSource>,
    /// Random source for leader election and responder delays
    rng: Arc<dyn RandomSource>,
    /// Metrics collector for recording operational data
    metrics: Arc<MetricsCollector>,
    /// Generation-tagged deferred task scheduler
    scheduler: Arc<TaskScheduler>,
    /// Guarded mutable state
    state: Arc<RwLock<ContextState>>,
}

impl SessionContext {
    /// Create a new context with default randomness, responses and metrics
    pub fn new(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        candidates: Arc<dyn CandidateProvider>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let rng: Arc<dyn RandomSource> = Arc::new(ThreadRandomSource);
        let responses: Arc<dyn ResponseSource> = Arc::new(CannedResponses::new(rng.clone()));
        let metrics = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_components(
            config, identity, candidates, publisher, responses, rng, metrics,
        )
    }

    /// Create a context with every component injected (used by tests to
    /// control randomness and capture events)
    pub fn with_components(
        config: AppConfig,
        identity: Arc<dyn IdentityProvider>,
        candidates: Arc<dyn CandidateProvider>,
        publisher: Arc<dyn EventPublisher>,
        responses: Arc<dyn ResponseSource>,
        rng: Arc<dyn RandomSource>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            config,
            identity,
            candidates,
            publisher,
            responses,
            rng,
            metrics,
            scheduler: Arc::new(TaskScheduler::new()),
            state: Arc::new(RwLock::new(ContextState::new())),
        }
    }

    /// Begin a matchmaking search for the current actor
    ///
    /// Transitions `Idle -> Searching` and schedules the completion after
    /// the configured delay. Rejected with `InvalidState` while a search
    /// or active session already exists.
    pub async fn start_search(&self) -> Result<()> {
        let actor = self
            .identity
            .current_user()
            .ok_or(SessionError::Unauthenticated)?;

        let generation = {
            let mut state = self
                .state
                .write()
                .map_err(|_| SessionError::InternalError {
                    message: "Failed to acquire state lock".to_string(),
                })?;

            match state.matchmaking {
                MatchmakingState::Idle => {}
                other => {
                    return Err(SessionError::InvalidState {
                        operation: "start_search",
                        state: other,
                    }
                    .into())
                }
            }

            state.matchmaking = MatchmakingState::Searching;
            state.search_started_at = Some(current_timestamp());
            state.epoch
        };

        self.metrics.record_search_started();
        self.metrics.record_task_scheduled("search_completion");

        info!(
            "Search started for '{}' (role: '{}'), completing in {:?}",
            actor.id,
            actor.role,
            self.config.search_delay()
        );

        let ctx = self.clone();
        self.scheduler
            .schedule(generation, self.config.search_delay(), async move {
                ctx.complete_search(actor, generation).await;
            });

        Ok(())
    }

    /// Timer-fired matchmaking completion
    ///
    /// Builds the roster, elects a leader, activates the session and
    /// seeds the welcome message. A firing whose generation no longer
    /// matches (or whose actor stopped searching) is discarded silently.
    async fn complete_search(&self, actor: UserProfile, generation: Generation) {
        let mut candidates = self.candidates.select_candidates(&actor.role);
        candidates.truncate(self.config.matchmaking.max_candidates);

        // Roster order: actor first, then candidates as returned
        let mut seen: HashSet<UserId> = HashSet::new();
        seen.insert(actor.id.clone());
        let mut members = vec![actor.clone()];
        for candidate in candidates {
            if seen.insert(candidate.id.clone()) {
                members.push(candidate);
            }
        }

        let leader_id = members[self.rng.pick_index(members.len())].id.clone();
        let now = current_timestamp();
        let session = match Session::form(generate_session_id(), members, leader_id, now) {
            Ok(session) => session,
            Err(e) => {
                warn!("Discarding matchmaking completion: {}", e);
                return;
            }
        };

        let event = {
            let mut state = match self.state.write() {
                Ok(state) => state,
                Err(_) => {
                    warn!("Failed to acquire state lock for matchmaking completion");
                    return;
                }
            };

            if state.epoch != generation || state.matchmaking != MatchmakingState::Searching {
                debug!(
                    "Discarding stale matchmaking completion for generation {}",
                    generation
                );
                self.metrics.record_stale_firing_discarded();
                return;
            }

            state.matchmaking = MatchmakingState::Matched;
            state.active = Some(session.clone());
            state.log.clear();
            state.log.append(ChatMessage::system(WELCOME_MESSAGE, now));

            if let Some(started_at) = state.search_started_at.take() {
                let waited = (now - started_at).to_std().unwrap_or_default();
                self.metrics.observe_search_duration(waited);
            }

            SessionFormed {
                session_id: session.id,
                leader_id: session.leader_id.clone(),
                members: session.members.clone(),
                timestamp: now,
            }
        };

        self.metrics.record_session_formed();
        self.metrics.record_message_posted(MessageKind::System);

        info!(
            "Matched '{}' into session {} with {} member(s), leader '{}'",
            actor.id,
            session.id,
            session.members.len(),
            session.leader_id
        );

        if let Err(e) = self.publisher.publish_session_formed(event).await {
            warn!("Failed to publish SessionFormed event: {}", e);
        }
    }

    /// Append a user message to the active session's log
    ///
    /// Schedules at most one responder reply when the roster carries an
    /// automated member other than the sender.
    pub async fn post_user_message(&self, text: &str) -> Result<ChatMessage> {
        let actor = self
            .identity
            .current_user()
            .ok_or(SessionError::Unauthenticated)?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyInput.into());
        }

        let (message, session_id, responder, generation) = {
            let mut state = self
                .state
                .write()
                .map_err(|_| SessionError::InternalError {
                    message: "Failed to acquire state lock".to_string(),
                })?;

            let (session_id, responder) = {
                let session = state.active.as_ref().ok_or(SessionError::NoActiveSession {
                    operation: "post_user_message",
                })?;
                (session.id, pick_responder(&session.members, &actor.id).cloned())
            };

            let message = state
                .log
                .append(ChatMessage::user(&actor, trimmed, current_timestamp()))
                .clone();
            (message, session_id, responder, state.epoch)
        };

        self.metrics.record_message_posted(MessageKind::User);
        debug!(
            "User '{}' posted message {} to session {}",
            actor.id, message.id, session_id
        );

        if self.config.chat.enable_responder {
            if let Some(responder) = responder {
                let (min, max) = self.config.responder_delay_window();
                let delay = self.rng.delay_within(min, max);

                debug!(
                    "Scheduling responder '{}' for session {} in {:?}",
                    responder.id, session_id, delay
                );
                self.metrics.record_task_scheduled("responder");

                let ctx = self.clone();
                self.scheduler.schedule(generation, delay, async move {
                    ctx.deliver_responder_message(session_id, responder, generation)
                        .await;
                });
            }
        }

        if let Err(e) = self
            .publisher
            .publish_message_posted(MessagePosted {
                session_id,
                message: message.clone(),
            })
            .await
        {
            warn!("Failed to publish MessagePosted event: {}", e);
        }

        Ok(message)
    }

    /// Timer-fired responder delivery
    ///
    /// Appends the synthesized reply unless the session it belongs to has
    /// been terminated in the meantime.
    async fn deliver_responder_message(
        &self,
        session_id: SessionId,
        responder: UserProfile,
        generation: Generation,
    ) {
        let text = self.responses.next_response();

        let event = {
            let mut state = match self.state.write() {
                Ok(state) => state,
                Err(_) => {
                    warn!("Failed to acquire state lock for responder delivery");
                    return;
                }
            };

            let still_active = state.epoch == generation
                && state.active.as_ref().map(|s| s.id) == Some(session_id);
            if !still_active {
                debug!(
                    "Discarding stale responder message for session {}",
                    session_id
                );
                self.metrics.record_stale_firing_discarded();
                return;
            }

            let message = state
                .log
                .append(ChatMessage::user(&responder, text, current_timestamp()))
                .clone();

            MessagePosted {
                session_id,
                message,
            }
        };

        self.metrics.record_message_posted(MessageKind::User);
        self.metrics.record_responder_message();
        debug!(
            "Responder '{}' replied in session {}",
            responder.id, session_id
        );

        if let Err(e) = self.publisher.publish_message_posted(event).await {
            warn!("Failed to publish MessagePosted event: {}", e);
        }
    }

    /// End the active session (leader only)
    ///
    /// The session moves to history most-recent-first, the log is
    /// discarded, pending timers are cancelled, and the actor returns to
    /// `Idle`.
    pub async fn end_session(&self) -> Result<Session> {
        let actor = self
            .identity
            .current_user()
            .ok_or(SessionError::Unauthenticated)?;

        let (ended, stale_generation) = {
            let mut state = self
                .state
                .write()
                .map_err(|_| SessionError::InternalError {
                    message: "Failed to acquire state lock".to_string(),
                })?;

            {
                let session = state.active.as_ref().ok_or(SessionError::NoActiveSession {
                    operation: "end_session",
                })?;
                if !session.is_leader(&actor.id) {
                    return Err(SessionError::NotAuthorized {
                        user_id: actor.id,
                        action: "end the session",
                    }
                    .into());
                }
            }

            let mut session = state.active.take().expect("active session checked above");
            session.mark_ended(current_timestamp())?;
            state.history.record(session.clone())?;
            state.log.clear();
            state.matchmaking = MatchmakingState::Idle;
            state.search_started_at = None;

            let stale_generation = state.epoch;
            state.epoch += 1;
            (session, stale_generation)
        };

        let cancelled = self.scheduler.cancel_generation(stale_generation);
        if cancelled > 0 {
            self.metrics.record_tasks_cancelled(cancelled);
        }

        self.metrics.record_session_ended();
        info!("Session {} ended by leader '{}'", ended.id, actor.id);

        let event = SessionEnded {
            session: ended.clone(),
            timestamp: ended.ended_at.unwrap_or_else(current_timestamp),
        };
        if let Err(e) = self.publisher.publish_session_ended(event).await {
            warn!("Failed to publish SessionEnded event: {}", e);
        }

        Ok(ended)
    }

    /// Leave the active session without ending it
    ///
    /// Any member may leave. Unlike `end_session` the session is NOT
    /// recorded in this actor's history (asymmetry kept as designed;
    /// confirm with product intent before changing it). Other members'
    /// views of the session are unaffected.
    pub async fn leave_session(&self) -> Result<()> {
        let actor = self
            .identity
            .current_user()
            .ok_or(SessionError::Unauthenticated)?;

        let (session_id, stale_generation) = {
            let mut state = self
                .state
                .write()
                .map_err(|_| SessionError::InternalError {
                    message: "Failed to acquire state lock".to_string(),
                })?;

            let session_id = state
                .active
                .as_ref()
                .ok_or(SessionError::NoActiveSession {
                    operation: "leave_session",
                })?
                .id;

            state.active = None;
            state.log.clear();
            state.matchmaking = MatchmakingState::Idle;
            state.search_started_at = None;

            let stale_generation = state.epoch;
            state.epoch += 1;
            (session_id, stale_generation)
        };

        let cancelled = self.scheduler.cancel_generation(stale_generation);
        if cancelled > 0 {
            self.metrics.record_tasks_cancelled(cancelled);
        }

        self.metrics.record_session_left();
        info!("'{}' left session {}", actor.id, session_id);

        let event = MemberLeft {
            session_id,
            user_id: actor.id,
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.publisher.publish_member_left(event).await {
            warn!("Failed to publish MemberLeft event: {}", e);
        }

        Ok(())
    }

    /// Current matchmaking state
    pub fn matchmaking_state(&self) -> Result<MatchmakingState> {
        let state = self
            .state
            .read()
            .map_err(|_| SessionError::InternalError {
                message: "Failed to acquire state lock".to_string(),
            })?;
        Ok(state.matchmaking)
    }

    /// Snapshot of the active session, if any
    pub fn active_session(&self) -> Result<Option<Session>> {
        let state = self
            .state
            .read()
            .map_err(|_| SessionError::InternalError {
                message: "Failed to acquire state lock".to_string(),
            })?;
        Ok(state.active.clone())
    }

    /// Snapshot of the live message log in append order
    pub fn messages(&self) -> Result<Vec<ChatMessage>> {
        let state = self
            .state
            .read()
            .map_err(|_| SessionError::InternalError {
                message: "Failed to acquire state lock".to_string(),
            })?;
        Ok(state.log.messages().to_vec())
    }

    /// Snapshot of the session history, most recent first
    pub fn history(&self) -> Result<Vec<Session>> {
        let state = self
            .state
            .read()
            .map_err(|_| SessionError::InternalError {
                message: "Failed to acquire state lock".to_string(),
            })?;
        Ok(state.history.records().cloned().collect())
    }

    /// Number of deferred tasks scheduled but not yet fired
    pub fn pending_timer_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Abort every outstanding deferred task (teardown/logout path)
    pub fn cancel_outstanding_tasks(&self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            self.metrics.record_tasks_cancelled(cancelled);
        }
        cancelled
    }

    /// Metrics collector backing this context
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }
}
