//! Sync client: optimistic move submission with bounded retry
//!
//! The client keeps a read-only mirror of the room tagged with the last
//! observed version. Moves go out with that version; the store decides.
//!
//! ```text
//!          submit            accepted
//!   Idle ─────────► Syncing ─────────► Idle
//!    ▲                 │ stale / rejected / retries exhausted
//!    │  dismiss        ▼
//!    └──────────── Error { reason, retry_count } ──retry──► Syncing
//! ```

use crate::config::SyncConfig;
use crate::protocol::{
    MoveAccepted, PerPlayer, Presence, Rejection, RoomId, RoomSnapshot, SubmitMoveRequest,
};
use crate::store::RoomStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uttt_core::{GameState, Move, Player};

/// Notice shown after a stale submission was replaced by the server state
pub const STALE_NOTICE: &str = "Opponent moved, try again";

// ============================================================================
// TRANSPORT
// ============================================================================

/// Failure to reach the store at all (as opposed to a rejection)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {status}: {message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Only failures where the request may never have been processed are
    /// resent automatically; a 4xx means the server saw it and refused.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Http { status, .. } => *status >= 500,
            TransportError::Decode(_) => false,
        }
    }
}

/// Store's answer to a submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(MoveAccepted),
    Rejected(Rejection),
}

impl From<Result<MoveAccepted, Rejection>> for SubmitOutcome {
    fn from(result: Result<MoveAccepted, Rejection>) -> Self {
        match result {
            Ok(accepted) => SubmitOutcome::Accepted(accepted),
            Err(rejection) => SubmitOutcome::Rejected(rejection),
        }
    }
}

/// How a client reaches the room store
#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit_move(
        &self,
        room_id: &str,
        request: &SubmitMoveRequest,
    ) -> Result<SubmitOutcome, TransportError>;

    async fn fetch(&self, room_id: &str) -> Result<RoomSnapshot, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn submit_move(
        &self,
        room_id: &str,
        request: &SubmitMoveRequest,
    ) -> Result<SubmitOutcome, TransportError> {
        (**self).submit_move(room_id, request).await
    }

    async fn fetch(&self, room_id: &str) -> Result<RoomSnapshot, TransportError> {
        (**self).fetch(room_id).await
    }
}

/// Transport that talks to a store in the same process
#[derive(Clone)]
pub struct LocalTransport {
    store: Arc<dyn RoomStore>,
}

impl LocalTransport {
    pub fn new(store: Arc<dyn RoomStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn submit_move(
        &self,
        room_id: &str,
        request: &SubmitMoveRequest,
    ) -> Result<SubmitOutcome, TransportError> {
        Ok(self
            .store
            .apply_validated_move(room_id, request.mv, request.expected_version)
            .into())
    }

    async fn fetch(&self, room_id: &str) -> Result<RoomSnapshot, TransportError> {
        self.store
            .get(room_id)
            .map_err(|e| TransportError::Http {
                status: 404,
                message: e.to_string(),
            })
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Submission state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Error { reason: String, retry_count: u32 },
}

/// A move awaiting the store, tagged with the version it was made against
#[derive(Clone, Copy, Debug)]
struct PendingMove {
    mv: Move,
    expected_version: u64,
}

/// One seat's view of an online room
pub struct SyncClient<T: Transport> {
    transport: T,
    config: SyncConfig,
    room_id: RoomId,
    me: Player,
    state: GameState,
    version: u64,
    status: SyncStatus,
    pending: Option<PendingMove>,
    players: PerPlayer<Presence>,
    rematch_requests: PerPlayer<bool>,
    player_left: Option<Player>,
}

impl<T: Transport> SyncClient<T> {
    pub fn new(transport: T, room_id: impl Into<RoomId>, me: Player, config: SyncConfig) -> Self {
        Self {
            transport,
            config,
            room_id: room_id.into(),
            me,
            state: GameState::new(),
            version: 0,
            status: SyncStatus::Idle,
            pending: None,
            players: PerPlayer::default(),
            rematch_requests: PerPlayer::default(),
            player_left: None,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn me(&self) -> Player {
        self.me
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    pub fn pending(&self) -> Option<Move> {
        self.pending.map(|p| p.mv)
    }

    pub fn players(&self) -> PerPlayer<Presence> {
        self.players
    }

    pub fn rematch_requests(&self) -> PerPlayer<bool> {
        self.rematch_requests
    }

    pub fn player_left(&self) -> Option<Player> {
        self.player_left
    }

    pub fn is_my_turn(&self) -> bool {
        !self.state.is_over() && self.state.current_player() == self.me
    }

    /// How long to wait before the next refresh
    pub fn poll_interval(&self) -> Duration {
        if self.state.is_over() {
            self.config.poll_finished
        } else if self.state.current_player() == self.me {
            self.config.poll_own_turn
        } else {
            self.config.poll_opponent_turn
        }
    }

    /// Adopt a fetched snapshot. Game state is taken only when strictly
    /// newer and no submission is in flight; lobby fields always follow.
    pub fn apply_fetched(&mut self, snapshot: RoomSnapshot) -> bool {
        if self.status == SyncStatus::Syncing {
            debug!(room = %self.room_id, "ignoring poll result while syncing");
            return false;
        }

        self.players = snapshot.players;
        self.rematch_requests = snapshot.rematch_requests;
        self.player_left = snapshot.player_left;

        if snapshot.version > self.version {
            debug!(room = %self.room_id, from = self.version, to = snapshot.version, "adopting newer state");
            self.state = snapshot.game_state;
            self.version = snapshot.version;
            true
        } else {
            false
        }
    }

    /// Fetch the room and adopt it if newer
    pub async fn refresh(&mut self) -> Result<bool, TransportError> {
        let snapshot = self.transport.fetch(&self.room_id).await?;
        Ok(self.apply_fetched(snapshot))
    }

    /// Submit a local move. Only starts from `Idle`; otherwise the current
    /// status is returned untouched.
    pub async fn submit(&mut self, board: u8, cell: u8) -> &SyncStatus {
        if self.status != SyncStatus::Idle {
            debug!(room = %self.room_id, status = ?self.status, "submit ignored");
            return &self.status;
        }
        self.pending = Some(PendingMove {
            mv: Move::new(board, cell, self.me),
            expected_version: self.version,
        });
        self.send_pending().await;
        &self.status
    }

    /// Resubmit the pending move with a fresh retry budget, against the
    /// version it was originally made on
    pub async fn retry(&mut self) -> &SyncStatus {
        if matches!(self.status, SyncStatus::Error { .. }) && self.pending.is_some() {
            self.send_pending().await;
        }
        &self.status
    }

    /// Drop the pending move and any error
    pub fn dismiss(&mut self) {
        self.pending = None;
        self.status = SyncStatus::Idle;
    }

    async fn send_pending(&mut self) {
        let Some(PendingMove { mv, expected_version }) = self.pending else {
            return;
        };
        self.status = SyncStatus::Syncing;
        let request = SubmitMoveRequest::new(mv, expected_version);

        let mut retries = 0;
        loop {
            match self.transport.submit_move(&self.room_id, &request).await {
                Ok(SubmitOutcome::Accepted(accepted)) => {
                    info!(room = %self.room_id, %mv, version = accepted.version, "move accepted");
                    self.state = accepted.game_state;
                    self.version = accepted.version;
                    self.pending = None;
                    self.status = SyncStatus::Idle;
                    return;
                }
                Ok(SubmitOutcome::Rejected(Rejection::StaleState { state, version })) => {
                    warn!(room = %self.room_id, %mv, server_version = version, "stale submission");
                    self.state = *state;
                    self.version = version;
                    self.pending = None;
                    self.status = SyncStatus::Error {
                        reason: STALE_NOTICE.to_string(),
                        retry_count: 0,
                    };
                    return;
                }
                Ok(SubmitOutcome::Rejected(rejection)) => {
                    warn!(room = %self.room_id, %mv, kind = rejection.kind(), "move rejected");
                    self.status = SyncStatus::Error {
                        reason: rejection.to_string(),
                        retry_count: 0,
                    };
                    return;
                }
                Err(err) if err.is_retryable() && retries < self.config.max_retries => {
                    retries += 1;
                    warn!(room = %self.room_id, %err, attempt = retries, "transport failure, retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(err) => {
                    warn!(room = %self.room_id, %err, retries, "submission failed");
                    self.status = SyncStatus::Error {
                        reason: err.to_string(),
                        retry_count: retries,
                    };
                    return;
                }
            }
        }
    }
}
