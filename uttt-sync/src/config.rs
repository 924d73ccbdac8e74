//! Sync client configuration

use std::time::Duration;

/// Retry and polling parameters for a [`crate::SyncClient`]
#[derive(Clone, Debug)]
pub struct SyncConfig {
    /// Automatic resubmissions after a transport failure
    pub max_retries: u32,
    /// Fixed wait between resubmissions
    pub retry_backoff: Duration,
    /// Deadline for a single request; a timeout counts as a network failure
    pub request_timeout: Duration,
    /// Poll period once the game is decided
    pub poll_finished: Duration,
    /// Poll period while it is the local player's turn
    pub poll_own_turn: Duration,
    /// Poll period while waiting for the opponent
    pub poll_opponent_turn: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            request_timeout: Duration::from_secs(5),
            poll_finished: Duration::from_secs(5),
            poll_own_turn: Duration::from_secs(2),
            poll_opponent_turn: Duration::from_millis(500),
        }
    }
}

impl SyncConfig {
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
