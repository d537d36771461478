//! The conversation controller
//!
//! [`Conversation`] owns the session state for one UI session and is the only
//! thing allowed to mutate it. UIs call the `submit_*` methods on user input,
//! hand the resulting [`PendingRequest`] to a backend, and feed the outcome
//! back through [`Conversation::complete_pending`]. Every mutation bumps
//! [`Conversation::revision`] so the UI knows when to redraw.

use crate::api::{BackendError, ChatBackend};
use crate::presets::Presets;
use crate::state::{ChatTurn, Notice, PendingRequest, SessionState};

pub const BAD_STATUS_REPLY: &str =
    "I'm sorry, I encountered an error processing your request. Please try again.";
pub const CANCELLED_REPLY: &str = "I'm sorry, the request was cancelled.";
pub const RESET_SUCCESS: &str = "Conversation reset successfully!";
pub const RESET_FAILED: &str = "Failed to reset conversation. Please try again.";

/// Assistant text for a failed chat request
pub fn error_reply(err: &BackendError) -> String {
    match err {
        BackendError::BadStatus(_) => BAD_STATUS_REPLY.to_string(),
        BackendError::Transport(detail) => {
            format!("I'm sorry, I encountered an error: {}", detail)
        }
    }
}

pub struct Conversation {
    state: SessionState,
    presets: Presets,
    notice: Option<Notice>,
    next_request_id: u64,
    revision: u64,
}

impl Conversation {
    pub fn new(presets: Presets) -> Self {
        Self {
            state: SessionState::new(),
            presets,
            notice: None,
            next_request_id: 1,
            revision: 0,
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        self.state.turns()
    }

    pub fn is_awaiting(&self) -> bool {
        self.state.is_awaiting()
    }

    pub fn presets(&self) -> &Presets {
        &self.presets
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Incremented on every state change
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn changed(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Append a user turn and enter the awaiting state.
    ///
    /// Ignored (returns false) while a request is outstanding or when the text
    /// is blank.
    pub fn submit_query(&mut self, text: &str) -> bool {
        if self.state.is_awaiting() {
            tracing::debug!("submit ignored, a request is already pending");
            return false;
        }
        if text.trim().is_empty() {
            return false;
        }

        self.state.push(ChatTurn::user(text));
        self.state.set_awaiting(true);
        tracing::info!(chars = text.chars().count(), "query submitted");
        self.changed();
        true
    }

    /// Same as [`Conversation::submit_query`] with the preset's text
    pub fn submit_preset(&mut self, index: usize) -> bool {
        match self.presets.get(index).map(str::to_owned) {
            Some(question) => self.submit_query(&question),
            None => false,
        }
    }

    /// Claim the outstanding query so it can be sent to the backend.
    ///
    /// Returns `None` when there is nothing to send or it has already been
    /// claimed. If the flag is set but no user turn exists, the flag is
    /// cleared.
    pub fn begin_pending(&mut self) -> Option<PendingRequest> {
        if !self.state.is_awaiting() || self.state.pending().is_some() {
            return None;
        }

        let Some(query) = self.state.last_user_query().map(str::to_owned) else {
            self.state.set_awaiting(false);
            self.changed();
            return None;
        };

        let request = PendingRequest {
            id: self.next_request_id,
            query,
        };
        self.next_request_id += 1;
        self.state.set_pending(Some(request.clone()));
        tracing::debug!(id = request.id, "request started");
        Some(request)
    }

    /// Record the backend outcome for request `id`.
    ///
    /// Outcomes for anything other than the current request (for instance one
    /// that was cancelled, or issued before a reset) are dropped and false is
    /// returned.
    pub fn complete_pending(&mut self, id: u64, outcome: Result<String, BackendError>) -> bool {
        if self.state.pending().map(|p| p.id) != Some(id) {
            tracing::debug!(id, "dropping stale reply");
            return false;
        }

        let content = match outcome {
            Ok(reply) => {
                tracing::info!(id, "reply received");
                reply
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "chat request failed");
                error_reply(&err)
            }
        };

        self.state.push(ChatTurn::assistant(content));
        self.state.set_pending(None);
        self.state.set_awaiting(false);
        self.changed();
        true
    }

    /// Run one full request/response cycle against `backend`
    pub async fn resolve_pending(&mut self, backend: &dyn ChatBackend) {
        let Some(request) = self.begin_pending() else {
            return;
        };
        let outcome = backend.chat(&request.query).await;
        self.complete_pending(request.id, outcome);
    }

    /// Abandon the outstanding request. Its reply, if it ever arrives, is dropped.
    pub fn cancel_pending(&mut self) -> bool {
        if !self.state.is_awaiting() {
            return false;
        }

        tracing::info!("request cancelled");
        self.state.push(ChatTurn::assistant(CANCELLED_REPLY));
        self.state.set_pending(None);
        self.state.set_awaiting(false);
        self.changed();
        true
    }

    /// Ask the backend to reset, then apply the outcome
    pub async fn reset_conversation(&mut self, backend: &dyn ChatBackend) -> bool {
        let outcome = backend.reset().await;
        self.complete_reset(outcome)
    }

    /// Clear the conversation if the backend confirmed the reset.
    ///
    /// Turns are only touched after success; either way a notice is shown.
    pub fn complete_reset(&mut self, outcome: Result<(), BackendError>) -> bool {
        let reset = match outcome {
            Ok(()) => {
                tracing::info!("conversation reset");
                self.state.clear();
                self.notice = Some(Notice::success(RESET_SUCCESS));
                true
            }
            Err(BackendError::BadStatus(status)) => {
                tracing::warn!(%status, "reset rejected");
                self.notice = Some(Notice::error(RESET_FAILED));
                false
            }
            Err(BackendError::Transport(detail)) => {
                tracing::warn!(error = %detail, "reset failed");
                self.notice = Some(Notice::error(format!("An error occurred: {}", detail)));
                false
            }
        };
        self.changed();
        reset
    }

    /// Age the current notice by one UI tick
    pub fn tick(&mut self) {
        if let Some(notice) = self.notice.as_mut() {
            if !notice.tick() {
                self.notice = None;
                self.changed();
            }
        }
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new(Presets::default())
    }
}
