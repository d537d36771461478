//! UI-agnostic conversation state types
//!
//! This module contains data structures that are shared between the
//! controller and any UI rendering it. Nothing here performs I/O.

/// Number of UI ticks a notice stays on screen (ticks are 300ms apart)
pub const NOTICE_TICKS: u8 = 4;

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "You",
            ChatRole::Assistant => "Assistant",
        }
    }

    /// Avatar glyph shown next to each turn
    pub fn avatar(&self) -> &'static str {
        match self {
            ChatRole::User => "👤",
            ChatRole::Assistant => "🧠",
        }
    }
}

/// The request currently waiting on the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub id: u64,
    pub query: String,
}

/// In-memory state for one UI session
///
/// Turns are append-only; the only way to remove them is [`SessionState::clear`].
#[derive(Debug, Default)]
pub struct SessionState {
    turns: Vec<ChatTurn>,
    awaiting_response: bool,
    pending: Option<PendingRequest>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn is_awaiting(&self) -> bool {
        self.awaiting_response
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        self.pending.as_ref()
    }

    /// Most recent user turn, scanning from the end
    pub fn last_user_query(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == ChatRole::User)
            .map(|turn| turn.content.as_str())
    }

    pub(crate) fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub(crate) fn set_awaiting(&mut self, awaiting: bool) {
        self.awaiting_response = awaiting;
    }

    pub(crate) fn set_pending(&mut self, pending: Option<PendingRequest>) {
        self.pending = pending;
    }

    pub(crate) fn clear(&mut self) {
        self.turns.clear();
        self.awaiting_response = false;
        self.pending = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient status message shown after a reset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    ttl: u8,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            ttl: NOTICE_TICKS,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            ttl: NOTICE_TICKS,
        }
    }

    /// Count down one tick. Returns false once the notice has expired.
    pub fn tick(&mut self) -> bool {
        self.ttl = self.ttl.saturating_sub(1);
        self.ttl > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_user_query_scans_from_end() {
        let mut state = SessionState::new();
        state.push(ChatTurn::user("first"));
        state.push(ChatTurn::assistant("reply"));
        state.push(ChatTurn::user("second"));
        state.push(ChatTurn::assistant("another reply"));
        assert_eq!(state.last_user_query(), Some("second"));
    }

    #[test]
    fn test_last_user_query_none_without_user_turns() {
        let mut state = SessionState::new();
        assert_eq!(state.last_user_query(), None);
        state.push(ChatTurn::assistant("hello"));
        assert_eq!(state.last_user_query(), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut state = SessionState::new();
        state.push(ChatTurn::user("q"));
        state.set_awaiting(true);
        state.set_pending(Some(PendingRequest { id: 1, query: "q".into() }));
        state.clear();
        assert!(state.turns().is_empty());
        assert!(!state.is_awaiting());
        assert!(state.pending().is_none());
    }

    #[test]
    fn test_notice_expires() {
        let mut notice = Notice::success("done");
        let mut ticks = 0;
        while notice.tick() {
            ticks += 1;
        }
        assert_eq!(ticks, NOTICE_TICKS as usize - 1);
    }
}
