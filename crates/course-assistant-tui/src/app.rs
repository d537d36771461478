use std::sync::Arc;

use course_assistant_core::{BackendError, ChatBackend, Config, Conversation, ModelChoice};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::tui::{AppEvent, EventSender};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Presets,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Conversation
    pub conversation: Conversation,
    pub backend: Arc<dyn ChatBackend>,
    pub api_url: String,
    chat_task: Option<JoinHandle<()>>,
    reset_task: Option<JoinHandle<()>>,
    events: EventSender,

    // Query input
    pub query_input: String,
    pub query_cursor: usize, // cursor position in query_input

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Sidebar
    pub preset_state: ListState,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Model picker state
    pub selected_model: ModelChoice,
    pub show_model_picker: bool,
    pub model_picker_state: ListState,
    pub persist_model: bool,

    // Panel areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub preset_area: Option<Rect>,

    // Redraw tracking
    dirty: bool,
    drawn_revision: Option<u64>,
}

impl App {
    pub fn new(
        conversation: Conversation,
        backend: Arc<dyn ChatBackend>,
        api_url: String,
        selected_model: ModelChoice,
        events: EventSender,
    ) -> Self {
        let mut preset_state = ListState::default();
        preset_state.select(Some(0));

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Chat,

            conversation,
            backend,
            api_url,
            chat_task: None,
            reset_task: None,
            events,

            query_input: String::new(),
            query_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,

            preset_state,

            animation_frame: 0,

            selected_model,
            show_model_picker: false,
            model_picker_state: ListState::default(),
            persist_model: false,

            chat_area: None,
            preset_area: None,

            dirty: true,
            drawn_revision: None,
        }
    }

    /// Mark UI-only state as changed
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// True when a redraw is due, either because UI state changed or the
    /// conversation moved to a new revision since the last frame.
    pub fn take_redraw(&mut self) -> bool {
        let revision = self.conversation.revision();
        let due = self.dirty || self.drawn_revision != Some(revision);
        self.dirty = false;
        self.drawn_revision = Some(revision);
        due
    }

    pub fn is_request_running(&self) -> bool {
        self.chat_task.is_some()
    }

    pub fn is_reset_running(&self) -> bool {
        self.reset_task.is_some()
    }

    /// Submit the text in the input box. Held back while a reset is running,
    /// since a successful reset would discard the new turn.
    pub fn submit_input(&mut self) {
        if self.is_reset_running() {
            tracing::debug!("submit ignored while reset is running");
            return;
        }
        let query = self.query_input.clone();
        if self.conversation.submit_query(&query) {
            self.query_input.clear();
            self.query_cursor = 0;
            self.start_request();
        }
    }

    /// Submit one of the sidebar sample questions
    pub fn submit_preset(&mut self, index: usize) {
        if self.is_reset_running() {
            tracing::debug!(index, "preset ignored while reset is running");
            return;
        }
        if self.conversation.submit_preset(index) {
            self.preset_state.select(Some(index));
            self.start_request();
        }
    }

    /// Hand the outstanding query to a background task
    fn start_request(&mut self) {
        self.scroll_chat_to_bottom();

        let Some(request) = self.conversation.begin_pending() else {
            return;
        };

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.chat_task = Some(tokio::spawn(async move {
            let outcome = backend.chat(&request.query).await;
            let _ = events.send(AppEvent::ChatFinished {
                id: request.id,
                outcome,
            });
        }));
    }

    pub fn finish_request(&mut self, id: u64, outcome: Result<String, BackendError>) {
        if self.conversation.complete_pending(id, outcome) {
            self.chat_task = None;
            self.scroll_chat_to_bottom();
        }
    }

    /// Give up on the outstanding request
    pub fn cancel_request(&mut self) {
        if self.conversation.cancel_pending() {
            if let Some(task) = self.chat_task.take() {
                task.abort();
            }
            self.scroll_chat_to_bottom();
        }
    }

    /// Ask the backend to reset. Ignored while a reset is already running.
    pub fn request_reset(&mut self) {
        if self.reset_task.is_some() {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        self.reset_task = Some(tokio::spawn(async move {
            let outcome = backend.reset().await;
            let _ = events.send(AppEvent::ResetFinished(outcome));
        }));
    }

    pub fn finish_reset(&mut self, outcome: Result<(), BackendError>) {
        self.reset_task = None;
        if self.conversation.complete_reset(outcome) {
            if let Some(task) = self.chat_task.take() {
                task.abort();
            }
            self.chat_scroll = 0;
        }
    }

    /// Tick animation frame and notice timers (called by Tick event)
    pub fn tick(&mut self) {
        if self.conversation.is_awaiting() {
            self.animation_frame = (self.animation_frame + 1) % 3;
            self.dirty = true;
        }
        self.conversation.tick();
    }

    // Sidebar navigation
    pub fn preset_nav_down(&mut self) {
        let len = self.conversation.presets().len();
        if len > 0 {
            let i = self.preset_state.selected().unwrap_or(0);
            self.preset_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn preset_nav_up(&mut self) {
        let i = self.preset_state.selected().unwrap_or(0);
        self.preset_state.select(Some(i.saturating_sub(1)));
    }

    pub fn submit_selected_preset(&mut self) {
        if let Some(i) = self.preset_state.selected() {
            self.submit_preset(i);
        }
    }

    // Model picker
    pub fn open_model_picker(&mut self) {
        self.show_model_picker = true;
        self.model_picker_state.select(Some(self.selected_model.index()));
    }

    pub fn model_picker_nav_down(&mut self) {
        let len = ModelChoice::all().len();
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some((i + 1).min(len - 1)));
    }

    pub fn model_picker_nav_up(&mut self) {
        let i = self.model_picker_state.selected().unwrap_or(0);
        self.model_picker_state.select(Some(i.saturating_sub(1)));
    }

    pub fn select_model(&mut self) {
        if let Some(i) = self.model_picker_state.selected() {
            if let Some(&model) = ModelChoice::all().get(i) {
                self.selected_model = model;
                if self.persist_model {
                    if let Err(e) = Config::save_default_model(model) {
                        tracing::warn!(error = %e, "could not save default model");
                    }
                }
            }
        }
        self.show_model_picker = false;
    }

    // Chat scrolling
    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.chat_line_count().saturating_sub(self.chat_height);
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    /// Scroll chat to bottom so the latest turn (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.chat_line_count().saturating_sub(self.chat_height);
    }

    /// Rendered height of the conversation at the current chat width
    pub fn chat_line_count(&self) -> u16 {
        // Fall back to a narrow width until the first frame has been drawn
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };
        let total_lines = ui::chat_paragraph(self).line_count(wrap_width);
        total_lines.min(u16::MAX as usize) as u16
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use course_assistant_core::{ChatTurn, Presets};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// Backend that echoes the query, optionally after a delay
    pub(crate) struct EchoBackend {
        pub delay: Duration,
        pub reset_ok: bool,
    }

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn chat(&self, query: &str) -> Result<String, BackendError> {
            tokio::time::sleep(self.delay).await;
            Ok(format!("echo: {}", query))
        }

        async fn reset(&self) -> Result<(), BackendError> {
            if self.reset_ok {
                Ok(())
            } else {
                Err(BackendError::Transport("connection refused".into()))
            }
        }
    }

    pub(crate) fn test_app(delay: Duration) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let backend = Arc::new(EchoBackend { delay, reset_ok: true });
        let app = App::new(
            Conversation::new(Presets::default()),
            backend,
            "http://localhost:5000/api".to_string(),
            ModelChoice::default(),
            tx,
        );
        (app, rx)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<AppEvent>) -> AppEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event in time")
            .expect("channel open")
    }

    #[tokio::test]
    async fn test_submit_runs_request_in_background() {
        let (mut app, mut rx) = test_app(Duration::ZERO);
        app.query_input = "hi".to_string();
        app.query_cursor = 2;

        app.submit_input();
        assert!(app.query_input.is_empty());
        assert!(app.conversation.is_awaiting());
        assert!(app.is_request_running());

        match next_event(&mut rx).await {
            AppEvent::ChatFinished { id, outcome } => app.finish_request(id, outcome),
            other => panic!("unexpected event {:?}", other),
        }

        assert!(!app.conversation.is_awaiting());
        assert!(!app.is_request_running());
        assert_eq!(
            app.conversation.turns(),
            &[ChatTurn::user("hi"), ChatTurn::assistant("echo: hi")]
        );
    }

    #[tokio::test]
    async fn test_submit_while_waiting_keeps_input() {
        let (mut app, _rx) = test_app(Duration::from_secs(60));
        app.query_input = "first".to_string();
        app.submit_input();

        app.query_input = "second".to_string();
        app.submit_input();
        assert_eq!(app.query_input, "second");
        assert_eq!(app.conversation.turns().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_aborts_request() {
        let (mut app, mut rx) = test_app(Duration::from_secs(60));
        app.submit_preset(1);
        assert!(app.is_request_running());

        app.cancel_request();
        assert!(!app.conversation.is_awaiting());
        assert!(!app.is_request_running());
        assert!(
            tokio::time::timeout(Duration::from_millis(100), rx.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_reset_round_trip() {
        let (mut app, mut rx) = test_app(Duration::ZERO);
        app.submit_preset(0);
        if let AppEvent::ChatFinished { id, outcome } = next_event(&mut rx).await {
            app.finish_request(id, outcome);
        }
        assert_eq!(app.conversation.turns().len(), 2);

        app.request_reset();
        assert!(app.is_reset_running());
        match next_event(&mut rx).await {
            AppEvent::ResetFinished(outcome) => app.finish_reset(outcome),
            other => panic!("unexpected event {:?}", other),
        }

        assert!(!app.is_reset_running());
        assert!(app.conversation.turns().is_empty());
        assert!(app.conversation.notice().is_some());
    }

    #[tokio::test]
    async fn test_submit_held_while_reset_runs() {
        let (mut app, mut rx) = test_app(Duration::ZERO);
        app.request_reset();

        app.query_input = "asked during reset".to_string();
        app.submit_input();
        app.submit_preset(0);
        assert_eq!(app.query_input, "asked during reset");
        assert!(app.conversation.turns().is_empty());
        assert!(!app.is_request_running());

        match next_event(&mut rx).await {
            AppEvent::ResetFinished(outcome) => app.finish_reset(outcome),
            other => panic!("unexpected event {:?}", other),
        }

        app.submit_input();
        assert_eq!(app.conversation.turns(), &[ChatTurn::user("asked during reset")]);
        assert!(app.is_request_running());
    }

    #[tokio::test]
    async fn test_failed_reset_keeps_turns() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend = Arc::new(EchoBackend {
            delay: Duration::ZERO,
            reset_ok: false,
        });
        let mut app = App::new(
            Conversation::default(),
            backend,
            String::new(),
            ModelChoice::default(),
            tx,
        );
        app.submit_preset(2);
        if let AppEvent::ChatFinished { id, outcome } = next_event(&mut rx).await {
            app.finish_request(id, outcome);
        }

        app.request_reset();
        if let AppEvent::ResetFinished(outcome) = next_event(&mut rx).await {
            app.finish_reset(outcome);
        }
        assert_eq!(app.conversation.turns().len(), 2);
        assert_eq!(
            app.conversation.notice().map(|n| n.text.as_str()),
            Some("An error occurred: connection refused")
        );
    }

    #[test]
    fn test_redraw_follows_revision() {
        let (mut app, _rx) = test_app(Duration::ZERO);
        assert!(app.take_redraw());
        assert!(!app.take_redraw());

        app.conversation.complete_reset(Ok(()));
        assert!(app.take_redraw());
        assert!(!app.take_redraw());

        app.mark_dirty();
        assert!(app.take_redraw());
    }

    #[test]
    fn test_model_picker_selects_without_persisting() {
        let (mut app, _rx) = test_app(Duration::ZERO);
        app.open_model_picker();
        assert_eq!(app.model_picker_state.selected(), Some(0));
        app.model_picker_nav_down();
        app.model_picker_nav_down();
        app.model_picker_nav_down();
        app.select_model();
        assert_eq!(app.selected_model, ModelChoice::MistralSmall);
        assert!(!app.show_model_picker);
    }

    #[test]
    fn test_chat_line_count_wraps() {
        let (mut app, _rx) = test_app(Duration::ZERO);
        app.chat_width = 20;
        app.conversation.submit_query("abcdefghijklmnopqrstuvwxy");
        // role line + 2 wrapped lines + separator, then the thinking indicator
        assert_eq!(app.chat_line_count(), 6);
    }

    #[test]
    fn test_chat_line_count_follows_word_wrap() {
        let (mut app, _rx) = test_app(Duration::ZERO);
        app.chat_width = 14;
        app.conversation.submit_query("hi");
        let request = app.conversation.begin_pending().unwrap();
        // 25 characters would fit in two rows, but no two words share a row
        app.conversation
            .complete_pending(request.id, Ok("aaaaaaaaa bbbbbbbbb ccccc".into()));

        // user: role + text + separator; assistant: role + 3 rows + separator
        assert_eq!(app.chat_line_count(), 8);
    }
}
