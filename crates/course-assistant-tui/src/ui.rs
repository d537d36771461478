use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use course_assistant_core::{ChatRole, ModelChoice, NoticeLevel};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, FocusPane, InputMode};

const ABOUT: &str = "This assistant helps you explore the technical courses available \
on Brainlox. Ask about courses, topics, or get recommendations based on your interests.";

fn role_style(role: ChatRole) -> Style {
    match role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

/// Header line for a turn: avatar and role name
fn role_line(role: ChatRole) -> Line<'static> {
    Line::from(vec![
        Span::raw(format!("{} ", role.avatar())),
        Span::styled(format!("{}:", role.label()), role_style(role)),
    ])
}

/// Style one line of assistant output.
///
/// Handles `**bold**` spans and turns leading `- ` / `* ` into bullets; anything
/// else (including an unclosed `**`) is shown as typed.
fn parse_markdown_line(text: &str) -> Line<'static> {
    let (prefix, body) = match text.trim_start().strip_prefix("- ").or_else(|| text.trim_start().strip_prefix("* ")) {
        Some(rest) => {
            let indent = text.len() - text.trim_start().len();
            (format!("{}• ", " ".repeat(indent)), rest)
        }
        None => (String::new(), text),
    };

    let mut spans: Vec<Span<'static>> = Vec::new();
    if !prefix.is_empty() {
        spans.push(Span::raw(prefix));
    }

    let mut rest = body;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("**") else {
            break;
        };
        if end == 0 {
            // "****" has nothing to bold
            spans.push(Span::raw(rest[..start + 4].to_string()));
            rest = &after[2..];
            continue;
        }
        if start > 0 {
            spans.push(Span::raw(rest[..start].to_string()));
        }
        spans.push(Span::styled(
            after[..end].to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        rest = &after[end + 2..];
    }
    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [sidebar_area, main_area] = Layout::horizontal([
        Constraint::Length(44),
        Constraint::Min(0),
    ])
    .areas(body_area);

    render_sidebar(app, frame, sidebar_area);
    render_chat_screen(app, frame, main_area);
    render_footer(app, frame, footer_area);

    if app.show_model_picker {
        render_model_picker(app, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" 🧠 Brainlox Course Assistant ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let subtitle = Line::from(Span::styled(
        " Your AI guide to Brainlox technical courses",
        Style::default().fg(Color::Gray),
    ));
    let powered_by = Line::from(vec![
        Span::styled(" Powered by ", Style::default().fg(Color::DarkGray)),
        Span::styled("Mistral AI", Style::default().fg(Color::Magenta).bold()),
        Span::styled(format!("  ·  {}", app.api_url), Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(vec![title, subtitle, powered_by]);
    frame.render_widget(header, area);
}

fn render_sidebar(app: &mut App, frame: &mut Frame, area: Rect) {
    let preset_height = app.conversation.presets().len() as u16 + 2;

    let [about_area, preset_area, settings_area] = Layout::vertical([
        Constraint::Min(4),
        Constraint::Length(preset_height),
        Constraint::Length(4),
    ])
    .areas(area);

    app.preset_area = Some(preset_area);

    let about = Paragraph::new(ABOUT)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" About "));
    frame.render_widget(about, about_area);

    let presets_focused = app.focus == FocusPane::Presets && app.input_mode == InputMode::Normal;
    let border_color = if presets_focused { Color::Cyan } else { Color::DarkGray };

    let items: Vec<ListItem> = app
        .conversation
        .presets()
        .iter()
        .enumerate()
        .map(|(i, question)| {
            ListItem::new(Line::from(vec![
                Span::styled(format!("F{} ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::raw(question.to_string()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Sample Questions "),
        )
        .highlight_style(if presets_focused {
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        })
        .highlight_symbol(if presets_focused { "> " } else { "  " });

    frame.render_stateful_widget(list, preset_area, &mut app.preset_state);

    let reset_label = if app.is_reset_running() {
        Span::styled(" Resetting...", Style::default().fg(Color::DarkGray).italic())
    } else {
        Span::styled(" r / Ctrl+R  Reset Conversation", Style::default().fg(Color::Red))
    };
    let settings = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(" Model: ", Style::default().fg(Color::DarkGray)),
            Span::styled(app.selected_model.as_str(), Style::default().fg(Color::Green)),
        ]),
        Line::from(reset_label),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Model Settings "));
    frame.render_widget(settings, settings_area);
}

/// The wrapped transcript, shared by rendering and the scroll bounds in `App`
pub fn chat_paragraph(app: &App) -> Paragraph<'static> {
    let awaiting = app.conversation.is_awaiting();
    let chat_text = if app.conversation.turns().is_empty() && !awaiting {
        Text::from(Span::styled(
            "Ask about Brainlox courses, e.g. What Python courses are available?",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line<'static>> = Vec::new();

        for turn in app.conversation.turns() {
            lines.push(role_line(turn.role));
            match turn.role {
                ChatRole::User => {
                    for line in turn.content.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                ChatRole::Assistant => {
                    for line in turn.content.lines() {
                        lines.push(parse_markdown_line(line));
                    }
                }
            }
            lines.push(Line::default());
        }

        if awaiting {
            lines.push(role_line(ChatRole::Assistant));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    Paragraph::new(chat_text).wrap(Wrap { trim: false })
}

/// Slice of the input that fits in `width` columns with the cursor kept in view.
///
/// Returns the visible text and the cursor column within it, both measured in
/// display width so wide characters take two cells.
fn input_viewport(input: &str, cursor: usize, width: usize) -> (String, u16) {
    if width == 0 {
        return (String::new(), 0);
    }

    let widths: Vec<usize> = input
        .chars()
        .map(|c| UnicodeWidthChar::width(c).unwrap_or(0))
        .collect();
    let cursor = cursor.min(widths.len());

    // Drop leading characters until the text before the cursor leaves room
    // for the cursor cell itself
    let mut start = 0;
    let mut before: usize = widths[..cursor].iter().sum();
    while before >= width && start < cursor {
        before -= widths[start];
        start += 1;
    }

    let mut used = 0;
    let visible: String = input
        .chars()
        .zip(widths.iter())
        .skip(start)
        .take_while(|(_, w)| {
            used += **w;
            used <= width
        })
        .map(|(c, _)| c)
        .collect();

    (visible, before as u16)
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [chat_area, notice_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store areas for mouse hit-testing
    app.chat_area = Some(chat_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_focused = app.focus == FocusPane::Chat;
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if chat_focused { Color::Cyan } else { Color::DarkGray }))
        .title(" Conversation ");

    let chat = chat_paragraph(app)
        .block(chat_block)
        .scroll((app.chat_scroll, 0));
    frame.render_widget(chat, chat_area);

    if let Some(notice) = app.conversation.notice() {
        let style = match notice.level {
            NoticeLevel::Success => Style::default().fg(Color::Black).bg(Color::Green),
            NoticeLevel::Error => Style::default().fg(Color::White).bg(Color::Red),
        };
        let notice = Paragraph::new(Span::styled(format!(" {} ", notice.text), style));
        frame.render_widget(notice, notice_area);
    }

    let editing = app.input_mode == InputMode::Editing;
    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if editing { Color::Yellow } else { Color::DarkGray }))
        .title(if app.is_request_running() {
            " Ask about Brainlox courses (waiting for reply, Esc Esc to cancel) "
        } else {
            " Ask about Brainlox courses "
        });

    let inner_width = input_area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_viewport(&app.query_input, app.query_cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);
    frame.render_widget(input, input_area);

    // Show cursor when editing
    if editing && !app.show_model_picker {
        frame.set_cursor_position((input_area.x + cursor_x + 1, input_area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.input_mode {
        InputMode::Normal => (" NORMAL ", Style::default().bg(Color::Blue).fg(Color::White)),
        InputMode::Editing => (" INSERT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let pairs: &[(&str, &str)] = match app.input_mode {
        InputMode::Editing => &[("Enter", "send"), ("Esc", "normal"), ("F1-F5", "sample"), ("Ctrl+C", "quit")],
        InputMode::Normal if app.conversation.is_awaiting() => {
            &[("Esc", "cancel"), ("j/k", "scroll"), ("i", "type"), ("q", "quit")]
        }
        InputMode::Normal => &[
            ("i", "type"),
            ("Tab", "focus"),
            ("j/k", "nav"),
            ("F1-F5", "sample"),
            ("m", "model"),
            ("r", "reset"),
            ("q", "quit"),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in pairs {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_model_picker(app: &mut App, frame: &mut Frame, area: Rect) {
    let models = ModelChoice::all();

    // Calculate popup size and position (centered)
    let popup_width = 40.min(area.width.saturating_sub(4));
    let popup_height = (models.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Select Mistral AI Model ");

    let items: Vec<ListItem> = models
        .iter()
        .map(|model| {
            let style = if *model == app.selected_model {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {} ", model.as_str())).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, popup_area, &mut app.model_picker_state);
}
