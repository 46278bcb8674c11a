use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthChar;
use crate::app::{App, InputMode};
use crate::transcript::Sender;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat, input, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let identity = app.controller.identity();
    let identity_note = if identity.is_persisted() {
        format!(" {} ", identity.user_id())
    } else {
        format!(" {} (session only) ", identity.user_id())
    };

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", app.controller.artifact().label()),
            Style::default().fg(Color::Cyan).bold(),
        ),
        Span::styled(app.server_url.clone(), Style::default().fg(Color::White)),
        Span::styled(identity_note, Style::default().fg(Color::Gray)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn sender_style(sender: Sender) -> Style {
    match sender {
        Sender::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Sender::Artifact(_) => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        Sender::System => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    }
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    if app.follow_tail {
        app.scroll_to_bottom();
    }

    let border_color = if app.input_mode == InputMode::Normal { Color::Cyan } else { Color::DarkGray };
    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" {} ", app.controller.artifact().label()));

    let transcript = app.controller.transcript();
    let chat_text = if transcript.is_empty() && !app.controller.is_sending() {
        Text::from(Span::styled(
            "유물에게 말을 걸어 보세요...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for (i, entry) in transcript.entries().iter().enumerate() {
            let mut spans = Vec::new();
            if transcript.is_detached_reply(i) {
                // Reply landed after a later message; point back at its exchange
                spans.push(Span::styled(
                    format!("↳{} ", entry.exchange),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            spans.push(Span::styled(format!("{}: ", entry.sender.label()), sender_style(entry.sender)));
            spans.push(Span::raw(entry.text.as_str()));
            lines.push(Line::from(spans));
        }

        if app.controller.is_sending() {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            let pending = app.controller.pending_count();
            let label = if pending > 1 {
                format!("{} 응답 대기 중{} ({})", app.controller.artifact().label(), dots, pending)
            } else {
                format!("{} 응답 대기 중{}", app.controller.artifact().label(), dots)
            };
            lines.push(Line::from(Span::styled(
                label,
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(chat_block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let input_border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(input_border_color))
        .title(" 메시지 (Enter to send) ");

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_x) = input_viewport(&app.input, app.cursor, inner_width);

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

/// Visible slice of `input` and the cursor column within it, both in display columns.
/// Wide characters (Hangul, CJK) take two columns.
fn input_viewport(input: &str, cursor: usize, inner_width: usize) -> (String, u16) {
    let width_of = |c: char| c.width().unwrap_or(0);
    let cursor_col: usize = input.chars().take(cursor).map(width_of).sum();

    // Drop leading characters until the cursor fits inside the box
    let mut skipped_chars = 0;
    let mut skipped_width = 0;
    if inner_width > 0 {
        let mut leading = input.chars();
        while cursor_col - skipped_width >= inner_width {
            let Some(c) = leading.next() else {
                break;
            };
            skipped_width += width_of(c);
            skipped_chars += 1;
        }
    }

    let mut visible = String::new();
    let mut used = 0;
    for c in input.chars().skip(skipped_chars) {
        let w = width_of(c);
        if used + w > inner_width {
            break;
        }
        used += w;
        visible.push(c);
    }

    (visible, (cursor_col - skipped_width) as u16)
}


fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " NORMAL ",
        InputMode::Editing => " INSERT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Normal => vec![
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" G ", key_style),
            Span::styled(" latest ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll mode ", label_style),
            Span::styled(" Ctrl-C ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let mut spans = vec![Span::styled(mode_text, mode_style)];
    spans.extend(hints);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
