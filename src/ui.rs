use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, FocusPane, InputMode, QUICK_ACTIONS};
use crate::session::{format_usd, Entry, Sender, SessionState};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, alert banner (when present), body, input, footer
    let alert_height = if app.session.alert().is_some() { 1 } else { 0 };
    let [header_area, alert_area, body_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(alert_height),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_alert(app, frame, alert_area);

    let [transcript_area, actions_area] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(26),
    ])
    .areas(body_area);

    render_transcript(app, frame, transcript_area);
    render_quick_actions(app, frame, actions_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = match app.session.state() {
        SessionState::AwaitingConfirmation(pending) => Span::styled(
            format!(
                " CONFIRM {} TO {} ",
                format_usd(pending.amount),
                pending.recipient
            ),
            Style::default().bg(Color::Yellow).fg(Color::Black).bold(),
        ),
        SessionState::Idle if app.in_flight > 0 => {
            Span::styled(" working ", Style::default().fg(Color::DarkGray))
        }
        SessionState::Idle => Span::raw(""),
    };

    let title = Line::from(vec![
        Span::styled(" Bankline ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            "conversational banking assistant ",
            Style::default().fg(Color::Gray),
        ),
        status,
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_alert(app: &App, frame: &mut Frame, area: Rect) {
    let Some(alert) = app.session.alert() else {
        return;
    };
    if area.height == 0 {
        return;
    }

    let banner = Paragraph::new(Line::from(Span::raw(format!(" {alert} "))))
        .style(Style::default().bg(Color::Yellow).fg(Color::Black).bold());
    frame.render_widget(banner, area);
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Transcript;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    // Store inner dimensions for scroll calculations
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let text = if app.session.transcript().is_empty() && app.in_flight == 0 {
        Text::from(Span::styled(
            "Ask about your balance, accounts, or transfers...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(transcript_lines(app))
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for entry in app.session.transcript() {
        match entry {
            Entry::Message(msg) => {
                let (label, style) = match msg.sender {
                    Sender::User => (
                        "You:",
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    Sender::System => (
                        "Assistant:",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                };
                lines.push(Line::from(Span::styled(label, style)));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
                lines.push(Line::default());
            }
            Entry::Receipt(receipt) => {
                lines.push(Line::from(Span::styled(
                    "Transfer executed successfully",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )));
                lines.push(receipt_field("Amount", format_usd(receipt.amount)));
                lines.push(receipt_field("Recipient", receipt.recipient.clone()));
                lines.push(receipt_field("New balance", format_usd(receipt.new_balance)));
                lines.push(Line::default());
            }
        }
    }

    if app.in_flight > 0 {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn receipt_field(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {label}: "),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(value),
    ])
}

fn render_quick_actions(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::QuickActions;
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Quick actions ");

    let items: Vec<ListItem> = QUICK_ACTIONS
        .iter()
        .map(|action| ListItem::new(format!(" {} ", action.label)))
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.quick_state);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Command (Enter to send) ");

    // Horizontal scroll keeps the cursor visible in a narrow box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);
    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => {
            let mut hints = vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" browse ", label_style),
                Span::styled(" Ctrl-C ", key_style),
                Span::styled(" quit ", label_style),
            ];
            if app.session.is_awaiting_confirmation() {
                hints.push(Span::styled(
                    " reply CONFIRM to proceed, anything else cancels ",
                    Style::default().fg(Color::Yellow),
                ));
            }
            hints
        }
        InputMode::Normal => {
            let mut hints = vec![
                Span::styled(" i ", key_style),
                Span::styled(" type ", label_style),
                Span::styled(" Tab ", key_style),
                Span::styled(" focus ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ];
            if app.focus == FocusPane::QuickActions {
                hints.push(Span::styled(" Enter ", key_style));
                hints.push(Span::styled(" run ", label_style));
            }
            hints.push(Span::styled(" q ", key_style));
            hints.push(Span::styled(" quit ", label_style));
            hints
        }
    };

    let footer = Paragraph::new(Line::from(hints));
    frame.render_widget(footer, area);
}
