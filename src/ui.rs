//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: a scrollable list on top and a one-line
//!   status bar at the bottom.
//! * Colours and styles are defined inline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;
use crate::notifications::Notification;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

    draw_notification_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

fn marker(n: &Notification) -> Span<'static> {
    if n.meta.done {
        Span::styled("✓", Style::default().fg(Color::Green))
    } else if n.unread {
        Span::styled("●", Style::default().fg(Color::Blue))
    } else {
        Span::raw(" ")
    }
}

fn state_color(state: &str) -> Color {
    match state {
        "open" => Color::Green,
        "merged" => Color::Magenta,
        "closed" => Color::Red,
        _ => Color::DarkGray,
    }
}

fn row(n: &Notification) -> ListItem<'_> {
    let date_str = n
        .updated_at
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "no date".into());

    let mut spans = vec![
        marker(n),
        Span::raw(" "),
        Span::styled(format!("{date_str:<17}"), Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
        Span::styled(
            format!("{:<30}", n.repository.full_name),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{:<12}", n.subject.kind),
            Style::default().fg(Color::Yellow),
        ),
        Span::raw(" "),
        Span::styled(&n.subject.title, Style::default().fg(Color::White)),
    ];
    if let Some(state) = &n.subject.state {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("({state})"),
            Style::default().fg(state_color(state)),
        ));
    }

    ListItem::new(Line::from(spans))
}

/// Render the scrollable notification list.
fn draw_notification_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app.items.iter().map(row).collect();

    let list = List::new(list_items)
        .block(Block::default().title(" Notifications ").borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let done = app.items.iter().filter(|n| n.meta.done).count();
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} notifications, {done} done", app.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  d: done  r: read  u: unsubscribe"),
    ]));
    frame.render_widget(status, area);
}
