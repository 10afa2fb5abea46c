//! Rendering of the session into a ratatui frame.

use std::time::Duration;

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::session::{Session, Transfer, TransferStatus};
use crate::size::human_readable_size;
use crate::table::COLUMNS;

const BORDER: Color = Color::Indexed(240);
const SELECTED_FG: Color = Color::Indexed(229);
const SELECTED_BG: Color = Color::Indexed(57);

const MAX_TRANSFER_LINES: usize = 6;
const MAX_MESSAGE_LINES: usize = 4;

const HELP: &str = "↑/k ↓/j move · g/G first/last · esc focus · enter show command · d download · q quit";

/// Draw the whole session: asset table, transfers, printed lines and key help.
pub fn draw(frame: &mut Frame, session: &Session, messages: &[String]) {
    let transfer_lines = session.transfers().len().min(MAX_TRANSFER_LINES);
    let message_lines = messages.len().min(MAX_MESSAGE_LINES);

    let [table_area, transfers_area, messages_area, help_area] = Layout::vertical([
        Constraint::Min(4),
        Constraint::Length(boxed_height(transfer_lines)),
        Constraint::Length(boxed_height(message_lines)),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_table(frame, session, table_area);
    if transfer_lines > 0 {
        draw_transfers(frame, session.transfers(), transfers_area);
    }
    if message_lines > 0 {
        let lines: Vec<Line> = messages[messages.len() - message_lines..]
            .iter()
            .map(|m| Line::raw(m.as_str()))
            .collect();
        frame.render_widget(Paragraph::new(lines).block(bordered(" Output ")), messages_area);
    }
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(BORDER)),
        help_area,
    );
}

fn boxed_height(lines: usize) -> u16 {
    if lines == 0 {
        0
    } else {
        lines as u16 + 2
    }
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER))
        .title(title)
}

fn release_title(session: &Session) -> String {
    let release = session.release();
    let published = release
        .published_at
        .map(|at| format!(" · published {}", at.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!(" {} ({}){published} ", release.display_title(), release.tag_name)
}

fn draw_table(frame: &mut Frame, session: &Session, area: Rect) {
    let table = session.table();
    let header = Row::new(COLUMNS.iter().map(|(title, _)| Cell::from(*title)))
        .style(Style::default().add_modifier(Modifier::UNDERLINED));
    let rows = table
        .rows()
        .iter()
        .map(|row| Row::new([Cell::from(row.name.as_str()), Cell::from(row.size.as_str())]));
    let widths = COLUMNS.map(|(_, width)| Constraint::Length(width));

    let highlight = if table.is_focused() {
        Style::default().fg(SELECTED_FG).bg(SELECTED_BG)
    } else {
        Style::default().fg(SELECTED_FG).bg(BORDER)
    };

    let title = release_title(session);
    let widget = Table::new(rows, widths)
        .header(header)
        .block(bordered(&title))
        .row_highlight_style(highlight);

    let mut state = TableState::default();
    if !table.is_empty() {
        state.select(Some(table.cursor()));
    }
    frame.render_stateful_widget(widget, area, &mut state);
}

fn draw_transfers(frame: &mut Frame, transfers: &[Transfer], area: Rect) {
    let block = bordered(" Downloads ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let shown = &transfers[transfers.len().saturating_sub(MAX_TRANSFER_LINES)..];
    let lines = Layout::vertical(vec![Constraint::Length(1); shown.len()]).split(inner);
    for (transfer, line) in shown.iter().zip(lines.iter()) {
        draw_transfer(frame, transfer, *line);
    }
}

fn draw_transfer(frame: &mut Frame, transfer: &Transfer, area: Rect) {
    match &transfer.status {
        TransferStatus::InFlight => {
            let ratio = transfer.progress.and_then(|p| p.ratio()).unwrap_or(0.0);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(SELECTED_BG).bg(Color::Reset))
                .ratio(ratio)
                .label(Span::raw(progress_label(transfer)));
            frame.render_widget(gauge, area);
        }
        TransferStatus::Completed { path, bytes } => {
            let text = format!(
                "{}  {}  saved to {}",
                transfer.asset,
                human_readable_size(*bytes, 1024),
                path.display()
            );
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(Color::Green)),
                area,
            );
        }
        TransferStatus::Failed { message } => {
            frame.render_widget(
                Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
                area,
            );
        }
    }
}

/// Byte counters, percentage and elapsed time of an in-flight transfer.
pub fn progress_label(transfer: &Transfer) -> String {
    let Some(progress) = transfer.progress else {
        return format!("{}  starting…", transfer.asset);
    };

    let done = human_readable_size(progress.bytes, 1024);
    match (progress.total, progress.ratio()) {
        (Some(total), Some(ratio)) => format!(
            "{}  {done} / {}  {:.0}%  {}",
            transfer.asset,
            human_readable_size(total, 1024),
            ratio * 100.0,
            format_elapsed(progress.elapsed)
        ),
        _ => format!(
            "{}  {done}  {}",
            transfer.asset,
            format_elapsed(progress.elapsed)
        ),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
