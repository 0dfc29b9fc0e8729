// Rendering
//
// Layout, top to bottom: title bar, record table, log pane, status bar.
// Overlays (help, bulk select) and the toast draw over everything else.

use super::app::App;
use super::modal::{Modal, RowCountInput};
use crate::logging::LogLevel;
use crate::source::Record;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LOG_PANE_HEIGHT: u16 = 6;

/// Draw one frame
pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(LOG_PANE_HEIGHT),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_title(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_logs(f, chunks[2], app);
    render_status(f, chunks[3], app);

    match &app.modal {
        Some(Modal::Help) => render_help(f, app),
        Some(Modal::BulkSelect(input)) => render_bulk_select(f, app, input),
        None => {}
    }

    if let Some(toast) = &app.toast {
        toast.render(f, f.area(), &app.theme);
    }
}

fn render_title(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let line = Line::from(vec![
        Span::styled(
            format!(" pagesel v{} ", crate::config::VERSION),
            Style::default()
                .fg(theme.highlight)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("│ source: {} ", app.controller.source_name()),
            Style::default().fg(theme.muted),
        ),
        Span::styled("│ ? help", Style::default().fg(theme.muted)),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.background)),
        area,
    );
}

/// Cut `text` to a single line at most `max` columns wide
fn fit(text: &str, max: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if flat.width() <= max {
        return flat;
    }
    let mut out = String::new();
    let mut width = 0;
    for c in flat.chars() {
        let w = c.width().unwrap_or(0);
        if width + w + 1 > max {
            break;
        }
        out.push(c);
        width += w;
    }
    out.push('…');
    out
}

fn record_row<'a>(record: &Record, selected: bool, app: &App) -> Row<'a> {
    let theme = &app.theme;
    let checkbox = if selected { "[x]" } else { "[ ]" };
    let check_style = if selected {
        Style::default().fg(theme.selected)
    } else {
        Style::default().fg(theme.muted)
    };
    let or_dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };

    Row::new(vec![
        Cell::from(checkbox).style(check_style),
        Cell::from(record.id.to_string()),
        Cell::from(fit(&record.title, 60)),
        Cell::from(fit(&record.place_of_origin, 24)),
        Cell::from(fit(&record.artist_display, 48)),
        Cell::from(fit(&or_dash(&record.inscriptions), 48)),
        Cell::from(record.date_start.to_string()),
        Cell::from(record.date_end.to_string()),
    ])
}

fn render_table(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let view = &app.view;

    let page_state = if view.records.is_empty() {
        "[ ]"
    } else if view.selected_on_page.len() == view.records.len() {
        "[x]"
    } else if view.selected_on_page.is_empty() {
        "[ ]"
    } else {
        "[-]"
    };

    let header = Row::new(vec![
        page_state,
        "ID",
        "Title",
        "Place",
        "Artist",
        "Inscriptions",
        "Start",
        "End",
    ])
    .style(
        Style::default()
            .fg(theme.highlight)
            .add_modifier(Modifier::BOLD),
    );

    let rows: Vec<Row> = view
        .records
        .iter()
        .map(|r| record_row(r, view.selected_on_page.contains(&r.id), app))
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(8),
        Constraint::Percentage(28),
        Constraint::Percentage(12),
        Constraint::Percentage(24),
        Constraint::Percentage(20),
        Constraint::Length(6),
        Constraint::Length(6),
    ];

    let title = match view.last_page {
        Some(last) => format!(" Records · page {}/{} ", view.current_page, last),
        None => " Records ".to_string(),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
        .title(title);

    if view.records.is_empty() {
        let message = if view.busy {
            format!("{} Loading…", app.spinner())
        } else {
            "No records".to_string()
        };
        f.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(theme.muted))
                .block(block),
            area,
        );
        return;
    }

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .style(Style::default().fg(theme.foreground))
        .row_highlight_style(Style::default().bg(theme.cursor_bg));

    let mut state = TableState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(table, area, &mut state);
}

fn render_logs(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let visible = area.height.saturating_sub(2) as usize;

    let lines: Vec<Line> = app
        .log_buffer
        .recent(visible)
        .into_iter()
        .map(|entry| {
            let level_style = match entry.level {
                LogLevel::Error => Style::default().fg(theme.error),
                LogLevel::Warn => Style::default().fg(theme.warning),
                _ => Style::default().fg(theme.muted),
            };
            Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S ").to_string(),
                    Style::default().fg(theme.muted),
                ),
                Span::styled(format!("{:<5} ", entry.level.as_str()), level_style),
                Span::styled(entry.message, Style::default().fg(theme.foreground)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border))
        .title(" Logs ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status(f: &mut Frame, area: Rect, app: &App) {
    let theme = &app.theme;
    let view = &app.view;

    let page = match view.last_page {
        Some(last) => format!("Page {}/{}", view.current_page, last),
        None => format!("Page {}", view.current_page),
    };
    let total = view
        .total_records
        .map(|t| format!("{} records", t))
        .unwrap_or_else(|| "? records".to_string());
    let busy = if view.busy {
        format!(" │ {} working", app.spinner())
    } else {
        String::new()
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} │ {} │ ", page, total),
            Style::default().fg(theme.status_bar),
        ),
        Span::styled(
            format!(
                "✓ {} selected ({} on page)",
                view.total_selected,
                view.selected_on_page.len()
            ),
            Style::default().fg(theme.selected),
        ),
        Span::styled(busy, Style::default().fg(theme.warning)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Create a centered rectangle of fixed size
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

fn modal_block<'a>(title: &'a str, app: &App) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight))
        .style(Style::default().bg(app.theme.background))
        .title(title)
}

fn render_help(f: &mut Frame, app: &App) {
    let key_style = Style::default().fg(app.theme.highlight);
    let desc_style = Style::default().fg(app.theme.foreground);

    let kb = |key: &str, desc: &str| -> Line {
        Line::from(vec![
            Span::raw("  "),
            Span::styled(format!("{:<12}", key), key_style),
            Span::styled(desc.to_string(), desc_style),
        ])
    };

    let lines = vec![
        kb("j/k ↑/↓", "Move cursor"),
        kb("space", "Toggle row"),
        kb("a", "Toggle all rows on page"),
        kb("l/n →", "Next page"),
        kb("h/p ←", "Previous page"),
        kb("Home/End", "First / last page"),
        kb("s", "Select first N rows"),
        kb("y", "Copy selected ids"),
        kb("?", "This help"),
        kb("q", "Quit"),
    ];

    let area = centered_rect(44, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(modal_block(" Keys ", app)),
        area,
    );
}

fn render_bulk_select(f: &mut Frame, app: &App, input: &RowCountInput) {
    let theme = &app.theme;

    let limit = match input.max {
        Some(max) => format!("1 to {}", max),
        None => "1 or more".to_string(),
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Rows to select ({}):", limit),
            Style::default().fg(theme.muted),
        )),
        Line::from(vec![
            Span::styled("> ", Style::default().fg(theme.highlight)),
            Span::styled(
                input.value.clone(),
                Style::default()
                    .fg(theme.foreground)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if input.pending { "" } else { "▏" },
                Style::default().fg(theme.highlight),
            ),
        ]),
        Line::default(),
    ];

    if input.pending {
        lines.push(Line::from(Span::styled(
            format!("{} Selecting…", app.spinner()),
            Style::default().fg(theme.warning),
        )));
    } else if let Some(error) = &input.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(theme.error),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            "enter: submit · ↑/↓: adjust · esc: close",
            Style::default().fg(theme.muted),
        )));
    }

    let area = centered_rect(46, lines.len() as u16 + 2, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(modal_block(" Select first N rows ", app)),
        area,
    );
}
