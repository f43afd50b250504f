mod app;

use std::io;
use std::path::PathBuf;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};

use app::{format_listed_at, format_price, seat_summary, truncate, AppState, LoadStatus};
use ticket_monitor::config::Config;
use ticket_monitor::crawl::latest_dump;
use ticket_monitor::types::ListingStatus;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    let mut app = AppState::new(resolve_source(&cfg));
    app.load().await;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();
    table_state.select(None);

    let result = run_loop(&mut terminal, &mut app, &mut table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// VIEWER_FILE wins; otherwise the newest dump in the output directory.
fn resolve_source(cfg: &Config) -> Option<PathBuf> {
    cfg.viewer_file
        .clone()
        .or_else(|| latest_dump(&cfg.output_dir).ok().flatten())
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    table_state: &mut TableState,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| render(f, app, table_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('r') | KeyCode::Char('R') => app.load().await,
                KeyCode::Char('a') | KeyCode::Char('A') => {
                    app.toggle_available_only();
                    table_state.select(None);
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    let max = app.displayed().len().saturating_sub(1);
                    let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                    table_state.select(Some(next));
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    let prev = table_state.selected().map_or(0, |i| i.saturating_sub(1));
                    table_state.select(Some(prev));
                }
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &AppState, table_state: &mut TableState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(0),    // listings
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_listings(f, app, table_state, chunks[1]);
    render_footer(f, app, chunks[2]);
}

fn render_header(f: &mut Frame, app: &AppState, area: Rect) {
    let (status_text, status_color) = match &app.status {
        LoadStatus::Loaded => ("● loaded".to_string(), Color::Green),
        LoadStatus::Loading => ("◌ loading".to_string(), Color::Yellow),
        LoadStatus::Error(e) => (format!("✗ {}", truncate(e, 50)), Color::Red),
    };

    let source = app
        .source
        .as_ref()
        .and_then(|p| p.file_name())
        .map_or("—".to_string(), |n| n.to_string_lossy().into_owned());
    let summary = app.summary();

    let spans = vec![
        Span::styled(
            " Resale Listings  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
        Span::raw("  │  "),
        Span::styled(source, Style::default().fg(Color::DarkGray)),
        Span::raw("  │  "),
        Span::styled(
            format!("{}/{} available", summary.available, summary.listings),
            Style::default().fg(Color::White),
        ),
        Span::raw("  │  "),
        Span::styled(format!("{} tickets", summary.tickets), Style::default().fg(Color::White)),
        Span::raw("  │  "),
        Span::styled(
            format!("{} – {}", format_price(summary.min_price), format_price(summary.max_price)),
            Style::default().fg(Color::White),
        ),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_listings(f: &mut Frame, app: &AppState, state: &mut TableState, area: Rect) {
    let header_cells = ["#", "Seat", "Seats", "Price", "Qty", "Status", "Bid", "Schedule", "Listed"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .displayed()
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let status = l.status.as_ref().map_or("—".to_string(), |s| s.to_string());
            let status_color = match &l.status {
                Some(ListingStatus::Open) => Color::Green,
                Some(ListingStatus::SettlementComplete) => Color::DarkGray,
                Some(ListingStatus::Cancelled) => Color::Red,
                _ => Color::White,
            };
            let biddable = match l.is_biddable {
                Some(false) => "no",
                _ => "yes",
            };
            let row_style = if l.is_available() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            Row::new(vec![
                Cell::from(format!("{}", i + 1)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(truncate(l.seat_type_name(), 20)),
                Cell::from(truncate(&seat_summary(l), 18)),
                Cell::from(format_price(Some(l.price()))).style(Style::default().fg(Color::Cyan)),
                Cell::from(format!("x{}", l.quantity())),
                Cell::from(truncate(&status, 19)).style(Style::default().fg(status_color)),
                Cell::from(biddable),
                Cell::from(truncate(l.trade_schedule_name().unwrap_or("—"), 16)),
                Cell::from(format_listed_at(l.created_at.as_deref())),
            ])
            .style(row_style)
        })
        .collect();

    let title = if app.available_only {
        " LISTINGS (available only) "
    } else {
        " LISTINGS "
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(12),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Length(19),
            Constraint::Length(4),
            Constraint::Length(16),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(
                title,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, state);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let filter = if app.available_only { "all" } else { "available only" };
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("reload  "),
        Span::styled("[a] ", Style::default().fg(Color::Yellow)),
        Span::raw(format!("{filter}  ")),
        Span::styled("[↑↓ / j k] ", Style::default().fg(Color::Yellow)),
        Span::raw("scroll"),
    ]);
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}
