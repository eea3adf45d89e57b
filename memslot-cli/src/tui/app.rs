// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TUI Dashboard using ratatui.
//!
//! Shows the latest status report of each monitored service. Regions that
//! do not exist yet are retried on every refresh.

use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use memslot_core::{Config, Snapshot, ValueStore};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::commands::open_store;
use crate::messages::StatusReport;

/// One dashboard row.
struct ServicePanel {
    service: String,
    store: Option<ValueStore>,
    latest: Option<Snapshot<StatusReport>>,
    error: Option<String>,
}

impl ServicePanel {
    fn refresh(&mut self, config: &Config) {
        if self.store.is_none() {
            match config
                .channels
                .status_region(&self.service)
                .map_err(|e| e.to_string())
                .and_then(|region| {
                    open_store(config, region.as_str(), false).map_err(|e| e.to_string())
                }) {
                Ok(store) => self.store = Some(store),
                Err(e) => {
                    self.error = Some(e);
                    return;
                }
            }
        }

        if let Some(store) = &self.store {
            match store.snapshot::<StatusReport>() {
                Ok(snapshot) => {
                    self.latest = Some(snapshot);
                    self.error = None;
                }
                Err(e) => self.error = Some(e.to_string()),
            }
        }
    }
}

/// Dashboard state.
struct App {
    /// Whether to quit the application.
    should_quit: bool,
    /// Number of refreshes so far.
    tick: u64,
    panels: Vec<ServicePanel>,
}

impl App {
    fn new(services: &[String]) -> Self {
        Self {
            should_quit: false,
            tick: 0,
            panels: services
                .iter()
                .map(|service| ServicePanel {
                    service: service.clone(),
                    store: None,
                    latest: None,
                    error: None,
                })
                .collect(),
        }
    }

    fn tick(&mut self, config: &Config) {
        self.tick = self.tick.wrapping_add(1);
        for panel in &mut self.panels {
            panel.refresh(config);
        }
    }

    fn healthy_count(&self) -> usize {
        self.panels
            .iter()
            .filter(|p| p.latest.as_ref().is_some_and(|s| s.value.active))
            .count()
    }
}

/// Run the TUI dashboard until 'q' or Esc.
pub async fn run_dashboard(
    config: &Config,
    services: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut app = App::new(services);
    app.tick(config);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Main loop
    loop {
        terminal.draw(|frame| render(frame, &app))?;

        if event::poll(Duration::from_millis(200))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }

        app.tick(config);
    }

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    // Title
    let title = Paragraph::new(" MEMSLOT SERVICE MONITOR ")
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(title, main_layout[0]);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
        .split(main_layout[1]);

    // Service table
    let header = Row::new(vec![
        Cell::from("Service"),
        Cell::from("Seq"),
        Cell::from("State"),
        Cell::from("Mode"),
        Cell::from("Temp"),
        Cell::from("Uptime"),
    ])
    .style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Yellow),
    );

    let rows: Vec<Row> = app.panels.iter().map(service_row).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(10),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Services ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(table, content_layout[0]);

    // Summary
    let summary = vec![
        Line::from(vec![
            Span::raw("Services: "),
            Span::styled(
                app.panels.len().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Active:   "),
            Span::styled(
                app.healthy_count().to_string(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Refresh:  "),
            Span::styled(app.tick.to_string(), Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let summary_block =
        Paragraph::new(summary).block(Block::default().title(" Summary ").borders(Borders::ALL));
    frame.render_widget(summary_block, content_layout[1]);

    // Footer
    let footer = Paragraph::new(" Press 'q' to quit ")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, main_layout[2]);
}

fn service_row(panel: &ServicePanel) -> Row<'static> {
    match (&panel.latest, &panel.error) {
        (Some(snapshot), _) => {
            let status = &snapshot.value;
            let (state, color) = if status.active {
                ("ACTIVE", Color::Green)
            } else {
                ("INACTIVE", Color::Red)
            };
            Row::new(vec![
                Cell::from(panel.service.clone()),
                Cell::from(snapshot.sequence.to_string()),
                Cell::from(format!("{} ({})", state, status.health))
                    .style(Style::default().fg(color)),
                Cell::from(status.mode.clone()),
                Cell::from(format!("{:.1}°C", status.metrics.temperature)),
                Cell::from(format!("{}s", status.metrics.uptime_secs)),
            ])
        }
        (None, error) => Row::new(vec![
            Cell::from(panel.service.clone()),
            Cell::from("-"),
            Cell::from(error.clone().unwrap_or_else(|| "Waiting...".to_string())),
            Cell::from("-"),
            Cell::from("-"),
            Cell::from("-"),
        ])
        .style(Style::default().fg(Color::DarkGray)),
    }
}
