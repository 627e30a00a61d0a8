//! Main application state and TUI event loop for the sales dashboard.
//!
//! [`App`] owns the theme, the selected [`View`] and the report computed for
//! it. The loaded dataset is borrowed for the lifetime of the loop and never
//! copied.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tracing::{debug, info, warn};

use dashboard_core::models::{Dataset, View};
use dashboard_core::{DashboardError, Result};
use dashboard_data::reader::LoadReport;
use dashboard_data::views::{compute_view, ViewOptions, ViewReport};

use crate::chart_view;
use crate::components::header::Header;
use crate::components::sidebar::Sidebar;
use crate::panels::{build_panels, Metric, Panel, Tone};
use crate::table_view;
use crate::themes::Theme;

/// Width of the navigation sidebar.
const SIDEBAR_WIDTH: u16 = 40;

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the sales dashboard TUI.
pub struct App {
    pub theme: Theme,
    pub selected: View,
    pub options: ViewOptions,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    /// Report for `selected`, or the error message it failed with.
    current: Option<std::result::Result<ViewReport, String>>,
}

impl App {
    pub fn new(theme_name: &str, selected: View, options: ViewOptions) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            selected,
            options,
            should_quit: false,
            current: None,
        }
    }

    /// Change the selected view, discarding the previous report.
    pub fn select(&mut self, view: View) {
        if view != self.selected {
            debug!("Switching view {} -> {}", self.selected, view);
            self.selected = view;
            self.current = None;
        }
    }

    /// Apply one key press.
    ///
    /// Up/BackTab and Down/Tab cycle through the views, `1`–`6` jump to one,
    /// `q`, `Esc` and `Ctrl+C` quit.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => self.select(self.selected.next()),
            KeyCode::Up | KeyCode::BackTab | KeyCode::Char('k') => {
                self.select(self.selected.previous())
            }
            KeyCode::Char(d @ '1'..='9') => {
                let index = (d as usize) - ('1' as usize);
                if let Some(view) = View::ALL.get(index) {
                    self.select(*view);
                }
            }
            _ => {}
        }
    }

    /// Compute the selected view if it has not been computed yet.
    pub fn refresh(&mut self, dataset: &Dataset) {
        if self.current.is_some() {
            return;
        }
        let outcome = compute_view(self.selected, dataset, &self.options).map_err(|e| {
            warn!("View {} failed: {}", self.selected, e);
            e.to_string()
        });
        self.current = Some(outcome);
    }

    // ── Event loop ────────────────────────────────────────────────────────────

    /// Run the interactive dashboard until the user quits.
    ///
    /// Terminal events are polled with a 250 ms timeout; between polls the
    /// task yields so a Ctrl+C signal raced against it by the caller is
    /// observed.
    pub async fn run(mut self, dataset: &Dataset, load: &LoadReport) -> Result<()> {
        let mut terminal = TerminalGuard::enter().map_err(DashboardError::Terminal)?;
        info!("Dashboard started on view {}", self.selected);

        let tick_rate = Duration::from_millis(250);

        while !self.should_quit {
            self.refresh(dataset);
            terminal
                .0
                .draw(|frame| self.render(frame, load))
                .map_err(DashboardError::Terminal)?;

            if event::poll(tick_rate).map_err(DashboardError::Terminal)? {
                if let Event::Key(key) = event::read().map_err(DashboardError::Terminal)? {
                    self.handle_key(key);
                }
            }

            tokio::task::yield_now().await;
        }

        info!("Dashboard closed");
        Ok(())
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&self, frame: &mut Frame, load: &LoadReport) {
        let [header_area, body_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .areas(frame.area());

        frame.render_widget(
            Paragraph::new(Text::from(Header::new(load, &self.theme).to_lines())),
            header_area,
        );

        let [sidebar_area, main_area] = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
            .areas(body_area);

        Sidebar::new(self.selected, &self.theme).render(frame, sidebar_area);
        self.render_main(frame, main_area);

        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                "↑/↓ Tab: switch view  1-6: jump  q: quit",
                self.theme.dim,
            ))),
            footer_area,
        );
    }

    fn render_main(&self, frame: &mut Frame, area: Rect) {
        let title = self.selected.title();
        match &self.current {
            None => table_view::render_no_data(frame, area, title, &self.theme),
            Some(Err(message)) => table_view::render_error(frame, area, title, message, &self.theme),
            Some(Ok(report)) => {
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(self.theme.separator)
                    .title(Span::styled(format!(" {} ", title), self.theme.header));
                let inner = block.inner(area);
                frame.render_widget(block, area);
                render_panels(frame, inner, &build_panels(report), Direction::Vertical, &self.theme);
            }
        }
    }
}

// ── Panel layout ──────────────────────────────────────────────────────────────

fn render_panels(
    frame: &mut Frame,
    area: Rect,
    panels: &[Panel],
    direction: Direction,
    theme: &Theme,
) {
    if panels.is_empty() {
        return;
    }
    let constraints: Vec<Constraint> = panels
        .iter()
        .map(|p| match (direction, p.fixed_height()) {
            (Direction::Vertical, Some(h)) => Constraint::Length(h),
            _ => Constraint::Fill(1),
        })
        .collect();
    let areas = Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(area);

    for (panel, panel_area) in panels.iter().zip(areas.iter()) {
        render_panel(frame, *panel_area, panel, direction, theme);
    }
}

fn render_panel(frame: &mut Frame, area: Rect, panel: &Panel, parent: Direction, theme: &Theme) {
    match panel {
        Panel::Bars(series) => chart_view::render_bar_series(frame, area, series, theme),
        Panel::Grouped(grouped) => chart_view::render_grouped_series(frame, area, grouped, theme),
        Panel::Table(table) => table_view::render_table_view(frame, area, table, theme),
        Panel::Metric(metric) => render_metric(frame, area, metric, theme),
        Panel::Columns(children) => {
            // Alternate direction so nested columns stack vertically.
            let direction = match parent {
                Direction::Vertical => Direction::Horizontal,
                Direction::Horizontal => Direction::Vertical,
            };
            render_panels(frame, area, children, direction, theme);
        }
    }
}

fn render_metric(frame: &mut Frame, area: Rect, metric: &Metric, theme: &Theme) {
    let value_style = match metric.tone {
        Tone::Neutral => theme.value,
        Tone::Positive => theme.success,
        Tone::Negative => theme.error,
        Tone::Warning => theme.warning,
    };
    let mut lines = vec![
        Line::from(Span::styled(metric.label.clone(), theme.label)),
        Line::from(Span::styled(metric.value.clone(), value_style)),
    ];
    if let Some(caption) = &metric.caption {
        lines.push(Line::from(Span::styled(caption.clone(), theme.dim)));
    }
    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border),
            ),
        area,
    );
}

// ── Terminal guard ────────────────────────────────────────────────────────────

/// Raw-mode alternate-screen terminal, restored when dropped.
struct TerminalGuard(Terminal<CrosstermBackend<io::Stdout>>);

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        Ok(Self(Terminal::new(backend)?))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.0.backend_mut(), LeaveAlternateScreen);
        let _ = self.0.show_cursor();
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
