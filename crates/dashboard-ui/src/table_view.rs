//! Tabular panels for the dashboard.
//!
//! Renders a bordered [`ratatui::widgets::Table`] with one row per entry and
//! an optional highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::themes::Theme;

/// Column alignment hint; numeric columns are right-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Numeric,
}

/// A fully formatted table ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub title: String,
    pub headers: Vec<String>,
    pub kinds: Vec<ColumnKind>,
    pub rows: Vec<Vec<String>>,
    /// Optional totals row, styled separately.
    pub total: Option<Vec<String>>,
}

impl TableData {
    pub fn new(title: impl Into<String>, columns: &[(&str, ColumnKind)]) -> Self {
        Self {
            title: title.into(),
            headers: columns.iter().map(|(h, _)| h.to_string()).collect(),
            kinds: columns.iter().map(|(_, k)| *k).collect(),
            rows: Vec::new(),
            total: None,
        }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn with_total(mut self, total: Vec<String>) -> Self {
        self.total = Some(total);
        self
    }

    /// Width each column needs: the widest of its header and cells.
    pub fn column_widths(&self) -> Vec<u16> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in self.rows.iter().chain(self.total.iter()) {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }
        widths.into_iter().map(|w| w.min(u16::MAX as usize) as u16).collect()
    }
}

/// Right-pad or left-pad `text` to `width` for numeric alignment.
fn align(text: &str, width: u16, kind: ColumnKind) -> String {
    match kind {
        ColumnKind::Numeric => format!("{:>width$}", text, width = width as usize),
        ColumnKind::Text => text.to_string(),
    }
}

/// Render `data` into `area`.
pub fn render_table_view(frame: &mut Frame, area: Rect, data: &TableData, theme: &Theme) {
    let widths = data.column_widths();
    let kind_of = |i: usize| data.kinds.get(i).copied().unwrap_or(ColumnKind::Text);
    let width_of = |i: usize| widths.get(i).copied().unwrap_or(0);

    let header_cells = data
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| Cell::from(align(h, width_of(i), kind_of(i))).style(theme.table_header));
    let header = Row::new(header_cells).height(1);

    let data_rows: Vec<Row> = data
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(
                row.iter()
                    .enumerate()
                    .map(|(c, cell)| Cell::from(align(cell, width_of(c), kind_of(c)))),
            )
            .style(style)
        })
        .collect();

    let mut all_rows = data_rows;
    if let Some(total) = &data.total {
        all_rows.push(
            Row::new(
                total
                    .iter()
                    .enumerate()
                    .map(|(c, cell)| Cell::from(align(cell, width_of(c), kind_of(c)))),
            )
            .style(theme.table_total),
        );
    }

    let constraints: Vec<Constraint> = widths.iter().map(|w| Constraint::Length(*w)).collect();

    let table = Table::new(all_rows, constraints)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(Span::styled(format!(" {} ", data.title), theme.chart_title)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

/// Render a placeholder when a view has nothing to show.
pub fn render_no_data(frame: &mut Frame, area: Rect, title: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No sales data in scope", theme.warning)),
        Line::from(""),
        Line::from(Span::styled(
            "Check the extract path and the rejected line count in the header.",
            theme.dim,
        )),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        ),
        area,
    );
}

/// Render a view that could not be computed.
pub fn render_error(frame: &mut Frame, area: Rect, title: &str, message: &str, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), theme.error)),
    ];
    frame.render_widget(
        Paragraph::new(ratatui::text::Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
