//! Bar charts for the dashboard: ranked single-series charts drawn
//! horizontally and grouped multi-series charts drawn vertically.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use dashboard_core::formatting;

use crate::themes::Theme;

/// Widest label shown next to a horizontal bar.
pub const MAX_LABEL_WIDTH: usize = 28;

/// One labelled value in a ranked chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BarPoint {
    pub label: String,
    pub value: f64,
}

/// A single ranked series.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub title: String,
    pub points: Vec<BarPoint>,
    /// Decimal places used for the value text.
    pub decimals: u32,
}

/// Several series (one per `series_labels` entry) laid out per group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedSeries {
    pub title: String,
    pub group_labels: Vec<String>,
    pub series_labels: Vec<String>,
    /// `values[group][series]`.
    pub values: Vec<Vec<f64>>,
}

/// Cut `text` to at most `max_width` terminal columns, marking the cut with
/// `…`.
pub fn truncate_label(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > max_width - 1 {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Bar lengths are integral; negative values are drawn as empty bars and
/// rely on the value text.
fn bar_height(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn chart_block<'a>(title: &str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(theme.table_border)
        .title(Span::styled(format!(" {} ", title), theme.chart_title))
}

/// Render a ranked series as horizontal bars, largest first as given.
pub fn render_bar_series(frame: &mut Frame, area: Rect, series: &BarSeries, theme: &Theme) {
    if series.points.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("No data", theme.dim)))
                .block(chart_block(&series.title, theme)),
            area,
        );
        return;
    }

    let label_width = series
        .points
        .iter()
        .map(|p| p.label.width())
        .max()
        .unwrap_or(0)
        .min(MAX_LABEL_WIDTH);

    let bars: Vec<Bar> = series
        .points
        .iter()
        .map(|p| {
            let label = format!(
                "{:<width$}",
                truncate_label(&p.label, label_width),
                width = label_width
            );
            Bar::default()
                .value(bar_height(p.value))
                .label(Line::from(label))
                .text_value(formatting::format_number(p.value, series.decimals))
                .style(theme.bar_style(p.value, 0))
                .value_style(theme.bar_value)
        })
        .collect();

    let chart = BarChart::default()
        .block(chart_block(&series.title, theme))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .label_style(theme.chart_axis)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

/// Render grouped vertical bars with a colour legend underneath.
pub fn render_grouped_series(frame: &mut Frame, area: Rect, grouped: &GroupedSeries, theme: &Theme) {
    if grouped.group_labels.is_empty() || grouped.series_labels.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("No data", theme.dim)))
                .block(chart_block(&grouped.title, theme)),
            area,
        );
        return;
    }

    let block = chart_block(&grouped.title, theme);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [chart_area, legend_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(legend_height(grouped, inner.width))])
        .areas(inner);

    let group_gap: u16 = 2;
    let bar_width = grouped_bar_width(
        chart_area.width,
        grouped.group_labels.len(),
        grouped.series_labels.len(),
        group_gap,
    );

    let mut chart = BarChart::default()
        .bar_width(bar_width)
        .bar_gap(0)
        .group_gap(group_gap)
        .label_style(theme.chart_axis)
        .value_style(theme.bar_value);

    for (g, label) in grouped.group_labels.iter().enumerate() {
        let bars: Vec<Bar> = grouped
            .series_labels
            .iter()
            .enumerate()
            .map(|(s, _)| {
                let value = grouped
                    .values
                    .get(g)
                    .and_then(|row| row.get(s))
                    .copied()
                    .unwrap_or(0.0);
                Bar::default()
                    .value(bar_height(value))
                    .text_value(String::new())
                    .style(Style::default().fg(theme.series_color(s)))
            })
            .collect();
        let group_label = truncate_label(label, group_width(bar_width, grouped.series_labels.len()));
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(group_label))
                .bars(&bars),
        );
    }

    frame.render_widget(chart, chart_area);
    frame.render_widget(
        Paragraph::new(legend_line(grouped, theme)).wrap(Wrap { trim: true }),
        legend_area,
    );
}

/// Widest bar that still fits every group in `width` columns.
pub fn grouped_bar_width(width: u16, groups: usize, series: usize, group_gap: u16) -> u16 {
    if groups == 0 || series == 0 {
        return 1;
    }
    let per_group = (width as usize / groups).saturating_sub(group_gap as usize);
    (per_group / series).clamp(1, 8) as u16
}

fn group_width(bar_width: u16, series: usize) -> usize {
    (bar_width as usize * series).max(1)
}

fn legend_line<'a>(grouped: &GroupedSeries, theme: &Theme) -> Line<'a> {
    let mut spans = Vec::new();
    for (i, label) in grouped.series_labels.iter().enumerate() {
        spans.push(Span::styled("■ ", Style::default().fg(theme.series_color(i))));
        spans.push(Span::styled(format!("{}  ", label), theme.label));
    }
    Line::from(spans)
}

fn legend_height(grouped: &GroupedSeries, width: u16) -> u16 {
    let needed: usize = grouped
        .series_labels
        .iter()
        .map(|l| l.width() + 4)
        .sum();
    let width = (width as usize).max(1);
    needed.div_ceil(width).clamp(1, 3) as u16
}

// ── Tests ──────────────────────────────────────────────────────────────────────
