//! Turns a computed [`ViewReport`] into the charts, tables and headline
//! figures the dashboard draws for it.
//!
//! Everything here is pure so the layout of each view can be tested without
//! a terminal.

use std::cmp::Ordering;

use dashboard_core::formatting::{
    format_amount, format_optional_percent, format_percent, format_quantity,
};
use dashboard_core::models::{Measure, Measures};
use dashboard_data::aggregator::Group;
use dashboard_data::views::{
    CategoryPopularityReport, RegionalProfitReport, RevenueTrendReport, TopCategoriesReport,
    TopCustomersReport, TopProductsReport, ViewReport,
};

use crate::chart_view::{BarPoint, BarSeries, GroupedSeries};
use crate::table_view::{ColumnKind, TableData};

/// Tone of a headline figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Positive,
    Negative,
    Warning,
}

/// A single headline figure, e.g. a contribution percentage.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
    pub tone: Tone,
    pub caption: Option<String>,
}

/// One drawable block of a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Bars(BarSeries),
    Grouped(GroupedSeries),
    Table(TableData),
    Metric(Metric),
    /// Panels laid out side by side.
    Columns(Vec<Panel>),
}

impl Panel {
    /// Fixed height for compact panels, `None` for panels that share the
    /// remaining space.
    pub fn fixed_height(&self) -> Option<u16> {
        match self {
            Panel::Metric(m) => Some(if m.caption.is_some() { 5 } else { 4 }),
            _ => None,
        }
    }
}

/// Build the panels for a computed view.
pub fn build_panels(report: &ViewReport) -> Vec<Panel> {
    match report {
        ViewReport::TopCategories(r) => top_categories_panels(r),
        ViewReport::RegionalProfit(r) => regional_profit_panels(r),
        ViewReport::TopProducts(r) => top_products_panels(r),
        ViewReport::CategoryPopularity(r) => category_popularity_panels(r),
        ViewReport::TopCustomers(r) => top_customers_panels(r),
        ViewReport::RevenueTrend(r) => revenue_trend_panels(r),
    }
}

fn series(title: String, groups: &[Group], measure: Measure) -> BarSeries {
    BarSeries {
        title,
        points: groups
            .iter()
            .map(|g| BarPoint {
                label: g.label(),
                value: g.value(measure),
            })
            .collect(),
        decimals: if measure == Measure::Quantity { 0 } else { 2 },
    }
}

fn top_categories_panels(r: &TopCategoriesReport) -> Vec<Panel> {
    let mut table = TableData::new(
        "Summary",
        &[
            ("Category", ColumnKind::Text),
            ("Sub-Category", ColumnKind::Text),
            (Measure::Quantity.label(), ColumnKind::Numeric),
            (Measure::Revenue.label(), ColumnKind::Numeric),
        ],
    );
    for g in &r.rows {
        table.push_row(vec![
            g.key_part(0).to_string(),
            g.key_part(1).to_string(),
            format_quantity(g.totals.quantity),
            format_amount(g.totals.revenue),
        ]);
    }

    vec![
        Panel::Columns(vec![
            Panel::Bars(series(
                format!("Top {} Category | Sub-Category by Quantity", r.limit),
                &r.rows,
                Measure::Quantity,
            )),
            Panel::Bars(series(
                format!("Revenue of Top {} Category | Sub-Category", r.limit),
                &r.rows,
                Measure::Revenue,
            )),
        ]),
        Panel::Table(table),
    ]
}

fn profit_table(title: String, heading: &str, groups: &[Group]) -> TableData {
    let mut table = TableData::new(
        title,
        &[(heading, ColumnKind::Text), ("Total Profit", ColumnKind::Numeric)],
    );
    for g in groups {
        table.push_row(vec![g.label(), format_amount(g.totals.profit)]);
    }
    table
}

fn regional_profit_panels(r: &RegionalProfitReport) -> Vec<Panel> {
    let left = vec![
        Panel::Bars(series(
            "Total Profit per Region".to_string(),
            &r.regions,
            Measure::Profit,
        )),
        Panel::Table(profit_table(
            "Regions".to_string(),
            "Region",
            &r.regions,
        )),
    ];
    let right = vec![
        Panel::Bars(series(
            format!("Total Profit per State in {}", r.top_region),
            &r.states,
            Measure::Profit,
        )),
        Panel::Table(profit_table(
            format!("States in {}", r.top_region),
            "State",
            &r.states,
        )),
    ];

    vec![
        Panel::Metric(Metric {
            label: "Most profitable region".to_string(),
            value: r.top_region.clone(),
            tone: Tone::Positive,
            caption: None,
        }),
        Panel::Columns(vec![Panel::Columns(left), Panel::Columns(right)]),
    ]
}

fn contribution_metric(label: String, pct: Option<f64>, caption: &str) -> Metric {
    Metric {
        label,
        value: format_optional_percent(pct),
        tone: if pct.is_some() {
            Tone::Neutral
        } else {
            Tone::Warning
        },
        caption: Some(caption.to_string()),
    }
}

fn top_products_panels(r: &TopProductsReport) -> Vec<Panel> {
    let mut table = TableData::new(
        "Profit & Quantity Detail",
        &[
            ("Product", ColumnKind::Text),
            ("Total Profit", ColumnKind::Numeric),
            ("Total Quantity", ColumnKind::Numeric),
        ],
    );
    for g in &r.products {
        table.push_row(vec![
            g.label(),
            format_amount(g.totals.profit),
            format_quantity(g.totals.quantity),
        ]);
    }
    let totals = r.products.iter().fold(Measures::default(), |mut acc, g| {
        acc.merge(&g.totals);
        acc
    });
    let table = table.with_total(vec![
        "TOTAL".to_string(),
        format_amount(r.top_profit),
        format_quantity(totals.quantity),
    ]);

    vec![
        Panel::Metric(contribution_metric(
            format!("Top {} products' share of total profit", r.limit),
            r.contribution_pct,
            "Profit concentrated in a few products signals both margin \
             opportunities and dependency risk.",
        )),
        Panel::Bars(series(
            "Total Profit per Product".to_string(),
            &r.products,
            Measure::Profit,
        )),
        Panel::Table(table),
    ]
}

fn category_popularity_panels(r: &CategoryPopularityReport) -> Vec<Panel> {
    let pivot = &r.pivot;
    let grouped = GroupedSeries {
        title: "Category Revenue Distribution per Region".to_string(),
        group_labels: pivot.row_labels.clone(),
        series_labels: pivot.column_labels.clone(),
        values: pivot.values.clone(),
    };

    // Region ascending, then revenue descending within a region.
    let mut cells: Vec<&Group> = r.breakdown.iter().collect();
    cells.sort_by(|a, b| {
        a.key_part(0).cmp(b.key_part(0)).then_with(|| {
            b.totals
                .revenue
                .partial_cmp(&a.totals.revenue)
                .unwrap_or(Ordering::Equal)
        })
    });
    let mut breakdown = TableData::new(
        "Category Revenue per Region",
        &[
            ("Region", ColumnKind::Text),
            ("Category", ColumnKind::Text),
            (Measure::Revenue.label(), ColumnKind::Numeric),
        ],
    );
    for g in cells {
        breakdown.push_row(vec![
            g.key_part(0).to_string(),
            g.key_part(1).to_string(),
            format_amount(g.totals.revenue),
        ]);
    }

    let mut leaders = TableData::new(
        "Most Popular Category per Region",
        &[
            ("Region", ColumnKind::Text),
            ("Category", ColumnKind::Text),
            (Measure::Revenue.label(), ColumnKind::Numeric),
        ],
    );
    for g in &r.leaders {
        leaders.push_row(vec![
            g.key_part(0).to_string(),
            g.key_part(1).to_string(),
            format_amount(g.totals.revenue),
        ]);
    }

    vec![
        Panel::Grouped(grouped),
        Panel::Columns(vec![
            Panel::Table(breakdown),
            Panel::Bars(series(
                "Leading Region | Category".to_string(),
                &r.leaders,
                Measure::Revenue,
            )),
            Panel::Table(leaders),
        ]),
    ]
}

fn top_customers_panels(r: &TopCustomersReport) -> Vec<Panel> {
    let mut table = TableData::new(
        "Customer Detail",
        &[
            ("Customer", ColumnKind::Text),
            (Measure::Revenue.label(), ColumnKind::Numeric),
            (Measure::Profit.label(), ColumnKind::Numeric),
            (Measure::Quantity.label(), ColumnKind::Numeric),
        ],
    );
    for g in &r.customers {
        table.push_row(vec![
            g.label(),
            format_amount(g.totals.revenue),
            format_amount(g.totals.profit),
            format_quantity(g.totals.quantity),
        ]);
    }

    vec![
        Panel::Metric(contribution_metric(
            format!("Top {} customers' share of total revenue", r.limit),
            r.contribution_pct,
            "A high share means revenue depends on a small customer base.",
        )),
        Panel::Bars(series(
            "Total Revenue per Customer".to_string(),
            &r.customers,
            Measure::Revenue,
        )),
        Panel::Table(table),
    ]
}

fn revenue_trend_panels(r: &RevenueTrendReport) -> Vec<Panel> {
    let growth = match (r.growth_pct, &r.growth_note) {
        (Some(pct), _) => Metric {
            label: format!("Revenue growth ({} → {})", r.baseline_year, r.compare_year),
            value: format_percent(pct),
            tone: if pct >= 0.0 {
                Tone::Positive
            } else {
                Tone::Negative
            },
            caption: None,
        },
        (None, note) => Metric {
            label: format!("Revenue growth ({} → {})", r.baseline_year, r.compare_year),
            value: "n/a".to_string(),
            tone: Tone::Warning,
            caption: note.clone(),
        },
    };

    let mut breakdown = TableData::new(
        "Revenue Breakdown per Category",
        &[
            ("Year", ColumnKind::Text),
            ("Category", ColumnKind::Text),
            (Measure::Revenue.label(), ColumnKind::Numeric),
        ],
    );
    for g in &r.breakdown {
        breakdown.push_row(vec![
            g.key_part(0).to_string(),
            g.key_part(1).to_string(),
            format_amount(g.totals.revenue),
        ]);
    }

    let mixes: Vec<Panel> = r
        .category_mix
        .iter()
        .map(|mix| {
            let mut table = TableData::new(
                format!("Category Mix {}", mix.year),
                &[
                    ("Category", ColumnKind::Text),
                    (Measure::Revenue.label(), ColumnKind::Numeric),
                    ("Share", ColumnKind::Numeric),
                ],
            );
            for share in &mix.shares {
                table.push_row(vec![
                    share.category.clone(),
                    format_amount(share.revenue),
                    format_optional_percent(share.share_pct),
                ]);
            }
            Panel::Table(table.with_total(vec![
                "TOTAL".to_string(),
                format_amount(mix.total_revenue),
                String::new(),
            ]))
        })
        .collect();

    let mut panels = vec![
        Panel::Metric(growth),
        Panel::Columns(vec![
            Panel::Bars(series(
                "Total Revenue per Year".to_string(),
                &r.years,
                Measure::Revenue,
            )),
            Panel::Table(breakdown),
        ]),
    ];
    if !mixes.is_empty() {
        panels.push(Panel::Columns(mixes));
    }
    panels
}

// ── Tests ──────────────────────────────────────────────────────────────────────
