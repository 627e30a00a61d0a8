//! The canned analyses behind each dashboard screen.
//!
//! [`compute_view`] is the single entry point: it takes the selected
//! [`View`], the loaded [`Dataset`] and the tuning knobs in [`ViewOptions`],
//! and returns a self-contained [`ViewReport`] that the terminal UI renders
//! and the JSON export serializes. Nothing is cached between calls.

use dashboard_core::models::{Dataset, Dimension, Measure, View};
use dashboard_core::settings::Settings;
use dashboard_core::{DashboardError, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregator::{Group, PivotTable, SalesAggregator};

// ── Options ───────────────────────────────────────────────────────────────────

/// Limits and year selection shared by every view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewOptions {
    pub category_limit: usize,
    pub product_limit: usize,
    pub customer_limit: usize,
    pub baseline_year: String,
    pub compare_year: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            category_limit: 5,
            product_limit: 10,
            customer_limit: 10,
            baseline_year: "2023".to_string(),
            compare_year: "2024".to_string(),
        }
    }
}

impl From<&Settings> for ViewOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            category_limit: settings.category_limit as usize,
            product_limit: settings.product_limit as usize,
            customer_limit: settings.customer_limit as usize,
            baseline_year: settings.baseline_year.clone(),
            compare_year: settings.compare_year.clone(),
        }
    }
}

// ── Reports ───────────────────────────────────────────────────────────────────

/// Best-selling (Category, Sub-Category) pairs by quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCategoriesReport {
    pub limit: usize,
    /// Ranked pairs; each carries quantity and revenue totals.
    pub rows: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionalProfitReport {
    /// Every region, profit descending.
    pub regions: Vec<Group>,
    pub top_region: String,
    /// States inside `top_region`, profit descending.
    pub states: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopProductsReport {
    pub limit: usize,
    /// Top products with profit and quantity, profit descending.
    pub products: Vec<Group>,
    pub top_profit: f64,
    pub total_profit: f64,
    /// Share of total profit held by `products`; `None` when the dataset
    /// total is not positive.
    pub contribution_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPopularityReport {
    /// Revenue by region (rows) and category (columns).
    pub pivot: PivotTable,
    /// Every observed (Region, Category) group, first-seen order.
    pub breakdown: Vec<Group>,
    /// Highest-revenue category in each region, regions in first-seen order.
    pub leaders: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCustomersReport {
    pub limit: usize,
    pub customers: Vec<Group>,
    pub top_revenue: f64,
    pub total_revenue: f64,
    pub contribution_pct: Option<f64>,
}

/// One category's slice of a year's revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub revenue: f64,
    pub share_pct: Option<f64>,
}

/// Category composition of one year's revenue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearMix {
    pub year: String,
    pub total_revenue: f64,
    pub shares: Vec<CategoryShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueTrendReport {
    pub baseline_year: String,
    pub compare_year: String,
    /// Revenue per year present in the data, ascending by year.
    pub years: Vec<Group>,
    pub growth_pct: Option<f64>,
    /// Why `growth_pct` is absent, when it is.
    pub growth_note: Option<String>,
    /// Revenue per (Year, Category), ascending by year.
    pub breakdown: Vec<Group>,
    pub category_mix: Vec<YearMix>,
}

impl RevenueTrendReport {
    pub fn revenue_for(&self, year: &str) -> Option<f64> {
        self.years
            .iter()
            .find(|g| g.key_part(0) == year)
            .map(|g| g.value(Measure::Revenue))
    }
}

/// The output of any view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "kebab-case")]
pub enum ViewReport {
    TopCategories(TopCategoriesReport),
    RegionalProfit(RegionalProfitReport),
    TopProducts(TopProductsReport),
    CategoryPopularity(CategoryPopularityReport),
    TopCustomers(TopCustomersReport),
    RevenueTrend(RevenueTrendReport),
}

impl ViewReport {
    pub fn view(&self) -> View {
        match self {
            ViewReport::TopCategories(_) => View::TopCategories,
            ViewReport::RegionalProfit(_) => View::RegionalProfit,
            ViewReport::TopProducts(_) => View::TopProducts,
            ViewReport::CategoryPopularity(_) => View::CategoryPopularity,
            ViewReport::TopCustomers(_) => View::TopCustomers,
            ViewReport::RevenueTrend(_) => View::RevenueTrend,
        }
    }
}

// ── Dispatch ──────────────────────────────────────────────────────────────────

/// Run the analysis behind `view` against `dataset`.
pub fn compute_view(view: View, dataset: &Dataset, options: &ViewOptions) -> Result<ViewReport> {
    debug!("Computing view {} over {} records", view, dataset.len());
    let report = match view {
        View::TopCategories => ViewReport::TopCategories(top_categories(dataset, options)),
        View::RegionalProfit => ViewReport::RegionalProfit(regional_profit(dataset)?),
        View::TopProducts => ViewReport::TopProducts(top_products(dataset, options)),
        View::CategoryPopularity => {
            ViewReport::CategoryPopularity(category_popularity(dataset)?)
        }
        View::TopCustomers => ViewReport::TopCustomers(top_customers(dataset, options)),
        View::RevenueTrend => ViewReport::RevenueTrend(revenue_trend(dataset, options)),
    };
    Ok(report)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

pub fn top_categories(dataset: &Dataset, options: &ViewOptions) -> TopCategoriesReport {
    let table = SalesAggregator::group_sum(dataset, &[Dimension::Category, Dimension::SubCategory]);
    let rows = SalesAggregator::sort_and_limit(
        &table,
        Measure::Quantity,
        true,
        Some(options.category_limit),
    );
    TopCategoriesReport {
        limit: options.category_limit,
        rows,
    }
}

pub fn regional_profit(dataset: &Dataset) -> Result<RegionalProfitReport> {
    let by_region = SalesAggregator::group_sum(dataset, &[Dimension::Region]);
    let regions = SalesAggregator::sort_and_limit(&by_region, Measure::Profit, true, None);

    let top_region = regions
        .first()
        .map(|g| g.key_part(0).to_string())
        .ok_or_else(|| DashboardError::EmptyScope("regional profit".to_string()))?;

    let in_region = SalesAggregator::filter_by_set(dataset, Dimension::Region, &[&top_region]);
    let by_state = SalesAggregator::group_sum(in_region, &[Dimension::State]);
    let states = SalesAggregator::sort_and_limit(&by_state, Measure::Profit, true, None);

    Ok(RegionalProfitReport {
        regions,
        top_region,
        states,
    })
}

pub fn top_products(dataset: &Dataset, options: &ViewOptions) -> TopProductsReport {
    let by_product = SalesAggregator::group_sum(dataset, &[Dimension::ProductName]);
    let ranked = SalesAggregator::sort_and_limit(
        &by_product,
        Measure::Profit,
        true,
        Some(options.product_limit),
    );
    let names: Vec<&str> = ranked.iter().map(|g| g.key_part(0)).collect();

    // Re-aggregate the selected products so the detail table is built from
    // the rows themselves rather than the ranking.
    let selected = SalesAggregator::filter_by_set(dataset, Dimension::ProductName, names.as_slice());
    let detail = SalesAggregator::group_sum(selected, &[Dimension::ProductName]);
    let products = SalesAggregator::sort_and_limit(&detail, Measure::Profit, true, None);

    let top_profit = SalesAggregator::sum_groups(&ranked, Measure::Profit);
    let total_profit = dataset.totals().profit;
    let contribution_pct = share_or_warn(top_profit, total_profit, "top products profit");

    TopProductsReport {
        limit: options.product_limit,
        products,
        top_profit,
        total_profit,
        contribution_pct,
    }
}

pub fn category_popularity(dataset: &Dataset) -> Result<CategoryPopularityReport> {
    let pivot = SalesAggregator::pivot_by_pair(
        dataset,
        Dimension::Region,
        Dimension::Category,
        Measure::Revenue,
    );
    let by_pair = SalesAggregator::group_sum(dataset, &[Dimension::Region, Dimension::Category]);
    let leaders = SalesAggregator::top_per_group(&by_pair, Measure::Revenue)?;

    Ok(CategoryPopularityReport {
        pivot,
        breakdown: by_pair.groups().to_vec(),
        leaders,
    })
}

pub fn top_customers(dataset: &Dataset, options: &ViewOptions) -> TopCustomersReport {
    let by_customer = SalesAggregator::group_sum(dataset, &[Dimension::CustomerName]);
    let customers = SalesAggregator::sort_and_limit(
        &by_customer,
        Measure::Revenue,
        true,
        Some(options.customer_limit),
    );

    let top_revenue = SalesAggregator::sum_groups(&customers, Measure::Revenue);
    let total_revenue = dataset.totals().revenue;
    let contribution_pct = share_or_warn(top_revenue, total_revenue, "top customers revenue");

    TopCustomersReport {
        limit: options.customer_limit,
        customers,
        top_revenue,
        total_revenue,
        contribution_pct,
    }
}

pub fn revenue_trend(dataset: &Dataset, options: &ViewOptions) -> RevenueTrendReport {
    let wanted = [options.baseline_year.as_str(), options.compare_year.as_str()];
    let in_scope = SalesAggregator::filter_by_set(dataset, Dimension::Year, &wanted);

    let by_year = SalesAggregator::group_sum(in_scope.iter().copied(), &[Dimension::Year]);
    let mut years = by_year.groups().to_vec();
    years.sort_by(|a, b| a.key_part(0).cmp(b.key_part(0)));

    let (growth_pct, growth_note) = match year_growth(&years, options) {
        Ok(growth) => (Some(growth), None),
        Err(e) => {
            warn!("Revenue growth unavailable: {}", e);
            (None, Some(e.to_string()))
        }
    };

    let by_pair = SalesAggregator::group_sum(
        in_scope.iter().copied(),
        &[Dimension::Year, Dimension::Category],
    );
    let mut breakdown = by_pair.groups().to_vec();
    breakdown.sort_by(|a, b| a.key_part(0).cmp(b.key_part(0)));

    let category_mix = years
        .iter()
        .map(|year| {
            let label = year.key_part(0);
            let total_revenue = year.value(Measure::Revenue);
            let shares = breakdown
                .iter()
                .filter(|g| g.key_part(0) == label)
                .map(|g| CategoryShare {
                    category: g.key_part(1).to_string(),
                    revenue: g.value(Measure::Revenue),
                    share_pct: SalesAggregator::ratio_to_total(
                        g.value(Measure::Revenue),
                        total_revenue,
                    )
                    .ok(),
                })
                .collect();
            YearMix {
                year: label.to_string(),
                total_revenue,
                shares,
            }
        })
        .collect();

    RevenueTrendReport {
        baseline_year: options.baseline_year.clone(),
        compare_year: options.compare_year.clone(),
        years,
        growth_pct,
        growth_note,
        breakdown,
        category_mix,
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn year_growth(years: &[Group], options: &ViewOptions) -> Result<f64> {
    let revenue_of = |label: &str| {
        years
            .iter()
            .find(|g| g.key_part(0) == label)
            .map(|g| g.value(Measure::Revenue))
            .ok_or_else(|| DashboardError::MissingGroup(format!("year {label}")))
    };
    let baseline = revenue_of(options.baseline_year.as_str())?;
    let current = revenue_of(options.compare_year.as_str())?;
    SalesAggregator::growth_percentage(&options.baseline_year, baseline, current)
}

fn share_or_warn(subset: f64, total: f64, what: &str) -> Option<f64> {
    match SalesAggregator::ratio_to_total(subset, total) {
        Ok(pct) => Some(pct),
        Err(e) => {
            warn!("Share of {} unavailable: {}", what, e);
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_core::models::SalesRecord;

    #[allow(clippy::too_many_arguments)]
    fn rec(
        year: &str,
        region: &str,
        state: &str,
        category: &str,
        sub: &str,
        product: &str,
        customer: &str,
        qty: u64,
        revenue: f64,
        profit: f64,
    ) -> SalesRecord {
        SalesRecord {
            year: year.to_string(),
            region: region.to_string(),
            state: state.to_string(),
            category: category.to_string(),
            sub_category: sub.to_string(),
            product_name: product.to_string(),
            customer_name: customer.to_string(),
            quantity: qty,
            revenue,
            profit,
        }
    }

    fn dataset() -> Dataset {
        Dataset::new(vec![
            rec("2023", "East", "NY", "Electronics", "Phones", "PhoneX", "Alice", 10, 1000.0, 100.0),
            rec("2023", "East", "NY", "Electronics", "Phones", "PhoneX", "Bob", 5, 500.0, 50.0),
            rec("2023", "West", "CA", "Furniture", "Desks", "Desk", "Carol", 2, 400.0, -30.0),
            rec("2024", "East", "NJ", "Furniture", "Chairs", "Chair", "Alice", 7, 350.0, 70.0),
            rec("2024", "South", "TX", "Office", "Pens", "Pen", "Dan", 40, 80.0, 20.0),
            rec("2024", "East", "NJ", "Electronics", "Tablets", "TabY", "Bob", 3, 900.0, 90.0),
        ])
    }

    #[test]
    fn test_top_categories_ranked_by_quantity() {
        let report = top_categories(&dataset(), &ViewOptions::default());
        let labels: Vec<String> = report.rows.iter().map(Group::label).collect();
        assert_eq!(
            labels,
            vec![
                "Office | Pens",
                "Electronics | Phones",
                "Furniture | Chairs",
                "Electronics | Tablets",
                "Furniture | Desks",
            ]
        );
        assert_eq!(report.rows[1].totals.quantity, 15);
        assert!((report.rows[1].totals.revenue - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_categories_respects_limit() {
        let options = ViewOptions {
            category_limit: 2,
            ..ViewOptions::default()
        };
        let report = top_categories(&dataset(), &options);
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.limit, 2);
    }

    #[test]
    fn test_regional_profit_drills_into_best_region() {
        let report = regional_profit(&dataset()).unwrap();
        assert_eq!(report.top_region, "East");
        let regions: Vec<&str> = report.regions.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(regions, vec!["East", "South", "West"]);

        let states: Vec<&str> = report.states.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(states, vec!["NJ", "NY"]);
        assert!((report.states[0].totals.profit - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_regional_profit_empty_dataset() {
        let err = regional_profit(&Dataset::default()).unwrap_err();
        assert!(matches!(err, DashboardError::EmptyScope(_)));
    }

    #[test]
    fn test_top_products_phonex_contribution() {
        let ds = Dataset::new(vec![
            rec("2023", "East", "NY", "Electronics", "Phones", "PhoneX", "Alice", 10, 1000.0, 100.0),
            rec("2023", "East", "NY", "Electronics", "Phones", "PhoneX", "Alice", 5, 500.0, 50.0),
        ]);
        let report = top_products(&ds, &ViewOptions::default());

        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].key_part(0), "PhoneX");
        assert_eq!(report.products[0].totals.profit, 150.0);
        assert_eq!(report.products[0].totals.quantity, 15);
        assert!((report.contribution_pct.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_products_partial_contribution() {
        let options = ViewOptions {
            product_limit: 2,
            ..ViewOptions::default()
        };
        let report = top_products(&dataset(), &options);
        let names: Vec<&str> = report.products.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(names, vec!["PhoneX", "TabY"]);
        assert!((report.top_profit - 240.0).abs() < 1e-9);
        assert!((report.total_profit - 300.0).abs() < 1e-9);
        assert!((report.contribution_pct.unwrap() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_products_non_positive_total_has_no_contribution() {
        let ds = Dataset::new(vec![rec(
            "2023", "East", "NY", "Furniture", "Desks", "Desk", "Carol", 1, 10.0, -5.0,
        )]);
        let report = top_products(&ds, &ViewOptions::default());
        assert_eq!(report.contribution_pct, None);
    }

    #[test]
    fn test_category_popularity_pivot_and_leaders() {
        let report = category_popularity(&dataset()).unwrap();
        assert_eq!(report.pivot.row_labels, vec!["East", "West", "South"]);
        assert_eq!(
            report.pivot.column_labels,
            vec!["Electronics", "Furniture", "Office"]
        );
        assert_eq!(report.pivot.cell_count(), 9);
        assert_eq!(report.pivot.get("East", "Electronics"), Some(2400.0));
        assert_eq!(report.pivot.get("South", "Electronics"), Some(0.0));

        let leaders: Vec<String> = report.leaders.iter().map(Group::label).collect();
        assert_eq!(
            leaders,
            vec!["East | Electronics", "West | Furniture", "South | Office"]
        );
        assert_eq!(report.breakdown.len(), 4);
    }

    #[test]
    fn test_category_popularity_breakdown_keeps_observed_zero_revenue_groups() {
        let ds = Dataset::new(vec![
            rec("2023", "East", "NY", "Electronics", "Phones", "PhoneX", "Alice", 1, 100.0, 10.0),
            rec("2023", "West", "CA", "Furniture", "Desks", "Desk", "Bob", 1, 50.0, 5.0),
            rec("2023", "West", "CA", "Electronics", "Phones", "PhoneX", "Carol", 1, 40.0, 4.0),
            rec("2023", "West", "CA", "Electronics", "Phones", "PhoneX", "Carol", 1, -40.0, -4.0),
        ]);
        let report = category_popularity(&ds).unwrap();

        let labels: Vec<String> = report.breakdown.iter().map(Group::label).collect();
        assert_eq!(
            labels,
            vec!["East | Electronics", "West | Furniture", "West | Electronics"]
        );
        assert_eq!(report.breakdown[2].totals.revenue, 0.0);
        assert_eq!(report.breakdown[2].totals.rows, 2);
        // East | Furniture is only a zero-filled pivot cell.
        assert_eq!(report.pivot.get("East", "Furniture"), Some(0.0));
    }

    #[test]
    fn test_top_customers_by_revenue() {
        let report = top_customers(&dataset(), &ViewOptions::default());
        let names: Vec<&str> = report.customers.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(names, vec!["Bob", "Alice", "Carol", "Dan"]);
        assert!((report.contribution_pct.unwrap() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_revenue_trend_growth_and_mix() {
        let report = revenue_trend(&dataset(), &ViewOptions::default());
        let years: Vec<&str> = report.years.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(years, vec!["2023", "2024"]);
        assert_eq!(report.revenue_for("2023"), Some(1900.0));
        assert_eq!(report.revenue_for("2024"), Some(1330.0));

        let growth = report.growth_pct.unwrap();
        assert!((growth - (-30.0)).abs() < 1e-9);
        assert!(report.growth_note.is_none());

        assert_eq!(report.category_mix.len(), 2);
        let mix_2024 = &report.category_mix[1];
        assert_eq!(mix_2024.year, "2024");
        let total: f64 = mix_2024.shares.iter().filter_map(|s| s.share_pct).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_revenue_trend_years_sorted_even_when_seen_out_of_order() {
        let ds = Dataset::new(vec![
            rec("2024", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 150.0, 1.0),
            rec("2023", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 100.0, 1.0),
            rec("2022", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 999.0, 1.0),
        ]);
        let report = revenue_trend(&ds, &ViewOptions::default());
        let years: Vec<&str> = report.years.iter().map(|g| g.key_part(0)).collect();
        assert_eq!(years, vec!["2023", "2024"]);
        assert_eq!(format!("{:.2}", report.growth_pct.unwrap()), "50.00");
        assert_eq!(report.breakdown[0].key_part(0), "2023");
    }

    #[test]
    fn test_revenue_trend_missing_year_omits_growth() {
        let ds = Dataset::new(vec![rec(
            "2023", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 100.0, 1.0,
        )]);
        let report = revenue_trend(&ds, &ViewOptions::default());
        assert_eq!(report.growth_pct, None);
        assert!(report.growth_note.unwrap().contains("2024"));
    }

    #[test]
    fn test_revenue_trend_zero_baseline_omits_growth() {
        let ds = Dataset::new(vec![
            rec("2023", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 0.0, 0.0),
            rec("2024", "East", "NY", "Office", "Pens", "Pen", "Dan", 1, 150.0, 1.0),
        ]);
        let report = revenue_trend(&ds, &ViewOptions::default());
        assert_eq!(report.growth_pct, None);
        assert_eq!(
            report.growth_note.as_deref(),
            Some("Baseline 2023 is zero; growth is undefined")
        );
        assert_eq!(report.category_mix[0].shares[0].share_pct, None);
    }

    #[test]
    fn test_compute_view_dispatch_matches_view() {
        let ds = dataset();
        let options = ViewOptions::default();
        for view in View::ALL {
            let report = compute_view(view, &ds, &options).unwrap();
            assert_eq!(report.view(), view);
        }
    }

    #[test]
    fn test_compute_view_on_empty_dataset() {
        let ds = Dataset::default();
        let options = ViewOptions::default();
        assert!(compute_view(View::TopCategories, &ds, &options).is_ok());
        assert!(compute_view(View::RegionalProfit, &ds, &options).is_err());
        assert!(compute_view(View::CategoryPopularity, &ds, &options).is_ok());
        assert!(compute_view(View::RevenueTrend, &ds, &options).is_ok());
    }

    #[test]
    fn test_view_report_serializes_with_tag() {
        let report = compute_view(View::TopCategories, &dataset(), &ViewOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["view"], "top-categories");
        assert_eq!(json["limit"], 5);
    }
}
