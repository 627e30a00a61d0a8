use serde::{Deserialize, Serialize};

/// One row of the sales extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Four-digit order year, kept as text exactly as it appears in the key.
    pub year: String,
    pub region: String,
    /// Province or state within the region.
    pub state: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub customer_name: String,
    /// Units sold.
    pub quantity: u64,
    pub revenue: f64,
    /// May be negative for loss-making lines.
    pub profit: f64,
}

/// A dimensional attribute of a [`SalesRecord`] that rows can be grouped or
/// filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Region,
    State,
    Category,
    SubCategory,
    ProductName,
    CustomerName,
}

impl Dimension {
    /// All dimensions in composite-key order.
    pub const ALL: [Dimension; 7] = [
        Dimension::Year,
        Dimension::Region,
        Dimension::State,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::ProductName,
        Dimension::CustomerName,
    ];

    /// Borrow this dimension's value from `record`.
    pub fn value<'a>(&self, record: &'a SalesRecord) -> &'a str {
        match self {
            Dimension::Year => &record.year,
            Dimension::Region => &record.region,
            Dimension::State => &record.state,
            Dimension::Category => &record.category,
            Dimension::SubCategory => &record.sub_category,
            Dimension::ProductName => &record.product_name,
            Dimension::CustomerName => &record.customer_name,
        }
    }

    /// Column heading used in tables.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::Region => "Region",
            Dimension::State => "State",
            Dimension::Category => "Category",
            Dimension::SubCategory => "Sub-Category",
            Dimension::ProductName => "Product",
            Dimension::CustomerName => "Customer",
        }
    }
}

/// A numeric column subject to aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Quantity,
    Revenue,
    Profit,
}

impl Measure {
    /// Read this measure from a single record.
    pub fn value(&self, record: &SalesRecord) -> f64 {
        match self {
            Measure::Quantity => record.quantity as f64,
            Measure::Revenue => record.revenue,
            Measure::Profit => record.profit,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Measure::Quantity => "Quantity",
            Measure::Revenue => "Revenue",
            Measure::Profit => "Profit",
        }
    }
}

/// Summed measures accumulated across a group of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measures {
    pub quantity: u64,
    pub revenue: f64,
    pub profit: f64,
    /// Number of records folded into these totals.
    pub rows: u64,
}

impl Measures {
    /// Add a single record's measures to the running totals.
    pub fn add_record(&mut self, record: &SalesRecord) {
        self.quantity = self.quantity.saturating_add(record.quantity);
        self.revenue += record.revenue;
        self.profit += record.profit;
        self.rows += 1;
    }

    /// Fold another set of totals into this one.
    pub fn merge(&mut self, other: &Measures) {
        self.quantity = self.quantity.saturating_add(other.quantity);
        self.revenue += other.revenue;
        self.profit += other.profit;
        self.rows += other.rows;
    }

    /// Read one measure as a float for ranking and ratios.
    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Quantity => self.quantity as f64,
            Measure::Revenue => self.revenue,
            Measure::Profit => self.profit,
        }
    }
}

/// The full, ordered collection of records loaded at startup.
///
/// Never mutated after construction; views borrow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SalesRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every measure across the whole dataset.
    pub fn totals(&self) -> Measures {
        let mut totals = Measures::default();
        for record in &self.records {
            totals.add_record(record);
        }
        totals
    }
}

impl FromIterator<SalesRecord> for Dataset {
    fn from_iter<I: IntoIterator<Item = SalesRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a SalesRecord;
    type IntoIter = std::slice::Iter<'a, SalesRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// The six canned analyses the dashboard can show.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    /// Best-selling category / sub-category pairs by quantity.
    TopCategories,
    /// Profit per region, then per state inside the best region.
    RegionalProfit,
    /// Most profitable products and their share of total profit.
    TopProducts,
    /// Revenue per category in every region and each region's leader.
    CategoryPopularity,
    /// Customers contributing the most revenue.
    TopCustomers,
    /// Year-over-year revenue comparison with category mix.
    RevenueTrend,
}

impl View {
    /// Navigation order.
    pub const ALL: [View; 6] = [
        View::TopCategories,
        View::RegionalProfit,
        View::TopProducts,
        View::CategoryPopularity,
        View::TopCustomers,
        View::RevenueTrend,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::TopCategories => "Top Categories & Sub-Categories",
            View::RegionalProfit => "Regional & Provincial Profit",
            View::TopProducts => "Top Most Profitable Products",
            View::CategoryPopularity => "Category Popularity Across Regions",
            View::TopCustomers => "Top Customers by Revenue Contribution",
            View::RevenueTrend => "Revenue Trend",
        }
    }

    /// Stable identifier matching the CLI spelling.
    pub fn slug(&self) -> &'static str {
        match self {
            View::TopCategories => "top-categories",
            View::RegionalProfit => "regional-profit",
            View::TopProducts => "top-products",
            View::CategoryPopularity => "category-popularity",
            View::TopCustomers => "top-customers",
            View::RevenueTrend => "revenue-trend",
        }
    }

    /// Zero-based position in [`View::ALL`].
    pub fn index(&self) -> usize {
        View::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    /// The following view, wrapping around.
    pub fn next(&self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    /// The preceding view, wrapping around.
    pub fn previous(&self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}
