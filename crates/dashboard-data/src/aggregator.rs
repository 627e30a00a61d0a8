//! Group-by, ranking and ratio operations over sales records.
//!
//! Every operation is pure: it borrows records or a grouped result and
//! returns a fresh value. Groups keep the order in which their key was first
//! seen so that ranking ties resolve deterministically.

use std::collections::{HashMap, HashSet};

use dashboard_core::models::{Dimension, Measure, Measures, SalesRecord};
use dashboard_core::{DashboardError, Result};
use serde::Serialize;

// ── Group ─────────────────────────────────────────────────────────────────────

/// One distinct key tuple and the measures summed over its records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    /// Dimension values, in the order the table was grouped by.
    pub key: Vec<String>,
    pub totals: Measures,
}

impl Group {
    /// Key values joined with `" | "`, e.g. `"Electronics | Phones"`.
    pub fn label(&self) -> String {
        self.key.join(" | ")
    }

    /// The `i`-th key value, or `""` when the key is shorter.
    pub fn key_part(&self, i: usize) -> &str {
        self.key.get(i).map(String::as_str).unwrap_or("")
    }

    pub fn value(&self, measure: Measure) -> f64 {
        self.totals.get(measure)
    }
}

// ── GroupedTable ──────────────────────────────────────────────────────────────

/// Result of a group-sum: key tuple → summed measures, in first-seen order.
#[derive(Debug, Clone, Serialize)]
pub struct GroupedTable {
    pub dimensions: Vec<Dimension>,
    groups: Vec<Group>,
    #[serde(skip)]
    index: HashMap<Vec<String>, usize>,
}

impl GroupedTable {
    fn new(dimensions: &[Dimension]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
            groups: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add_record(&mut self, record: &SalesRecord) {
        let key: Vec<String> = self
            .dimensions
            .iter()
            .map(|d| d.value(record).to_string())
            .collect();

        let slot = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.groups.push(Group {
                    key: key.clone(),
                    totals: Measures::default(),
                });
                self.index.insert(key, self.groups.len() - 1);
                self.groups.len() - 1
            }
        };
        self.groups[slot].totals.add_record(record);
    }

    /// Groups in first-seen order.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up a group by its full key.
    pub fn get(&self, key: &[&str]) -> Option<&Group> {
        let owned: Vec<String> = key.iter().map(|k| k.to_string()).collect();
        self.index.get(&owned).map(|&i| &self.groups[i])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ── PivotTable ────────────────────────────────────────────────────────────────

/// Dense two-dimensional aggregate, zero-filled for unseen combinations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub row_dimension: Dimension,
    pub column_dimension: Dimension,
    pub measure: Measure,
    /// Distinct row values, first-seen order.
    pub row_labels: Vec<String>,
    /// Distinct column values, first-seen order.
    pub column_labels: Vec<String>,
    /// `values[row][column]`; always `row_labels.len()` × `column_labels.len()`.
    pub values: Vec<Vec<f64>>,
}

impl PivotTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.row_labels.iter().position(|l| l == row)?;
        let c = self.column_labels.iter().position(|l| l == column)?;
        Some(self.values[r][c])
    }

    /// Number of cells (rows × columns).
    pub fn cell_count(&self) -> usize {
        self.values.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.row_labels.is_empty()
    }
}

// ── SalesAggregator ───────────────────────────────────────────────────────────

/// Stateless helper holding the query operations the views compose.
pub struct SalesAggregator;

impl SalesAggregator {
    /// Sum every measure per distinct combination of `dimensions`.
    ///
    /// With no dimensions the result holds a single group with an empty key.
    pub fn group_sum<'a, I>(records: I, dimensions: &[Dimension]) -> GroupedTable
    where
        I: IntoIterator<Item = &'a SalesRecord>,
    {
        let mut table = GroupedTable::new(dimensions);
        for record in records {
            table.add_record(record);
        }
        table
    }

    /// Rank groups by `measure`, optionally keeping only the first `limit`.
    ///
    /// The sort is stable, so groups with equal values stay in first-seen
    /// order.
    pub fn sort_and_limit(
        table: &GroupedTable,
        measure: Measure,
        descending: bool,
        limit: Option<usize>,
    ) -> Vec<Group> {
        let mut ranked: Vec<Group> = table.groups().to_vec();
        ranked.sort_by(|a, b| {
            let ord = a.value(measure).total_cmp(&b.value(measure));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        if let Some(n) = limit {
            ranked.truncate(n);
        }
        ranked
    }

    /// `subset / total × 100`. The total must be strictly positive.
    pub fn ratio_to_total(subset: f64, total: f64) -> Result<f64> {
        if total.is_nan() || total <= 0.0 {
            return Err(DashboardError::NonPositiveTotal(total));
        }
        Ok(subset / total * 100.0)
    }

    /// `(current − baseline) / baseline × 100`. A zero baseline is an error
    /// naming `baseline_label`.
    pub fn growth_percentage(baseline_label: &str, baseline: f64, current: f64) -> Result<f64> {
        if baseline == 0.0 {
            return Err(DashboardError::ZeroBaseline(baseline_label.to_string()));
        }
        Ok((current - baseline) / baseline * 100.0)
    }

    /// Cross-tabulate `measure` over two dimensions.
    pub fn pivot_by_pair<'a, I>(
        records: I,
        row_dimension: Dimension,
        column_dimension: Dimension,
        measure: Measure,
    ) -> PivotTable
    where
        I: IntoIterator<Item = &'a SalesRecord>,
    {
        let mut row_labels: Vec<String> = Vec::new();
        let mut column_labels: Vec<String> = Vec::new();
        let mut row_index: HashMap<&'a str, usize> = HashMap::new();
        let mut column_index: HashMap<&'a str, usize> = HashMap::new();
        let mut sparse: HashMap<(usize, usize), f64> = HashMap::new();

        for record in records {
            let row_value = row_dimension.value(record);
            let column_value = column_dimension.value(record);

            let r = *row_index.entry(row_value).or_insert_with(|| {
                row_labels.push(row_value.to_string());
                row_labels.len() - 1
            });
            let c = *column_index.entry(column_value).or_insert_with(|| {
                column_labels.push(column_value.to_string());
                column_labels.len() - 1
            });

            *sparse.entry((r, c)).or_insert(0.0) += measure.value(record);
        }

        let values = (0..row_labels.len())
            .map(|r| {
                (0..column_labels.len())
                    .map(|c| sparse.get(&(r, c)).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();

        PivotTable {
            row_dimension,
            column_dimension,
            measure,
            row_labels,
            column_labels,
            values,
        }
    }

    /// For a table grouped by `(A, B)`, pick the `B` with the highest
    /// `measure` for every `A`.
    ///
    /// Winners are returned in first-seen order of `A`; ties keep the
    /// first-seen `B`.
    pub fn top_per_group(table: &GroupedTable, measure: Measure) -> Result<Vec<Group>> {
        if table.dimensions.len() != 2 {
            return Err(DashboardError::DimensionArity {
                expected: 2,
                found: table.dimensions.len(),
            });
        }

        let mut winners: Vec<Group> = Vec::new();
        let mut slot_of: HashMap<&str, usize> = HashMap::new();

        for group in table.groups() {
            match slot_of.get(group.key_part(0)) {
                Some(&i) => {
                    if group.value(measure) > winners[i].value(measure) {
                        winners[i] = group.clone();
                    }
                }
                None => {
                    slot_of.insert(group.key_part(0), winners.len());
                    winners.push(group.clone());
                }
            }
        }

        Ok(winners)
    }

    /// Keep the records whose `dimension` value is in `allowed`, preserving
    /// row order.
    pub fn filter_by_set<'a, I, S>(
        records: I,
        dimension: Dimension,
        allowed: &[S],
    ) -> Vec<&'a SalesRecord>
    where
        I: IntoIterator<Item = &'a SalesRecord>,
        S: AsRef<str>,
    {
        let allowed: HashSet<&str> = allowed.iter().map(|s| s.as_ref()).collect();
        records
            .into_iter()
            .filter(|r| allowed.contains(dimension.value(r)))
            .collect()
    }

    /// Sum one measure over a set of groups.
    pub fn sum_groups(groups: &[Group], measure: Measure) -> f64 {
        groups.iter().map(|g| g.value(measure)).sum()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
