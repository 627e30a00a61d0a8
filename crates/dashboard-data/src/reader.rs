//! Extract discovery and loading.
//!
//! Reads the tab / pipe delimited output of the upstream batch job and turns
//! it into a [`Dataset`]. Malformed lines are dropped and counted in a
//! [`LoadReport`]; only a missing or unreadable resource is an error.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use dashboard_core::models::{Dataset, SalesRecord};
use dashboard_core::{DashboardError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Number of tab-separated top-level fields in a valid line.
pub const TOP_LEVEL_FIELDS: usize = 4;
/// Number of `|`-separated fields in a valid composite key.
pub const KEY_FIELDS: usize = 7;
/// File-name prefix of batch job output shards.
pub const PART_FILE_PREFIX: &str = "part-";
/// Largest quantity accepted on a single line. Keeps every group total exact
/// as both `u64` and `f64`.
pub const MAX_LINE_QUANTITY: u64 = 1_000_000_000;

// ── Public types ──────────────────────────────────────────────────────────────

/// Why a line was left out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The line did not split into exactly four tab-separated fields.
    FieldCount,
    /// The composite key did not split into exactly seven `|` fields.
    KeyArity,
    /// Quantity was not a non-negative integer up to [`MAX_LINE_QUANTITY`].
    Quantity,
    /// Revenue was not a finite decimal.
    Revenue,
    /// Profit was not a finite decimal.
    Profit,
    /// The line was not valid UTF-8.
    Encoding,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            RejectReason::FieldCount => "expected 4 tab-separated fields",
            RejectReason::KeyArity => "expected 7 key fields",
            RejectReason::Quantity => "quantity is not an integer between 0 and 1000000000",
            RejectReason::Revenue => "revenue is not a number",
            RejectReason::Profit => "profit is not a number",
            RejectReason::Encoding => "line is not valid UTF-8",
        };
        f.write_str(text)
    }
}

/// Result of applying the line policy to one raw line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Empty after trimming; skipped without counting as a rejection.
    Blank,
    Accepted(SalesRecord),
    Rejected(RejectReason),
}

/// Per-reason rejection counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RejectionCounts {
    pub field_count: u64,
    pub key_arity: u64,
    pub quantity: u64,
    pub revenue: u64,
    pub profit: u64,
    pub encoding: u64,
}

impl RejectionCounts {
    pub fn record(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::FieldCount => self.field_count += 1,
            RejectReason::KeyArity => self.key_arity += 1,
            RejectReason::Quantity => self.quantity += 1,
            RejectReason::Revenue => self.revenue += 1,
            RejectReason::Profit => self.profit += 1,
            RejectReason::Encoding => self.encoding += 1,
        }
    }

    /// Rejections where the line had the wrong shape.
    pub fn structural(&self) -> u64 {
        self.field_count + self.key_arity
    }

    /// Rejections where a measure failed to parse.
    pub fn numeric(&self) -> u64 {
        self.quantity + self.revenue + self.profit
    }

    pub fn total(&self) -> u64 {
        self.structural() + self.numeric() + self.encoding
    }
}

/// Diagnostics gathered while loading an extract.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// The path the caller asked for (file or directory).
    pub source: PathBuf,
    /// Files actually read, in load order.
    pub files: Vec<PathBuf>,
    /// Physical lines seen, blank ones included.
    pub lines_read: u64,
    pub blank_lines: u64,
    pub accepted: u64,
    pub rejected: RejectionCounts,
    /// When loading finished.
    pub loaded_at: DateTime<Utc>,
    /// Wall-clock seconds spent reading and parsing.
    pub load_time_seconds: f64,
}

impl LoadReport {
    /// An empty report for `source`, before any line has been read.
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            files: Vec::new(),
            lines_read: 0,
            blank_lines: 0,
            accepted: 0,
            rejected: RejectionCounts::default(),
            loaded_at: Utc::now(),
            load_time_seconds: 0.0,
        }
    }

    /// Fold one line outcome into the counters, returning the record if any.
    fn tally(&mut self, outcome: LineOutcome) -> Option<SalesRecord> {
        self.lines_read += 1;
        match outcome {
            LineOutcome::Blank => {
                self.blank_lines += 1;
                None
            }
            LineOutcome::Accepted(record) => {
                self.accepted += 1;
                Some(record)
            }
            LineOutcome::Rejected(reason) => {
                self.rejected.record(reason);
                None
            }
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Apply the ingestion policy to a single raw line.
///
/// The line is trimmed, split on tabs into exactly four fields, the first of
/// which splits on `|` into exactly seven dimension fields. Quantity must be a
/// non-negative integer no larger than [`MAX_LINE_QUANTITY`]; revenue and
/// profit must be finite decimals.
pub fn parse_line(line: &str) -> LineOutcome {
    let line = line.trim();
    if line.is_empty() {
        return LineOutcome::Blank;
    }

    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != TOP_LEVEL_FIELDS {
        return LineOutcome::Rejected(RejectReason::FieldCount);
    }

    let dims: Vec<&str> = fields[0].split('|').collect();
    if dims.len() != KEY_FIELDS {
        return LineOutcome::Rejected(RejectReason::KeyArity);
    }

    let quantity = match fields[1].trim().parse::<u64>() {
        Ok(q) if q <= MAX_LINE_QUANTITY => q,
        _ => return LineOutcome::Rejected(RejectReason::Quantity),
    };
    let Some(revenue) = parse_decimal(fields[2]) else {
        return LineOutcome::Rejected(RejectReason::Revenue);
    };
    let Some(profit) = parse_decimal(fields[3]) else {
        return LineOutcome::Rejected(RejectReason::Profit);
    };

    LineOutcome::Accepted(SalesRecord {
        year: dims[0].to_string(),
        region: dims[1].to_string(),
        state: dims[2].to_string(),
        category: dims[3].to_string(),
        sub_category: dims[4].to_string(),
        product_name: dims[5].to_string(),
        customer_name: dims[6].to_string(),
        quantity,
        revenue,
        profit,
    })
}

/// Find every `part-*` file recursively under `dir`, sorted by path.
pub fn find_part_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| name.starts_with(PART_FILE_PREFIX))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load an extract into a [`Dataset`].
///
/// `path` may be a single file or a directory of `part-*` shards, which are
/// concatenated in path order. Fails only when the resource itself is
/// missing or unreadable; malformed lines are counted in the report.
pub fn load_dataset(path: &Path) -> Result<(Dataset, LoadReport)> {
    let started = Instant::now();
    let mut report = LoadReport::new(path);

    if !path.exists() {
        return Err(DashboardError::DataPathNotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        let parts = find_part_files(path);
        if parts.is_empty() {
            return Err(DashboardError::NoDataFiles(path.to_path_buf()));
        }
        parts
    } else {
        vec![path.to_path_buf()]
    };

    let mut records: Vec<SalesRecord> = Vec::new();
    for file_path in &files {
        let file = std::fs::File::open(file_path).map_err(|source| DashboardError::FileRead {
            path: file_path.clone(),
            source,
        })?;
        read_records(
            std::io::BufReader::new(file),
            file_path,
            &mut report,
            &mut records,
        )?;
        report.files.push(file_path.clone());
    }

    report.loaded_at = Utc::now();
    report.load_time_seconds = started.elapsed().as_secs_f64();

    info!(
        "Loaded {} records from {} file(s); {} line(s) rejected ({} structural, {} numeric)",
        report.accepted,
        report.files.len(),
        report.rejected.total(),
        report.rejected.structural(),
        report.rejected.numeric(),
    );

    Ok((Dataset::new(records), report))
}

/// Parse every line from `reader`, appending accepted records to `out`.
///
/// `source` is only used for diagnostics.
pub fn read_records<R: BufRead>(
    mut reader: R,
    source: &Path,
    report: &mut LoadReport,
    out: &mut Vec<SalesRecord>,
) -> Result<()> {
    let mut line = String::new();
    let mut line_no = 0u64;

    loop {
        line.clear();
        let outcome = match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => parse_line(&line),
            // `read_line` consumes the offending bytes, so reading resumes
            // at the next line.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                LineOutcome::Rejected(RejectReason::Encoding)
            }
            Err(source_err) => {
                return Err(DashboardError::FileRead {
                    path: source.to_path_buf(),
                    source: source_err,
                })
            }
        };
        line_no += 1;

        if let LineOutcome::Rejected(reason) = &outcome {
            debug!("Skipping {}:{}: {}", source.display(), line_no, reason);
        }
        if let Some(record) = report.tally(outcome) {
            out.push(record);
        }
    }

    Ok(())
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_decimal(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    const PHONE_ALICE: &str = "2023|East|NY|Electronics|Phones|PhoneX|Alice\t10\t1000.0\t100.0";
    const PHONE_BOB: &str = "2023|East|NY|Electronics|Phones|PhoneX|Bob\t5\t500.0\t50.0";

    fn write_extract(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path
    }

    fn accepted(line: &str) -> SalesRecord {
        match parse_line(line) {
            LineOutcome::Accepted(r) => r,
            other => panic!("expected accepted record, got {other:?}"),
        }
    }

    // ── parse_line ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_line_maps_fields_positionally() {
        let r = accepted(PHONE_ALICE);
        assert_eq!(r.year, "2023");
        assert_eq!(r.region, "East");
        assert_eq!(r.state, "NY");
        assert_eq!(r.category, "Electronics");
        assert_eq!(r.sub_category, "Phones");
        assert_eq!(r.product_name, "PhoneX");
        assert_eq!(r.customer_name, "Alice");
        assert_eq!(r.quantity, 10);
        assert_eq!(r.revenue, 1000.0);
        assert_eq!(r.profit, 100.0);
    }

    #[test]
    fn test_parse_line_negative_profit_and_signs() {
        let r = accepted("2024|West|CA|Furniture|Chairs|Seat|Carol\t+3\t-12.5\t-40.25");
        assert_eq!(r.quantity, 3);
        assert_eq!(r.revenue, -12.5);
        assert_eq!(r.profit, -40.25);
    }

    #[test]
    fn test_parse_line_trims_surrounding_whitespace() {
        let r = accepted(&format!("  {}  \r", PHONE_BOB));
        assert_eq!(r.customer_name, "Bob");
        assert_eq!(r.profit, 50.0);
    }

    #[test]
    fn test_parse_line_blank() {
        assert_eq!(parse_line(""), LineOutcome::Blank);
        assert_eq!(parse_line("   \t  "), LineOutcome::Blank);
    }

    #[test]
    fn test_parse_line_wrong_tab_count() {
        assert_eq!(
            parse_line("2023|East|NY|Electronics|Phones|PhoneX|Alice\t10\t1000.0"),
            LineOutcome::Rejected(RejectReason::FieldCount)
        );
        assert_eq!(
            parse_line(&format!("{}\textra", PHONE_ALICE)),
            LineOutcome::Rejected(RejectReason::FieldCount)
        );
    }

    #[test]
    fn test_parse_line_wrong_key_arity() {
        assert_eq!(
            parse_line("2023|East|NY|Electronics|Phones|PhoneX\t10\t1000.0\t100.0"),
            LineOutcome::Rejected(RejectReason::KeyArity)
        );
        assert_eq!(
            parse_line("2023|East|NY|Electronics|Phones|PhoneX|Alice|X\t10\t1000.0\t100.0"),
            LineOutcome::Rejected(RejectReason::KeyArity)
        );
    }

    #[test]
    fn test_parse_line_bad_numerics() {
        let key = "2023|East|NY|Electronics|Phones|PhoneX|Alice";
        assert_eq!(
            parse_line(&format!("{key}\tten\t1000.0\t100.0")),
            LineOutcome::Rejected(RejectReason::Quantity)
        );
        assert_eq!(
            parse_line(&format!("{key}\t1.5\t1000.0\t100.0")),
            LineOutcome::Rejected(RejectReason::Quantity)
        );
        assert_eq!(
            parse_line(&format!("{key}\t-1\t1000.0\t100.0")),
            LineOutcome::Rejected(RejectReason::Quantity)
        );
        assert_eq!(
            parse_line(&format!("{key}\t1\tabc\t100.0")),
            LineOutcome::Rejected(RejectReason::Revenue)
        );
        assert_eq!(
            parse_line(&format!("{key}\t1\t10.0\tNaN")),
            LineOutcome::Rejected(RejectReason::Profit)
        );
        assert_eq!(
            parse_line(&format!("{key}\t1\tinf\t1.0")),
            LineOutcome::Rejected(RejectReason::Revenue)
        );
    }

    #[test]
    fn test_parse_line_quantity_upper_bound() {
        let key = "2023|East|NY|Electronics|Phones|PhoneX|Alice";
        let r = accepted(&format!("{key}\t{MAX_LINE_QUANTITY}\t1.0\t1.0"));
        assert_eq!(r.quantity, MAX_LINE_QUANTITY);
        assert_eq!(
            parse_line(&format!("{key}\t{}\t1.0\t1.0", MAX_LINE_QUANTITY + 1)),
            LineOutcome::Rejected(RejectReason::Quantity)
        );
        assert_eq!(
            parse_line(&format!("{key}\t{}\t1.0\t1.0", u64::MAX)),
            LineOutcome::Rejected(RejectReason::Quantity)
        );
    }

    #[test]
    fn test_huge_quantities_are_rejected_before_aggregation() {
        let input = format!(
            "2023|East|NY|Electronics|Phones|PhoneX|Alice\t{}\t1.0\t1.0\n\
             2023|East|NY|Electronics|Phones|PhoneX|Bob\t1\t1.0\t1.0\n",
            u64::MAX
        );
        let mut report = LoadReport::new(Path::new("mem"));
        let mut out = Vec::new();
        read_records(input.as_bytes(), Path::new("mem"), &mut report, &mut out).unwrap();

        assert_eq!(report.rejected.quantity, 1);
        let dataset = Dataset::new(out);
        let top = crate::views::top_categories(&dataset, &crate::views::ViewOptions::default());
        assert_eq!(top.rows.len(), 1);
        assert_eq!(top.rows[0].totals.quantity, 1);
    }

    #[test]
    fn test_parse_line_allows_empty_dimension_values() {
        let r = accepted("2023||NY|Electronics|Phones|PhoneX|\t1\t1\t1");
        assert_eq!(r.region, "");
        assert_eq!(r.customer_name, "");
    }

    // ── read_records ──────────────────────────────────────────────────────────

    #[test]
    fn test_read_records_counts_every_outcome() {
        let input = format!(
            "{PHONE_ALICE}\n\nbad line\n2023|East|NY|Electronics|Phones|PhoneX\t1\t1\t1\n{PHONE_BOB}\n"
        );
        let mut report = LoadReport::new(Path::new("mem"));
        let mut out = Vec::new();
        read_records(input.as_bytes(), Path::new("mem"), &mut report, &mut out).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(report.lines_read, 5);
        assert_eq!(report.blank_lines, 1);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.rejected.field_count, 1);
        assert_eq!(report.rejected.key_arity, 1);
        assert_eq!(report.rejected.total(), 2);
    }

    #[test]
    fn test_read_records_skips_invalid_utf8_and_continues() {
        let mut input: Vec<u8> = Vec::new();
        input.extend_from_slice(b"2023|East|NY|Electronics|Phones|Ph\xffone|Alice\t1\t1\t1\n");
        input.extend_from_slice(PHONE_BOB.as_bytes());
        input.push(b'\n');

        let mut report = LoadReport::new(Path::new("mem"));
        let mut out = Vec::new();
        read_records(input.as_slice(), Path::new("mem"), &mut report, &mut out).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].customer_name, "Bob");
        assert_eq!(report.rejected.encoding, 1);
    }

    // ── load_dataset ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_dataset_end_to_end() {
        let dir = TempDir::new().unwrap();
        let path = write_extract(dir.path(), "SalesProduct.txt", &[PHONE_ALICE, PHONE_BOB]);

        let (dataset, report) = load_dataset(&path).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].customer_name, "Alice");
        assert_eq!(dataset.records()[1].customer_name, "Bob");
        assert_eq!(report.files, vec![path]);
        assert_eq!(report.rejected.total(), 0);
    }

    #[test]
    fn test_load_dataset_malformed_lines_do_not_abort() {
        let dir = TempDir::new().unwrap();
        let path = write_extract(
            dir.path(),
            "SalesProduct.txt",
            &[
                "2023|East|NY|Electronics|Phones|PhoneX|Alice\t10\t1000.0",
                "2023|East|NY|Electronics|Phones|PhoneX\t10\t1000.0\t100.0",
                "2023|East|NY|Electronics|Phones|PhoneX|Alice\tten\t1000.0\t100.0",
                PHONE_BOB,
            ],
        );

        let (dataset, report) = load_dataset(&path).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].customer_name, "Bob");
        assert_eq!(report.rejected.field_count, 1);
        assert_eq!(report.rejected.key_arity, 1);
        assert_eq!(report.rejected.quantity, 1);
    }

    #[test]
    fn test_load_dataset_keeps_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = write_extract(dir.path(), "dup.txt", &[PHONE_ALICE, PHONE_ALICE]);
        let (dataset, _) = load_dataset(&path).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_load_dataset_missing_path_is_resource_error() {
        let err = load_dataset(Path::new("/tmp/does-not-exist-sales-dashboard-xyz.txt"))
            .unwrap_err();
        assert!(matches!(err, DashboardError::DataPathNotFound(_)));
        assert!(err.is_resource_error());
    }

    #[test]
    fn test_load_dataset_directory_of_parts() {
        let dir = TempDir::new().unwrap();
        write_extract(dir.path(), "part-00001", &[PHONE_BOB]);
        write_extract(dir.path(), "part-00000", &[PHONE_ALICE]);
        write_extract(dir.path(), "_SUCCESS", &["not data"]);

        let (dataset, report) = load_dataset(dir.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].customer_name, "Alice");
        assert_eq!(report.files.len(), 2);
        assert_eq!(report.rejected.total(), 0);
    }

    #[test]
    fn test_load_dataset_directory_without_parts() {
        let dir = TempDir::new().unwrap();
        write_extract(dir.path(), "notes.txt", &[PHONE_ALICE]);

        let err = load_dataset(dir.path()).unwrap_err();
        assert!(matches!(err, DashboardError::NoDataFiles(_)));
    }

    #[test]
    fn test_load_dataset_empty_file() {
        let dir = TempDir::new().unwrap();
        let path = write_extract(dir.path(), "empty.txt", &[]);
        let (dataset, report) = load_dataset(&path).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(report.lines_read, 0);
    }

    // ── find_part_files ───────────────────────────────────────────────────────

    #[test]
    fn test_find_part_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("year=2024");
        std::fs::create_dir_all(&sub).unwrap();
        write_extract(dir.path(), "part-00002", &["x"]);
        write_extract(&sub, "part-00000", &["x"]);
        write_extract(dir.path(), "part-00001", &["x"]);

        let files = find_part_files(dir.path());
        let names: Vec<String> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().display().to_string())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "part-00001");
        assert_eq!(names[1], "part-00002");
    }

    #[test]
    fn test_find_part_files_nonexistent_path() {
        let files = find_part_files(Path::new("/tmp/does-not-exist-sales-parts-xyz"));
        assert!(files.is_empty());
    }
}
