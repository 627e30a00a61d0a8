use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::View;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Terminal dashboard for batch sales extracts
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-dashboard",
    about = "Terminal dashboard for batch sales extracts",
    version
)]
pub struct Settings {
    /// Extract file, or a directory of `part-*` files
    #[arg(long, env = "SALES_DASHBOARD_DATA", default_value = "SalesProduct.txt")]
    pub data: PathBuf,

    /// View shown first
    #[arg(long, value_enum, default_value_t = View::TopCategories)]
    pub view: View,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Number of category / sub-category pairs ranked by quantity
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub category_limit: u32,

    /// Number of products ranked by profit
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub product_limit: u32,

    /// Number of customers ranked by revenue
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub customer_limit: u32,

    /// Earlier year of the revenue trend comparison
    #[arg(long, default_value = "2023")]
    pub baseline_year: String,

    /// Later year of the revenue trend comparison
    #[arg(long, default_value = "2024")]
    pub compare_year: String,

    /// Print the selected view as JSON instead of starting the dashboard
    #[arg(long)]
    pub json: bool,

    /// With --json, print every view
    #[arg(long, requires = "json")]
    pub all: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.sales-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline_year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_year: Option<String>,
}

impl LastUsedParams {
    /// Default location: `~/.sales-dashboard/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".sales-dashboard").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!("Ignoring unreadable {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] but with an explicit argument
    /// list and config path so tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Explicit values (flag or environment) always win over persisted ones.
        if !is_arg_explicitly_set(&matches, "data") {
            if let Some(v) = last.data {
                settings.data = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        // NOTE: clap stores the arg id using the field name (underscores).
        if !is_arg_explicitly_set(&matches, "category_limit") {
            if let Some(v) = last.category_limit {
                settings.category_limit = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "product_limit") {
            if let Some(v) = last.product_limit {
                settings.product_limit = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "customer_limit") {
            if let Some(v) = last.customer_limit {
                settings.customer_limit = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "baseline_year") {
            if let Some(v) = last.baseline_year {
                settings.baseline_year = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "compare_year") {
            if let Some(v) = last.compare_year {
                settings.compare_year = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!("Could not persist settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data: Some(s.data.clone()),
            view: Some(s.view),
            theme: Some(s.theme.clone()),
            category_limit: Some(s.category_limit),
            product_limit: Some(s.product_limit),
            customer_limit: Some(s.customer_limit),
            baseline_year: Some(s.baseline_year.clone()),
            compare_year: Some(s.compare_year.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied on the command line or through its
/// environment variable, rather than falling back to the default value.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
