mod bootstrap;

use anyhow::{Context, Result};
use dashboard_core::models::View;
use dashboard_core::settings::Settings;
use dashboard_data::export::{build_export, to_json};
use dashboard_data::reader::load_dataset;
use dashboard_data::views::ViewOptions;
use dashboard_ui::app::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    let app_dir = bootstrap::ensure_directories()?;
    // The dashboard owns the terminal, so its logs go to a file by default.
    let log_file = match (&settings.log_file, settings.json) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(bootstrap::default_log_file(&app_dir)),
        (None, true) => None,
    };
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Sales Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Data: {}, View: {}, Theme: {}",
        settings.data.display(),
        settings.view,
        settings.theme
    );

    let (dataset, load) = load_dataset(&settings.data)
        .with_context(|| format!("Could not load sales data from {}", settings.data.display()))?;
    if load.rejected.total() > 0 {
        tracing::warn!(
            "{} malformed line(s) skipped while loading {}",
            load.rejected.total(),
            settings.data.display()
        );
    }

    let options = ViewOptions::from(&settings);

    if settings.json {
        let views: Vec<View> = if settings.all {
            View::ALL.to_vec()
        } else {
            vec![settings.view]
        };
        let document = build_export(&dataset, &load, &options, &views);
        println!("{}", to_json(&document)?);
        return Ok(());
    }

    let app = App::new(&settings.theme, settings.view, options);

    // The loop exits on 'q' / Ctrl+C inside the TUI. The OS-level signal is
    // raced as well so a Ctrl+C delivered outside raw mode also exits cleanly.
    tokio::select! {
        result = app.run(&dataset, &load) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Ctrl+C received; shutting down");
        }
    }

    Ok(())
}
