//! Vitals entrypoint: a small command-line harness around the dashboard
//! layout engine for poking at a persisted configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use core_grid::{GRID_COLS, GRID_ROWS, WidgetPlacement, WidgetSize, covered_slots, slot_index};
use core_sources::{HealthDataSource, MetricKind, MetricsSnapshot, SourceStatus, StaticHealthSource};
use core_store::{FileStorage, WidgetConfigStore, default_layout};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "vitals", version, about = "Vitals dashboard layout tool")]
struct Args {
    /// Directory holding the persisted dashboard configuration.
    #[arg(long = "data-dir", default_value = ".vitals")]
    data_dir: PathBuf,
    /// Directory receiving `vitals.log`.
    #[arg(long = "log-dir", default_value = ".")]
    log_dir: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current grid (default).
    Show,
    /// Flip a widget's enabled flag.
    Toggle { id: String },
    /// Resize a widget (small | medium | large). Illegal requests are a
    /// logged no-op.
    Resize { id: String, size: String },
    /// Move a widget to a slot (0-5), swapping with any occupant.
    Move { id: String, slot: u8 },
    /// Restore the default layout.
    Reset,
}

fn configure_logging(dir: &Path) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(dir, "vitals.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

fn parse_size(raw: &str) -> Result<WidgetSize> {
    match raw {
        "small" => Ok(WidgetSize::Small),
        "medium" => Ok(WidgetSize::Medium),
        "large" => Ok(WidgetSize::Large),
        other => bail!("unknown size {other:?} (expected small | medium | large)"),
    }
}

fn metric_for(widget_id: &str) -> Option<MetricKind> {
    match widget_id {
        "steps" => Some(MetricKind::Steps),
        "sleep" => Some(MetricKind::SleepHours),
        "hydration" => Some(MetricKind::Hydration),
        "hrv" => Some(MetricKind::HeartRateVariability),
        "meditation" | "mindfulness" => Some(MetricKind::MindfulMinutes),
        _ => None,
    }
}

fn demo_health_source() -> StaticHealthSource {
    let mut snapshot = MetricsSnapshot::default();
    snapshot.values.insert(MetricKind::Steps, 6_214.0);
    snapshot.values.insert(MetricKind::SleepHours, 7.4);
    snapshot.values.insert(MetricKind::Hydration, 1.6);
    snapshot.values.insert(MetricKind::HeartRateVariability, 48.0);
    snapshot.values.insert(MetricKind::MindfulMinutes, 12.0);
    StaticHealthSource::new(snapshot, SourceStatus::Ready)
}

fn render_grid(placements: &[WidgetPlacement]) -> String {
    let mut out = String::new();
    for row in 0..GRID_ROWS {
        let mut cells = Vec::new();
        for col in 0..GRID_COLS {
            let slot = slot_index(row, col);
            let label = placements
                .iter()
                .filter(|p| p.enabled)
                .find(|p| covered_slots(p).contains(&slot))
                .map(|p| p.id.as_str())
                .unwrap_or("·");
            cells.push(format!("{label:^14}"));
        }
        out.push_str(&format!("|{}|\n", cells.join("|")));
    }
    out
}

async fn show(store: &WidgetConfigStore) {
    let placements = store.load().await;
    print!("{}", render_grid(&placements));

    let source = demo_health_source();
    let snapshot = source.snapshot().await;
    let mut readings = Vec::new();
    for p in placements.iter().filter(|p| p.enabled) {
        if let Some(value) = metric_for(&p.id).and_then(|kind| snapshot.value(kind)) {
            readings.push(format!("{} {value}", p.id));
        }
    }
    if !readings.is_empty() {
        println!("readings: {}", readings.join(", "));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging(&args.log_dir)?;
    info!(target: "runtime", data_dir = %args.data_dir.display(), "startup");

    let storage = Arc::new(FileStorage::new(&args.data_dir));
    let store = WidgetConfigStore::new(storage);

    match args.command.unwrap_or(Command::Show) {
        Command::Show => {}
        Command::Toggle { id } => store.toggle(&id).await?,
        Command::Resize { id, size } => store.change_size(&id, parse_size(&size)?).await?,
        Command::Move { id, slot } => store.move_to_position(&id, slot).await?,
        Command::Reset => store.reorder(default_layout()).await?,
    }
    show(&store).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_lowercase_names() {
        assert_eq!(parse_size("small").unwrap(), WidgetSize::Small);
        assert_eq!(parse_size("large").unwrap(), WidgetSize::Large);
        assert!(parse_size("huge").is_err());
    }

    #[test]
    fn render_marks_free_slots() {
        let placements = vec![WidgetPlacement::new("steps", true, WidgetSize::Small, 0)];
        let grid = render_grid(&placements);
        assert!(grid.contains("steps"));
        assert_eq!(grid.matches('·').count(), 5);
    }

    #[test]
    fn render_repeats_label_across_span() {
        let placements = vec![WidgetPlacement::new("sleep", true, WidgetSize::Large, 3)];
        let grid = render_grid(&placements);
        assert_eq!(grid.matches("sleep").count(), 3);
    }
}
