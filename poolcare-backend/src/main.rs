use poolcare_backend::command::{Command, HELP_TEXT, ReadingArgs};
use poolcare_backend::config;
use poolcare_backend::model::storage::{FileStore, ImportMode};
use poolcare_backend::module::csv_import::parse_readings_csv;
use poolcare_backend::service::{PoolService, ServiceOptions};

use anyhow::{Context, Result};
use chrono::Utc;
use poolcare_common::{ChemicalReading, parse_timestamp};
use serde::Serialize;
use std::sync::Arc;

const CONFIG_PATH: &str = "config.toml";

type Service = PoolService<Arc<FileStore>>;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var("POOLCARE_CONFIG").unwrap_or_else(|_| CONFIG_PATH.to_string());
    let config_found = config::read_config(&config_path)?;
    let config = config::CONFIG.get().context("Configuration not loaded")?;

    // Initialize logging
    let _logging_guard = poolcare_backend::logging::init_logging(
        &config.log_dir,
        "poolcare",
        &config.log_level,
    )?;
    poolcare_backend::logging::prune_old_logs(&config.log_dir, "poolcare").await;

    if !config_found {
        tracing::debug!("No config file at {}, using defaults", config_path);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = Command::parse(&args)?;
    if command == Command::Help {
        println!("{}", HELP_TEXT);
        return Ok(());
    }

    let store = FileStore::open(&config.data_file)
        .with_context(|| format!("Failed to open data file {}", config.data_file))?;
    let service = PoolService::new(Arc::new(store), ServiceOptions::from(config));

    // Opportunistic cache sweep on every run
    let swept = service.sweep_cache();
    if swept > 0 {
        tracing::debug!("Evicted {} expired cache entries", swept);
    }

    run(&service, command).await
}

async fn run(service: &Service, command: Command) -> Result<()> {
    match command {
        Command::Record(args) => {
            let reading = build_reading(args)?;
            let report = service.submit(reading);
            print_json(&report)?;
            if !report.persisted {
                anyhow::bail!("Reading was not stored");
            }
        }
        Command::Check(args) => print_json(&service.check(&args.measurements))?,
        Command::Status => match service.latest_status() {
            Some((reading, status)) => print_json(&serde_json::json!({
                "reading": reading,
                "status": status,
            }))?,
            None => println!("No readings recorded yet"),
        },
        Command::Adjust => match service.adjustments_for_latest() {
            Some((reading, adjustments)) => print_json(&serde_json::json!({
                "reading": reading,
                "adjustments": adjustments,
            }))?,
            None => println!("No readings recorded yet"),
        },
        Command::Trend(chemical) => print_json(&serde_json::json!({
            "chemical": chemical,
            "trend": service.trend(chemical),
        }))?,
        Command::History(count) => print_json(&service.history(count))?,
        Command::Delete(id) => {
            if !service.delete(&id) {
                anyhow::bail!("No reading with id {}", id);
            }
            println!("Deleted {}", id);
        }
        Command::Export(namespace) => println!("{}", service.export(namespace.as_deref())),
        Command::Import { path, replace } => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path))?;
            let mode = if replace { ImportMode::Replace } else { ImportMode::Merge };
            if !service.import(&content, mode) {
                anyhow::bail!("Import from {} failed", path);
            }
            println!("Imported {} ({:?})", path, mode);
        }
        Command::ImportCsv(path) => {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path))?;
            let summary = parse_readings_csv(&content);
            let parsed = summary.readings.len();
            let stored = service.import_readings(summary.readings);
            print_json(&serde_json::json!({
                "parsed": parsed,
                "stored": stored,
                "skipped_rows": summary.skipped_rows,
            }))?;
        }
        Command::Migrate { from, to, keys } => {
            let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
            let selected = if keys.is_empty() { None } else { Some(keys.as_slice()) };
            if !service.migrate(&from, &to, selected) {
                anyhow::bail!("Migration from '{}' to '{}' did not complete", from, to);
            }
            println!("Migrated '{}' to '{}'", from, to);
        }
        Command::Sweep => println!("Evicted {} expired cache entries", service.sweep_cache()),
        Command::Help => println!("{}", HELP_TEXT),
    }

    Ok(())
}

fn build_reading(args: ReadingArgs) -> Result<ChemicalReading> {
    let timestamp = match args.at.as_deref() {
        Some(at) => parse_timestamp(at)?,
        None => Utc::now(),
    };
    let reading = ChemicalReading::new(timestamp, args.measurements);
    Ok(match args.notes {
        Some(notes) => reading.with_notes(notes),
        None => reading,
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
