pub mod cli;
pub mod data;
pub mod dataset;
pub mod histogram;
pub mod io_utils;
pub mod observable;
pub mod plot;
pub mod render;
pub mod session;
pub mod settings;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::{Cli, Commands, InputArgs},
    dataset::{Dataset, LoadOptions},
    settings::Settings,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("histplot", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => handle_columns(&args.input),
        Commands::Range(args) => handle_range(&args),
        Commands::Histogram(args) => plot::execute(&args),
        Commands::Settings(args) => handle_settings(&args),
    }
}

pub(crate) fn load_options(args: &InputArgs) -> Result<LoadOptions> {
    Ok(LoadOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        tag_source: !args.no_source_tag,
    })
}

fn load_dataset(args: &InputArgs) -> Result<Dataset> {
    let files = io_utils::collect_inputs(&args.inputs)?;
    debug!("Input files: {:?}", files);
    if let Some(delimiter) = args.delimiter {
        info!("Reading with delimiter '{}'", printable_delimiter(delimiter));
    }
    let dataset = Dataset::load(&files, &load_options(args)?);
    info!(
        "Loaded {} record(s) across {} column(s) from {} file(s)",
        dataset.len(),
        dataset.columns().len(),
        dataset.sources().len()
    );
    Ok(dataset)
}

fn handle_columns(args: &InputArgs) -> Result<()> {
    let dataset = load_dataset(args)?;
    let summaries = dataset.column_summaries();
    if summaries.is_empty() {
        info!("No columns found");
    } else {
        let (headers, rows) = table::column_rows(&summaries);
        table::print_table(&headers, &rows);
    }
    for skipped in dataset.skipped() {
        println!("skipped {}: {}", skipped.path.display(), skipped.reason);
    }
    Ok(())
}

fn handle_range(args: &cli::RangeArgs) -> Result<()> {
    let dataset = load_dataset(&args.input)?;
    let range = histogram::auto_range(&dataset, &args.column)
        .with_context(|| format!("Computing range of '{}'", args.column))?;
    match range {
        Some((min, max)) => println!("{min}\t{max}"),
        None => warn!("Column '{}' has no numeric values", args.column),
    }
    Ok(())
}

fn handle_settings(args: &cli::SettingsArgs) -> Result<()> {
    let mut settings = Settings::load(&args.settings)
        .with_context(|| format!("Loading settings from {:?}", args.settings))?;
    if !args.assignments.is_empty() {
        for assignment in &args.assignments {
            settings.assign(assignment)?;
        }
        settings
            .save(&args.settings)
            .with_context(|| format!("Writing settings to {:?}", args.settings))?;
        info!(
            "Updated {} setting(s) in {:?}",
            args.assignments.len(),
            args.settings
        );
    }
    for (key, value) in settings.entries() {
        println!("{key}={value}");
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
