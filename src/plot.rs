//! The `histogram` command: load, configure a [`Session`], emit the result.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::{HistogramArgs, OutputFormat},
    histogram::{HistogramError, Weighting, compute_histogram, normalize_range},
    io_utils, load_options,
    render::PlotLabels,
    session::Session,
    settings::Settings,
    table,
};

pub fn execute(args: &HistogramArgs) -> Result<()> {
    let mut settings = Settings::load(&args.settings).unwrap_or_else(|err| {
        warn!("Ignoring unreadable settings: {err:#}");
        Settings::default()
    });
    if args.auto_range {
        settings.auto_min_max = true;
    } else if args.no_auto_range {
        settings.auto_min_max = false;
    }

    let mut session = Session::new(&settings);
    session.set_labels(PlotLabels {
        title: args.title.clone().unwrap_or(settings.title_label),
        x_label: args.x_label.clone().unwrap_or(settings.x_axis_label),
        y_label: args.y_label.clone().unwrap_or(settings.y_axis_label),
    });

    let outcome = run(&mut session, args);

    if !args.no_save_settings {
        // Persistence problems never change the command's outcome.
        match session.settings().save(&args.settings) {
            Ok(()) => info!("Saved settings to {:?}", args.settings),
            Err(err) => warn!("Could not save settings: {err:#}"),
        }
    }
    outcome
}

fn run(session: &mut Session, args: &HistogramArgs) -> Result<()> {
    let files = io_utils::collect_inputs(&args.input.inputs)?;
    let options = load_options(&args.input)?;
    let dataset = session.load(&files, &options);
    if dataset.is_empty() {
        warn!("No records were loaded from {} file(s)", files.len());
    }

    let weighting = Weighting::from_label(&args.weight);
    let mut first_error: Option<HistogramError> = None;
    let mut note = |result: Result<(), HistogramError>| {
        if let Err(err) = result {
            warn!("Skipping update: {err}");
            first_error.get_or_insert(err);
        }
    };
    note(session.select_value_column(&args.column));
    note(session.select_weighting(weighting.clone()));
    note(session.set_bins(args.bins));
    let (mut min, mut max) = session.range();
    if args.min.is_some() || args.max.is_some() {
        (min, max) = (args.min.unwrap_or(min), args.max.unwrap_or(max));
        note(session.set_range(min, max));
    }
    let requested_range = normalize_range(min, max).ok();

    // A result left over from an earlier parameter set is not the one asked for.
    let Some(result) = session.result().filter(|r| {
        r.value_column == args.column
            && r.weighting == weighting
            && r.bins.len() == args.bins
            && Some(r.range) == requested_range
    }) else {
        warn!("{}", HistogramError::NothingToExport);
        let cause = first_error
            .or_else(|| {
                let request = session.request()?;
                compute_histogram(session.dataset()?, &request).err()
            })
            .unwrap_or(HistogramError::NothingToExport);
        return Err(anyhow::Error::new(cause).context("No histogram computed"));
    };
    info!(
        "Binned {} record(s) of '{}' into {} bin(s) over {}..{} ({} outside range, {} skipped)",
        result.included,
        result.value_column,
        result.bins.len(),
        result.range.0,
        result.range.1,
        result.out_of_range,
        result.skipped
    );

    match args.format {
        OutputFormat::Table => {
            let (headers, rows) = table::histogram_rows(result);
            table::print_table(&headers, &rows);
        }
        OutputFormat::Csv => print!("{}", session.export_csv()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(result)?),
    }

    if let Some(path) = &args.output {
        io_utils::write_text(Some(path), &session.export_csv()?)
            .with_context(|| format!("Exporting bins to {path:?}"))?;
        info!("Exported {} bin(s) to {path:?}", result.bins.len());
    }
    if let Some(path) = &args.figure {
        session.save_figure(path)?;
        info!("Saved figure to {path:?}");
    }
    Ok(())
}
