use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::settings::DEFAULT_SETTINGS_FILE;

#[derive(Debug, Parser)]
#[command(author, version, about = "Weighted histograms over CSV columns", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the columns of the loaded files with their value counts
    Columns(ColumnsArgs),
    /// Report the observed minimum and maximum of a column
    Range(RangeArgs),
    /// Compute a weighted histogram and export its bins
    Histogram(HistogramArgs),
    /// Show or update the persisted plot settings
    Settings(SettingsArgs),
}

/// Options shared by every command that loads data.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// CSV files or directories to load (directories contribute every file they contain)
    #[arg(short = 'i', long = "input", required = true, action = clap::ArgAction::Append)]
    pub inputs: Vec<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Do not add the `file` column naming each record's source
    #[arg(long = "no-source-tag")]
    pub no_source_tag: bool,
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Column to inspect
    #[arg(short = 'c', long = "column")]
    pub column: String,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Column whose values are binned
    #[arg(short = 'c', long = "column")]
    pub column: String,
    /// Column holding per-record weights (`None` counts every record once)
    #[arg(short = 'w', long = "weight", default_value = "None")]
    pub weight: String,
    /// Number of equal-width bins
    #[arg(short = 'b', long, default_value_t = crate::session::DEFAULT_BINS)]
    pub bins: usize,
    /// Lower bound of the range (overrides auto range)
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,
    /// Upper bound of the range (overrides auto range)
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,
    /// Derive min and max from the column's values
    #[arg(long = "auto-range", conflicts_with = "no_auto_range")]
    pub auto_range: bool,
    /// Keep the configured min and max even when AutoMinMax is set
    #[arg(long = "no-auto-range")]
    pub no_auto_range: bool,
    /// Plot title
    #[arg(long)]
    pub title: Option<String>,
    /// X axis label
    #[arg(long = "x-label")]
    pub x_label: Option<String>,
    /// Y axis label
    #[arg(long = "y-label")]
    pub y_label: Option<String>,
    /// Write the bin export CSV to this file
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Save a figure; the format follows the extension (.svg, .png)
    #[arg(long)]
    pub figure: Option<PathBuf>,
    /// How to print the result on stdout
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
    /// Settings file read at startup and written back on exit
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,
    /// Do not write the settings file back on exit
    #[arg(long = "no-save-settings")]
    pub no_save_settings: bool,
}

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Settings file to show or update
    #[arg(long, default_value = DEFAULT_SETTINGS_FILE)]
    pub settings: PathBuf,
    /// Assignments such as `TitleLabel=mjd histogram` or `AutoMinMax=0`
    #[arg(long = "set", action = clap::ArgAction::Append)]
    pub assignments: Vec<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_aliases() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn histogram_arguments_parse() {
        let cli = Cli::try_parse_from([
            "histplot", "histogram", "-i", "a.csv", "-i", "dir", "-c", "mjd", "-w", "mjd_n",
            "--bins", "2", "--min", "-5", "--max", "20", "--format", "csv",
        ])
        .expect("parse");
        let Commands::Histogram(args) = cli.command else {
            panic!("expected histogram command");
        };
        assert_eq!(args.input.inputs.len(), 2);
        assert_eq!(args.weight, "mjd_n");
        assert_eq!(args.bins, 2);
        assert_eq!(args.min, Some(-5.0));
        assert_eq!(args.format, OutputFormat::Csv);
        assert!(!args.no_save_settings);
    }

    #[test]
    fn auto_range_flags_conflict() {
        let parsed = Cli::try_parse_from([
            "histplot", "histogram", "-i", "a.csv", "-c", "mjd", "--auto-range", "--no-auto-range",
        ]);
        assert!(parsed.is_err());
    }
}
