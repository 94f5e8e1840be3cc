//! Batchscope CLI
//!
//! Command-line interface for the resample engine:
//! - Resample a record file into buckets
//! - Show the discovered schema of a record file
//! - Generate a default config file

use anyhow::{bail, Context};
use batchscope::config::{generate_default_config, Config, LoadedConfig, LoggingConfig};
use batchscope::dataset::{self, load_records};
use batchscope::resample::{
    format_number, Aggregation, DimensionKind, MetricRecord, ResampleConfig, ResampleResult,
    Resampler,
};
use batchscope::schema::DiscoverySchema;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "batchscope")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resample discovered data batches into chart buckets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: standard locations, then environment)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resample records into buckets
    Resample {
        /// Record file (.json or .csv)
        input: PathBuf,
        /// Dimension to group by (default: from the discovered schema)
        #[arg(short, long)]
        dimension: Option<String>,
        /// Dimension kind (temporal, numeric, categorical); inferred when omitted
        #[arg(short, long)]
        kind: Option<String>,
        /// Metric to aggregate
        #[arg(short, long)]
        metric: Option<String>,
        /// Aggregation function (sum, avg, count)
        #[arg(short, long)]
        aggregation: Option<String>,
        /// Time bucket (hour, day, week, month, quarter, year), bin count, or auto
        #[arg(short, long, default_value = "auto")]
        bucket: String,
        /// Brush range as START:END bucket indices
        #[arg(short, long, allow_hyphen_values = true, value_parser = parse_range)]
        range: Option<(i64, i64)>,
        /// Numeric bin edge hints (JSON)
        #[arg(long)]
        numeric_hints: Option<PathBuf>,
        /// Category group hints (JSON)
        #[arg(long)]
        category_hints: Option<PathBuf>,
        /// Also list the records selected by the brush
        #[arg(long)]
        selected: bool,
    },

    /// Show dimensions and metrics discovered in a record file
    Schema {
        /// Record file (.json or .csv)
        input: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => LoadedConfig {
            config: Config::load_with_env(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            source: Some(path.clone()),
            failures: Vec::new(),
        },
        None => Config::discover(),
    };
    init_logging(&loaded.config.logging);
    loaded.log();
    let config = loaded.config;

    match cli.command {
        Commands::Resample {
            input,
            dimension,
            kind,
            metric,
            aggregation,
            bucket,
            range,
            numeric_hints,
            category_hints,
            selected,
        } => {
            let records = load_records(&input)
                .with_context(|| format!("loading records from {}", input.display()))?;
            let schema = DiscoverySchema::infer(&records);

            let mut request = schema.default_config();
            if let Some(dimension) = dimension {
                request.dimension_kind = match kind.as_deref() {
                    Some(kind) => parse_kind(kind)?,
                    None => schema
                        .kind_of(&dimension)
                        .unwrap_or(DimensionKind::Categorical),
                };
                request.dimension = dimension;
            } else if let Some(kind) = kind.as_deref() {
                request.dimension_kind = parse_kind(kind)?;
            }
            if let Some(metric) = metric {
                if request.aggregation == Aggregation::Count {
                    request.aggregation = Aggregation::Sum;
                }
                request.metric = metric;
            }
            if let Some(aggregation) = aggregation.as_deref() {
                request.aggregation = Aggregation::from_str(aggregation)
                    .with_context(|| format!("unknown aggregation '{}'", aggregation))?;
            }
            request.bucket = bucket;
            request.range = range;

            let numeric_hints = numeric_hints
                .map(|path| dataset::load_numeric_hints(&path))
                .transpose()
                .context("loading numeric hints")?;
            let category_hints = category_hints
                .map(|path| dataset::load_category_hints(&path))
                .transpose()
                .context("loading category hints")?;

            let resampler = Resampler::with_settings(config.resample.settings());
            let result = resampler.compute(
                &records,
                &request,
                numeric_hints.as_ref(),
                category_hints.as_ref(),
            );

            match cli.format {
                OutputFormat::Json => {
                    let body = serde_json::json!({
                        "config": request,
                        "result": result,
                    });
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                OutputFormat::Table => print_result(&request, &result),
            }

            if selected {
                print_selected(&result, &records, cli.format)?;
            }
        }

        Commands::Schema { input } => {
            let records = load_records(&input)
                .with_context(|| format!("loading records from {}", input.display()))?;
            let schema = DiscoverySchema::infer(&records);

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
                OutputFormat::Table => {
                    println!("{} records", records.len());
                    println!("\nDimensions:");
                    for dimension in &schema.dimensions {
                        println!("  {:<24} {}", dimension.name, dimension.kind);
                    }
                    println!("\nMetrics:");
                    for metric in &schema.metrics {
                        println!("  {}", metric);
                    }
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("batchscope={}", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_kind(s: &str) -> anyhow::Result<DimensionKind> {
    match DimensionKind::from_str(s) {
        Some(kind) => Ok(kind),
        None => bail!("unknown dimension kind '{}'", s),
    }
}

/// Parse `START:END` into a bucket index pair
fn parse_range(s: &str) -> Result<(i64, i64), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{}'", s))?;
    let start = start
        .trim()
        .parse()
        .map_err(|_| format!("invalid range start '{}'", start))?;
    let end = end
        .trim()
        .parse()
        .map_err(|_| format!("invalid range end '{}'", end))?;
    Ok((start, end))
}

fn print_result(request: &ResampleConfig, result: &ResampleResult) {
    println!(
        "{} of {} by {} ({}), bucket: {}",
        result.aggregation,
        if result.aggregation == Aggregation::Count {
            "records"
        } else {
            request.metric.as_str()
        },
        request.dimension,
        request.dimension_kind,
        result.resolved_bucket
    );
    for degradation in &result.degradations {
        println!("  note: {}", degradation);
    }
    if result.skipped_records > 0 {
        println!("  note: {} records lack the dimension", result.skipped_records);
    }

    if result.is_empty() {
        println!("\nNo buckets available for this selection");
        return;
    }

    println!();
    println!("{:>5}  {:<28} {:>14} {:>8}", "#", "BUCKET", "VALUE", "RECORDS");
    for (index, bucket) in result.series.iter().enumerate() {
        let in_brush = match result.config_range {
            Some((start, end)) if result.filter_active => index >= start && index <= end,
            _ => false,
        };
        println!(
            "{:>5}{} {:<28} {:>14} {:>8}",
            index,
            if in_brush { "*" } else { " " },
            bucket.label,
            format_number(bucket.value),
            bucket.ids.len()
        );
    }

    if let (true, Some(ids)) = (result.filter_active, &result.allowed_ids) {
        println!("\nBrush selects {} records", ids.len());
    }
}

fn print_selected(
    result: &ResampleResult,
    records: &[MetricRecord],
    format: OutputFormat,
) -> anyhow::Result<()> {
    let selected = result.selected(records);
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&selected)?),
        OutputFormat::Table => {
            println!("\nSelected batches ({}):", selected.len());
            for record in selected {
                println!(
                    "  {:<20} {:<25} {}",
                    record.id,
                    record.time.as_deref().unwrap_or("-"),
                    record.category.as_deref().unwrap_or("-")
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(parse_range("2:5"), Ok((2, 5)));
        assert_eq!(parse_range("-5:10000"), Ok((-5, 10000)));
        assert!(parse_range("5").is_err());
        assert!(parse_range("a:b").is_err());
    }

    #[test]
    fn test_cli_parses_resample() {
        let cli = Cli::try_parse_from([
            "batchscope",
            "resample",
            "batches.json",
            "--dimension",
            "rows",
            "--kind",
            "numeric",
            "--range",
            "-5:10000",
            "--format",
            "json",
        ])
        .unwrap();

        assert!(cli.format == OutputFormat::Json);
        match cli.command {
            Commands::Resample {
                dimension, range, ..
            } => {
                assert_eq!(dimension.as_deref(), Some("rows"));
                assert_eq!(range, Some((-5, 10000)));
            }
            _ => panic!("expected resample"),
        }
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("temporal").unwrap(), DimensionKind::Temporal);
        assert!(parse_kind("ordinal").is_err());
    }
}
