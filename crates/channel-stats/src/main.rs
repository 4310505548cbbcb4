//! CLI entry point for channel statistics analysis.

use anyhow::{Context, Result};
use channel_stats::table::columns;
use channel_stats::utils::{format_grouped, percentage, truncate_str};
use channel_stats::{
    AnalyticsConfig, ChannelAnalyzer, DataConfig, DataValidator, LoggingConfig, OutlierMethod,
    ReportWriter, ValidationOptions, basic_cleaning, export_csv, load_table, summarize,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Columns the analysis expects; missing ones are reported, not fatal.
const REQUIRED_COLUMNS: [&str; 3] = [columns::YOUTUBER, columns::SUBSCRIBERS, columns::VIDEO_VIEWS];

/// CLI-compatible outlier method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierMethod {
    /// Tukey fences at 1.5 x IQR
    Iqr,
    /// More than 3 sample standard deviations from the mean
    Zscore,
}

impl From<CliOutlierMethod> for OutlierMethod {
    fn from(cli: CliOutlierMethod) -> Self {
        match cli {
            CliOutlierMethod::Iqr => OutlierMethod::Iqr,
            CliOutlierMethod::Zscore => OutlierMethod::Zscore,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Channel statistics quality checks and analysis",
    long_about = "Validate and analyze a CSV of channel statistics.\n\n\
                  EXAMPLES:\n  \
                  # Full analysis with reports in ./outputs\n  \
                  channel-stats analyze --csv data/channels.csv\n\n  \
                  # Quick look at the dataset\n  \
                  channel-stats summary --csv data/channels.csv --verbose\n\n  \
                  # Clean and export\n  \
                  channel-stats clean --csv data/channels.csv --output cleaned.csv"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error) [default: config file, else info]
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Only show warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the dataset and write quality and analysis reports
    Analyze {
        /// Path to the CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of top channels to list
        #[arg(long)]
        top_n: Option<usize>,

        /// Method used to flag outliers
        #[arg(long, value_enum)]
        outlier_method: Option<CliOutlierMethod>,
    },

    /// Print a dataset summary
    Summary {
        /// Path to the CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Include column types and missing counts
        #[arg(short, long)]
        verbose: bool,
    },

    /// Clean the dataset and export it as CSV
    Clean {
        /// Path to the CSV file
        #[arg(long)]
        csv: PathBuf,

        /// Output path for the cleaned CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Pick the log level: `--log-level` wins over the config file.
fn resolve_log_level(cli_level: Option<&str>, logging: &LoggingConfig) -> String {
    cli_level.unwrap_or(&logging.level).to_string()
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let Cli {
        command,
        log_level,
        quiet,
    } = Cli::parse();

    match command {
        Command::Analyze {
            csv,
            output,
            config,
            top_n,
            outlier_method,
        } => {
            let mut config = match config {
                Some(path) => AnalyticsConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => AnalyticsConfig::default(),
            };
            init_logging(
                &resolve_log_level(log_level.as_deref(), &config.logging),
                quiet,
            );
            config.data.csv_path = Some(csv);
            if let Some(output) = output {
                config.output.base_dir = output;
            }
            if let Some(n) = top_n {
                config.analysis.top_n = n;
            }
            if let Some(method) = outlier_method {
                config.analysis.outlier_method = method.into();
            }
            config.validate()?;
            run_analyze(&config)
        }
        Command::Summary { csv, verbose } => {
            init_logging(
                &resolve_log_level(log_level.as_deref(), &LoggingConfig::default()),
                quiet,
            );
            run_summary(&csv, verbose)
        }
        Command::Clean { csv, output } => {
            init_logging(
                &resolve_log_level(log_level.as_deref(), &LoggingConfig::default()),
                quiet,
            );
            run_clean(&csv, &output)
        }
    }
}

fn run_analyze(config: &AnalyticsConfig) -> Result<()> {
    let csv = config
        .data
        .csv_path
        .as_ref()
        .context("No input CSV configured")?;
    debug!("Configuration: {:?}", config);

    println!("Analyzing: {}", csv.display());
    println!("Output directory: {}", config.output.base_dir.display());

    let df = load_table(csv, &config.data)?;
    info!("Dataset loaded successfully: {:?}", df.shape());

    // Validation
    let validator = DataValidator::new(&df)?;
    let options = ValidationOptions::default()
        .required_columns(REQUIRED_COLUMNS)
        .missing_threshold(config.analysis.missing_threshold);
    let validation = validator.validate_all(&options);
    for issue in &validation.issues {
        warn!("{}", issue);
    }

    // Analysis
    let analyzer = ChannelAnalyzer::new(&df)?;
    let summary = analyzer.summary(
        config.analysis.outlier_method,
        config.analysis.correlation_threshold,
        config.analysis.top_n,
    )?;

    let writer = ReportWriter::new(&config.output.base_dir);
    writer.write_text("quality_report.txt", &validator.generate_quality_report())?;
    writer.write_text("analysis_report.txt", &analyzer.generate_report())?;
    if config.output.write_json {
        writer.write_json("validation.json", &validation)?;
        writer.write_json("analysis.json", &summary)?;
    }

    println!("\n{}", "=".repeat(80));
    println!("ANALYSIS SUMMARY");
    println!("{}\n", "=".repeat(80));
    println!("  Channels: {}", summary.total_channels);
    println!(
        "  Validation: {} ({} issues, {} warnings)",
        if validation.passed { "passed" } else { "failed" },
        validation.issues.len(),
        validation.warnings.len()
    );

    if !summary.top_by_subscribers.is_empty() {
        println!("\nTOP {} BY SUBSCRIBERS", summary.top_by_subscribers.len());
        println!("{}", "-".repeat(40));
        for (rank, entry) in summary.top_by_subscribers.iter().enumerate() {
            println!(
                "  {:>3}. {:<30} {:>15}",
                rank + 1,
                truncate_str(entry.youtuber.as_deref().unwrap_or("n/a"), 30),
                format_grouped(entry.value, 0)
            );
        }
    }

    if !summary.outliers.is_empty() {
        println!("\nOUTLIERS ({})", config.analysis.outlier_method);
        println!("{}", "-".repeat(40));
        for stats in &summary.outliers {
            println!(
                "  {:<20} {:>6} rows ({:.1}%)",
                stats.column, stats.n_outliers, stats.pct_outliers
            );
        }
    }

    if !summary.strong_correlations.is_empty() {
        println!(
            "\nSTRONG CORRELATIONS (|r| >= {})",
            config.analysis.correlation_threshold
        );
        println!("{}", "-".repeat(40));
        for pair in &summary.strong_correlations {
            println!("  {} ~ {}: {:.3}", pair.first, pair.second, pair.coefficient);
        }
    }

    println!(
        "\nAnalysis complete! Reports saved to {}",
        config.output.base_dir.display()
    );
    Ok(())
}

fn run_summary(csv: &Path, verbose: bool) -> Result<()> {
    println!("Loading: {}", csv.display());
    let df = load_table(csv, &DataConfig::default())?;
    let summary = summarize(&df);
    let (rows, cols) = summary.shape;

    println!("\n{}", "=".repeat(60));
    println!("DATASET SUMMARY");
    println!("{}", "=".repeat(60));
    println!("Shape: {} rows x {} columns", rows, cols);
    println!("\nColumns ({}):", summary.columns.len());
    for name in &summary.columns {
        println!("  - {}", name);
    }

    if verbose {
        println!("\nData Types:");
        for name in &summary.columns {
            if let Some(dtype) = summary.dtypes.get(name) {
                println!("  {}: {}", name, dtype);
            }
        }

        println!("\nMissing Values:");
        if summary.total_missing() == 0 {
            println!("  No missing values");
        } else {
            for name in &summary.columns {
                let count = summary.missing_counts.get(name).copied().unwrap_or(0);
                if count > 0 {
                    println!("  {}: {} ({:.1}%)", name, count, percentage(count, rows));
                }
            }
        }
    }

    println!("\nFirst 3 rows:");
    println!("{}", df.head(Some(3)));
    println!("{}", "=".repeat(60));
    Ok(())
}

fn run_clean(csv: &Path, output: &Path) -> Result<()> {
    println!("Cleaning: {}", csv.display());
    let df = load_table(csv, &DataConfig::default())?;
    let cleaned = basic_cleaning(&df)?;

    println!("Original: {} rows x {} columns", df.height(), df.width());
    println!(
        "Cleaned: {} rows x {} columns",
        cleaned.height(),
        cleaned.width()
    );
    println!("Removed: {} rows", df.height() - cleaned.height());

    export_csv(&cleaned, output)?;
    println!("Cleaned data saved to: {}", output.display());
    Ok(())
}
