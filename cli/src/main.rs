use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use stocktracer::{
    analysis::{IndicatorBasis, IndicatorConfig, DEFAULT_RSI_PERIOD, DEFAULT_STOCHASTIC_PERIOD},
    prelude::*,
    report::render_text_table,
    services::{load_series_file, write_rows},
    utils::{format_duration, init_logger, parse_weekday, Timer},
};

#[derive(Parser)]
#[command(name = "stocktracer")]
#[command(about = "Analyse a stock's daily bars on a single weekday: Stochastic, RSI and summary statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a CSV file of daily bars (Date,Open,High,Low,Close,Volume)
    Analyze {
        /// Path to the CSV file
        #[arg(short, long)]
        input: PathBuf,
        /// Weekday to keep (name, abbreviation or 0-6 with Monday = 0)
        #[arg(short, long, default_value = "friday")]
        day: String,
        /// Ticker label used in headings and chart titles
        #[arg(short, long, default_value = "TICKER")]
        ticker: String,
        /// Stochastic Oscillator period
        #[arg(long, default_value_t = DEFAULT_STOCHASTIC_PERIOD)]
        period: usize,
        /// RSI period
        #[arg(long, default_value_t = DEFAULT_RSI_PERIOD)]
        rsi_period: usize,
        /// Rows the indicator windows advance over: filtered or daily
        #[arg(long, default_value = "filtered")]
        basis: IndicatorBasis,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Oldest row first instead of newest first
        #[arg(long)]
        ascending: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_logger()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            day,
            ticker,
            period,
            rsi_period,
            basis,
            format,
            ascending,
        } => {
            let timer = Timer::start("analyze command");
            let weekday = parse_weekday(&day)?;
            let ticker = ticker.trim().to_uppercase();
            let series = load_series_file(&input)?;

            let config = AnalysisConfig {
                indicators: IndicatorConfig {
                    stochastic_period: period,
                    rsi_period,
                    ..IndicatorConfig::default()
                },
                basis,
            };

            let analysis = match analyze(&series, weekday, &config) {
                Ok(analysis) => analysis,
                Err(err @ (TracerError::EmptyInput | TracerError::EmptyFilterResult { .. })) => {
                    tracing::warn!("{}", err);
                    eprintln!("{}", err);
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            let (Some(start), Some(end)) = (series.first_date(), series.last_date()) else {
                return Ok(());
            };
            let order = if ascending { SortOrder::Ascending } else { SortOrder::Descending };
            let report = build_report(&ticker, start, end, &analysis, order);

            match format {
                OutputFormat::Table => {
                    println!("{}\n", report.heading);
                    print!("{}", render_text_table(&report.table));
                    println!("\nSummary Statistics\n{}", report.summary_text);
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
                OutputFormat::Csv => {
                    write_rows(std::io::stdout().lock(), &report.table)?;
                }
            }

            tracing::info!("Completed in {}", format_duration(timer.elapsed_ms()));
        }
    }

    Ok(())
}
