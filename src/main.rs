//! CLI entry point for the listing tools.
//!
//! Provides subcommands for scraping flat listings, merging the scraped
//! spreadsheets, checking a scrape against a reference spreadsheet, and
//! charting the merged data.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use listing_tools::{
    compare::{compare, extra_in_candidate},
    config::Workspace,
    fetch::BasicClient,
    files::spreadsheet_choices,
    listing::Dataset,
    merge::merge_dir,
    output::{RunSummary, append_record, format_elapsed, log_result, render_json, render_text},
    report,
    scrape::{
        City, DEFAULT_MAX_AREA, DEFAULT_MIN_AREA, DEFAULT_PAGES, Deal, Rooms, Scraper, SearchQuery,
        offers_to_table, parse_area_bounds, parse_rooms_list,
    },
    select::{ask, choose, choose_many},
    sheet::write_xlsx,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "listing_tools")]
#[command(about = "Scrape, merge, check and chart real-estate listings", long_about = None)]
struct Cli {
    /// Project root holding atest/, raw/ and figures/ (default: $LISTINGS_ROOT or .)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a scraped spreadsheet against a reference spreadsheet
    Compare {
        /// Reference spreadsheet (chosen from atest/ when omitted)
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Spreadsheet to check (chosen from raw/ when omitted)
        #[arg(short, long)]
        candidate: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Also list URLs found only in the candidate
        #[arg(long, default_value_t = false)]
        show_extra: bool,

        /// CSV file to append the run summary to
        #[arg(long, default_value = "logs/autotest_history.csv")]
        history: PathBuf,
    },
    /// Merge every spreadsheet in raw/ into raw/final/
    Merge {
        /// Name of the merged workbook
        #[arg(short, long, default_value = "merged_data.xlsx")]
        output: String,
    },
    /// Scrape flat listings from cian.ru into raw/
    Scrape {
        #[arg(long, value_enum)]
        city: Option<City>,

        #[arg(long, value_enum)]
        deal: Option<Deal>,

        /// Room types, e.g. `studio,1,2`
        #[arg(long)]
        rooms: Option<String>,

        /// Minimum total area, m²
        #[arg(long)]
        min_area: Option<u32>,

        /// Maximum total area, m²
        #[arg(long)]
        max_area: Option<u32>,

        /// Maximum number of result pages
        #[arg(short, long, default_value_t = DEFAULT_PAGES)]
        pages: u32,

        /// Seconds to wait between pages
        #[arg(long, default_value_t = 2)]
        delay: u64,
    },
    /// Build charts and a summary from the merged spreadsheet
    Report {
        /// Workbook in raw/final/ to analyze
        #[arg(short, long, default_value = "merged_data.xlsx")]
        input: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/listing_tools.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("listing_tools.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let workspace = Workspace::resolve(cli.root);
    info!(root = %workspace.root().display(), "Workspace resolved");

    match cli.command {
        Commands::Compare {
            reference,
            candidate,
            format,
            show_extra,
            history,
        } => {
            run_compare(&workspace, reference, candidate, format, show_extra, &history)?;
        }
        Commands::Merge { output } => {
            let start = Instant::now();
            let outcome = merge_dir(&workspace.raw_dir(), &workspace.final_dir(), &output)?;

            for (file, reason) in &outcome.skipped_files {
                println!("Skipped {file}: {reason}");
            }
            match &outcome.output {
                Some(path) => println!(
                    "Merged {} files ({} rows) into {} in {:.1} s",
                    outcome.merged_files.len(),
                    outcome.rows,
                    path.display(),
                    start.elapsed().as_secs_f64()
                ),
                None => println!(
                    "No readable spreadsheets in {}, nothing written",
                    workspace.raw_dir().display()
                ),
            }
        }
        Commands::Scrape {
            city,
            deal,
            rooms,
            min_area,
            max_area,
            pages,
            delay,
        } => {
            let city = match city {
                Some(city) => city,
                None => *choose("Choose a city", &City::ALL)?,
            };
            let deal = match deal {
                Some(deal) => deal,
                None => *choose("Choose a deal type", &Deal::ALL)?,
            };
            let rooms = match rooms {
                Some(rooms) => parse_rooms_list(&rooms)?,
                None => choose_many("Choose room types:", &Rooms::ALL)?
                    .into_iter()
                    .copied()
                    .collect(),
            };
            let (min_area, max_area) = match (min_area, max_area) {
                (Some(min), Some(max)) => (min, max),
                (min, max) => {
                    let min = match min {
                        Some(v) => v.to_string(),
                        None => ask(&format!("Minimum area, m² (default {DEFAULT_MIN_AREA})"))?,
                    };
                    let max = match max {
                        Some(v) => v.to_string(),
                        None => ask(&format!("Maximum area, m² (default {DEFAULT_MAX_AREA})"))?,
                    };
                    parse_area_bounds(&min, &max)
                }
            };

            let query = SearchQuery {
                city,
                deal,
                rooms,
                min_area,
                max_area,
            };

            run_scrape(&workspace, &query, pages, Duration::from_secs(delay)).await?;
        }
        Commands::Report { input } => {
            let outcome = report::run(
                &workspace.final_dir().join(&input),
                &workspace.filters_file(),
                &workspace.figures_dir(),
            )?;

            for (task, reason) in &outcome.failed {
                println!("Task {task} skipped: {reason}");
            }
            for (task, reason) in &outcome.charts_failed {
                println!("Task {task} chart not saved: {reason}");
            }
            println!(
                "{} of {} tasks done over {} flats, see {}",
                outcome.completed.len(),
                report::tasks::TASKS.len(),
                outcome.flats,
                workspace.figures_dir().display()
            );
        }
    }

    Ok(())
}

/// Loads both spreadsheets, compares them, prints and logs the result, and
/// appends a summary row to `history`.
#[tracing::instrument(skip(workspace, format, show_extra))]
fn run_compare(
    workspace: &Workspace,
    reference: Option<PathBuf>,
    candidate: Option<PathBuf>,
    format: Format,
    show_extra: bool,
    history: &Path,
) -> Result<()> {
    let reference = match reference {
        Some(path) => path,
        None => pick_file(&workspace.atest_dir(), "Choose the reference file")?,
    };
    let candidate = match candidate {
        Some(path) => path,
        None => pick_file(&workspace.raw_dir(), "Choose the file to check")?,
    };

    let start = Instant::now();

    let reference_data = Dataset::load(&reference)
        .with_context(|| format!("failed to load reference {}", reference.display()))?;
    let candidate_data = Dataset::load(&candidate)
        .with_context(|| format!("failed to load candidate {}", candidate.display()))?;

    println!("Reference rows: {}", reference_data.len());
    println!("Candidate rows: {}", candidate_data.len());
    info!(
        reference_rows = reference_data.len(),
        candidate_rows = candidate_data.len(),
        "Datasets loaded"
    );

    let result = compare(&reference_data, &candidate_data);

    let reference_name = display_name(&reference);
    let candidate_name = display_name(&candidate);

    match format {
        Format::Text => print!("{}", render_text(&result)),
        Format::Json => println!("{}", render_json(&reference_name, &candidate_name, &result)?),
    }

    let extra = extra_in_candidate(&reference_data, &candidate_data);
    if !extra.is_empty() {
        info!(count = extra.len(), "Listings found only in candidate");
        if show_extra {
            println!("\nOnly in candidate ({}):", extra.len());
            for url in &extra {
                println!("  {url}");
            }
        }
    }

    let elapsed = start.elapsed();
    let summary = RunSummary::new(
        &reference_name,
        &candidate_name,
        reference_data.len(),
        candidate_data.len(),
        &result,
        elapsed,
    );
    log_result(&summary, &result);
    println!("\nElapsed: {}", format_elapsed(elapsed));

    append_record(history, &summary)?;
    Ok(())
}

#[tracing::instrument(skip(workspace, query), fields(file = %query.base_filename()))]
async fn run_scrape(workspace: &Workspace, query: &SearchQuery, pages: u32, delay: Duration) -> Result<()> {
    let start = Instant::now();
    let scraper = Scraper::new(BasicClient::new()?).with_page_delay(delay);

    let pb = ProgressBar::new(pages as u64);
    pb.set_style(ProgressStyle::with_template("{msg} [{bar:40}] page {pos}/{len}")?.progress_chars("=> "));
    pb.set_message("Scraping");

    let mut total = 0;
    let collected = scraper
        .collect(query, pages, |page, count| {
            total += count;
            pb.set_position(page as u64);
            pb.set_message(format!("{total} offers"));
        })
        .await;
    pb.finish_and_clear();
    let offers = collected?;

    if offers.is_empty() {
        warn!("No offers found");
        println!("No offers found, nothing written");
        return Ok(());
    }

    let path = workspace.raw_dir().join(query.filename_at(Local::now()));
    write_xlsx(&path, &offers_to_table(&offers, query.deal))?;

    println!(
        "Saved {} offers to {} in {}",
        offers.len(),
        path.display(),
        format_elapsed(start.elapsed())
    );
    Ok(())
}

fn pick_file(dir: &Path, title: &str) -> Result<PathBuf> {
    let files = spreadsheet_choices(dir)?;
    let name = choose(title, &files)?;
    Ok(dir.join(name))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
