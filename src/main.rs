use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use polyphase_sort::constants::BYTES_PER_GB;
use polyphase_sort::external_sort::constants::DEFAULT_OUTPUT_FILE_NAME;
use polyphase_sort::external_sort::sort_file_with_shutdown;
use polyphase_sort::utils::{file_size_bytes, format_bytes, format_duration, setup_logging, throughput};
use polyphase_sort::{CompareMode, ExternalSortConfig, SortStrategy};

#[derive(Parser)]
#[command(name = "polyphase-sort")]
#[command(about = "Sorts a line-delimited text file with an external polyphase merge")]
#[command(version)]
struct Args {
    #[arg(short, long, help = "Input file, one UTF-8 value per line")]
    input: PathBuf,

    #[arg(short, long, help = "Output file (defaults to sorted.txt next to the input)")]
    output: Option<PathBuf>,

    #[arg(short, long, help = "Configuration file (JSON)")]
    config: Option<PathBuf>,

    #[arg(short = 'f', long = "files", help = "Number of auxiliary working files")]
    file_count: Option<usize>,

    #[arg(short, long, value_enum, help = "How values compare")]
    mode: Option<CompareMode>,

    #[arg(short, long, value_enum, help = "Sort strategy")]
    strategy: Option<SortStrategy>,

    #[arg(short, long, help = "Directory for working files")]
    temp_dir: Option<PathBuf>,

    #[arg(short, long, help = "Verbose output")]
    verbose: bool,

    #[arg(long, help = "Write run statistics as JSON to this path")]
    stats_json: Option<PathBuf>,
}

fn default_output(input: &Path) -> PathBuf {
    input
        .parent()
        .map(|parent| parent.join(DEFAULT_OUTPUT_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE_NAME))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExternalSortConfig::from_file(path)?,
        None => ExternalSortConfig::default(),
    };
    if args.file_count.is_some() {
        config.file_count = args.file_count;
    }
    if let Some(mode) = args.mode {
        config.compare_mode = mode;
    }
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if args.temp_dir.is_some() {
        config.temp_directory = args.temp_dir.clone();
    }
    if args.verbose {
        config.verbose = true;
    }
    config.validate()?;

    setup_logging(if config.verbose { "verbose" } else { "normal" })?;

    if !args.input.is_file() {
        anyhow::bail!("Input file does not exist: {}", args.input.display());
    }
    let output = args.output.clone().unwrap_or_else(|| default_output(&args.input));
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let input_bytes = file_size_bytes(&args.input)?;
    info!("Input: {} ({})", args.input.display(), format_bytes(input_bytes));
    info!("Output: {}", output.display());
    match config.strategy {
        SortStrategy::Polyphase => info!(
            "Working files: {} auxiliary + 1 sink",
            config.resolve_file_count(input_bytes)
        ),
        SortStrategy::Baseline => info!(
            "Memory limit: {:.2} GB, chunk size {} MB",
            config.memory_limit_bytes() as f64 / BYTES_PER_GB,
            config.resolve_chunk_size_mb(input_bytes)
        ),
    }

    let shutdown_flag = Arc::new(AtomicBool::new(false));
    let shutdown_flag_clone = shutdown_flag.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown signal received, stopping after the current merge level");
                shutdown_flag_clone.store(true, Ordering::Relaxed);
            }
            Err(e) => warn!("Failed to listen for ctrl+c: {}", e),
        }
    });

    let stats = sort_file_with_shutdown(&args.input, &output, config, shutdown_flag).await?;

    println!("Sort completed");
    println!("========================================");
    println!("Strategy:           {:?}", stats.strategy);
    println!("Records:            {}", stats.total_records);
    println!("Working files:      {}", stats.file_count);
    println!("Runs distributed:   {}", stats.runs_distributed);
    println!("Dummy runs:         {}", stats.dummy_runs);
    println!("Merge levels:       {}", stats.merge_levels);
    println!("Merge passes:       {}", stats.merge_passes);
    if stats.chunks_created > 0 {
        println!("Chunks created:     {}", stats.chunks_created);
    }
    println!("Distribution time:  {}", format_duration(stats.distribution_time_ms));
    println!("Merge time:         {}", format_duration(stats.merge_time_ms));
    println!("Total time:         {}", format_duration(stats.processing_time_ms));
    println!(
        "Throughput:         {:.0} records/sec",
        throughput(stats.total_records, stats.processing_time_ms)
    );

    if let Some(path) = &args.stats_json {
        std::fs::write(path, serde_json::to_string_pretty(&stats)?)?;
        info!("Statistics written to {}", path.display());
    }

    Ok(())
}
