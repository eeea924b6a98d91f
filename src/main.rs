use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use namestats::{periods, records, runtime, stats};

/// Ranked and quantile-bucketed name statistics per religion and gender.
#[derive(Parser, Debug)]
#[command(name = "namestats")]
struct Args {
    /// Source table: gender,religion,name,total,<one column per year>
    input: PathBuf,

    /// Output JSON (default: <input-stem>_stats.json next to the input)
    #[arg(env = "NAMESTATS_OUTPUT")]
    output: Option<PathBuf>,

    /// Year of the first count column
    #[arg(long, default_value_t = 1948, env = "NAMESTATS_START_YEAR")]
    start_year: u16,

    /// JSON list of periods replacing the default ones
    #[arg(long, env = "NAMESTATS_PERIODS")]
    periods: Option<PathBuf>,

    /// Print the profile of this name to stdout after the run
    #[arg(long)]
    lookup: Option<String>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Fail when the resident set exceeds this many MiB
    #[arg(long, env = "NAMESTATS_MAX_RSS_MB")]
    max_rss_mb: Option<u64>,
}

fn default_output_path(input: &Path) -> PathBuf {
    let parent = input
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("names");
    parent.join(format!("{stem}_stats.json"))
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = BufWriter::new(f);
    if pretty {
        serde_json::to_writer_pretty(&mut w, value)?;
    } else {
        serde_json::to_writer(&mut w, value)?;
    }
    w.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("namestats=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    runtime::configure_thread_pool();

    info!(input = %args.input.display(), "reading records");
    let records = records::load_records(&args.input, args.start_year)
        .with_context(|| format!("load {}", args.input.display()))?;
    info!(
        names = records.name_count(),
        records = records.record_count(),
        years = records.year_count(),
        "records loaded"
    );

    let periods = match &args.periods {
        Some(path) => periods::load_periods(path)
            .with_context(|| format!("load periods {}", path.display()))?,
        None => match records.span() {
            Some((first, last)) => periods::canonical_periods(first, last),
            None => Vec::new(),
        },
    };

    let opts = stats::BuildOptions {
        show_progress: !args.no_progress,
        max_rss_bytes: args.max_rss_mb.map(runtime::mb_to_bytes),
    };
    let all = stats::build_all_stats(&records, &periods, &opts)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_json(&output, &all, args.pretty)?;
    info!(output = %output.display(), "stats written");

    if let Some(name) = &args.lookup {
        let profile = stats::profile_name(&records, &all, name)?;
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if args.pretty {
            serde_json::to_writer_pretty(&mut out, &profile)?;
        } else {
            serde_json::to_writer(&mut out, &profile)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
