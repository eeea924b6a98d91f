use rayon::ThreadPoolBuilder;
use std::sync::Once;
use tracing::{info, warn};

use crate::error::{Result, StatsError};

const MB: u64 = 1024 * 1024;

/// Environment variables consulted for the worker count, first hit wins.
const THREAD_HINTS: [&str; 6] = [
    "NAMESTATS_THREADS",
    "RAYON_NUM_THREADS",
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "PBS_NP",
    "OMP_NUM_THREADS",
];

fn positive_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|&n| n > 0)
}

/// Worker count and the hint it came from.
fn thread_hint(keys: &[&'static str]) -> Option<(usize, &'static str)> {
    keys.iter().find_map(|&key| {
        let raw = std::env::var(key).ok()?;
        positive_count(&raw).map(|n| (n, key))
    })
}

fn worker_count() -> (usize, &'static str) {
    thread_hint(&THREAD_HINTS).unwrap_or_else(|| {
        let n = std::thread::available_parallelism().map_or(1, |n| n.get());
        (n, "available_parallelism")
    })
}

/// Builds the global rayon pool once. Later calls are no-ops.
pub fn configure_thread_pool() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let (threads, hint) = worker_count();
        let built = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("namestats-worker-{i}"))
            .build_global();
        match built {
            Ok(()) => info!(threads, hint, "rayon pool configured"),
            Err(err) => warn!(%err, "rayon pool already set; keeping it"),
        }
    });
}

/// Resident set size from `/proc/self/statm` (second field, in pages).
fn current_rss_bytes() -> Option<u64> {
    let statm = std::fs::read_to_string("/proc/self/statm").ok()?;
    let pages: u64 = statm.split_whitespace().nth(1)?.parse().ok()?;
    // SAFETY: sysconf has no preconditions.
    let page = u64::try_from(unsafe { libc::sysconf(libc::_SC_PAGESIZE) }).ok()?;
    (page > 0).then(|| pages.saturating_mul(page))
}

/// Logs the resident set size after `stage` and fails when it exceeds
/// `budget_bytes`. Silent where `/proc` is unavailable.
pub fn report_memory(stage: &str, budget_bytes: Option<u64>) -> Result<()> {
    let Some(rss) = current_rss_bytes() else {
        return Ok(());
    };
    match budget_bytes {
        Some(limit) => {
            info!(stage, rss_mb = rss / MB, limit_mb = limit / MB, "memory");
            if rss > limit {
                return Err(StatsError::MemoryBudget {
                    rss_mb: rss / MB,
                    limit_mb: limit / MB,
                });
            }
        }
        None => info!(stage, rss_mb = rss / MB, "memory"),
    }
    Ok(())
}

pub fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(MB)
}
