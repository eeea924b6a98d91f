use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use super::entries::build_entries;
use super::peaks::{GenerationScan, PeakKey, track_peaks};
use super::quantiles::{sort_entries, summarize, top_names};
use super::types::{
    AllStats, DemographicGroupStats, GroupTable, NameEntry, PeriodStats, quantile_labels,
};
use crate::demographics::Demographic;
use crate::error::{Result, StatsError};
use crate::periods::{YearPeriod, validate_periods};
use crate::records::RecordSet;
use crate::runtime;

const SPARSE_GROUP: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub show_progress: bool,
    pub max_rss_bytes: Option<u64>,
}

/// Stats for one group from its (unsorted) entry list. Hands the sorted list
/// back for callers that keep it.
pub fn group_stats(
    period: &str,
    demographic: Demographic,
    mut entries: Vec<NameEntry>,
) -> (DemographicGroupStats, Vec<NameEntry>) {
    sort_entries(&mut entries);
    if entries.len() < SPARSE_GROUP {
        warn!(
            period,
            group = %demographic,
            names = entries.len(),
            "sparse group; quantiles may be noisy"
        );
    }

    let summary = summarize(&entries);
    let stats = DemographicGroupStats {
        name_count: entries.len(),
        population_total: entries.iter().map(|e| e.total).sum(),
        quantile_thresholds: summary.thresholds,
        quantile_totals: summary.totals,
        top_names: top_names(&entries),
        peak_names: None,
    };
    (stats, entries)
}

/// Group stats for every target of one period, in target order. For
/// generation periods the sorted entry lists are returned as well.
fn build_period(
    records: &RecordSet,
    period: &YearPeriod,
) -> Result<(Vec<DemographicGroupStats>, Option<Vec<Vec<NameEntry>>>)> {
    let t0 = Instant::now();
    let mut entries = build_entries(records, period)?;
    let t_entries = t0.elapsed().as_secs_f64();

    // exact buckets are moved out up front so the fold can be shared
    let jobs: Vec<(Demographic, Option<Vec<NameEntry>>)> = Demographic::targets()
        .map(|t| (t, entries.take_exact(t)))
        .collect();

    let outcomes: Vec<(DemographicGroupStats, Option<Vec<NameEntry>>)> = jobs
        .into_par_iter()
        .map(|(target, exact)| {
            let list = exact.unwrap_or_else(|| entries.collect(target));
            let (stats, sorted) = group_stats(&period.slug, target, list);
            (stats, period.generation.then_some(sorted))
        })
        .collect();
    drop(entries);

    debug!(
        entries_s = t_entries,
        total_s = t0.elapsed().as_secs_f64(),
        "period timings"
    );

    let (stats, retained): (Vec<_>, Vec<_>) = outcomes.into_iter().unzip();
    let retained = if period.generation {
        Some(retained.into_iter().flatten().collect())
    } else {
        None
    };
    Ok((stats, retained))
}

fn check_periods(records: &RecordSet, periods: &[YearPeriod]) -> Result<()> {
    match records.span() {
        Some((first, last)) => validate_periods(periods, first, last),
        None => match periods.first() {
            Some(p) => Err(StatsError::InvalidPeriod {
                slug: p.slug.clone(),
                reason: "record set has no years".into(),
            }),
            None => Ok(()),
        },
    }
}

/// Runs every period, then the generational peak pass, and assembles the
/// output.
pub fn build_all_stats(
    records: &RecordSet,
    periods: &[YearPeriod],
    opts: &BuildOptions,
) -> Result<AllStats> {
    check_periods(records, periods)?;
    let t0 = Instant::now();

    let pb = if opts.show_progress {
        ProgressBar::new(periods.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} periods {msg}") {
        pb.set_style(style.progress_chars("=>-"));
    }

    let mut tables: Vec<Vec<DemographicGroupStats>> = Vec::with_capacity(periods.len());
    let mut scans: Vec<Vec<GenerationScan>> =
        (0..Demographic::COUNT).map(|_| Vec::new()).collect();

    for period in periods {
        let _span = info_span!("period", slug = %period.slug).entered();
        pb.set_message(period.slug.clone());

        let (groups, retained) = build_period(records, period)?;
        info!(
            start = period.start,
            end = period.end,
            generation = period.generation,
            population = groups[0].population_total,
            names = groups[0].name_count,
            "period built"
        );

        if let Some(retained) = retained {
            let slug: Arc<str> = period.slug.as_str().into();
            for ((group_scans, entries), stats) in scans.iter_mut().zip(retained).zip(&groups) {
                group_scans.push(GenerationScan {
                    period: slug.clone(),
                    population_total: stats.population_total,
                    entries,
                });
            }
        }
        tables.push(groups);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let mut peaks = track_peaks(Demographic::targets().zip(scans).collect());
    info!(groups_with_peaks = peaks.len(), "peak scan done");
    runtime::report_memory("after peak scan", opts.max_rss_bytes)?;

    let mut out = Vec::with_capacity(periods.len());
    for (period, groups) in periods.iter().zip(tables) {
        let slug: Arc<str> = period.slug.as_str().into();
        let groups = Demographic::targets()
            .zip(groups)
            .map(|(demographic, stats)| {
                let key = PeakKey {
                    period: slug.clone(),
                    demographic,
                };
                match peaks.remove(&key) {
                    Some(names) => stats.with_peak_names(names),
                    None => stats,
                }
            })
            .collect();
        out.push(PeriodStats {
            year_period: period.clone(),
            by_religion_and_gender: GroupTable::from_ordered(groups),
        });
    }

    info!(
        periods = out.len(),
        wall_s = t0.elapsed().as_secs_f64(),
        "stats built"
    );
    Ok(AllStats {
        quantile_labels: quantile_labels(),
        periods: out,
    })
}
