use super::types::NameEntry;

/// Quantile boundaries as whole percentiles: deciles up to 90, then every
/// percentile above it.
pub const PERCENTILES: [usize; 19] = [
    10, 20, 30, 40, 50, 60, 70, 80, 90, 91, 92, 93, 94, 95, 96, 97, 98, 99, 100,
];

const TOP_SHORT: usize = 10;
const TOP_LONG: usize = 20;
const TOP_LONG_MIN_ENTRIES: usize = 100;
const TOP_LONG_MIN_TOTAL: u64 = 50;

/// Ascending by total, ties by name.
pub fn sort_entries(entries: &mut [NameEntry]) {
    entries.sort_unstable_by(|a, b| a.total.cmp(&b.total).then_with(|| a.name.cmp(&b.name)));
}

/// "Higher" index for `percent` over `n` sorted entries:
/// `clamp(1, ceil(percent * n / 100), n) - 1`. Requires `n > 0`.
#[inline]
pub fn boundary_index(percent: usize, n: usize) -> usize {
    (percent * n).div_ceil(100).clamp(1, n) - 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantileSummary {
    pub thresholds: Vec<u64>,
    pub totals: Vec<u64>,
}

pub fn summarize(sorted: &[NameEntry]) -> QuantileSummary {
    summarize_at(sorted, &PERCENTILES)
}

/// Thresholds and bucket totals at ascending `percents`, in one forward pass
/// over `sorted`. Buckets cover every entry only when `percents` ends at 100.
/// An empty input yields zeros.
pub fn summarize_at(sorted: &[NameEntry], percents: &[usize]) -> QuantileSummary {
    let n = sorted.len();
    if n == 0 {
        return QuantileSummary {
            thresholds: vec![0; percents.len()],
            totals: vec![0; percents.len()],
        };
    }

    let mut thresholds = Vec::with_capacity(percents.len());
    let mut totals = Vec::with_capacity(percents.len());
    let mut cursor = 0usize;

    for &p in percents {
        let idx = boundary_index(p, n);
        thresholds.push(sorted[idx].total);

        let mut bucket = 0u64;
        while cursor <= idx {
            bucket += sorted[cursor].total;
            cursor += 1;
        }
        totals.push(bucket);
    }

    QuantileSummary { thresholds, totals }
}

/// Most common names of an ascending list, largest first. Dense groups get a
/// longer list.
pub fn top_names(sorted: &[NameEntry]) -> Vec<NameEntry> {
    let n = sorted.len();
    let take = if n > TOP_LONG_MIN_ENTRIES && sorted[n - TOP_LONG].total >= TOP_LONG_MIN_TOTAL {
        TOP_LONG
    } else {
        TOP_SHORT.min(n)
    };
    sorted[n - take..].iter().rev().cloned().collect()
}
