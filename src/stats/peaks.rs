use ahash::AHashMap;
use rayon::prelude::*;
use std::sync::Arc;

use super::types::NameEntry;
use crate::demographics::Demographic;

const MIN_PEAK_TOTAL: u64 = 50;
const MIN_PEAK_FRACTION: f64 = 0.00001;
const PEAK_SHORT: usize = 10;
const PEAK_LONG: usize = 20;

/// Identifies one group's stats within one period.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeakKey {
    pub period: Arc<str>,
    pub demographic: Demographic,
}

/// A generation's entry list for one group, moved into the tracker.
#[derive(Debug)]
pub struct GenerationScan {
    pub period: Arc<str>,
    pub population_total: u64,
    pub entries: Vec<NameEntry>,
}

#[derive(Debug, Clone, Copy)]
struct Peak {
    fraction: f64,
    origin: usize,
}

/// Per-group fold over generations, in the order they are scanned.
#[derive(Debug, Default)]
pub struct PeakTracker {
    origins: Vec<(Arc<str>, u64)>,
    peaks: AHashMap<Arc<str>, Peak>,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every qualifying fraction of `scan`, then drops its entries.
    /// An existing peak is replaced unless it is strictly greater, so equal
    /// fractions go to the later generation.
    pub fn scan(&mut self, scan: GenerationScan) {
        let GenerationScan {
            period,
            population_total,
            entries,
        } = scan;
        let origin = self.origins.len();
        self.origins.push((period, population_total));

        for entry in &entries {
            if entry.total < MIN_PEAK_TOTAL {
                continue;
            }
            let fraction = entry.total as f64 / population_total as f64;
            if fraction < MIN_PEAK_FRACTION {
                continue;
            }
            match self.peaks.get_mut(&entry.name) {
                Some(cur) if cur.fraction > fraction => {}
                Some(cur) => *cur = Peak { fraction, origin },
                None => {
                    self.peaks.insert(entry.name.clone(), Peak { fraction, origin });
                }
            }
        }
        drop(entries);
    }

    /// Peak-name lists per origin generation, for origins that won at least
    /// one name.
    pub fn finish(self) -> Vec<(Arc<str>, Vec<NameEntry>)> {
        let mut by_origin: Vec<Vec<(Arc<str>, f64)>> = vec![Vec::new(); self.origins.len()];
        for (name, peak) in self.peaks {
            by_origin[peak.origin].push((name, peak.fraction));
        }

        self.origins
            .into_iter()
            .zip(by_origin)
            .filter(|(_, names)| !names.is_empty())
            .map(|((period, population_total), names)| {
                (period, peak_list(names, population_total))
            })
            .collect()
    }
}

/// Highest fractions first, 20 of them when at least 20 names qualified,
/// otherwise up to 10. Totals are rescaled to the origin population.
fn peak_list(mut names: Vec<(Arc<str>, f64)>, population_total: u64) -> Vec<NameEntry> {
    names.sort_unstable_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    let take = if names.len() >= PEAK_LONG {
        PEAK_LONG
    } else {
        PEAK_SHORT.min(names.len())
    };
    let split = names.len() - take;
    names
        .drain(split..)
        .rev()
        .map(|(name, fraction)| {
            NameEntry::new(name, (fraction * population_total as f64).round() as u64)
        })
        .collect()
}

/// Runs one tracker per group. Groups are independent; each group's scans
/// must already be in generation order.
pub fn track_peaks(
    scans: Vec<(Demographic, Vec<GenerationScan>)>,
) -> AHashMap<PeakKey, Vec<NameEntry>> {
    scans
        .into_par_iter()
        .flat_map_iter(|(demographic, group_scans)| {
            let mut tracker = PeakTracker::new();
            for scan in group_scans {
                tracker.scan(scan);
            }
            tracker
                .finish()
                .into_iter()
                .map(move |(period, names)| (PeakKey { period, demographic }, names))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::{Gender, Religion};

    fn scan(period: &str, population_total: u64, entries: &[(&str, u64)]) -> GenerationScan {
        GenerationScan {
            period: period.into(),
            population_total,
            entries: entries.iter().map(|&(n, t)| NameEntry::new(n, t)).collect(),
        }
    }

    fn find<'a>(out: &'a [(Arc<str>, Vec<NameEntry>)], period: &str) -> Option<&'a Vec<NameEntry>> {
        out.iter().find(|(p, _)| p.as_ref() == period).map(|(_, v)| v)
    }

    #[test]
    fn equal_fraction_goes_to_later_generation() {
        let mut t = PeakTracker::new();
        t.scan(scan("gen-z", 10_000, &[("X", 100)]));
        t.scan(scan("gen-y", 10_000, &[("X", 100)]));
        let out = t.finish();
        assert!(find(&out, "gen-z").is_none());
        assert_eq!(find(&out, "gen-y").unwrap(), &vec![NameEntry::new("X", 100)]);
    }

    #[test]
    fn strictly_greater_earlier_peak_is_kept() {
        // 0.0002 in A, then 0.0001 in B
        let mut t = PeakTracker::new();
        t.scan(scan("a", 250_000, &[("X", 50)]));
        t.scan(scan("b", 500_000, &[("X", 50)]));
        let out = t.finish();
        assert_eq!(out.len(), 1);
        assert_eq!(find(&out, "a").unwrap()[0].total, 50);
    }

    #[test]
    fn later_higher_fraction_replaces() {
        let mut t = PeakTracker::new();
        t.scan(scan("a", 10_000, &[("X", 100)]));
        t.scan(scan("b", 1_000, &[("X", 60)]));
        let out = t.finish();
        assert!(find(&out, "a").is_none());
        assert_eq!(find(&out, "b").unwrap()[0], NameEntry::new("X", 60));
    }

    #[test]
    fn small_totals_and_fractions_are_ignored() {
        let mut t = PeakTracker::new();
        // total below 50
        t.scan(scan("a", 100, &[("Rare", 49)]));
        // fraction below 1e-5
        t.scan(scan("b", 10_000_000, &[("Thin", 99)]));
        assert!(t.finish().is_empty());
    }

    #[test]
    fn list_length_depends_on_qualifying_names() {
        let few: Vec<(String, u64)> = (0..15).map(|i| (format!("n{i:02}"), 100 + i)).collect();
        let few_refs: Vec<(&str, u64)> = few.iter().map(|(n, t)| (n.as_str(), *t)).collect();
        let mut t = PeakTracker::new();
        t.scan(scan("a", 100_000, &few_refs));
        let out = t.finish();
        let list = find(&out, "a").unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0], NameEntry::new("n14", 114));
        assert!(list.windows(2).all(|w| w[0].total >= w[1].total));

        let many: Vec<(String, u64)> = (0..20).map(|i| (format!("n{i:02}"), 100 + i)).collect();
        let many_refs: Vec<(&str, u64)> = many.iter().map(|(n, t)| (n.as_str(), *t)).collect();
        let mut t = PeakTracker::new();
        t.scan(scan("a", 100_000, &many_refs));
        assert_eq!(find(&t.finish(), "a").unwrap().len(), 20);
    }

    #[test]
    fn peaks_attach_to_origin_generation() {
        let mut t = PeakTracker::new();
        t.scan(scan("new", 1_000, &[("A", 100), ("B", 50)]));
        t.scan(scan("old", 2_000, &[("A", 100), ("B", 400)]));
        let out = t.finish();
        assert_eq!(find(&out, "new").unwrap(), &vec![NameEntry::new("A", 100)]);
        assert_eq!(find(&out, "old").unwrap(), &vec![NameEntry::new("B", 400)]);
    }

    #[test]
    fn groups_are_tracked_independently() {
        let jewish = Demographic::new(Religion::Jewish, Gender::All);
        let muslim = Demographic::new(Religion::Muslim, Gender::All);
        let out = track_peaks(vec![
            (jewish, vec![scan("g1", 1_000, &[("X", 100)]), scan("g2", 1_000, &[("X", 50)])]),
            (muslim, vec![scan("g1", 1_000, &[("X", 50)]), scan("g2", 1_000, &[("X", 100)])]),
        ]);
        let key = |period: &str, demographic| PeakKey {
            period: period.into(),
            demographic,
        };
        assert_eq!(out.len(), 2);
        assert!(out.contains_key(&key("g1", jewish)));
        assert!(out.contains_key(&key("g2", muslim)));
    }
}
