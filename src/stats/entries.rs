use ahash::AHashMap;
use smallvec::SmallVec;
use std::sync::Arc;

use super::types::NameEntry;
use crate::demographics::Demographic;
use crate::error::Result;
use crate::periods::YearPeriod;
use crate::records::RecordSet;

/// One name's nonzero period totals, per concrete demographic.
#[derive(Debug, Clone)]
pub struct NameTotals {
    pub name: Arc<str>,
    pub totals: SmallVec<[(Demographic, u64); 8]>,
}

impl NameTotals {
    /// Sum of the totals whose demographic belongs to `target`.
    #[inline]
    pub fn total_for(&self, target: Demographic) -> u64 {
        self.totals
            .iter()
            .filter(|(d, _)| d.matches(target))
            .map(|&(_, t)| t)
            .sum()
    }
}

/// Entry lists for one period, owned by the step that processes it.
#[derive(Debug, Default)]
pub struct PeriodEntries {
    pub by_demographic: AHashMap<Demographic, Vec<NameEntry>>,
    pub by_name: Vec<NameTotals>,
}

/// Walks every record once and indexes its period total both by exact
/// demographic and by name. Zero totals are skipped.
pub fn build_entries(records: &RecordSet, period: &YearPeriod) -> Result<PeriodEntries> {
    let start_year = records.start_year();
    let mut out = PeriodEntries {
        by_demographic: AHashMap::with_capacity(8),
        by_name: Vec::with_capacity(records.name_count()),
    };

    for group in records.groups() {
        let mut totals: SmallVec<[(Demographic, u64); 8]> = SmallVec::new();
        for record in &group.records {
            let total = record.total_for(start_year, period)?;
            if total == 0 {
                continue;
            }
            out.by_demographic
                .entry(record.demographic)
                .or_default()
                .push(NameEntry::new(group.name.clone(), total));
            totals.push((record.demographic, total));
        }
        if !totals.is_empty() {
            out.by_name.push(NameTotals {
                name: group.name.clone(),
                totals,
            });
        }
    }
    Ok(out)
}

impl PeriodEntries {
    /// Takes the exact bucket for `target` when one exists.
    pub fn take_exact(&mut self, target: Demographic) -> Option<Vec<NameEntry>> {
        self.by_demographic.remove(&target)
    }

    /// Folds the per-name lists through the membership test. One entry per
    /// name with a nonzero sum; order follows the record set.
    pub fn collect(&self, target: Demographic) -> Vec<NameEntry> {
        self.by_name
            .iter()
            .filter_map(|n| {
                let total = n.total_for(target);
                (total != 0).then(|| NameEntry::new(n.name.clone(), total))
            })
            .collect()
    }

    /// Entry list for `target`: the exact bucket if present, else the fold.
    pub fn resolve(&mut self, target: Demographic) -> Vec<NameEntry> {
        match self.take_exact(target) {
            Some(entries) => entries,
            None => self.collect(target),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::{Gender, Religion};
    use crate::records::NameRecord;

    fn d(r: Religion, g: Gender) -> Demographic {
        Demographic::new(r, g)
    }

    fn sample() -> RecordSet {
        let mut set = RecordSet::new(2000, 3);
        let rows = [
            ("Adam", d(Religion::Jewish, Gender::Men), vec![1, 2, 3]),
            ("Adam", d(Religion::Muslim, Gender::Men), vec![0, 0, 4]),
            ("Noa", d(Religion::Jewish, Gender::Women), vec![5, 0, 0]),
            ("Noa", d(Religion::Jewish, Gender::Men), vec![0, 1, 0]),
            ("Yam", d(Religion::Druze, Gender::Women), vec![2, 0, 0]),
        ];
        for (name, dem, counts) in rows {
            set.push(NameRecord::new(name, dem, counts)).unwrap();
        }
        set
    }

    fn as_pairs(entries: &[NameEntry]) -> Vec<(&str, u64)> {
        entries.iter().map(|e| (e.name.as_ref(), e.total)).collect()
    }

    #[test]
    fn indexes_by_demographic_and_by_name() {
        let set = sample();
        let period = YearPeriod::new(2000, 2002, "all", "");
        let entries = build_entries(&set, &period).unwrap();

        let jm = &entries.by_demographic[&d(Religion::Jewish, Gender::Men)];
        assert_eq!(as_pairs(jm), [("Adam", 6), ("Noa", 1)]);
        assert_eq!(entries.by_demographic.len(), 4);
        assert_eq!(entries.by_name.len(), 3);
        assert_eq!(entries.by_name[0].totals.len(), 2);
    }

    #[test]
    fn zero_totals_contribute_nothing() {
        let set = sample();
        let period = YearPeriod::new(2002, 2002, "1y", "");
        let entries = build_entries(&set, &period).unwrap();

        // Noa and Yam have nothing in 2002
        assert_eq!(entries.by_name.len(), 1);
        assert!(!entries
            .by_demographic
            .contains_key(&d(Religion::Jewish, Gender::Women)));
    }

    #[test]
    fn out_of_range_period_fails() {
        let set = sample();
        let period = YearPeriod::new(1999, 2002, "bad", "");
        assert!(build_entries(&set, &period).is_err());
    }

    #[test]
    fn resolves_exact_and_aggregate_targets() {
        let set = sample();
        let period = YearPeriod::new(2000, 2002, "all", "");
        let mut entries = build_entries(&set, &period).unwrap();

        let jewish = entries.resolve(d(Religion::Jewish, Gender::All));
        assert_eq!(as_pairs(&jewish), [("Adam", 6), ("Noa", 6)]);

        let men = entries.resolve(d(Religion::All, Gender::Men));
        assert_eq!(as_pairs(&men), [("Adam", 10), ("Noa", 1)]);

        let everyone = entries.resolve(d(Religion::All, Gender::All));
        assert_eq!(as_pairs(&everyone), [("Adam", 10), ("Noa", 6), ("Yam", 2)]);

        let dw = entries.resolve(d(Religion::Druze, Gender::Women));
        assert_eq!(as_pairs(&dw), [("Yam", 2)]);
        // the exact bucket was moved out; the fold gives the same answer
        assert!(entries.take_exact(d(Religion::Druze, Gender::Women)).is_none());
        assert_eq!(as_pairs(&entries.collect(d(Religion::Druze, Gender::Women))), [("Yam", 2)]);

        assert!(entries.resolve(d(Religion::Christian, Gender::All)).is_empty());
    }
}
