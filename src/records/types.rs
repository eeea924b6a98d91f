use ahash::AHashMap;
use std::sync::Arc;

use crate::demographics::Demographic;
use crate::error::{Result, StatsError};
use crate::periods::YearPeriod;

/// Yearly counts of one name within one concrete demographic.
#[derive(Debug, Clone)]
pub struct NameRecord {
    pub name: Arc<str>,
    pub demographic: Demographic,
    pub total: u64,
    pub year_counts: Vec<u64>, // year_counts[i] belongs to start_year + i
}

impl NameRecord {
    pub fn new(name: impl Into<Arc<str>>, demographic: Demographic, year_counts: Vec<u64>) -> Self {
        let total = year_counts.iter().sum();
        Self {
            name: name.into(),
            demographic,
            total,
            year_counts,
        }
    }

    /// Like `new`, but checks a total supplied by the source against the counts.
    pub fn with_total(
        name: impl Into<Arc<str>>,
        demographic: Demographic,
        total: u64,
        year_counts: Vec<u64>,
    ) -> Result<Self> {
        let record = Self::new(name, demographic, year_counts);
        if record.total != total {
            return Err(StatsError::TotalMismatch {
                name: record.name.to_string(),
                total,
                sum: record.total,
            });
        }
        Ok(record)
    }

    /// Sum of the counts for the years of `period`. The full stored range
    /// short-circuits to `total`.
    pub fn total_for(&self, start_year: u16, period: &YearPeriod) -> Result<u64> {
        let len = self.year_counts.len() as i64;
        let first = i64::from(period.start) - i64::from(start_year);
        let last = i64::from(period.end) - i64::from(start_year);

        if first == 0 && last == len - 1 {
            return Ok(self.total);
        }
        if first < 0 || last >= len || first > last {
            return Err(StatsError::PeriodOutOfRange {
                start: period.start,
                end: period.end,
                first: start_year,
                last: (i64::from(start_year) + len - 1).max(0) as u16,
            });
        }
        Ok(self.year_counts[first as usize..=last as usize].iter().sum())
    }
}

/// All records of one name, across demographics.
#[derive(Debug, Clone)]
pub struct NameGroup {
    pub name: Arc<str>,
    pub records: Vec<NameRecord>,
}

/// The full input: records grouped by name in first-seen order, all sharing
/// the same yearly span.
#[derive(Debug, Clone)]
pub struct RecordSet {
    start_year: u16,
    year_count: usize,
    groups: Vec<NameGroup>,
    index: AHashMap<Arc<str>, usize>,
    n_records: usize,
}

impl RecordSet {
    pub fn new(start_year: u16, year_count: usize) -> Self {
        Self {
            start_year,
            year_count,
            groups: Vec::new(),
            index: AHashMap::new(),
            n_records: 0,
        }
    }

    pub fn push(&mut self, record: NameRecord) -> Result<()> {
        if record.year_counts.len() != self.year_count {
            return Err(StatsError::YearCountMismatch {
                name: record.name.to_string(),
                got: record.year_counts.len(),
                expected: self.year_count,
            });
        }
        self.n_records += 1;
        if let Some(&pos) = self.index.get(&record.name) {
            self.groups[pos].records.push(record);
            return Ok(());
        }
        let pos = self.groups.len();
        self.index.insert(record.name.clone(), pos);
        self.groups.push(NameGroup {
            name: record.name.clone(),
            records: vec![record],
        });
        Ok(())
    }

    #[inline]
    pub fn start_year(&self) -> u16 {
        self.start_year
    }

    #[inline]
    pub fn year_count(&self) -> usize {
        self.year_count
    }

    /// Inclusive `(first, last)` years, or `None` when no years are stored.
    pub fn span(&self) -> Option<(u16, u16)> {
        let n = u16::try_from(self.year_count).ok()?.checked_sub(1)?;
        Some((self.start_year, self.start_year.checked_add(n)?))
    }

    pub fn groups(&self) -> &[NameGroup] {
        &self.groups
    }

    pub fn get(&self, name: &str) -> Option<&NameGroup> {
        self.index.get(name).map(|&pos| &self.groups[pos])
    }

    #[inline]
    pub fn name_count(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn record_count(&self) -> usize {
        self.n_records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demographics::{Gender, Religion};

    fn jm() -> Demographic {
        Demographic::new(Religion::Jewish, Gender::Men)
    }

    #[test]
    fn full_span_uses_precomputed_total() {
        let r = NameRecord::new("Noa", jm(), vec![1, 2, 3, 4]);
        let p = YearPeriod::new(2000, 2003, "all", "");
        assert_eq!(r.total_for(2000, &p).unwrap(), 10);
    }

    #[test]
    fn sub_range_is_inclusive_sum() {
        let r = NameRecord::new("Noa", jm(), vec![1, 2, 3, 4]);
        assert_eq!(r.total_for(2000, &YearPeriod::new(2001, 2002, "mid", "")).unwrap(), 5);
        assert_eq!(r.total_for(2000, &YearPeriod::new(2003, 2003, "1y", "")).unwrap(), 4);
    }

    #[test]
    fn out_of_range_is_an_error() {
        let r = NameRecord::new("Noa", jm(), vec![1, 2, 3, 4]);
        let err = r
            .total_for(2000, &YearPeriod::new(1999, 2001, "early", ""))
            .unwrap_err();
        assert!(matches!(
            err,
            StatsError::PeriodOutOfRange { first: 2000, last: 2003, .. }
        ));
        assert!(r.total_for(2000, &YearPeriod::new(2002, 2004, "late", "")).is_err());
    }

    #[test]
    fn supplied_total_must_match() {
        assert!(NameRecord::with_total("Noa", jm(), 10, vec![1, 2, 3, 4]).is_ok());
        assert!(matches!(
            NameRecord::with_total("Noa", jm(), 11, vec![1, 2, 3, 4]),
            Err(StatsError::TotalMismatch { total: 11, sum: 10, .. })
        ));
    }

    #[test]
    fn record_set_groups_by_name_in_first_seen_order() {
        let jw = Demographic::new(Religion::Jewish, Gender::Women);
        let mut set = RecordSet::new(2000, 2);
        set.push(NameRecord::new("Noa", jw, vec![1, 1])).unwrap();
        set.push(NameRecord::new("Adam", jm(), vec![2, 0])).unwrap();
        set.push(NameRecord::new("Noa", jm(), vec![0, 3])).unwrap();

        let names: Vec<_> = set.groups().iter().map(|g| g.name.as_ref()).collect();
        assert_eq!(names, ["Noa", "Adam"]);
        assert_eq!(set.get("Noa").unwrap().records.len(), 2);
        assert_eq!(set.record_count(), 3);
        assert_eq!(set.span(), Some((2000, 2001)));

        assert!(matches!(
            set.push(NameRecord::new("Eli", jm(), vec![1, 2, 3])),
            Err(StatsError::YearCountMismatch { got: 3, expected: 2, .. })
        ));
        assert_eq!(RecordSet::new(2000, 0).span(), None);
    }
}
