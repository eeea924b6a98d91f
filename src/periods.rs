use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Result, StatsError};

/// Closed, inclusive year range over which counts are summed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearPeriod {
    pub start: u16,
    pub end: u16,
    pub slug: String,
    pub description: String,
    /// Generation periods feed the peak tracker. Not part of the output.
    #[serde(default, skip_serializing)]
    pub generation: bool,
}

impl YearPeriod {
    pub fn new(start: u16, end: u16, slug: &str, description: &str) -> Self {
        Self {
            start,
            end,
            slug: slug.to_string(),
            description: description.to_string(),
            generation: false,
        }
    }

    pub fn generation(start: u16, end: u16, slug: &str, description: &str) -> Self {
        Self {
            generation: true,
            ..Self::new(start, end, slug, description)
        }
    }

    /// Clips to `[first, last]`, or `None` when there is no overlap.
    fn clip(mut self, first: u16, last: u16) -> Option<Self> {
        self.start = self.start.max(first);
        self.end = self.end.min(last);
        (self.start <= self.end).then_some(self)
    }
}

// (start, end, slug, description), newest first
const GENERATIONS: [(u16, u16, &str, &str); 5] = [
    (2013, 2024, "gen-alpha", "Generation Alpha"),
    (1997, 2012, "gen-z", "Generation Z"),
    (1981, 1996, "gen-y", "Generation Y"),
    (1965, 1980, "gen-x", "Generation X"),
    (0, 1964, "gen-baby-boom", "Baby boomers"),
];

/// The default period list for data spanning `[first, last]`: the full span,
/// the last year, the last five years, then generations newest first.
pub fn canonical_periods(first: u16, last: u16) -> Vec<YearPeriod> {
    if first > last {
        return Vec::new();
    }
    let mut periods = vec![
        YearPeriod::new(first, last, "all", "All data"),
        YearPeriod::new(last, last, "1y", "Last year"),
        YearPeriod::new(last.saturating_sub(4).max(first), last, "5y", "Last 5 years"),
    ];
    periods.extend(
        GENERATIONS
            .iter()
            .filter_map(|&(s, e, slug, desc)| YearPeriod::generation(s, e, slug, desc).clip(first, last)),
    );
    periods
}

/// Checks a configured period list against the data span.
pub fn validate_periods(periods: &[YearPeriod], first: u16, last: u16) -> Result<()> {
    let mut seen = AHashSet::with_capacity(periods.len());
    for p in periods {
        let invalid = |reason: String| StatsError::InvalidPeriod {
            slug: p.slug.clone(),
            reason,
        };
        if p.slug.is_empty() {
            return Err(invalid("empty slug".into()));
        }
        if !seen.insert(p.slug.as_str()) {
            return Err(invalid("duplicate slug".into()));
        }
        if p.start > p.end {
            return Err(invalid(format!("start {} after end {}", p.start, p.end)));
        }
        if p.start < first || p.end > last {
            return Err(invalid(format!(
                "{}-{} outside data span {}-{}",
                p.start, p.end, first, last
            )));
        }
    }
    Ok(())
}

pub fn load_periods(path: &Path) -> Result<Vec<YearPeriod>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
