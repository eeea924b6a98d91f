use serde::Serialize;

use super::quantiles::PERCENTILES;
use super::types::{AllStats, DemographicGroupStats};
use crate::demographics::{Demographic, Gender, Religion};
use crate::error::Result;
use crate::records::RecordSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NameGroupProfile {
    pub religion: Religion,
    pub gender: Gender,
    pub total: u64,
    pub fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decile: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamePeriodProfile {
    pub slug: String,
    pub groups: Vec<NameGroupProfile>,
}

/// Where one name sits within every group of every period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameProfile {
    pub name: String,
    pub periods: Vec<NamePeriodProfile>,
}

/// Percentile label of the first quantile whose threshold reaches `total`.
pub fn quantile_band(total: u64, stats: &DemographicGroupStats) -> Option<u32> {
    stats
        .quantile_thresholds
        .iter()
        .position(|&t| total <= t)
        .map(|i| PERCENTILES[i] as u32)
}

fn group_profile(demographic: Demographic, total: u64, stats: &DemographicGroupStats) -> NameGroupProfile {
    let fraction = if stats.population_total == 0 {
        0.0
    } else {
        total as f64 / stats.population_total as f64
    };
    let band = if total == 0 {
        None
    } else {
        quantile_band(total, stats)
    };
    NameGroupProfile {
        religion: demographic.religion,
        gender: demographic.gender,
        total,
        fraction,
        decile: band.map(|v| v.div_ceil(10)),
        percentile: band.filter(|&v| v > 90),
    }
}

/// Profiles `name` against already computed stats. Names absent from the
/// record set get zero totals everywhere.
pub fn profile_name(records: &RecordSet, stats: &AllStats, name: &str) -> Result<NameProfile> {
    let named = records.get(name).map(|g| g.records.as_slice()).unwrap_or(&[]);

    let mut periods = Vec::with_capacity(stats.periods.len());
    for period in &stats.periods {
        let mut totals = Vec::with_capacity(named.len());
        for record in named {
            totals.push((
                record.demographic,
                record.total_for(records.start_year(), &period.year_period)?,
            ));
        }

        let groups = period
            .by_religion_and_gender
            .iter()
            .map(|(target, group)| {
                let total = totals
                    .iter()
                    .filter(|(d, _)| d.matches(target))
                    .map(|&(_, t)| t)
                    .sum();
                group_profile(target, total, group)
            })
            .collect();
        periods.push(NamePeriodProfile {
            slug: period.year_period.slug.clone(),
            groups,
        });
    }

    Ok(NameProfile {
        name: name.to_string(),
        periods,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::YearPeriod;
    use crate::records::NameRecord;
    use crate::stats::driver::{BuildOptions, build_all_stats};

    fn sample() -> (RecordSet, AllStats) {
        let mut set = RecordSet::new(2000, 2);
        let jm = Demographic::new(Religion::Jewish, Gender::Men);
        let jw = Demographic::new(Religion::Jewish, Gender::Women);
        for i in 0..20u64 {
            set.push(NameRecord::new(format!("m{i:02}"), jm, vec![i + 1, 0])).unwrap();
        }
        set.push(NameRecord::new("Noa", jw, vec![3, 4])).unwrap();
        set.push(NameRecord::new("m19", jw, vec![1, 0])).unwrap();
        let periods = vec![
            YearPeriod::new(2000, 2001, "all", ""),
            YearPeriod::new(2001, 2001, "1y", ""),
        ];
        let stats = build_all_stats(&set, &periods, &BuildOptions::default()).unwrap();
        (set, stats)
    }

    fn group<'a>(p: &'a NamePeriodProfile, r: Religion, g: Gender) -> &'a NameGroupProfile {
        p.groups
            .iter()
            .find(|x| x.religion == r && x.gender == g)
            .unwrap()
    }

    #[test]
    fn top_name_is_in_the_upper_percentiles() {
        let (set, stats) = sample();
        let profile = profile_name(&set, &stats, "m19").unwrap();
        let all = &profile.periods[0];

        let jm = group(all, Religion::Jewish, Gender::Men);
        assert_eq!(jm.total, 20);
        // with 20 names the 96th..100th boundaries all land on the maximum
        assert_eq!(jm.percentile, Some(96));
        assert_eq!(jm.decile, Some(10));

        // m19 also has a women's record; the jewish aggregate sums both
        let jewish = group(all, Religion::Jewish, Gender::All);
        assert_eq!(jewish.total, 21);
    }

    #[test]
    fn smallest_name_is_in_the_first_decile() {
        let (set, stats) = sample();
        let profile = profile_name(&set, &stats, "m00").unwrap();
        let jm = group(&profile.periods[0], Religion::Jewish, Gender::Men);
        assert_eq!(jm.total, 1);
        assert_eq!(jm.decile, Some(1));
        assert_eq!(jm.percentile, None);
        assert!((jm.fraction - 1.0 / 210.0).abs() < 1e-12);
    }

    #[test]
    fn absent_names_have_zero_totals() {
        let (set, stats) = sample();
        let profile = profile_name(&set, &stats, "Nobody").unwrap();
        assert_eq!(profile.periods.len(), 2);
        for p in &profile.periods {
            assert_eq!(p.groups.len(), Demographic::COUNT);
            assert!(p.groups.iter().all(|g| g.total == 0 && g.decile.is_none()));
        }

        // zero in the last year only
        let m05 = profile_name(&set, &stats, "m05").unwrap();
        let jm = group(&m05.periods[1], Religion::Jewish, Gender::Men);
        assert_eq!(jm.total, 0);
        assert_eq!(jm.fraction, 0.0);
    }
}
