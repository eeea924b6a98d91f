use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::sync::Arc;

use super::quantiles::PERCENTILES;
use crate::demographics::{Demographic, Gender, Religion};
use crate::periods::YearPeriod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameEntry {
    pub name: Arc<str>,
    pub total: u64,
}

impl NameEntry {
    pub fn new(name: impl Into<Arc<str>>, total: u64) -> Self {
        Self {
            name: name.into(),
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemographicGroupStats {
    pub name_count: usize,
    pub population_total: u64,
    pub quantile_thresholds: Vec<u64>,
    pub quantile_totals: Vec<u64>,
    pub top_names: Vec<NameEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_names: Option<Vec<NameEntry>>,
}

impl DemographicGroupStats {
    pub fn with_peak_names(self, peak_names: Vec<NameEntry>) -> Self {
        Self {
            peak_names: Some(peak_names),
            ..self
        }
    }
}

/// Dense religion × gender table, stored in `Demographic::targets()` order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable(Vec<DemographicGroupStats>);

impl GroupTable {
    /// `groups` must hold one entry per target, in target order.
    pub(crate) fn from_ordered(groups: Vec<DemographicGroupStats>) -> Self {
        debug_assert_eq!(groups.len(), Demographic::COUNT);
        Self(groups)
    }

    pub fn get(&self, religion: Religion, gender: Gender) -> &DemographicGroupStats {
        &self.0[Demographic::new(religion, gender).index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Demographic, &DemographicGroupStats)> {
        Demographic::targets().zip(self.0.iter())
    }
}

struct GenderRow<'a>(&'a [DemographicGroupStats]);

impl Serialize for GenderRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (gender, stats) in Gender::ORDER.iter().zip(self.0) {
            map.serialize_entry(gender.slug(), stats)?;
        }
        map.end()
    }
}

impl Serialize for GroupTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Religion::ORDER.len()))?;
        for (religion, row) in Religion::ORDER
            .iter()
            .zip(self.0.chunks(Gender::ORDER.len()))
        {
            map.serialize_entry(religion.slug(), &GenderRow(row))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub year_period: YearPeriod,
    pub by_religion_and_gender: GroupTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantileKind {
    Percentile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuantileLabel {
    #[serde(rename = "type")]
    pub kind: QuantileKind,
    pub value: u32,
}

pub fn quantile_labels() -> Vec<QuantileLabel> {
    PERCENTILES
        .iter()
        .map(|&value| QuantileLabel {
            kind: QuantileKind::Percentile,
            value: value as u32,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllStats {
    pub quantile_labels: Vec<QuantileLabel>,
    pub periods: Vec<PeriodStats>,
}

impl AllStats {
    pub fn period(&self, slug: &str) -> Option<&PeriodStats> {
        self.periods.iter().find(|p| p.year_period.slug == slug)
    }
}
