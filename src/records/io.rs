use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::types::{NameRecord, RecordSet};
use crate::demographics::Demographic;
use crate::error::{Result, StatsError};

// gender, religion, name, total
const FIXED_FIELDS: usize = 4;

fn parse_count(field: &str, line: usize) -> Result<u64> {
    field.parse().map_err(|_| StatsError::MalformedRecord {
        line,
        reason: format!("'{field}' is not a count"),
    })
}

/// Reads `gender,religion,name,total,y0,y1,...` rows. The header fixes how
/// many yearly columns every row must carry.
pub fn read_records<R: BufRead>(reader: R, start_year: u16) -> Result<RecordSet> {
    let mut lines = reader.lines();

    let year_count = match lines.next() {
        Some(header) => header?.trim().split(',').count().saturating_sub(FIXED_FIELDS),
        None => 0,
    };
    let mut set = RecordSet::new(start_year, year_count);

    for (i, line) in lines.enumerate() {
        let line_no = i + 2;
        let line = line?;
        let fields: Vec<&str> = line.trim().split(',').collect();
        if fields.len() < FIXED_FIELDS + 1 {
            continue;
        }

        let demographic =
            Demographic::parse_concrete(fields[0], fields[1]).map_err(|e| StatsError::RecordLabel {
                line: line_no,
                source: Box::new(e),
            })?;
        let name = fields[2].trim();
        if name.is_empty() {
            return Err(StatsError::MalformedRecord {
                line: line_no,
                reason: "empty name".into(),
            });
        }
        let total = parse_count(fields[3].trim(), line_no)?;
        let year_counts = fields[FIXED_FIELDS..]
            .iter()
            .map(|f| parse_count(f.trim(), line_no))
            .collect::<Result<Vec<u64>>>()?;

        set.push(NameRecord::with_total(name, demographic, total, year_counts)?)?;
    }

    debug!(
        names = set.name_count(),
        records = set.record_count(),
        years = set.year_count(),
        "records parsed"
    );
    Ok(set)
}

pub fn load_records(path: &Path, start_year: u16) -> Result<RecordSet> {
    let f = File::open(path)?;
    read_records(BufReader::new(f), start_year)
}
