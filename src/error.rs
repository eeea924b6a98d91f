use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Unknown religion: {0}")]
    UnknownReligion(String),

    #[error("Unknown gender: {0}")]
    UnknownGender(String),

    #[error("Demographic {0} is not concrete")]
    NotConcrete(String),

    #[error("Year period {start}-{end} out of range {first}-{last}")]
    PeriodOutOfRange {
        start: u16,
        end: u16,
        first: u16,
        last: u16,
    },

    #[error("Invalid period '{slug}': {reason}")]
    InvalidPeriod { slug: String, reason: String },

    #[error("Bad label at line {line}: {source}")]
    RecordLabel {
        line: usize,
        #[source]
        source: Box<StatsError>,
    },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Record '{name}' has total {total} but yearly counts sum to {sum}")]
    TotalMismatch { name: String, total: u64, sum: u64 },

    #[error("Record '{name}' has {got} yearly counts, expected {expected}")]
    YearCountMismatch {
        name: String,
        got: usize,
        expected: usize,
    },

    #[error("RSS {rss_mb} MiB exceeded limit {limit_mb} MiB")]
    MemoryBudget { rss_mb: u64, limit_mb: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
