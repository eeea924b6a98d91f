//! Per-period name statistics by religion and gender: quantile thresholds and
//! bucket totals, top names, and the generation in which each name peaked.

pub mod demographics;
pub mod error;
pub mod periods;
pub mod records;
pub mod runtime;
pub mod stats;

pub use error::{Result, StatsError};
