//! Pure KPI computation: period resolution, metrics consolidation and
//! campaign aggregation. Nothing in here performs I/O.

pub mod campaigns;
pub mod consolidate;
pub mod date_range;
