//! Data layer for flight-ops.
//!
//! Reads monthly sheets from a workbook, combines and indexes them, runs
//! time-bucketed aggregations and predicate filters, and writes the
//! aggregated result back out as a spreadsheet.

pub mod aggregator;
pub mod analysis;
pub mod combiner;
pub mod query;
pub mod reader;
pub mod writer;
