//! Detection result analysis.
//!
//! Grouping and formatting of the findings returned by the detection service.

pub mod aggregator;

pub use aggregator::*;
