//! Stratify: layered random grouping library
//!
//! Splits a table of experiment subjects into groups of exact sizes while
//! balancing numeric covariates across groups, and refines existing
//! groupings by extract-and-redistribute search.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod utils;
