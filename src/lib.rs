//! tabstat: Naive Bayes classification and correlation analysis
//!
//! A library for learning Naive Bayes models from tabular data, scoring
//! tables against them, and reducing columns by pairwise correlation.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
