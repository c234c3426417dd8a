//! Query Engine - Filter pipeline plus the five analytical operations

pub mod analyzer;
pub mod crosstab;
pub mod filters;

pub use analyzer::{AnalysisResult, Analyzer};
pub use filters::FilterSet;
