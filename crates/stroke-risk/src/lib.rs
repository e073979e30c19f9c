pub mod coerce;
pub mod config;
pub mod error;
pub mod models;
pub mod scorer;
pub mod statistics;
#[cfg(test)]
mod tests;

pub use config::{RiskConfig, RiskThresholds, RiskWeights};
pub use error::ScoringError;
pub use models::*;
pub use scorer::{calculate_risk_score, RiskScorer};
pub use statistics::{
    summarize, PopulationStats, StrokeAggregate, StrokeProfile, StrokeRecord, SubgroupTotals,
};
