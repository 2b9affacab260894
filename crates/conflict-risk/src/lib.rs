//! Composite conflict-risk scoring with scenario simulation and fleet-wide aggregation.

pub mod config;
pub mod error;
pub mod risk;
pub mod telemetry;
