//! Causelog resource anomaly detection

pub mod config;
pub mod detection;
pub mod runner;

pub use config::{load_config, AnomalyConfig};
pub use detection::{AnomalyDetector, MetricsHistory};
pub use runner::{AnomalyRunner, ResourceSampler};
