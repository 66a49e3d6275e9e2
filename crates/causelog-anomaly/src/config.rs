//! Configuration for the anomaly detection loop

use serde::Deserialize;
use std::fs;
use std::path::Path;

// Main config structure
#[derive(Debug, Clone, Deserialize)]
pub struct AnomalyConfig {
    // polling cadence of the runner (in secs)
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,

    // trailing window kept per service
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    // minimum samples before a service is evaluated at all
    #[serde(default = "default_min_history")]
    pub min_history: usize,

    // number of trailing samples the average is taken over
    #[serde(default = "default_avg_window")]
    pub avg_window: usize,

    // cpu_spike: current > multiplier * avg AND current > floor
    #[serde(default = "default_cpu_multiplier")]
    pub cpu_multiplier: f64,
    #[serde(default = "default_cpu_floor")]
    pub cpu_floor: f64,

    // memory_spike: current > multiplier * avg AND current > floor
    #[serde(default = "default_memory_multiplier")]
    pub memory_multiplier: f64,
    #[serde(default = "default_memory_floor")]
    pub memory_floor: f64,
}

fn default_check_interval() -> u64 {
    30
}
fn default_history_capacity() -> usize {
    60
}
fn default_min_history() -> usize {
    5
}
fn default_avg_window() -> usize {
    10
}
fn default_cpu_multiplier() -> f64 {
    1.5
}
fn default_cpu_floor() -> f64 {
    20.0
}
fn default_memory_multiplier() -> f64 {
    1.3
}
fn default_memory_floor() -> f64 {
    50.0
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            history_capacity: default_history_capacity(),
            min_history: default_min_history(),
            avg_window: default_avg_window(),
            cpu_multiplier: default_cpu_multiplier(),
            cpu_floor: default_cpu_floor(),
            memory_multiplier: default_memory_multiplier(),
            memory_floor: default_memory_floor(),
        }
    }
}

// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AnomalyConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AnomalyConfig = toml::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_detection_constants() {
        let config = AnomalyConfig::default();
        assert_eq!(config.history_capacity, 60);
        assert_eq!(config.min_history, 5);
        assert_eq!(config.avg_window, 10);
        assert_eq!(config.cpu_multiplier, 1.5);
        assert_eq!(config.cpu_floor, 20.0);
        assert_eq!(config.memory_multiplier, 1.3);
        assert_eq!(config.memory_floor, 50.0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_content = r#"
check_interval_seconds = 10
cpu_floor = 30.0
"#;
        let config: AnomalyConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.check_interval_seconds, 10);
        assert_eq!(config.cpu_floor, 30.0);
        assert_eq!(config.memory_floor, 50.0);
    }
}
