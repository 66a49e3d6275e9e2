//! Resource spike detection against per-service trailing windows.
//!
//! A sample is evaluated against the history *excluding itself* and only
//! pushed into the window afterwards. Both the relative multiplier and
//! the absolute floor must hold for a spike to be flagged.

use crate::config::AnomalyConfig;
use causelog_core::{AnomalyKind, AnomalyRecord, MetricSample};
use std::collections::{HashMap, VecDeque};
use tracing::info;
use uuid::Uuid;

/// Bounded trailing window of samples per service.
#[derive(Debug)]
pub struct MetricsHistory {
    windows: HashMap<String, VecDeque<MetricSample>>,
    capacity: usize,
}

impl MetricsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: HashMap::new(),
            capacity,
        }
    }

    pub fn push(&mut self, sample: MetricSample) {
        let window = self
            .windows
            .entry(sample.service.clone())
            .or_insert_with(|| VecDeque::with_capacity(self.capacity));
        if window.len() == self.capacity {
            window.pop_front();
        }
        window.push_back(sample);
    }

    pub fn len(&self, service: &str) -> usize {
        self.windows.get(service).map(|w| w.len()).unwrap_or(0)
    }

    /// Mean cpu/memory over the last `n` samples for a service.
    fn trailing_average(&self, service: &str, n: usize) -> Option<(f64, f64)> {
        let window = self.windows.get(service)?;
        if window.is_empty() {
            return None;
        }
        let skip = window.len().saturating_sub(n);
        let tail: Vec<&MetricSample> = window.iter().skip(skip).collect();
        let count = tail.len() as f64;
        let cpu = tail.iter().map(|s| s.cpu_percent).sum::<f64>() / count;
        let mem = tail.iter().map(|s| s.memory_percent).sum::<f64>() / count;
        Some((cpu, mem))
    }
}

// main anomaly detector
pub struct AnomalyDetector {
    config: AnomalyConfig,
    history: MetricsHistory,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyConfig) -> Self {
        let history = MetricsHistory::new(config.history_capacity);
        Self { config, history }
    }

    /// Evaluate a batch of fresh samples against the trailing windows and
    /// absorb them into history.
    pub fn check(&mut self, samples: &[MetricSample]) -> Vec<AnomalyRecord> {
        let mut anomalies = Vec::new();

        for sample in samples {
            if self.history.len(&sample.service) >= self.config.min_history {
                if let Some((cpu_avg, mem_avg)) = self
                    .history
                    .trailing_average(&sample.service, self.config.avg_window)
                {
                    if sample.cpu_percent > self.config.cpu_multiplier * cpu_avg
                        && sample.cpu_percent > self.config.cpu_floor
                    {
                        info!(
                            service = %sample.service,
                            current = sample.cpu_percent,
                            average = cpu_avg,
                            "cpu spike detected"
                        );
                        anomalies.push(AnomalyRecord {
                            id: Uuid::new_v4(),
                            service: sample.service.clone(),
                            kind: AnomalyKind::CpuSpike,
                            current: sample.cpu_percent,
                            average: cpu_avg,
                            timestamp: sample.timestamp,
                        });
                    }

                    if sample.memory_percent > self.config.memory_multiplier * mem_avg
                        && sample.memory_percent > self.config.memory_floor
                    {
                        info!(
                            service = %sample.service,
                            current = sample.memory_percent,
                            average = mem_avg,
                            "memory spike detected"
                        );
                        anomalies.push(AnomalyRecord {
                            id: Uuid::new_v4(),
                            service: sample.service.clone(),
                            kind: AnomalyKind::MemorySpike,
                            current: sample.memory_percent,
                            average: mem_avg,
                            timestamp: sample.timestamp,
                        });
                    }
                }
            }

            self.history.push(sample.clone());
        }

        anomalies
    }

    pub fn history(&self) -> &MetricsHistory {
        &self.history
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyConfig::default())
    }
}
