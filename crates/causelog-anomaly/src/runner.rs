//! Polling loop driving the detector from an external resource sampler.

use crate::config::AnomalyConfig;
use crate::detection::AnomalyDetector;
use async_trait::async_trait;
use causelog_core::{AnomalyRecord, MetricSample};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{error, warn};

/// Seam to the external resource sampler; the core does not perform the
/// sampling itself.
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<Vec<MetricSample>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Main runner that polls the sampler and forwards flagged anomalies to
/// an optional sink channel. Delivery is fire-and-forget.
pub struct AnomalyRunner {
    config: AnomalyConfig,
    detector: AnomalyDetector,
    sampler: Box<dyn ResourceSampler>,
    sink: Option<mpsc::UnboundedSender<AnomalyRecord>>,
}

impl AnomalyRunner {
    pub fn new(config: AnomalyConfig, sampler: Box<dyn ResourceSampler>) -> Self {
        let detector = AnomalyDetector::new(config.clone());
        Self {
            config,
            detector,
            sampler,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: mpsc::UnboundedSender<AnomalyRecord>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn run(&mut self) {
        let mut ticker = interval(Duration::from_secs(self.config.check_interval_seconds));

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// One polling round; sampler failures are logged, never fatal.
    pub async fn tick(&mut self) -> Vec<AnomalyRecord> {
        let samples = match self.sampler.sample().await {
            Ok(samples) => samples,
            Err(e) => {
                error!("resource sampler failed: {}", e);
                return Vec::new();
            }
        };

        let anomalies = self.detector.check(&samples);
        for anomaly in &anomalies {
            warn!(
                service = %anomaly.service,
                kind = ?anomaly.kind,
                current = anomaly.current,
                average = anomaly.average,
                "anomaly flagged"
            );
            if let Some(sink) = &self.sink {
                let _ = sink.send(anomaly.clone());
            }
        }
        anomalies
    }
}
