// Analysis engine
// Orchestrates: collaborator call (with timeout) -> deterministic fallback

use crate::collaborator::{AnalysisCollaborator, AnalysisError};
use crate::fallback::FallbackClassifier;
use causelog_core::{AnalysisProvenance, AnalysisReport, CorrelationResult};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Ceiling for one collaborator call; on expiry the fallback answers
    pub collaborator_timeout: Duration,
    pub model_confidence: f64,
    pub fallback_confidence: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            collaborator_timeout: Duration::from_secs(10),
            model_confidence: 0.9,
            fallback_confidence: 0.6,
        }
    }
}

/// Always-answering analysis front. Collaborator failures of every kind
/// (timeout, transport, schema) degrade identically to the rule tables.
pub struct AnalysisEngine {
    config: AnalysisConfig,
    collaborator: Option<Box<dyn AnalysisCollaborator>>,
    fallback: FallbackClassifier,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig, collaborator: Option<Box<dyn AnalysisCollaborator>>) -> Self {
        Self {
            config,
            collaborator,
            fallback: FallbackClassifier::new(),
        }
    }

    /// Rule tables only, no collaborator.
    pub fn rule_only() -> Self {
        Self::new(AnalysisConfig::default(), None)
    }

    /// Analyze a correlation result. Never fails; provenance and
    /// confidence say which path produced the answer.
    pub async fn analyze(&self, correlation: &CorrelationResult) -> AnalysisReport {
        if let Some(collaborator) = &self.collaborator {
            let outcome = timeout(
                self.config.collaborator_timeout,
                collaborator.analyze(correlation),
            )
            .await
            .map_err(|_| AnalysisError::TimedOut);

            match outcome {
                Ok(Ok(classification)) => {
                    info!(
                        collaborator = collaborator.name(),
                        correlation_id = %correlation.id,
                        "collaborator classification accepted"
                    );
                    return AnalysisReport {
                        classification,
                        provenance: AnalysisProvenance::Model,
                        confidence: self.config.model_confidence,
                    };
                }
                Ok(Err(e)) | Err(e) => {
                    warn!(
                        collaborator = collaborator.name(),
                        error = %e,
                        "collaborator failed, using rule fallback"
                    );
                }
            }
        }

        self.analyze_fallback(correlation)
    }

    /// The synchronous fallback path, also usable directly.
    pub fn analyze_fallback(&self, correlation: &CorrelationResult) -> AnalysisReport {
        AnalysisReport {
            classification: self.fallback.classify(correlation),
            provenance: AnalysisProvenance::RuleFallback,
            confidence: self.config.fallback_confidence,
        }
    }
}
