//! Correlation pass: select the records around a trigger, order them,
//! infer the origin service and build the causal chain.
//!
//! Correlation is a pure read-only pass over a buffer snapshot. It never
//! fails for structurally valid input and never returns an empty chain.

use crate::origin::OriginResolver;
use causelog_core::classify::ErrorClassifier;
use causelog_core::parser::ServiceNormalizer;
use causelog_core::{
    truncate_chars, ChainEntry, CorrelationResult, ErrorDetails, ErrorTag, LogRecord, TimeWindow,
    ERROR_MESSAGE_CAP,
};
use chrono::Duration;
use regex::Regex;
use tracing::debug;
use uuid::Uuid;

/// How many records the tiered fallback selects when the time window
/// comes up empty.
const FALLBACK_TAKE: usize = 50;

#[derive(Debug, Clone)]
pub struct CorrelatorConfig {
    /// Half-width of the selection window around the trigger, in ms
    pub window_ms: i64,
    /// Whitelist of canonical services for origin inference
    pub known_services: Vec<String>,
    /// Terminal origin fallback; never "unknown"
    pub default_service: String,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            window_ms: 5000,
            known_services: causelog_core::parser::DEFAULT_KNOWN_SERVICES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            default_service: "API-GATEWAY".to_string(),
        }
    }
}

pub struct Correlator {
    config: CorrelatorConfig,
    classifier: ErrorClassifier,
    origin: OriginResolver,
    endpoint_pattern: Regex,
}

impl Correlator {
    pub fn new(config: CorrelatorConfig) -> Self {
        let normalizer = ServiceNormalizer::with_known(config.known_services.clone());
        let origin = OriginResolver::new(normalizer, config.default_service.clone());
        Self {
            config,
            classifier: ErrorClassifier::new(),
            origin,
            endpoint_pattern: Regex::new(r"(/api/[A-Za-z0-9_\-./{}]+)").unwrap(),
        }
    }

    /// Correlate with the configured window width.
    pub fn correlate_default(&self, trigger: &LogRecord, snapshot: &[LogRecord]) -> CorrelationResult {
        self.correlate(trigger, snapshot, self.config.window_ms)
    }

    /// One correlation pass over an arrival-ordered snapshot.
    pub fn correlate(
        &self,
        trigger: &LogRecord,
        snapshot: &[LogRecord],
        window_ms: i64,
    ) -> CorrelationResult {
        let window = TimeWindow {
            start: trigger.timestamp - Duration::milliseconds(window_ms),
            end: trigger.timestamp + Duration::milliseconds(window_ms),
        };

        let mut selected = self.select(trigger, snapshot, &window);

        // the trigger always participates, even against an empty buffer
        if !selected.iter().any(|r| r.id == trigger.id) {
            selected.push(trigger.clone());
        }

        // ascending by timestamp; id breaks ties so reruns are identical
        selected.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));

        let is_error: Vec<bool> = selected.iter().map(|r| self.classifier.is_error(r)).collect();

        let affected_services = discovery_order_services(&selected);
        let origin_service = self.origin.resolve(trigger, &selected, &is_error);
        let log_chain = build_chain(&selected, &is_error);
        let error_details = self.extract_error_details(trigger, &selected, &is_error);

        debug!(
            trigger_id = trigger.id,
            origin = %origin_service,
            chain_len = log_chain.len(),
            services = affected_services.len(),
            "correlation pass complete"
        );

        CorrelationResult {
            id: Uuid::new_v4(),
            trigger_id: trigger.id,
            trigger_timestamp: trigger.timestamp,
            origin_service,
            affected_services,
            log_chain,
            error_details,
            time_window: window,
        }
    }

    /// Window selection with the tiered fallback: in-window records, else
    /// the most recent errors, else the most recent records of any level.
    fn select(
        &self,
        _trigger: &LogRecord,
        snapshot: &[LogRecord],
        window: &TimeWindow,
    ) -> Vec<LogRecord> {
        let in_window: Vec<LogRecord> = snapshot
            .iter()
            .filter(|r| r.timestamp >= window.start && r.timestamp <= window.end)
            .cloned()
            .collect();
        if !in_window.is_empty() {
            return in_window;
        }

        let errors: Vec<LogRecord> = snapshot
            .iter()
            .filter(|r| self.classifier.is_error(r))
            .cloned()
            .collect();
        if !errors.is_empty() {
            let skip = errors.len().saturating_sub(FALLBACK_TAKE);
            return errors.into_iter().skip(skip).collect();
        }

        let skip = snapshot.len().saturating_sub(FALLBACK_TAKE);
        snapshot.iter().skip(skip).cloned().collect()
    }

    /// Aggregate error evidence from the sorted selection. The trigger is
    /// always included even when the error filter would skip it.
    fn extract_error_details(
        &self,
        trigger: &LogRecord,
        sorted: &[LogRecord],
        is_error: &[bool],
    ) -> ErrorDetails {
        let mut evidence: Vec<&LogRecord> = sorted
            .iter()
            .zip(is_error)
            .filter(|(r, e)| **e || r.id == trigger.id)
            .map(|(r, _)| r)
            .collect();
        if !evidence.iter().any(|r| r.id == trigger.id) {
            evidence.push(trigger);
        }

        let mut error_types: Vec<ErrorTag> = Vec::new();
        let mut error_messages: Vec<String> = Vec::new();
        let mut affected_endpoints: Vec<String> = Vec::new();

        for record in &evidence {
            for tag in self.classifier.tags(&record.message) {
                if !error_types.contains(&tag) {
                    error_types.push(tag);
                }
            }

            let truncated = truncate_chars(&record.message, ERROR_MESSAGE_CAP);
            if !error_messages.contains(&truncated) {
                error_messages.push(truncated);
            }

            for caps in self.endpoint_pattern.captures_iter(&record.message) {
                if let Some(m) = caps.get(1) {
                    let endpoint = m.as_str().trim_end_matches(['.', ',']).to_string();
                    if !affected_endpoints.contains(&endpoint) {
                        affected_endpoints.push(endpoint);
                    }
                }
            }
        }

        ErrorDetails {
            error_count: evidence.len().max(1),
            error_types,
            error_messages,
            affected_endpoints,
        }
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new(CorrelatorConfig::default())
    }
}

/// Affected services in discovery order, no duplicates.
fn discovery_order_services(sorted: &[LogRecord]) -> Vec<String> {
    let mut services = Vec::new();
    for record in sorted {
        if !services.contains(&record.service) {
            services.push(record.service.clone());
        }
    }
    services
}

/// Walk the sorted selection and mark propagation hops: when a different
/// service produces the next error, the previous error-producing service
/// is recorded as `propagated_from`. A heuristic, not ground truth.
fn build_chain(sorted: &[LogRecord], is_error: &[bool]) -> Vec<ChainEntry> {
    let mut chain = Vec::with_capacity(sorted.len());
    let mut last_error_service: Option<String> = None;

    for (record, &err) in sorted.iter().zip(is_error) {
        let propagated_from = if err {
            match &last_error_service {
                Some(prev) if *prev != record.service => Some(prev.clone()),
                _ => None,
            }
        } else {
            None
        };

        if err {
            last_error_service = Some(record.service.clone());
        }

        chain.push(ChainEntry {
            timestamp: record.timestamp,
            service: record.service.clone(),
            level: record.level,
            message: truncate_chars(&record.message, ERROR_MESSAGE_CAP),
            is_error: err,
            propagated_from,
        });
    }

    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use causelog_core::LogLevel;
    use chrono::{TimeZone, Utc};

    fn record(id: u64, service: &str, level: LogLevel, message: &str, sec: u32) -> LogRecord {
        LogRecord {
            id,
            service: service.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, sec).unwrap(),
            level,
            message: message.to_string(),
            source_identity: service.to_lowercase(),
            raw: message.to_string(),
        }
    }

    #[test]
    fn test_propagation_hop_between_distinct_services() {
        let records = vec![
            record(1, "DB-SERVICE", LogLevel::Error, "pool exhausted", 0),
            record(2, "DB-SERVICE", LogLevel::Error, "pool exhausted again", 1),
            record(3, "API-GATEWAY", LogLevel::Error, "502 from upstream", 2),
        ];
        let is_error = vec![true, true, true];
        let chain = build_chain(&records, &is_error);

        assert_eq!(chain[0].propagated_from, None);
        assert_eq!(chain[1].propagated_from, None); // same service, no hop
        assert_eq!(chain[2].propagated_from, Some("DB-SERVICE".to_string()));
    }

    #[test]
    fn test_non_error_records_never_propagate() {
        let records = vec![
            record(1, "A", LogLevel::Error, "error here", 0),
            record(2, "B", LogLevel::Info, "routine", 1),
            record(3, "B", LogLevel::Error, "failed now", 2),
        ];
        let is_error = vec![true, false, true];
        let chain = build_chain(&records, &is_error);

        assert_eq!(chain[1].propagated_from, None);
        assert_eq!(chain[2].propagated_from, Some("A".to_string()));
    }

    #[test]
    fn test_endpoint_extraction_dedup() {
        let correlator = Correlator::default();
        let trigger = record(1, "API-GATEWAY", LogLevel::Error, "GET /api/users/42 failed, retry GET /api/users/42", 0);
        let result = correlator.correlate(&trigger, &[trigger.clone()], 5000);
        assert_eq!(result.error_details.affected_endpoints, vec!["/api/users/42"]);
    }
}
