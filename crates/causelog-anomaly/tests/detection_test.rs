use causelog_anomaly::{AnomalyConfig, AnomalyDetector};
use causelog_core::{AnomalyKind, MetricSample};
use chrono::Utc;

fn sample(service: &str, cpu: f64, mem: f64) -> MetricSample {
    MetricSample {
        service: service.to_string(),
        timestamp: Utc::now(),
        cpu_percent: cpu,
        memory_percent: mem,
        pid_count: 10,
    }
}

/// Feed `n` identical baseline samples so the trailing average is exact.
fn warm_up(detector: &mut AnomalyDetector, service: &str, n: usize, cpu: f64, mem: f64) {
    for _ in 0..n {
        let flagged = detector.check(&[sample(service, cpu, mem)]);
        assert!(flagged.is_empty(), "baseline must not flag");
    }
}

#[test]
fn test_cpu_spike_flagged() {
    // Scenario: 10 samples averaging 10% cpu, current 25% -> spike
    // (25 > 1.5 * 10 and 25 > 20)
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "API-GATEWAY", 10, 10.0, 30.0);

    let flagged = detector.check(&[sample("API-GATEWAY", 25.0, 30.0)]);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].kind, AnomalyKind::CpuSpike);
    assert_eq!(flagged[0].current, 25.0);
    assert!((flagged[0].average - 10.0).abs() < 1e-9);
}

#[test]
fn test_cpu_below_relative_threshold_not_flagged() {
    // current 16% fails the relative check (16 < 1.5 * 10) even though
    // it clears nothing else
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "API-GATEWAY", 10, 10.0, 30.0);

    let flagged = detector.check(&[sample("API-GATEWAY", 16.0, 30.0)]);
    assert!(flagged.is_empty());
}

#[test]
fn test_cpu_below_absolute_floor_not_flagged() {
    // relative threshold met but the absolute floor (20) is not
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "CACHE-SERVICE", 10, 5.0, 30.0);

    let flagged = detector.check(&[sample("CACHE-SERVICE", 12.0, 30.0)]);
    assert!(flagged.is_empty());
}

#[test]
fn test_memory_spike_thresholds() {
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "DB-SERVICE", 10, 10.0, 45.0);

    // 60 > 1.3 * 45 = 58.5 and 60 > 50
    let flagged = detector.check(&[sample("DB-SERVICE", 10.0, 60.0)]);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].kind, AnomalyKind::MemorySpike);

    // high in absolute terms but within 1.3x of the average
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "DB-SERVICE", 10, 10.0, 55.0);
    let flagged = detector.check(&[sample("DB-SERVICE", 10.0, 60.0)]);
    assert!(flagged.is_empty());
}

#[test]
fn test_no_evaluation_below_min_history() {
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    // only 4 samples of history -> nothing is evaluated yet
    warm_up(&mut detector, "NEW-SERVICE", 4, 1.0, 1.0);

    let flagged = detector.check(&[sample("NEW-SERVICE", 99.0, 99.0)]);
    assert!(flagged.is_empty());
}

#[test]
fn test_services_are_independent() {
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "QUIET-SERVICE", 10, 10.0, 30.0);
    warm_up(&mut detector, "BUSY-SERVICE", 10, 60.0, 30.0);

    // 70% cpu is a spike for the quiet service only
    let flagged = detector.check(&[
        sample("QUIET-SERVICE", 70.0, 30.0),
        sample("BUSY-SERVICE", 70.0, 30.0),
    ]);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].service, "QUIET-SERVICE");
}

#[test]
fn test_one_sample_can_flag_both_kinds() {
    let mut detector = AnomalyDetector::new(AnomalyConfig::default());
    warm_up(&mut detector, "DB-SERVICE", 10, 10.0, 40.0);

    let flagged = detector.check(&[sample("DB-SERVICE", 40.0, 80.0)]);
    let kinds: Vec<_> = flagged.iter().map(|a| a.kind).collect();
    assert!(kinds.contains(&AnomalyKind::CpuSpike));
    assert!(kinds.contains(&AnomalyKind::MemorySpike));
}
