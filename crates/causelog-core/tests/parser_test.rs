use causelog_core::classify::ErrorClassifier;
use causelog_core::parser::{LineParser, ServiceNormalizer};
use causelog_core::LogLevel;

#[test]
fn test_structured_line_full_extraction() {
    let parser = LineParser::new();

    let raw = "[API-GATEWAY] 2026-02-10T14:30:45.123Z ERROR: upstream returned 502";
    let record = parser.parse(raw, "api-gateway-1");

    println!("service: {}", record.service);
    println!("level: {:?}", record.level);
    println!("message: {}", record.message);

    assert_eq!(record.service, "API-GATEWAY");
    assert_eq!(record.level, LogLevel::Error);
    assert_eq!(record.message, "upstream returned 502");
    assert_eq!(record.raw, raw);
}

#[test]
fn test_structured_line_lowercase_level() {
    let parser = LineParser::new();
    let record = parser.parse("[user_service] 2026-02-10T14:30:45Z warning: slow query", "x");

    assert_eq!(record.service, "USER-SERVICE");
    assert_eq!(record.level, LogLevel::Warn);
}

#[test]
fn test_unstructured_line_fallback() {
    // Scenario: line not matching the pattern must still become a valid record
    let parser = LineParser::new();
    let record = parser.parse("random unstructured text", "my-weird-container-7");

    assert_eq!(record.level, LogLevel::Info); // no error keywords present
    assert!(!record.service.is_empty());
    assert_eq!(record.service, "MY-WEIRD-CONTAINER");
    assert_eq!(record.message, "random unstructured text");
}

#[test]
fn test_fallback_level_from_keywords() {
    let parser = LineParser::new();

    let record = parser.parse("something FATAL happened", "svc");
    assert_eq!(record.level, LogLevel::Critical);

    let record = parser.parse("Error: could not bind port", "svc");
    assert_eq!(record.level, LogLevel::Error);
}

#[test]
fn test_bad_timestamp_falls_back_to_now() {
    let parser = LineParser::new();
    let before = chrono::Utc::now();
    let record = parser.parse("[DB-SERVICE] not-a-timestamp ERROR: boom", "db");
    let after = chrono::Utc::now();

    assert_eq!(record.service, "DB-SERVICE");
    assert!(record.timestamp >= before && record.timestamp <= after);
}

#[test]
fn test_classification_runs_on_full_line() {
    // storage truncation is a buffer concern; classification sees the full text
    let parser = LineParser::new();
    let classifier = ErrorClassifier::new();

    let long_tail = "x".repeat(600);
    let line = format!("{} and then: connection refused", long_tail);
    let record = parser.parse(&line, "payment-service");

    assert!(classifier.is_error(&record));
}

#[test]
fn test_normalizer_known_table_wins_over_stripping() {
    let normalizer = ServiceNormalizer::new();
    assert_eq!(normalizer.normalize("k8s_payment-service_abc123-2"), "PAYMENT-SERVICE");
    assert!(normalizer.is_known("api-gateway"));
    assert!(!normalizer.is_known("mystery-box"));
}
