// Failure-cascade simulator - generates a plausible multi-service log
// stream ending in a pool-exhaustion cascade, for demoing the pipeline
// without real sources.

use causelog_ingest::SourceLine;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

const SERVICES: &[&str] = &[
    "API-GATEWAY",
    "USER-SERVICE",
    "DB-SERVICE",
    "CACHE-SERVICE",
    "ORDER-SERVICE",
];

const ROUTINE_MESSAGES: &[&str] = &[
    "GET /api/users/{} -> 200 in {}ms",
    "POST /api/orders -> 201 in {}ms (user {})",
    "cache hit ratio {}% over last {} requests",
    "health check ok, {} connections, {}ms p99",
];

/// Generate `baseline` routine lines followed by a failure cascade. The
/// timestamps walk backwards from now so everything lands in one window.
pub fn generate_cascade(seed: u64, baseline: usize) -> Vec<SourceLine> {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = Utc::now() - Duration::seconds(baseline as i64 + 10);
    let mut lines = Vec::with_capacity(baseline + 4);

    for i in 0..baseline {
        let service = SERVICES[rng.random_range(0..SERVICES.len())];
        let template = ROUTINE_MESSAGES[rng.random_range(0..ROUTINE_MESSAGES.len())];
        let message = template
            .replacen("{}", &rng.random_range(1..500u32).to_string(), 1)
            .replacen("{}", &rng.random_range(1..200u32).to_string(), 1);
        let ts = start + Duration::seconds(i as i64);
        lines.push(source_line(service, &ts.to_rfc3339(), "INFO", &message));
    }

    // the cascade: db pool gives out, gateway and user-service follow
    let t0 = start + Duration::seconds(baseline as i64);
    lines.push(source_line(
        "DB-SERVICE",
        &t0.to_rfc3339(),
        "ERROR",
        "Connection pool exhausted | pool=primary active=50 idle=0",
    ));
    lines.push(source_line(
        "DB-SERVICE",
        &(t0 + Duration::seconds(1)).to_rfc3339(),
        "ERROR",
        "Query timeout after 5000ms on /api/orders lookup",
    ));
    lines.push(source_line(
        "API-GATEWAY",
        &(t0 + Duration::seconds(2)).to_rfc3339(),
        "ERROR",
        "upstream returned 502 for GET /api/orders/checkout",
    ));
    lines.push(source_line(
        "USER-SERVICE",
        &(t0 + Duration::seconds(3)).to_rfc3339(),
        "CRITICAL",
        "Failed to load session from db-service, aborting request",
    ));

    lines
}

fn source_line(service: &str, ts: &str, level: &str, message: &str) -> SourceLine {
    SourceLine {
        line: format!("[{}] {} {}: {}", service, ts, level, message),
        source_identity: format!("{}-1", service.to_lowercase()),
    }
}
