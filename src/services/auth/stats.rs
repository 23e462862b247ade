use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Process-wide authentication counters (exposed on `/actuator/metrics`).
#[derive(Debug, Default)]
pub struct AuthStats {
    logins_succeeded: AtomicU64,
    logins_failed: AtomicU64,
    principals_established: AtomicU64,
    tokens_rejected: AtomicU64,
    requests_denied: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatsSnapshot {
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub principals_established: u64,
    pub tokens_rejected: u64,
    pub requests_denied: u64,
}

impl AuthStats {
    pub fn login_succeeded(&self) {
        self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn login_failed(&self) {
        self.logins_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn principal_established(&self) {
        self.principals_established.fetch_add(1, Ordering::Relaxed);
    }

    pub fn token_rejected(&self) {
        self.tokens_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_denied(&self) {
        self.requests_denied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AuthStatsSnapshot {
        AuthStatsSnapshot {
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            principals_established: self.principals_established.load(Ordering::Relaxed),
            tokens_rejected: self.tokens_rejected.load(Ordering::Relaxed),
            requests_denied: self.requests_denied.load(Ordering::Relaxed),
        }
    }
}
