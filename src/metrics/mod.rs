//! Metrics collection module
//!
//! Tracks provider latency, error rates, and usage statistics.

use crate::place::PlaceSource;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

const RESPONSE_TIME_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    calls: u64,
    errors: u64,
    timeouts: u64,
    response_times: VecDeque<u64>,
}

/// Process-wide metrics collector
pub struct Metrics {
    /// Total suggestion requests
    suggestions: AtomicU64,
    /// Total place-details requests
    details: AtomicU64,
    /// Places written to the local index or the store
    persisted: AtomicU64,
    /// Failed persistence writes
    persist_failures: AtomicU64,
    providers: RwLock<HashMap<PlaceSource, ProviderCounters>>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            suggestions: AtomicU64::new(0),
            details: AtomicU64::new(0),
            persisted: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub fn inc_suggestions(&self) {
        self.suggestions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_details(&self) {
        self.details.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persisted(&self, ok: bool) {
        let counter = if ok {
            &self.persisted
        } else {
            &self.persist_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one provider call and how it ended
    pub fn record_call(&self, source: PlaceSource, elapsed: Duration, outcome: CallOutcome) {
        let mut providers = self.write();
        let counters = providers.entry(source).or_default();

        counters.calls += 1;
        match outcome {
            CallOutcome::Success => {}
            CallOutcome::Error => counters.errors += 1,
            CallOutcome::Timeout => {
                counters.errors += 1;
                counters.timeouts += 1;
            }
        }

        // Keep the last 100 response times
        if counters.response_times.len() >= RESPONSE_TIME_WINDOW {
            counters.response_times.pop_front();
        }
        counters
            .response_times
            .push_back(elapsed.as_millis().min(u64::MAX as u128) as u64);
    }

    pub fn total_suggestions(&self) -> u64 {
        self.suggestions.load(Ordering::Relaxed)
    }

    pub fn total_details(&self) -> u64 {
        self.details.load(Ordering::Relaxed)
    }

    /// Average response time for a provider in milliseconds
    pub fn avg_response_time(&self, source: PlaceSource) -> Option<u64> {
        self.read().get(&source).and_then(avg)
    }

    /// Percentage of calls that succeeded; 100 when never called
    pub fn reliability(&self, source: PlaceSource) -> f64 {
        self.read()
            .get(&source)
            .map(reliability)
            .unwrap_or(100.0)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let providers = self
            .read()
            .iter()
            .map(|(source, counters)| {
                (
                    *source,
                    ProviderStats {
                        calls: counters.calls,
                        errors: counters.errors,
                        timeouts: counters.timeouts,
                        avg_response_time_ms: avg(counters),
                        reliability: reliability(counters),
                    },
                )
            })
            .collect();

        MetricsSnapshot {
            suggestions: self.total_suggestions(),
            details: self.total_details(),
            persisted: self.persisted.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            providers,
        }
    }

    // Counters stay usable after a panic elsewhere
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PlaceSource, ProviderCounters>> {
        self.providers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PlaceSource, ProviderCounters>> {
        self.providers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn avg(counters: &ProviderCounters) -> Option<u64> {
    let times = &counters.response_times;
    if times.is_empty() {
        None
    } else {
        Some(times.iter().sum::<u64>() / times.len() as u64)
    }
}

fn reliability(counters: &ProviderCounters) -> f64 {
    if counters.calls == 0 {
        100.0
    } else {
        (counters.calls - counters.errors) as f64 / counters.calls as f64 * 100.0
    }
}

/// How a single provider call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Error,
    Timeout,
}

/// Statistics for a single provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderStats {
    pub calls: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub avg_response_time_ms: Option<u64>,
    pub reliability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub suggestions: u64,
    pub details: u64,
    pub persisted: u64,
    pub persist_failures: u64,
    pub providers: BTreeMap<PlaceSource, ProviderStats>,
}
