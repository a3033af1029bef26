//! Fire-and-forget analytics.
//!
//! A bounded in-memory ring of events (oldest dropped first) that the
//! request path writes to and never reads synchronously. Recording can
//! never fail a request; the event also lands in the structured log so it
//! survives process restarts in the log backend even though the ring does
//! not.

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::quota::Identity;

/// Ring capacity. Oldest events beyond this are dropped (FIFO, not LRU).
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsEvent {
    pub name: String,
    pub identity: Identity,
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
    pub metadata: Value,
}

/// Aggregate snapshot over the ring.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsStats {
    pub total_users: usize,
    pub daily_active_users: usize,
    pub events_today: usize,
    pub total_events: usize,
    pub events_by_type: HashMap<String, usize>,
    /// Share of identities that started the bot and went on to analyze a
    /// resume, in percent.
    pub conversion_rate: f64,
}

pub struct AnalyticsSink {
    events: Mutex<VecDeque<AnalyticsEvent>>,
    capacity: usize,
}

impl AnalyticsSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Record an event. One-way: nothing on the request path depends on it.
    pub fn record(&self, name: &str, identity: Identity, metadata: Value) {
        let now = Utc::now();
        tracing::info!(event = name, identity, %metadata, "analytics");

        let mut events = self.events.lock();
        if events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(AnalyticsEvent {
            name: name.to_string(),
            identity,
            timestamp: now,
            date: now.date_naive(),
            metadata,
        });
    }

    pub fn stats(&self) -> AnalyticsStats {
        let events = self.events.lock();
        let today = Utc::now().date_naive();

        let mut all_users = HashSet::new();
        let mut today_users = HashSet::new();
        let mut events_today = 0;
        let mut events_by_type: HashMap<String, usize> = HashMap::new();

        for event in events.iter() {
            all_users.insert(event.identity);
            if event.date == today {
                today_users.insert(event.identity);
                events_today += 1;
            }
            *events_by_type.entry(event.name.clone()).or_default() += 1;
        }

        let started = events_by_type.get("user_started").copied().unwrap_or(0);
        let analyzed = events_by_type.get("resume_analyzed").copied().unwrap_or(0);
        let conversion_rate = if started > 0 {
            ((analyzed as f64 / started as f64) * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        AnalyticsStats {
            total_users: all_users.len(),
            daily_active_users: today_users.len(),
            events_today,
            total_events: events.len(),
            events_by_type,
            conversion_rate,
        }
    }
}

impl Default for AnalyticsSink {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn records_events_with_metadata() {
        let sink = AnalyticsSink::new();
        sink.record("resume_analyzed", 42, json!({"score": 80}));

        let stats = sink.stats();
        assert_eq!(stats.total_events, 1);
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.events_by_type.get("resume_analyzed"), Some(&1));
    }

    #[test]
    fn ring_drops_oldest_first() {
        let sink = AnalyticsSink::with_capacity(3);
        for i in 0..5 {
            sink.record("event", i, Value::Null);
        }

        let events = sink.events.lock();
        assert_eq!(events.len(), 3);
        // identities 0 and 1 were dropped, 2..5 kept in order
        let kept: Vec<i64> = events.iter().map(|e| e.identity).collect();
        assert_eq!(kept, vec![2, 3, 4]);
    }

    #[test]
    fn conversion_rate_is_percent_of_starts() {
        let sink = AnalyticsSink::new();
        sink.record("user_started", 1, Value::Null);
        sink.record("user_started", 2, Value::Null);
        sink.record("user_started", 3, Value::Null);
        sink.record("resume_analyzed", 1, Value::Null);

        let stats = sink.stats();
        assert!((stats.conversion_rate - 33.33).abs() < 0.01);
    }

    #[test]
    fn conversion_rate_zero_without_starts() {
        let sink = AnalyticsSink::new();
        sink.record("resume_analyzed", 1, Value::Null);
        assert!((sink.stats().conversion_rate - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn daily_active_users_counts_today_only() {
        let sink = AnalyticsSink::new();
        sink.record("event", 1, Value::Null);
        sink.record("event", 1, Value::Null);
        sink.record("event", 2, Value::Null);

        let stats = sink.stats();
        assert_eq!(stats.daily_active_users, 2);
        assert_eq!(stats.events_today, 3);
    }
}
