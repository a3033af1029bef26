//! Entity storage behind the quota ledger.
//!
//! The ledger only ever talks to a [`UsageStore`]; the default
//! [`MemoryStore`] keeps everything in process memory (counters reset on
//! restart - a documented limitation), and an external store can be swapped
//! in without touching ledger logic.

use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

/// Opaque requester identity (Telegram user id).
pub type Identity = i64;

/// Per-identity daily usage counters. Never destroyed once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageState {
    pub requests_today: u32,
    /// UTC calendar day the counter belongs to.
    pub day: NaiveDate,
    pub last_request: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
}

impl UsageState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            requests_today: 0,
            day: now.date_naive(),
            last_request: None,
            registered_at: now,
        }
    }

    /// Lazy UTC day rollover: reset the counter exactly once when the
    /// current date differs from the stored one. No background timer.
    pub fn roll_day(&mut self, today: NaiveDate) {
        if self.day != today {
            self.day = today;
            self.requests_today = 0;
        }
    }
}

/// Premium subscription. An identity is unlimited while `valid_until` is
/// strictly in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub valid_until: DateTime<Utc>,
}

/// get/set/delete per entity type. Implementations need no interior
/// locking; the ledger serializes all access behind its own mutex.
pub trait UsageStore: Send {
    fn get_usage(&self, id: Identity) -> Option<UsageState>;
    fn set_usage(&mut self, id: Identity, state: UsageState);
    fn get_subscription(&self, id: Identity) -> Option<Subscription>;
    fn set_subscription(&mut self, id: Identity, subscription: Subscription);
    fn delete_subscription(&mut self, id: Identity);
}

/// Volatile in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    usage: HashMap<Identity, UsageState>,
    subscriptions: HashMap<Identity, Subscription>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryStore {
    fn get_usage(&self, id: Identity) -> Option<UsageState> {
        self.usage.get(&id).cloned()
    }

    fn set_usage(&mut self, id: Identity, state: UsageState) {
        self.usage.insert(id, state);
    }

    fn get_subscription(&self, id: Identity) -> Option<Subscription> {
        self.subscriptions.get(&id).copied()
    }

    fn set_subscription(&mut self, id: Identity, subscription: Subscription) {
        self.subscriptions.insert(id, subscription);
    }

    fn delete_subscription(&mut self, id: Identity) {
        self.subscriptions.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn roll_day_resets_counter_once() {
        let now = Utc::now();
        let mut state = UsageState::new(now - Duration::days(1));
        state.requests_today = 3;

        let today = now.date_naive();
        state.roll_day(today);
        assert_eq!(state.requests_today, 0);
        assert_eq!(state.day, today);

        // same-day access leaves the counter alone
        state.requests_today = 2;
        state.roll_day(today);
        assert_eq!(state.requests_today, 2);
    }

    #[test]
    fn memory_store_round_trips_entities() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        assert!(store.get_usage(1).is_none());

        store.set_usage(1, UsageState::new(now));
        assert_eq!(store.get_usage(1).unwrap().requests_today, 0);

        store.set_subscription(
            1,
            Subscription {
                valid_until: now + Duration::days(30),
            },
        );
        assert!(store.get_subscription(1).is_some());
        store.delete_subscription(1);
        assert!(store.get_subscription(1).is_none());
    }
}
