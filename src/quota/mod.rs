//! Daily free-quota ledger with premium subscription bypass.
//!
//! All read-modify-write sequences for one identity run under a single
//! mutex, so interleaved requests cannot double-spend the last free slot
//! and a refund cannot race a concurrent consume. Contention is low;
//! coarse locking is intentional.

pub mod store;

use chrono::{Duration, Utc};
use parking_lot::Mutex;

pub use store::{Identity, MemoryStore, Subscription, UsageState, UsageStore};

pub struct QuotaLedger {
    store: Mutex<Box<dyn UsageStore>>,
    free_daily_limit: u32,
}

impl QuotaLedger {
    pub fn new(free_daily_limit: u32) -> Self {
        Self::with_store(Box::new(MemoryStore::new()), free_daily_limit)
    }

    pub fn with_store(store: Box<dyn UsageStore>, free_daily_limit: u32) -> Self {
        Self {
            store: Mutex::new(store),
            free_daily_limit,
        }
    }

    /// Whether the identity may perform a billable attempt right now.
    /// Unlimited identities always pass; free identities pass while today's
    /// counter is below the limit. No counter mutation.
    pub fn check(&self, id: Identity) -> bool {
        let mut store = self.store.lock();
        if Self::subscription_active(&mut **store, id) {
            return true;
        }
        let state = Self::rolled_usage(&mut **store, id);
        state.requests_today < self.free_daily_limit
    }

    /// Atomic check-then-consume: re-validates the limit and increments the
    /// counter under one lock guard. Returns `false` (without consuming)
    /// when the identity is at the limit. This is the only way a billable
    /// attempt reserves its slot.
    pub fn try_consume(&self, id: Identity) -> bool {
        let mut store = self.store.lock();
        let unlimited = Self::subscription_active(&mut **store, id);
        let mut state = Self::rolled_usage(&mut **store, id);
        if !unlimited && state.requests_today >= self.free_daily_limit {
            return false;
        }
        state.requests_today += 1;
        state.last_request = Some(Utc::now());
        store.set_usage(id, state);
        true
    }

    /// Increment the counter unconditionally. Callers must have seen
    /// `check` succeed; [`Self::try_consume`] is the racing-safe variant.
    pub fn consume(&self, id: Identity) {
        let mut store = self.store.lock();
        let mut state = Self::rolled_usage(&mut **store, id);
        state.requests_today += 1;
        state.last_request = Some(Utc::now());
        store.set_usage(id, state);
    }

    /// Reverse one debit after a billed attempt failed to produce a result.
    /// Floored at zero: a refund after a day rollover cannot underflow.
    pub fn refund(&self, id: Identity) {
        let mut store = self.store.lock();
        let mut state = Self::rolled_usage(&mut **store, id);
        state.requests_today = state.requests_today.saturating_sub(1);
        store.set_usage(id, state);
    }

    /// Free attempts left today. Unlimited identities report the full limit.
    pub fn remaining(&self, id: Identity) -> u32 {
        let mut store = self.store.lock();
        let state = Self::rolled_usage(&mut **store, id);
        self.free_daily_limit.saturating_sub(state.requests_today)
    }

    /// Current usage snapshot (creates the state on first access and
    /// applies the lazy day rollover).
    pub fn usage(&self, id: Identity) -> UsageState {
        let mut store = self.store.lock();
        Self::rolled_usage(&mut **store, id)
    }

    pub fn grant_subscription(&self, id: Identity, days: u32) {
        let valid_until = Utc::now() + Duration::days(i64::from(days));
        let mut store = self.store.lock();
        store.set_subscription(id, Subscription { valid_until });
        tracing::info!(identity = id, days, "subscription granted");
    }

    /// Active-subscription check. Expired entries are evicted here, lazily.
    pub fn is_unlimited(&self, id: Identity) -> bool {
        let mut store = self.store.lock();
        Self::subscription_active(&mut **store, id)
    }

    fn subscription_active(store: &mut dyn UsageStore, id: Identity) -> bool {
        match store.get_subscription(id) {
            Some(sub) if sub.valid_until > Utc::now() => true,
            Some(_) => {
                store.delete_subscription(id);
                false
            }
            None => false,
        }
    }

    /// Get-or-create the usage state with the day rollover applied and
    /// persisted.
    fn rolled_usage(store: &mut dyn UsageStore, id: Identity) -> UsageState {
        let now = Utc::now();
        let mut state = store
            .get_usage(id)
            .unwrap_or_else(|| UsageState::new(now));
        let before = state.day;
        state.roll_day(now.date_naive());
        if state.day != before || store.get_usage(id).is_none() {
            store.set_usage(id, state.clone());
        }
        state
    }
}
