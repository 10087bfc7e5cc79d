//! Per-customer conversation state and the process-wide store that owns it.
//!
//! One mutable [`Session`] exists per customer phone number, created lazily
//! on first reference and removed by explicit deletion or the inactivity
//! sweep. The store hands out one `Arc<Mutex<Session>>` per key so there is
//! at most one in-flight mutation per customer even when a webhook delivers
//! the same customer's messages concurrently. An eviction racing an in-use
//! session resolves as last-write-wins; the session is recreated on the next
//! access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::filter::SearchFilter;
use crate::domain::vehicle::VehicleRecord;
use crate::financing::ANNUAL_RATE;

/// Action-log values are truncated to keep entries bounded; the log is
/// diagnostic only and never drives control flow.
const ACTION_VALUE_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub at: DateTime<Utc>,
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub customer_phone: String,
    pub selected_vehicle: Option<VehicleRecord>,
    pub last_search_filter: Option<SearchFilter>,
    pub down_payment: Option<f64>,
    pub term_years: Option<u32>,
    pub monthly_payment: Option<f64>,
    pub amount_financed: Option<f64>,
    pub annual_rate: f64,
    pub last_utterance: Option<String>,
    pub last_reply: Option<String>,
    pub last_query: Option<String>,
    actions: Vec<ActionLogEntry>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(customer_phone: impl Into<String>) -> Self {
        Self {
            customer_phone: customer_phone.into(),
            selected_vehicle: None,
            last_search_filter: None,
            down_payment: None,
            term_years: None,
            monthly_payment: None,
            amount_financed: None,
            annual_rate: ANNUAL_RATE,
            last_utterance: None,
            last_reply: None,
            last_query: None,
            actions: Vec::new(),
            last_activity: Utc::now(),
        }
    }

    pub fn actions(&self) -> &[ActionLogEntry] {
        &self.actions
    }

    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    pub fn log_action(&mut self, field: &str, value: impl AsRef<str>) {
        let value: String = value.as_ref().chars().take(ACTION_VALUE_LIMIT).collect();
        self.actions.push(ActionLogEntry { at: Utc::now(), field: field.to_string(), value });
        self.touch();
    }

    /// Sets (or clears) the currently discussed vehicle. Moving to a
    /// *different* vehicle invalidates the financing fields; re-selecting
    /// the same stock id keeps them.
    pub fn select_vehicle(&mut self, vehicle: Option<VehicleRecord>) {
        let changed = match (&self.selected_vehicle, &vehicle) {
            (Some(current), Some(next)) => current.stock_id != next.stock_id,
            (None, Some(_)) | (Some(_), None) => true,
            (None, None) => false,
        };
        if changed {
            self.clear_financing();
        }

        match &vehicle {
            Some(vehicle) => self.log_action("selected_vehicle", vehicle.display_name()),
            None => self.log_action("selected_vehicle", "none"),
        }
        self.selected_vehicle = vehicle;
    }

    pub fn set_search_filter(&mut self, filter: SearchFilter) {
        self.log_action("last_search_filter", format!("{filter:?}"));
        self.last_search_filter = Some(filter);
    }

    pub fn set_financing(
        &mut self,
        down_payment: f64,
        term_years: Option<u32>,
        monthly_payment: Option<f64>,
        amount_financed: f64,
    ) {
        self.down_payment = Some(down_payment);
        self.term_years = term_years;
        self.monthly_payment = monthly_payment;
        self.amount_financed = Some(amount_financed);
        self.log_action("financing", format!("down={down_payment} term={term_years:?}"));
    }

    pub fn clear_financing(&mut self) {
        self.down_payment = None;
        self.term_years = None;
        self.monthly_payment = None;
        self.amount_financed = None;
        self.annual_rate = ANNUAL_RATE;
        self.touch();
    }

    pub fn record_exchange(&mut self, utterance: &str, reply: &str, query_tag: &str) {
        self.last_utterance = Some(utterance.to_string());
        self.last_reply = Some(reply.to_string());
        self.last_query = Some(query_tag.to_string());
        self.log_action("last_query", format!("{query_tag}: {utterance}"));
    }
}

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily creates the customer's session. The returned handle is the
    /// per-key lock: callers hold it for the whole mutation.
    pub fn get_or_create(&self, customer_phone: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.lock_map();
        if let Some(session) = sessions.get(customer_phone) {
            return Arc::clone(session);
        }

        info!(
            event_name = "session.created",
            customer_phone = %customer_phone,
            "created conversation session"
        );
        let session = Arc::new(Mutex::new(Session::new(customer_phone)));
        sessions.insert(customer_phone.to_string(), Arc::clone(&session));
        session
    }

    /// Runs one serialized mutation against the customer's session.
    pub fn with_session<T>(&self, customer_phone: &str, f: impl FnOnce(&mut Session) -> T) -> T {
        let handle = self.get_or_create(customer_phone);
        let mut session = lock_session(&handle);
        f(&mut session)
    }

    pub fn delete(&self, customer_phone: &str) -> bool {
        self.lock_map().remove(customer_phone).is_some()
    }

    /// Replaces the session with a fresh one, re-seeding the customer
    /// identity.
    pub fn reset(&self, customer_phone: &str) {
        let session = Arc::new(Mutex::new(Session::new(customer_phone)));
        self.lock_map().insert(customer_phone.to_string(), session);
    }

    pub fn list_active(&self) -> Vec<String> {
        let mut phones: Vec<String> = self.lock_map().keys().cloned().collect();
        phones.sort();
        phones
    }

    /// Removes every session whose last activity is older than the
    /// threshold. Returns the number of evicted sessions.
    pub fn evict_inactive(&self, max_age_hours: i64) -> usize {
        let cutoff = Utc::now() - Duration::hours(max_age_hours);
        let mut sessions = self.lock_map();
        let before = sessions.len();
        sessions.retain(|_, session| lock_session(session).last_activity >= cutoff);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(event_name = "session.evicted", count = evicted, "evicted inactive sessions");
        }
        evicted
    }

    fn lock_map(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<Session>>>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn lock_session(session: &Arc<Mutex<Session>>) -> std::sync::MutexGuard<'_, Session> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{Session, SessionStore};
    use crate::catalog::dataset::fixtures::vehicle;
    use crate::financing::ANNUAL_RATE;

    #[test]
    fn sessions_are_created_lazily_and_shared_by_key() {
        let store = SessionStore::new();
        assert!(store.list_active().is_empty());

        let first = store.get_or_create("5215550001");
        let second = store.get_or_create("5215550001");
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert_eq!(store.list_active(), vec!["5215550001"]);
    }

    #[test]
    fn mutating_one_customer_never_touches_another() {
        let store = SessionStore::new();
        store.with_session("a", |session| {
            session.select_vehicle(Some(vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000)));
            session.set_financing(60_000.0, Some(4), Some(6_087.0), 240_000.0);
        });

        store.with_session("b", |session| {
            assert!(session.selected_vehicle.is_none());
            assert!(session.down_payment.is_none());
            assert!(session.actions().is_empty());
        });
    }

    #[test]
    fn selecting_a_different_vehicle_clears_financing() {
        let mut session = Session::new("x");
        session.select_vehicle(Some(vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000)));
        session.set_financing(60_000.0, Some(4), Some(6_087.0), 240_000.0);

        // Re-selecting the same stock id keeps the quote.
        session.select_vehicle(Some(vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000)));
        assert_eq!(session.down_payment, Some(60_000.0));

        session.select_vehicle(Some(vehicle(2, "Nissan", "Versa", 2020, 240_000.0, 35_000)));
        assert!(session.down_payment.is_none());
        assert!(session.term_years.is_none());
        assert!(session.monthly_payment.is_none());
        assert!(session.amount_financed.is_none());
        assert_eq!(session.annual_rate, ANNUAL_RATE);
    }

    #[test]
    fn action_log_entries_are_content_bounded() {
        let mut session = Session::new("x");
        session.log_action("last_query", "x".repeat(500));
        assert_eq!(session.actions().len(), 1);
        assert_eq!(session.actions()[0].value.chars().count(), 100);
    }

    #[test]
    fn reset_reseeds_the_customer_identity() {
        let store = SessionStore::new();
        store.with_session("5215550002", |session| {
            session.select_vehicle(Some(vehicle(1, "Toyota", "Corolla", 2021, 300_000.0, 20_000)));
        });

        store.reset("5215550002");
        store.with_session("5215550002", |session| {
            assert_eq!(session.customer_phone, "5215550002");
            assert!(session.selected_vehicle.is_none());
            assert!(session.actions().is_empty());
        });
    }

    #[test]
    fn delete_reports_whether_a_session_existed() {
        let store = SessionStore::new();
        assert!(!store.delete("nobody"));
        store.get_or_create("somebody");
        assert!(store.delete("somebody"));
        assert!(store.list_active().is_empty());
    }

    #[test]
    fn eviction_removes_stale_sessions_and_keeps_fresh_ones() {
        let store = SessionStore::new();
        let stale = store.get_or_create("stale");
        store.get_or_create("fresh");

        stale.lock().expect("session lock").last_activity = Utc::now() - Duration::hours(30);

        let evicted = store.evict_inactive(24);
        assert_eq!(evicted, 1);
        assert_eq!(store.list_active(), vec!["fresh"]);

        // The evicted customer comes back as a brand-new session.
        store.with_session("stale", |session| assert!(session.actions().is_empty()));
    }
}
