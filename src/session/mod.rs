//! Session state handed to the UI layer
//!
//! Holds the last projection and the order list, and persists them to a
//! [`KeyValueStore`] between runs.

mod store;

pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

use crate::error::Result;
use crate::orders::{Order, OrderId};
use crate::projection::ProjectionResult;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Storage key for the last projection result
pub const LAST_PROJECTION_KEY: &str = "last_projection";

/// Storage key for the order list
pub const ORDERS_KEY: &str = "orders";

/// Explicit session context, owned by whoever drives the UI
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub last_projection: Option<ProjectionResult>,
    pub orders: Vec<Order>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a session; missing keys leave the matching field empty
    pub fn load_from(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(Self {
            last_projection: read_json(store, LAST_PROJECTION_KEY)?,
            orders: read_json(store, ORDERS_KEY)?.unwrap_or_default(),
        })
    }

    pub fn save_to(&self, store: &dyn KeyValueStore) -> Result<()> {
        match &self.last_projection {
            Some(result) => write_json(store, LAST_PROJECTION_KEY, result)?,
            None => store.remove(LAST_PROJECTION_KEY)?,
        }
        write_json(store, ORDERS_KEY, &self.orders)?;
        log::debug!("Saved session with {} orders", self.orders.len());
        Ok(())
    }

    /// Insert or replace an order by id, keeping the list in placement order
    pub fn upsert_order(&mut self, order: Order) {
        match self.orders.iter_mut().find(|existing| existing.id() == order.id()) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
    }

    /// First id a new simulator should issue so it never reuses an id saved here
    pub fn next_order_id(&self) -> OrderId {
        self.orders
            .iter()
            .map(|order| order.id().0.saturating_add(1))
            .max()
            .map_or(OrderId(1), OrderId)
    }

    pub fn clear(&mut self) {
        self.last_projection = None;
        self.orders.clear();
    }
}

fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    store.set(key, &serde_json::to_string(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::{
        ManualClock, OrderAction, OrderDraft, OrderSimulator, OrderStatus, ScriptedRandom, SimulatorConfig,
    };
    use crate::projection::{project, ProjectionRequest};
    use chrono::Utc;
    use std::sync::Arc;

    fn sample_order(id: u64, status: OrderStatus) -> Order {
        let draft = OrderDraft::new("AAPL", OrderAction::Buy, 5, 190.0).unwrap();
        let mut order = Order::pending(OrderId(id), draft, Utc::now());
        if status == OrderStatus::Cancelled {
            order.cancel(Utc::now());
        }
        order
    }

    fn simulator_after(session: &Session) -> OrderSimulator {
        OrderSimulator::with_first_id(
            SimulatorConfig::default(),
            Arc::new(ManualClock::default()),
            Arc::new(ScriptedRandom::new()),
            session.next_order_id(),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_through_memory_store() {
        let store = MemoryStore::new();
        let mut session = Session::new();
        session.last_projection = Some(
            project(&ProjectionRequest::LumpSum {
                principal: 100_000.0,
                annual_rate_percent: 10.0,
                years: 5,
            })
            .unwrap(),
        );
        session.upsert_order(sample_order(1, OrderStatus::Pending));

        session.save_to(&store).unwrap();
        let restored = Session::load_from(&store).unwrap();

        assert_eq!(restored.last_projection, session.last_projection);
        assert_eq!(restored.orders, session.orders);
    }

    #[test]
    fn test_load_empty_store() {
        let restored = Session::load_from(&MemoryStore::new()).unwrap();
        assert!(restored.last_projection.is_none());
        assert!(restored.orders.is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let mut session = Session::new();
        session.upsert_order(sample_order(1, OrderStatus::Pending));
        session.upsert_order(sample_order(2, OrderStatus::Pending));
        session.upsert_order(sample_order(1, OrderStatus::Cancelled));

        assert_eq!(session.orders.len(), 2);
        assert_eq!(session.orders[0].status(), OrderStatus::Cancelled);
    }

    #[test]
    fn test_next_order_id() {
        let mut session = Session::new();
        assert_eq!(session.next_order_id(), OrderId(1));

        session.upsert_order(sample_order(9, OrderStatus::Pending));
        session.upsert_order(sample_order(4, OrderStatus::Cancelled));
        assert_eq!(session.next_order_id(), OrderId(10));
    }

    #[test]
    fn test_orders_survive_a_second_run() {
        let store = MemoryStore::new();

        let mut first_run = Session::load_from(&store).unwrap();
        let aapl = simulator_after(&first_run)
            .place("AAPL", OrderAction::Buy, 5, 190.0)
            .unwrap();
        first_run.upsert_order(aapl.clone());
        first_run.save_to(&store).unwrap();

        let mut second_run = Session::load_from(&store).unwrap();
        let tsla = simulator_after(&second_run)
            .place("TSLA", OrderAction::Sell, 2, 250.0)
            .unwrap();
        second_run.upsert_order(tsla.clone());
        second_run.save_to(&store).unwrap();

        assert_ne!(aapl.id(), tsla.id());
        let restored = Session::load_from(&store).unwrap();
        let symbols: Vec<&str> = restored.orders.iter().map(|order| order.symbol()).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    }

    #[test]
    fn test_clearing_removes_stored_projection() {
        let store = MemoryStore::new();
        store.set(LAST_PROJECTION_KEY, "stale").unwrap();

        let mut session = Session::new();
        session.clear();
        session.save_to(&store).unwrap();

        assert_eq!(store.get(LAST_PROJECTION_KEY).unwrap(), None);
        assert_eq!(store.get(ORDERS_KEY).unwrap().as_deref(), Some("[]"));
    }
}
