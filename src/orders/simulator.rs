//! Simulated order execution
//!
//! Every submitted order starts `Pending` and owns one timer. When the timer fires the
//! order is filled (with slippage) or rejected, exactly once. A cancel that takes the
//! book lock before the timer does always wins, and the later timer becomes a no-op.

use super::clock::{Clock, TimerHandle};
use super::config::SimulatorConfig;
use super::order::{Notification, Order, OrderAction, OrderDraft, OrderId, OrderStatus};
use super::random::RandomSource;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, Weak};
use std::time::Duration;

/// Receives resolved orders and the matching notification events
pub trait OrderListener: Send + Sync {
    /// Called once per order that filled or was rejected; never for cancelled orders
    fn on_resolved(&self, order: &Order);

    /// Called right after `on_resolved` with the event for the notification widget
    fn on_notification(&self, _notification: &Notification) {}
}

type ResolvedFn = Box<dyn Fn(&Order) + Send + Sync>;
type NotificationFn = Box<dyn Fn(&Notification) + Send + Sync>;

/// Listener built from two closures
pub struct CallbackListener {
    resolved: ResolvedFn,
    notification: NotificationFn,
}

impl CallbackListener {
    pub fn new(
        on_resolved: impl Fn(&Order) + Send + Sync + 'static,
        on_notification: impl Fn(&Notification) + Send + Sync + 'static,
    ) -> Self {
        Self {
            resolved: Box::new(on_resolved),
            notification: Box::new(on_notification),
        }
    }
}

impl OrderListener for CallbackListener {
    fn on_resolved(&self, order: &Order) {
        (self.resolved)(order)
    }

    fn on_notification(&self, notification: &Notification) {
        (self.notification)(notification)
    }
}

struct Entry {
    order: Order,
    timer: Option<TimerHandle>,
}

struct Shared {
    config: SimulatorConfig,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
    /// Ids are issued in increasing order, so iteration follows submission order
    book: Mutex<BTreeMap<OrderId, Entry>>,
    listeners: RwLock<Vec<Arc<dyn OrderListener>>>,
    next_id: AtomicU64,
}

impl Shared {
    fn book(&self) -> MutexGuard<'_, BTreeMap<OrderId, Entry>> {
        self.book.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Timer callback: settle a still-pending order and tell the listeners
    fn resolve(&self, id: OrderId) {
        let resolved = {
            let mut book = self.book();
            let Some(entry) = book.get_mut(&id) else {
                return;
            };
            if entry.order.status() != OrderStatus::Pending {
                log::debug!("Timer for {} fired after it became {}", id, entry.order.status());
                return;
            }
            entry.timer = None;

            let now = self.clock.now();
            if self.random.bernoulli(self.config.success_probability) {
                let slippage = self
                    .random
                    .uniform(-self.config.max_slippage, self.config.max_slippage);
                // Whole cents, never below one cent
                let executed_price = round_to_cents(entry.order.requested_price() + slippage).max(0.01);
                entry.order.fill(executed_price, now);
                log::info!(
                    "Filled {}: {} {} {} at {:.2} (requested {:.2})",
                    id,
                    entry.order.action(),
                    entry.order.quantity(),
                    entry.order.symbol(),
                    executed_price,
                    entry.order.requested_price()
                );
            } else {
                let reasons = &self.config.rejection_reasons;
                let reason = reasons[self.random.pick(reasons.len())].clone();
                log::info!("Rejected {} ({}): {}", id, entry.order.symbol(), reason);
                entry.order.reject(reason, now);
            }

            entry.order.clone()
        };

        // Listeners run without the book lock so they may call back into the simulator
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        let notification = Notification::for_order(&resolved);
        for listener in &listeners {
            listener.on_resolved(&resolved);
            if let Some(notification) = &notification {
                listener.on_notification(notification);
            }
        }
    }
}

/// Simulated order execution for the trading screen
///
/// Cheap to clone; clones share the same order book.
#[derive(Clone)]
pub struct OrderSimulator {
    shared: Arc<Shared>,
}

impl OrderSimulator {
    /// Simulator issuing ids from `ORD-000001`
    pub fn new(config: SimulatorConfig, clock: Arc<dyn Clock>, random: Arc<dyn RandomSource>) -> Result<Self> {
        Self::with_first_id(config, clock, random, OrderId(1))
    }

    /// Simulator whose first order gets `first_id`, for resuming after orders saved by an earlier run
    pub fn with_first_id(
        config: SimulatorConfig,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
        first_id: OrderId,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                clock,
                random,
                book: Mutex::new(BTreeMap::new()),
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(first_id.0),
            }),
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn OrderListener>) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.shared.config
    }

    /// Accept an order and schedule its resolution
    ///
    /// The returned order is always `Pending`.
    pub fn submit(&self, draft: OrderDraft) -> Order {
        let shared = &self.shared;
        let id = OrderId(shared.next_id.fetch_add(1, Ordering::Relaxed));
        let order = Order::pending(id, draft, shared.clock.now());

        let delay_ms = shared
            .random
            .uniform(shared.config.min_delay_ms as f64, shared.config.max_delay_ms as f64);
        let delay = Duration::from_millis(delay_ms.round().max(0.0) as u64);

        // The entry must exist before the timer is armed; a real clock may fire immediately
        shared.book().insert(
            id,
            Entry {
                order: order.clone(),
                timer: None,
            },
        );

        let weak: Weak<Shared> = Arc::downgrade(shared);
        let timer = shared.clock.after(
            delay,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.resolve(id);
                }
            }),
        );

        if let Some(entry) = shared.book().get_mut(&id) {
            if entry.order.status() == OrderStatus::Pending {
                entry.timer = Some(timer);
            }
        }

        log::info!(
            "Submitted {}: {} {} {} at {:.2}, resolving in {:?}",
            id,
            order.action(),
            order.quantity(),
            order.symbol(),
            order.requested_price(),
            delay
        );

        order
    }

    /// Build a draft from loose fields and submit it
    pub fn place(&self, symbol: &str, action: OrderAction, quantity: u32, requested_price: f64) -> Result<Order> {
        let draft = OrderDraft::new(symbol, action, quantity, requested_price)?;
        Ok(self.submit(draft))
    }

    /// Cancel a pending order
    ///
    /// Fails with `InvalidState` once the order has left `Pending`; the order is left untouched.
    pub fn cancel(&self, id: OrderId) -> Result<Order> {
        let (order, timer) = {
            let mut book = self.shared.book();
            let entry = book.get_mut(&id).ok_or(Error::UnknownOrder(id))?;
            if entry.order.status() != OrderStatus::Pending {
                return Err(Error::InvalidState {
                    order_id: id,
                    status: entry.order.status(),
                });
            }
            entry.order.cancel(self.shared.clock.now());
            (entry.order.clone(), entry.timer.take())
        };

        if let Some(timer) = timer {
            timer.cancel();
        }
        log::info!("Cancelled {} ({})", id, order.symbol());

        Ok(order)
    }

    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.shared.book().get(&id).map(|entry| entry.order.clone())
    }

    /// Snapshot of every order, in submission order
    pub fn orders(&self) -> Vec<Order> {
        self.shared.book().values().map(|entry| entry.order.clone()).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.shared
            .book()
            .values()
            .filter(|entry| entry.order.status() == OrderStatus::Pending)
            .count()
    }
}

impl fmt::Debug for OrderSimulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderSimulator")
            .field("config", &self.shared.config)
            .field("orders", &self.shared.book().len())
            .finish()
    }
}

fn round_to_cents(price: f64) -> f64 {
    (price * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::clock::{ManualClock, TokioClock};
    use crate::orders::random::{RngSource, ScriptedRandom};
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Recorder {
        resolved: Mutex<Vec<Order>>,
        notifications: Mutex<Vec<Notification>>,
    }

    impl OrderListener for Recorder {
        fn on_resolved(&self, order: &Order) {
            self.resolved.lock().unwrap().push(order.clone());
        }

        fn on_notification(&self, notification: &Notification) {
            self.notifications.lock().unwrap().push(notification.clone());
        }
    }

    fn setup(random: Arc<dyn RandomSource>) -> (OrderSimulator, ManualClock, Arc<Recorder>) {
        let clock = ManualClock::default();
        let simulator = OrderSimulator::new(SimulatorConfig::default(), Arc::new(clock.clone()), random).unwrap();
        let recorder = Arc::new(Recorder::default());
        simulator.add_listener(recorder.clone());
        (simulator, clock, recorder)
    }

    fn draft(symbol: &str, price: f64) -> OrderDraft {
        OrderDraft::new(symbol, OrderAction::Buy, 10, price).unwrap()
    }

    #[test]
    fn test_forced_fill_with_slippage() {
        // Draws: delay, then slippage
        let random = ScriptedRandom::new()
            .with_uniforms([3000.0, 0.5])
            .with_bernoullis([true]);
        let (simulator, clock, recorder) = setup(Arc::new(random));

        let order = simulator.submit(draft("AAPL", 100.0));
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.resolved_at().is_none());

        clock.advance(Duration::from_millis(2999));
        assert_eq!(simulator.order(order.id()).unwrap().status(), OrderStatus::Pending);

        clock.advance(Duration::from_millis(1));
        let filled = simulator.order(order.id()).unwrap();
        assert_eq!(filled.status(), OrderStatus::Filled);
        assert_relative_eq!(filled.executed_price().unwrap(), 100.5);
        assert!(filled.rejection_reason().is_none());
        assert_eq!(
            filled.resolved_at().unwrap() - filled.placed_at(),
            chrono::Duration::milliseconds(3000)
        );

        assert_eq!(recorder.resolved.lock().unwrap().len(), 1);
        let notifications = recorder.notifications.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].is_success());
        assert_eq!(notifications[0].message(), "BUY 10 AAPL executed at 100.50");
    }

    #[test]
    fn test_forced_rejection_picks_reason() {
        // Draws: delay, then reason index 2
        let random = ScriptedRandom::new()
            .with_uniforms([2000.0, 2.0])
            .with_bernoullis([false]);
        let (simulator, clock, recorder) = setup(Arc::new(random));

        let order = simulator.submit(draft("INFY", 1500.0));
        clock.run_until_idle();

        let rejected = simulator.order(order.id()).unwrap();
        assert_eq!(rejected.status(), OrderStatus::Rejected);
        assert_eq!(rejected.rejection_reason(), Some("Market closed"));
        assert!(rejected.executed_price().is_none());

        // Rejection travels the same path as a fill
        assert_eq!(recorder.resolved.lock().unwrap()[0].status(), OrderStatus::Rejected);
        assert_eq!(
            recorder.notifications.lock().unwrap()[0].message(),
            "Order for INFY rejected: Market closed"
        );
    }

    #[test]
    fn test_cancel_before_timer_suppresses_resolution() {
        let (simulator, clock, recorder) = setup(Arc::new(ScriptedRandom::new()));

        let order = simulator.submit(draft("TCS", 3500.0));
        let cancelled = simulator.cancel(order.id()).unwrap();

        assert_eq!(cancelled.status(), OrderStatus::Cancelled);
        assert!(cancelled.resolved_at().is_some());
        assert_eq!(clock.pending_timers(), 0);

        clock.advance(Duration::from_secs(60));
        assert_eq!(simulator.order(order.id()).unwrap().status(), OrderStatus::Cancelled);
        assert!(recorder.resolved.lock().unwrap().is_empty());
        assert!(recorder.notifications.lock().unwrap().is_empty());
    }

    #[test]
    fn test_cancel_after_resolution_is_invalid_state() {
        let random = ScriptedRandom::new().with_bernoullis([true]);
        let (simulator, clock, recorder) = setup(Arc::new(random));

        let order = simulator.submit(draft("HDFC", 1600.0));
        clock.run_until_idle();
        let before = simulator.order(order.id()).unwrap();

        let err = simulator.cancel(order.id()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidState {
                status: OrderStatus::Filled,
                ..
            }
        ));
        assert_eq!(simulator.order(order.id()).unwrap(), before);
        assert_eq!(recorder.resolved.lock().unwrap().len(), 1);

        // A second cancel of a cancelled order is also rejected
        let other = simulator.submit(draft("WIPRO", 450.0));
        simulator.cancel(other.id()).unwrap();
        assert!(matches!(
            simulator.cancel(other.id()),
            Err(Error::InvalidState {
                status: OrderStatus::Cancelled,
                ..
            })
        ));
    }

    #[test]
    fn test_cancel_unknown_order() {
        let (simulator, _clock, _recorder) = setup(Arc::new(ScriptedRandom::new()));
        assert!(matches!(simulator.cancel(OrderId(99)), Err(Error::UnknownOrder(_))));
    }

    #[test]
    fn test_every_order_reaches_one_terminal_state() {
        let (simulator, clock, recorder) = setup(Arc::new(RngSource::seeded(2024)));

        let orders: Vec<Order> = (0..50)
            .map(|i| simulator.submit(draft("SBIN", 500.0 + i as f64)))
            .collect();
        for order in orders.iter().step_by(5) {
            simulator.cancel(order.id()).unwrap();
        }
        assert_eq!(simulator.pending_count(), 40);

        clock.run_until_idle();

        assert_eq!(simulator.pending_count(), 0);
        let resolved = recorder.resolved.lock().unwrap();
        assert_eq!(resolved.len(), 40);

        let mut ids: Vec<OrderId> = resolved.iter().map(|o| o.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 40);

        for order in simulator.orders() {
            match order.status() {
                OrderStatus::Filled => {
                    let price = order.executed_price().unwrap();
                    assert!((price - order.requested_price()).abs() <= 1.0 + 1e-9);
                }
                OrderStatus::Rejected => assert!(order.rejection_reason().is_some()),
                OrderStatus::Cancelled => assert!(order.executed_price().is_none()),
                OrderStatus::Pending => panic!("order {} still pending", order.id()),
            }
        }
        assert_eq!(recorder.notifications.lock().unwrap().len(), 40);
    }

    #[test]
    fn test_orders_listed_in_submission_order() {
        let (simulator, _clock, _recorder) = setup(Arc::new(ScriptedRandom::new()));

        let first = simulator.place("ITC", OrderAction::Sell, 3, 440.0).unwrap();
        let second = simulator.place("LT", OrderAction::Buy, 1, 3600.0).unwrap();

        let ids: Vec<OrderId> = simulator.orders().iter().map(|o| o.id()).collect();
        assert_eq!(ids, vec![first.id(), second.id()]);
        assert!(matches!(
            simulator.place("ITC", OrderAction::Sell, 0, 440.0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_first_id_offsets_numbering() {
        let clock = ManualClock::default();
        let simulator = OrderSimulator::with_first_id(
            SimulatorConfig::default(),
            Arc::new(clock),
            Arc::new(ScriptedRandom::new()),
            OrderId(41),
        )
        .unwrap();

        assert_eq!(simulator.place("ITC", OrderAction::Buy, 1, 440.0).unwrap().id(), OrderId(41));
        assert_eq!(simulator.place("LT", OrderAction::Buy, 1, 3600.0).unwrap().id(), OrderId(42));
    }

    #[test]
    fn test_executed_price_in_whole_cents() {
        // Both delays are drawn at submit, slippage when each timer fires
        let random = ScriptedRandom::new()
            .with_uniforms([2000.0, 2000.0, 0.123456, -1.0])
            .with_bernoullis([true, true]);
        let (simulator, clock, _recorder) = setup(Arc::new(random));

        let regular = simulator.submit(draft("AAPL", 100.0));
        let penny = simulator.submit(draft("PENNY", 0.5));
        clock.run_until_idle();

        assert_eq!(simulator.order(regular.id()).unwrap().executed_price(), Some(100.12));
        assert_eq!(simulator.order(penny.id()).unwrap().executed_price(), Some(0.01));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SimulatorConfig {
            success_probability: -0.1,
            ..Default::default()
        };
        let result = OrderSimulator::new(config, Arc::new(ManualClock::default()), Arc::new(ScriptedRandom::new()));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_callback_listener() {
        let (simulator, clock, _recorder) = setup(Arc::new(ScriptedRandom::new().with_bernoullis([true])));
        let messages = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&messages);
        simulator.add_listener(Arc::new(CallbackListener::new(
            |_order| {},
            move |notification| sink.lock().unwrap().push(notification.message()),
        )));

        simulator.submit(draft("ONGC", 250.0));
        clock.run_until_idle();

        // Scripted fallback: slippage is the midpoint of the range, i.e. zero
        assert_eq!(*messages.lock().unwrap(), vec!["BUY 10 ONGC executed at 250.00".to_string()]);
    }

    #[tokio::test]
    async fn test_resolves_on_tokio_clock() {
        let config = SimulatorConfig {
            min_delay_ms: 5,
            max_delay_ms: 15,
            ..Default::default()
        };
        let clock = Arc::new(TokioClock::new(tokio::runtime::Handle::current()));
        let simulator = OrderSimulator::new(config, clock, Arc::new(RngSource::seeded(9))).unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        simulator.add_listener(Arc::new(CallbackListener::new(
            move |order| {
                let _ = tx.send(order.clone());
            },
            |_| {},
        )));

        let kept = simulator.submit(draft("BTC", 60000.0));
        let cancelled = simulator.submit(draft("ETH", 3000.0));
        simulator.cancel(cancelled.id()).unwrap();

        let resolved = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id(), kept.id());
        assert!(resolved.status().is_terminal());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(simulator.order(cancelled.id()).unwrap().status(), OrderStatus::Cancelled);
    }
}
