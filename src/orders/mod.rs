//! Simulated order lifecycle for the trading demo screen
//!
//! Orders move `Pending -> Filled | Rejected` after a randomized delay, or
//! `Pending -> Cancelled` when cancelled first. Time and randomness are injected
//! through the [`Clock`] and [`RandomSource`] ports.

mod order;
mod config;
mod simulator;
pub mod clock;
pub mod random;

pub use order::{Notification, Order, OrderAction, OrderDraft, OrderId, OrderStatus};
pub use config::SimulatorConfig;
pub use simulator::{CallbackListener, OrderListener, OrderSimulator};
pub use clock::{Clock, ManualClock, TimerHandle, TokioClock};
pub use random::{RandomSource, RngSource, ScriptedRandom};
