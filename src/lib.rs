//! Invest Core - projection engine and simulated order execution for an investment tracker
//!
//! This library provides:
//! - Compound-growth projections for recurring (SIP), lump sum and step-up SIP plans
//! - Year-by-year breakdowns and annualized return figures for charting
//! - Batch and rate-sweep scenario runs
//! - A simulated order lifecycle (pending -> filled/rejected/cancelled) with injectable time and randomness
//! - Session state persisted to local key-value storage

pub mod error;
pub mod projection;
pub mod orders;
pub mod scenario;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use projection::{project, InvestmentMode, ProjectionRequest, ProjectionResult, YearlyRow};
pub use orders::{Order, OrderAction, OrderDraft, OrderId, OrderSimulator, OrderStatus, Notification, SimulatorConfig};
pub use scenario::ScenarioRunner;
pub use session::Session;
