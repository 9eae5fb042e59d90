//! Compound-growth projections for recurring, lump sum and step-up investments

mod request;
mod engine;
mod breakdown;
pub mod returns;

pub use request::{InvestmentMode, ProjectionRequest, MAX_YEARS, PERIODS_PER_YEAR};
pub use engine::{project, contribution_schedule};
pub use breakdown::{ProjectionResult, ReturnSummary, YearlyRow};
