//! Projection request types for the three investment modes

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Months per year used for periodic compounding
pub const PERIODS_PER_YEAR: u32 = 12;

/// Longest accepted investment horizon, in years
pub const MAX_YEARS: u32 = 100;

/// Investment mode, used when a request is assembled from loose input (CLI, forms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentMode {
    /// Constant monthly contribution
    Recurring,
    /// Single up-front principal, compounded annually
    LumpSum,
    /// Monthly contribution raised by a fixed percentage every year
    RecurringStepUp,
}

impl fmt::Display for InvestmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentMode::Recurring => write!(f, "RECURRING"),
            InvestmentMode::LumpSum => write!(f, "LUMP_SUM"),
            InvestmentMode::RecurringStepUp => write!(f, "RECURRING_STEP_UP"),
        }
    }
}

impl FromStr for InvestmentMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "recurring" | "sip" => Ok(InvestmentMode::Recurring),
            "lump-sum" | "lumpsum" => Ok(InvestmentMode::LumpSum),
            "recurring-step-up" | "step-up" | "step-up-sip" => Ok(InvestmentMode::RecurringStepUp),
            other => Err(Error::invalid(format!("unrecognized investment mode: {}", other))),
        }
    }
}

/// Parameters for a single projection
///
/// Rates are whole-number percentages: `12.0` means 12% per year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectionRequest {
    Recurring {
        periodic_amount: f64,
        annual_rate_percent: f64,
        years: u32,
    },
    LumpSum {
        principal: f64,
        annual_rate_percent: f64,
        years: u32,
    },
    RecurringStepUp {
        periodic_amount: f64,
        annual_rate_percent: f64,
        years: u32,
        annual_step_up_percent: f64,
    },
}

impl ProjectionRequest {
    /// Build a request from loose inputs
    ///
    /// `amount` is the monthly contribution for recurring modes and the principal for
    /// lump sum. `step_up_percent` is ignored unless the mode is `RecurringStepUp`.
    pub fn from_parts(
        mode: InvestmentMode,
        amount: f64,
        annual_rate_percent: f64,
        years: u32,
        step_up_percent: f64,
    ) -> Self {
        match mode {
            InvestmentMode::Recurring => ProjectionRequest::Recurring {
                periodic_amount: amount,
                annual_rate_percent,
                years,
            },
            InvestmentMode::LumpSum => ProjectionRequest::LumpSum {
                principal: amount,
                annual_rate_percent,
                years,
            },
            InvestmentMode::RecurringStepUp => ProjectionRequest::RecurringStepUp {
                periodic_amount: amount,
                annual_rate_percent,
                years,
                annual_step_up_percent: step_up_percent,
            },
        }
    }

    pub fn mode(&self) -> InvestmentMode {
        match self {
            ProjectionRequest::Recurring { .. } => InvestmentMode::Recurring,
            ProjectionRequest::LumpSum { .. } => InvestmentMode::LumpSum,
            ProjectionRequest::RecurringStepUp { .. } => InvestmentMode::RecurringStepUp,
        }
    }

    pub fn years(&self) -> u32 {
        match self {
            ProjectionRequest::Recurring { years, .. }
            | ProjectionRequest::LumpSum { years, .. }
            | ProjectionRequest::RecurringStepUp { years, .. } => *years,
        }
    }

    pub fn annual_rate_percent(&self) -> f64 {
        match self {
            ProjectionRequest::Recurring { annual_rate_percent, .. }
            | ProjectionRequest::LumpSum { annual_rate_percent, .. }
            | ProjectionRequest::RecurringStepUp { annual_rate_percent, .. } => *annual_rate_percent,
        }
    }

    /// Same request with the horizon replaced (used for the yearly breakdown)
    pub fn with_years(&self, years: u32) -> Self {
        let mut truncated = self.clone();
        match &mut truncated {
            ProjectionRequest::Recurring { years: y, .. }
            | ProjectionRequest::LumpSum { years: y, .. }
            | ProjectionRequest::RecurringStepUp { years: y, .. } => *y = years,
        }
        truncated
    }

    /// Same request with the annual rate replaced (used for rate sweeps)
    pub fn with_rate(&self, annual_rate_percent: f64) -> Self {
        let mut swept = self.clone();
        match &mut swept {
            ProjectionRequest::Recurring { annual_rate_percent: r, .. }
            | ProjectionRequest::LumpSum { annual_rate_percent: r, .. }
            | ProjectionRequest::RecurringStepUp { annual_rate_percent: r, .. } => {
                *r = annual_rate_percent
            }
        }
        swept
    }

    /// Check the field invariants: 1..=MAX_YEARS years, all amounts and rates finite and >= 0
    pub fn validate(&self) -> Result<()> {
        if self.years() < 1 {
            return Err(Error::invalid("years must be at least 1"));
        }
        if self.years() > MAX_YEARS {
            return Err(Error::invalid(format!(
                "years must be at most {}, got {}",
                MAX_YEARS,
                self.years()
            )));
        }

        check_non_negative("annual_rate_percent", self.annual_rate_percent())?;

        match self {
            ProjectionRequest::Recurring { periodic_amount, .. } => {
                check_non_negative("periodic_amount", *periodic_amount)
            }
            ProjectionRequest::LumpSum { principal, .. } => check_non_negative("principal", *principal),
            ProjectionRequest::RecurringStepUp {
                periodic_amount,
                annual_step_up_percent,
                ..
            } => {
                check_non_negative("periodic_amount", *periodic_amount)?;
                check_non_negative("annual_step_up_percent", *annual_step_up_percent)
            }
        }
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::invalid(format!("{} must be a finite number, got {}", field, value)));
    }
    if value < 0.0 {
        return Err(Error::invalid(format!("{} must not be negative, got {}", field, value)));
    }
    Ok(())
}
