//! Compound-growth calculators for recurring, lump sum and step-up investments

use super::breakdown::{ProjectionResult, YearlyRow};
use super::request::{ProjectionRequest, PERIODS_PER_YEAR};
use super::returns::annualized_return_percent;
use crate::error::Result;

/// Unrounded aggregates for one horizon
#[derive(Debug, Clone, Copy)]
struct RawProjection {
    contributed: f64,
    future_value: f64,
}

impl RawProjection {
    /// Round each aggregate independently, then derive growth from the rounded values
    fn to_row(self, year: u32) -> YearlyRow {
        let contributed = self.contributed.round();
        let total = self.future_value.round();
        YearlyRow {
            year,
            contributed,
            growth: total - contributed,
            total,
        }
    }
}

/// Project a request to its horizon, with a year-by-year breakdown
pub fn project(request: &ProjectionRequest) -> Result<ProjectionResult> {
    request.validate()?;

    let years = request.years();

    // Each breakdown year is a full recomputation with the horizon truncated to that year
    let yearly_breakdown: Vec<YearlyRow> = (1..=years)
        .map(|year| compute(&request.with_years(year)).to_row(year))
        .collect();

    let final_row = compute(request).to_row(years);

    let periods_per_year = match request {
        ProjectionRequest::LumpSum { .. } => 1,
        _ => PERIODS_PER_YEAR,
    };
    let annualized_return_percent =
        annualized_return_percent(&contribution_schedule(request)?, final_row.total, periods_per_year);

    log::debug!(
        "Projected {} over {} years: contributed={} final={}",
        request.mode(),
        years,
        final_row.contributed,
        final_row.total
    );

    Ok(ProjectionResult {
        total_contributed: final_row.contributed,
        total_growth: final_row.growth,
        final_value: final_row.total,
        yearly_breakdown,
        annualized_return_percent,
    })
}

/// Amount paid in at the start of each period
///
/// Monthly for the recurring modes, one entry per year (only the first non-zero) for lump sum.
pub fn contribution_schedule(request: &ProjectionRequest) -> Result<Vec<f64>> {
    request.validate()?;

    let schedule = match *request {
        ProjectionRequest::Recurring { periodic_amount, years, .. } => {
            vec![periodic_amount; total_periods(years)]
        }
        ProjectionRequest::LumpSum { principal, years, .. } => {
            let mut schedule = vec![0.0; years as usize];
            if let Some(first) = schedule.first_mut() {
                *first = principal;
            }
            schedule
        }
        ProjectionRequest::RecurringStepUp {
            periodic_amount,
            years,
            annual_step_up_percent,
            ..
        } => {
            let step_factor = 1.0 + annual_step_up_percent / 100.0;
            let mut amount = periodic_amount;
            (0..total_periods(years))
                .map(|period| {
                    if period > 0 && period % PERIODS_PER_YEAR as usize == 0 {
                        amount *= step_factor;
                    }
                    amount
                })
                .collect()
        }
    };
    Ok(schedule)
}

fn compute(request: &ProjectionRequest) -> RawProjection {
    match *request {
        ProjectionRequest::Recurring {
            periodic_amount,
            annual_rate_percent,
            years,
        } => recurring(periodic_amount, annual_rate_percent, years),
        ProjectionRequest::LumpSum {
            principal,
            annual_rate_percent,
            years,
        } => lump_sum(principal, annual_rate_percent, years),
        ProjectionRequest::RecurringStepUp {
            periodic_amount,
            annual_rate_percent,
            years,
            annual_step_up_percent,
        } => {
            if annual_step_up_percent == 0.0 {
                // No step-up is a plain recurring plan; share its closed form so results match exactly
                recurring(periodic_amount, annual_rate_percent, years)
            } else {
                step_up(periodic_amount, annual_rate_percent, years, annual_step_up_percent)
            }
        }
    }
}

/// Annuity-due future value of a constant monthly contribution
fn recurring(periodic_amount: f64, annual_rate_percent: f64, years: u32) -> RawProjection {
    let r = monthly_rate(annual_rate_percent);
    let n = total_periods(years);

    let future_value = if r == 0.0 {
        periodic_amount * n as f64
    } else {
        periodic_amount * (((1.0 + r).powi(n as i32) - 1.0) / r) * (1.0 + r)
    };

    RawProjection {
        contributed: periodic_amount * n as f64,
        future_value,
    }
}

/// Single principal compounded annually
fn lump_sum(principal: f64, annual_rate_percent: f64, years: u32) -> RawProjection {
    RawProjection {
        contributed: principal,
        future_value: principal * (1.0 + annual_rate_percent / 100.0).powi(years as i32),
    }
}

/// Period-by-period simulation with the contribution raised after each completed year
fn step_up(
    periodic_amount: f64,
    annual_rate_percent: f64,
    years: u32,
    annual_step_up_percent: f64,
) -> RawProjection {
    let r = monthly_rate(annual_rate_percent);
    let n = total_periods(years);
    let step_factor = 1.0 + annual_step_up_percent / 100.0;

    let mut amount = periodic_amount;
    let mut contributed = 0.0;
    let mut future_value = 0.0;

    for period in 0..n {
        if period > 0 && period % PERIODS_PER_YEAR as usize == 0 {
            amount *= step_factor;
        }
        contributed += amount;
        // Compounds for the remaining periods including this one
        future_value += amount * (1.0 + r).powi((n - period) as i32);
    }

    RawProjection {
        contributed,
        future_value,
    }
}

/// Monthly periods in a validated horizon (at most `MAX_YEARS * 12`)
fn total_periods(years: u32) -> usize {
    years as usize * PERIODS_PER_YEAR as usize
}

fn monthly_rate(annual_rate_percent: f64) -> f64 {
    annual_rate_percent / PERIODS_PER_YEAR as f64 / 100.0
}
