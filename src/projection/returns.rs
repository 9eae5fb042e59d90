//! Annualized return implied by a contribution schedule and its final value
//!
//! Finds the per-period rate `r` at which the schedule, paid at the start of each
//! period and compounded to the horizon, grows into the final value. Accumulated
//! value is strictly increasing in `r` when anything is paid in, so the root is
//! unique and a bracketed Newton iteration always converges.

/// Per-period rate search interval: -99% to +100% per period
const RATE_FLOOR: f64 = -0.99;
const RATE_CEILING: f64 = 1.0;

const MAX_ITERATIONS: usize = 200;
const RATE_TOLERANCE: f64 = 1e-12;

/// Annualized return of a projection, in percent
///
/// `contributions` are the amounts paid in at the start of each period and
/// `final_value` is the value at the end of the last period. Returns `None` when
/// nothing was paid in or when the implied rate lies outside the search interval.
pub fn annualized_return_percent(
    contributions: &[f64],
    final_value: f64,
    periods_per_year: u32,
) -> Option<f64> {
    if !final_value.is_finite() || contributions.iter().all(|&c| c <= 0.0) {
        return None;
    }

    let periodic = solve_periodic_rate(contributions, final_value)?;
    Some(((1.0 + periodic).powi(periods_per_year as i32) - 1.0) * 100.0)
}

/// Value of the schedule at the horizon, and its derivative, for a per-period rate
///
/// Horner form: each step adds the period's contribution and grows the running
/// balance by one period.
fn accumulate(contributions: &[f64], rate: f64) -> (f64, f64) {
    let growth = 1.0 + rate;
    let mut balance = 0.0;
    let mut slope = 0.0;

    for &contribution in contributions {
        let opening = balance + contribution;
        slope = slope * growth + opening;
        balance = opening * growth;
    }

    (balance, slope)
}

fn solve_periodic_rate(contributions: &[f64], final_value: f64) -> Option<f64> {
    let shortfall = |rate: f64| accumulate(contributions, rate).0 - final_value;

    let mut low = RATE_FLOOR;
    let mut high = RATE_CEILING;
    if shortfall(low) > 0.0 || shortfall(high) < 0.0 {
        return None;
    }

    let mut rate = 0.0;
    for _ in 0..MAX_ITERATIONS {
        let (balance, slope) = accumulate(contributions, rate);
        let diff = balance - final_value;

        if diff == 0.0 {
            return Some(rate);
        }
        if diff > 0.0 {
            high = rate;
        } else {
            low = rate;
        }

        // Newton step, or bisection when it would leave the bracket
        let newton = rate - diff / slope;
        let next = if slope > 0.0 && newton > low && newton < high {
            newton
        } else {
            (low + high) / 2.0
        };

        if (next - rate).abs() < RATE_TOLERANCE {
            return Some(next);
        }
        rate = next;
    }

    log::debug!("Return solver stopped after {} iterations at rate {}", MAX_ITERATIONS, rate);
    Some(rate)
}
