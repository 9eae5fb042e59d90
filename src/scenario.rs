//! Scenario runner for batch projections
//!
//! Runs many independent projections in parallel, e.g. the same plan at several
//! expected rates for a "what if" comparison table.

use crate::error::Result;
use crate::projection::{project, ProjectionRequest, ProjectionResult};
use rayon::prelude::*;

/// One swept scenario: the rate that was applied and its outcome
#[derive(Debug)]
pub struct RateScenario {
    pub annual_rate_percent: f64,
    pub result: Result<ProjectionResult>,
}

/// Parallel batch runner for projections
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::new();
/// let base = ProjectionRequest::Recurring { periodic_amount: 5000.0, annual_rate_percent: 12.0, years: 10 };
/// for scenario in runner.rate_sweep(&base, &[8.0, 10.0, 12.0]) {
///     println!("{}% -> {:?}", scenario.annual_rate_percent, scenario.result.map(|r| r.final_value));
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    /// Run sequentially instead of on the rayon pool
    sequential: bool,
}

impl ScenarioRunner {
    pub fn new() -> Self {
        Self { sequential: false }
    }

    /// Runner that never touches the thread pool (useful inside other parallel work)
    pub fn sequential() -> Self {
        Self { sequential: true }
    }

    /// Run each request independently; results keep input order
    pub fn run_batch(&self, requests: &[ProjectionRequest]) -> Vec<Result<ProjectionResult>> {
        log::info!("Running {} projections", requests.len());

        if self.sequential {
            requests.iter().map(project).collect()
        } else {
            requests.par_iter().map(project).collect()
        }
    }

    /// Run the same request at each of the given annual rates
    pub fn rate_sweep(&self, base: &ProjectionRequest, rates: &[f64]) -> Vec<RateScenario> {
        let requests: Vec<ProjectionRequest> = rates.iter().map(|&rate| base.with_rate(rate)).collect();

        self.run_batch(&requests)
            .into_iter()
            .zip(rates)
            .map(|(result, &annual_rate_percent)| RateScenario {
                annual_rate_percent,
                result,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn base_request() -> ProjectionRequest {
        ProjectionRequest::Recurring {
            periodic_amount: 5000.0,
            annual_rate_percent: 12.0,
            years: 10,
        }
    }

    #[test]
    fn test_rate_sweep_orders_by_rate() {
        let runner = ScenarioRunner::new();
        let scenarios = runner.rate_sweep(&base_request(), &[6.0, 9.0, 12.0]);

        assert_eq!(scenarios.len(), 3);
        assert_eq!(scenarios[0].annual_rate_percent, 6.0);

        let finals: Vec<f64> = scenarios
            .iter()
            .map(|s| s.result.as_ref().unwrap().final_value)
            .collect();

        // Higher rate, higher final value
        assert!(finals[0] < finals[1] && finals[1] < finals[2]);
    }

    #[test]
    fn test_batch_matches_single_projection() {
        let requests = vec![
            base_request(),
            ProjectionRequest::LumpSum {
                principal: 100_000.0,
                annual_rate_percent: 10.0,
                years: 5,
            },
        ];

        let parallel = ScenarioRunner::new().run_batch(&requests);
        let sequential = ScenarioRunner::sequential().run_batch(&requests);

        for ((p, s), request) in parallel.iter().zip(&sequential).zip(&requests) {
            let expected = project(request).unwrap();
            assert_eq!(p.as_ref().unwrap(), &expected);
            assert_eq!(s.as_ref().unwrap(), &expected);
        }
    }

    #[test]
    fn test_invalid_scenarios_fail_individually() {
        let scenarios = ScenarioRunner::new().rate_sweep(&base_request(), &[-2.0, 8.0]);

        assert!(matches!(scenarios[0].result, Err(Error::InvalidArgument(_))));
        assert!(scenarios[1].result.is_ok());
    }
}
