//! Order simulator configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn default_min_delay_ms() -> u64 { 2000 }
fn default_max_delay_ms() -> u64 { 8000 }
fn default_success_probability() -> f64 { 0.85 }
fn default_max_slippage() -> f64 { 1.0 }

fn default_rejection_reasons() -> Vec<String> {
    [
        "Insufficient liquidity",
        "Price limit exceeded",
        "Market closed",
        "Order timeout",
    ]
    .iter()
    .map(|reason| reason.to_string())
    .collect()
}

/// Tunables for simulated order resolution
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Lower bound of the resolution delay
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the resolution delay
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Probability that an order fills rather than being rejected
    #[serde(default = "default_success_probability")]
    pub success_probability: f64,

    /// Fills execute within `requested_price ± max_slippage`
    #[serde(default = "default_max_slippage")]
    pub max_slippage: f64,

    /// Reasons a rejected order may carry, picked uniformly
    #[serde(default = "default_rejection_reasons")]
    pub rejection_reasons: Vec<String>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            success_probability: default_success_probability(),
            max_slippage: default_max_slippage(),
            rejection_reasons: default_rejection_reasons(),
        }
    }
}

impl SimulatorConfig {
    /// Load from a JSON file, then validate
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        log::info!("Loaded simulator config from {:?}", path);
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_delay_ms > self.max_delay_ms {
            return Err(Error::invalid(format!(
                "min_delay_ms ({}) exceeds max_delay_ms ({})",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        if !(0.0..=1.0).contains(&self.success_probability) {
            return Err(Error::invalid(format!(
                "success_probability must be within [0, 1], got {}",
                self.success_probability
            )));
        }
        if !self.max_slippage.is_finite() || self.max_slippage < 0.0 {
            return Err(Error::invalid(format!(
                "max_slippage must be a non-negative number, got {}",
                self.max_slippage
            )));
        }
        if self.rejection_reasons.is_empty() {
            return Err(Error::invalid("rejection_reasons must not be empty"));
        }
        Ok(())
    }
}
