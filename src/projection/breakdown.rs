//! Projection output structures and breakdown export

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One year of the breakdown series, as if the horizon ended at `year`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YearlyRow {
    pub year: u32,
    pub contributed: f64,
    pub growth: f64,
    pub total: f64,
}

/// Complete projection result
///
/// Monetary fields are whole currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    /// Sum of all principal/contributions over the horizon
    pub total_contributed: f64,

    /// `final_value - total_contributed`
    pub total_growth: f64,

    /// Projected value at horizon end
    pub final_value: f64,

    /// One row per year, 1..=years
    pub yearly_breakdown: Vec<YearlyRow>,

    /// Annualized internal rate of return of the contribution schedule, in percent
    #[serde(default)]
    pub annualized_return_percent: Option<f64>,
}

impl ProjectionResult {
    /// Return ratios for display
    pub fn summary(&self) -> ReturnSummary {
        let (absolute_return_percent, wealth_multiple) = if self.total_contributed > 0.0 {
            (
                self.total_growth / self.total_contributed * 100.0,
                self.final_value / self.total_contributed,
            )
        } else {
            (0.0, 0.0)
        };

        ReturnSummary {
            years: self.yearly_breakdown.len() as u32,
            total_contributed: self.total_contributed,
            total_growth: self.total_growth,
            final_value: self.final_value,
            absolute_return_percent,
            wealth_multiple,
            annualized_return_percent: self.annualized_return_percent,
        }
    }

    /// Write the yearly breakdown as CSV (`year,contributed,growth,total`)
    pub fn write_breakdown_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in &self.yearly_breakdown {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the whole result as pretty JSON
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

/// Summary statistics for a projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnSummary {
    pub years: u32,
    pub total_contributed: f64,
    pub total_growth: f64,
    pub final_value: f64,
    /// Growth as a percentage of what was put in
    pub absolute_return_percent: f64,
    /// Final value per unit contributed
    pub wealth_multiple: f64,
    pub annualized_return_percent: Option<f64>,
}
