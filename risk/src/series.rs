//! Return series input
//!
//! A [`ReturnSeries`] is the foundational input of every estimator. Values
//! are unitless returns (fractions or percentages, consistently), never
//! prices. Missing entries are kept as NaN and dropped by [`clean_values`].
//!
//! [`clean_values`]: ReturnSeries::clean_values

use crate::error::{RiskError, Result};
use crate::stats;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordered sequence of returns with optional observation dates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    values: Vec<f64>,
    dates: Option<Vec<NaiveDate>>,
}

/// Descriptive statistics of the clean sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Number of non-missing observations
    pub observations: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1)
    pub std_dev: Option<f64>,
    pub skewness: Option<f64>,
}

impl ReturnSeries {
    /// Create a series without dates
    ///
    /// # Example
    ///
    /// ```
    /// use qf_risk::ReturnSeries;
    ///
    /// let series = ReturnSeries::new(vec![0.01, f64::NAN, -0.02]);
    /// assert_eq!(series.len(), 3);
    /// assert_eq!(series.clean_values(), vec![0.01, -0.02]);
    /// ```
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            dates: None,
        }
    }

    /// Create a dated series; both vectors must have the same length
    pub fn with_dates(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(RiskError::InvalidParameter(format!(
                "Got {} dates for {} returns",
                dates.len(),
                values.len()
            )));
        }
        Ok(Self {
            values,
            dates: Some(dates),
        })
    }

    /// Raw values including missing entries
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn dates(&self) -> Option<&[NaiveDate]> {
        self.dates.as_deref()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns with missing (NaN) and non-finite entries removed
    pub fn clean_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| v.is_finite()).collect()
    }

    /// Clean losses, loss = -return
    pub fn losses(&self) -> Vec<f64> {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| -v)
            .collect()
    }

    pub fn summary(&self) -> SeriesSummary {
        let clean = self.clean_values();
        SeriesSummary {
            observations: clean.len(),
            mean: stats::mean(&clean),
            std_dev: stats::sample_std_dev(&clean),
            skewness: stats::skewness(&clean),
        }
    }
}

impl From<Vec<f64>> for ReturnSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl FromIterator<f64> for ReturnSeries {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
