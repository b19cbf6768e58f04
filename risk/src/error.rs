//! Error types for risk calculations

use thiserror::Error;

/// Errors that can occur in risk calculations
///
/// Insufficient data is not an error: estimators report it through
/// [`Estimate::Undefined`](crate::Estimate::Undefined).
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Invalid threshold quantile: {0} (must be between 0 and 1)")]
    InvalidThresholdQuantile(f64),

    #[error("Unsupported VaR method: {0} (expected historical, parametric or evt)")]
    UnsupportedMethod(String),

    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("Number of simulations must be at least 1")]
    InvalidSimulationCount,

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Numerical instability: {0}")]
    NumericalInstability(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<serde_yaml::Error> for RiskError {
    fn from(err: serde_yaml::Error) -> Self {
        RiskError::ConfigError(err.to_string())
    }
}

impl From<serde_json::Error> for RiskError {
    fn from(err: serde_json::Error) -> Self {
        RiskError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

/// Reject non-finite or non-positive monetary inputs
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RiskError::NonPositive { name, value });
    }
    Ok(())
}

/// Reject probabilities outside the open unit interval
pub(crate) fn ensure_confidence(confidence_level: f64) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(RiskError::InvalidConfidenceLevel(confidence_level));
    }
    Ok(())
}

pub(crate) fn ensure_threshold_quantile(quantile: f64) -> Result<()> {
    if !(quantile > 0.0 && quantile < 1.0) {
        return Err(RiskError::InvalidThresholdQuantile(quantile));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_check() {
        assert!(ensure_positive("premium", 39.0).is_ok());
        assert!(matches!(
            ensure_positive("premium", 0.0),
            Err(RiskError::NonPositive { name: "premium", .. })
        ));
        assert!(ensure_positive("spot", f64::NAN).is_err());
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(ensure_confidence(0.95).is_ok());
        assert!(ensure_confidence(1.0).is_err());
        assert!(ensure_confidence(0.0).is_err());
        assert!(ensure_confidence(f64::NAN).is_err());
    }

    #[test]
    fn test_error_messages() {
        let err = RiskError::UnsupportedMethod("garch".to_string());
        assert!(err.to_string().contains("garch"));

        let err = RiskError::InvalidConfidenceLevel(1.5);
        assert!(err.to_string().contains("1.5"));
    }
}
