//! Defined-or-undefined estimator results
//!
//! Small samples are an expected outcome, not a failure. Every estimator in
//! the crate returns an [`Estimate`] so callers check one sentinel type
//! instead of a mix of NaN values and errors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason an estimate could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Undefined {
    /// Too few clean observations in the return series
    InsufficientObservations { required: usize, available: usize },

    /// Too few losses above the EVT threshold
    InsufficientExceedances { required: usize, available: usize },

    /// Gearing requested at a scenario where the stock return is exactly zero
    ZeroStockReturn,
}

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Undefined::InsufficientObservations { required, available } => write!(
                f,
                "not enough observations ({} of {} required)",
                available, required
            ),
            Undefined::InsufficientExceedances { required, available } => write!(
                f,
                "not enough tail data ({} of {} exceedances required)",
                available, required
            ),
            Undefined::ZeroStockReturn => write!(f, "stock return is zero"),
        }
    }
}

/// A value, or an explicit marker that none exists for this input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Estimate<T> {
    Defined(T),
    Undefined(Undefined),
}

impl<T> Estimate<T> {
    pub fn is_defined(&self) -> bool {
        matches!(self, Estimate::Defined(_))
    }

    /// The value if defined
    pub fn value(self) -> Option<T> {
        match self {
            Estimate::Defined(v) => Some(v),
            Estimate::Undefined(_) => None,
        }
    }

    /// The reason if undefined
    pub fn undefined_reason(&self) -> Option<Undefined> {
        match self {
            Estimate::Defined(_) => None,
            Estimate::Undefined(reason) => Some(*reason),
        }
    }

    pub fn as_ref(&self) -> Estimate<&T> {
        match self {
            Estimate::Defined(v) => Estimate::Defined(v),
            Estimate::Undefined(reason) => Estimate::Undefined(*reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Estimate<U> {
        match self {
            Estimate::Defined(v) => Estimate::Defined(f(v)),
            Estimate::Undefined(reason) => Estimate::Undefined(reason),
        }
    }

    pub fn and_then<U, F: FnOnce(T) -> Estimate<U>>(self, f: F) -> Estimate<U> {
        match self {
            Estimate::Defined(v) => f(v),
            Estimate::Undefined(reason) => Estimate::Undefined(reason),
        }
    }
}

/// Width, fill and alignment apply to both variants; precision only to
/// defined values, so an undefined reason is never truncated.
impl fmt::Display for Estimate<f64> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Estimate::Defined(v) => fmt::Display::fmt(v, f),
            Estimate::Undefined(reason) => {
                let text = format!("undefined ({})", reason);
                let padding = f.width().unwrap_or(0).saturating_sub(text.chars().count());
                // Right-aligned by default, like the numbers it stands in for
                let (before, after) = match f.align() {
                    Some(fmt::Alignment::Left) => (0, padding),
                    Some(fmt::Alignment::Center) => (padding / 2, padding - padding / 2),
                    Some(fmt::Alignment::Right) | None => (padding, 0),
                };
                let fill = f.fill();
                for _ in 0..before {
                    write!(f, "{}", fill)?;
                }
                f.write_str(&text)?;
                for _ in 0..after {
                    write!(f, "{}", fill)?;
                }
                Ok(())
            }
        }
    }
}
