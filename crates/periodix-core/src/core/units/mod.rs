//! Unit conversion.
//!
//! Values are held internally in a fixed set of base units (angstrom, eV,
//! amu, ps, elementary charge, degree). Conversion is provided as a service
//! behind the [`UnitConverter`] trait so callers can inject their own table;
//! [`StandardUnits`] is the built-in implementation.

pub mod registry;

use crate::core::models::property::PropValue;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    Unknown(String),

    #[error("Malformed unit expression '{expression}': {reason}")]
    Malformed {
        expression: String,
        reason: &'static str,
    },

    #[error("Cannot convert a {0} value between units")]
    NonNumeric(&'static str),
}

/// Converts numbers between internal base units and named units.
pub trait UnitConverter {
    /// Size of one `unit` in internal base units.
    fn factor(&self, unit: &str) -> Result<f64, UnitError>;

    /// Interprets `value` as given in `unit` and returns it in base units.
    fn set_in_units(&self, value: f64, unit: &str) -> Result<f64, UnitError> {
        Ok(value * self.factor(unit)?)
    }

    /// Expresses a base-unit `value` in `unit`.
    fn get_in_units(&self, value: f64, unit: &str) -> Result<f64, UnitError> {
        Ok(value / self.factor(unit)?)
    }
}

/// The built-in unit table with support for compound expressions.
///
/// Expressions combine named units with `*`, `/` and integer powers `^n`,
/// evaluated left to right: `eV/angstrom`, `g/cm^3`, `kcal/mol`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardUnits;

impl UnitConverter for StandardUnits {
    fn factor(&self, unit: &str) -> Result<f64, UnitError> {
        let unit = unit.trim();
        if let Some(factor) = registry::factor(unit) {
            return Ok(factor);
        }
        parse_expression(unit)
    }
}

fn parse_expression(expression: &str) -> Result<f64, UnitError> {
    let malformed = |reason| UnitError::Malformed {
        expression: expression.to_string(),
        reason,
    };
    if expression.is_empty() {
        return Err(malformed("empty expression"));
    }

    let mut total = 1.0;
    let mut divide = false;
    let mut rest = expression;
    loop {
        let end = rest.find(['*', '/']).unwrap_or(rest.len());
        let term = rest[..end].trim();
        if term.is_empty() {
            return Err(malformed("missing unit between operators"));
        }

        let value = parse_term(term).map_err(|err| match err {
            UnitError::Malformed { reason, .. } => malformed(reason),
            other => other,
        })?;
        total = if divide { total / value } else { total * value };

        if end == rest.len() {
            return Ok(total);
        }
        divide = rest.as_bytes()[end] == b'/';
        rest = &rest[end + 1..];
    }
}

fn parse_term(term: &str) -> Result<f64, UnitError> {
    let (name, power) = match term.split_once('^') {
        Some((name, power)) => {
            let power: i32 = power.trim().parse().map_err(|_| UnitError::Malformed {
                expression: term.to_string(),
                reason: "power must be an integer",
            })?;
            (name.trim(), power)
        }
        None => (term, 1),
    };

    let base = if name == "1" {
        1.0
    } else {
        registry::factor(name).ok_or_else(|| UnitError::Unknown(name.to_string()))?
    };
    Ok(base.powi(power))
}

/// Expresses every number in a base-unit `value` in `unit`.
///
/// Vectors and sequences are converted element-wise; integers become floats.
pub fn get_value_in_units(
    converter: &dyn UnitConverter,
    value: &PropValue,
    unit: &str,
) -> Result<PropValue, UnitError> {
    let factor = converter.factor(unit)?;
    match value {
        PropValue::Int(v) => Ok(PropValue::Float(*v as f64 / factor)),
        PropValue::Float(v) => Ok(PropValue::Float(v / factor)),
        PropValue::Vector(v) => Ok(PropValue::Vector(v / factor)),
        PropValue::Sequence(values) => Ok(PropValue::Sequence(
            values.iter().map(|v| v / factor).collect(),
        )),
        PropValue::Bool(_) | PropValue::Text(_) => Err(UnitError::NonNumeric(value.kind())),
    }
}
