//! Resource names, quantities and threshold maps.
//!
//! Quantities follow the Kubernetes text format: a decimal number with an
//! optional exponent (`129e6`) or suffix, either decimal (`m`, `k`, `M`,
//! `G`, ...) or binary (`Ki`, `Mi`, `Gi`, ...). Values are kept as text and
//! parsed on demand so a malformed quantity only fails the computation that
//! touches it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QuantityError;

/// A percentage of node capacity. May exceed 100 or drop below 0 while
/// budgets are being computed and consumed.
pub type Percentage = f64;

/// Resource name → percentage, used both for configured thresholds and for
/// measured node usage.
pub type ResourceThresholds = BTreeMap<ResourceName, Percentage>;

/// Resource name → quantity, as found in node capacity and container specs.
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Name of a schedulable resource.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceName {
    Cpu,
    Memory,
    /// Number of pods a node can host.
    Pods,
    /// Any other resource; carried through but never accounted.
    Other(String),
}

impl ResourceName {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceName::Cpu => "cpu",
            ResourceName::Memory => "memory",
            ResourceName::Pods => "pods",
            ResourceName::Other(name) => name,
        }
    }

    /// Whether utilization accounting considers this resource.
    pub fn is_tracked(&self) -> bool {
        matches!(self, ResourceName::Cpu | ResourceName::Memory | ResourceName::Pods)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        match name {
            "cpu" => ResourceName::Cpu,
            "memory" => ResourceName::Memory,
            "pods" => ResourceName::Pods,
            other => ResourceName::Other(other.to_string()),
        }
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "cpu" | "memory" | "pods" => ResourceName::from(name.as_str()),
            _ => ResourceName::Other(name),
        }
    }
}

impl From<ResourceName> for String {
    fn from(name: ResourceName) -> Self {
        match name {
            ResourceName::Other(name) => name,
            tracked => tracked.as_str().to_string(),
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static QUANTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([+-]?(?:\d+\.?\d*|\.\d+))(?:[eE]([+-]?\d+))?([a-zA-Z]*)$")
        .expect("quantity pattern is a valid regex")
});

/// A resource quantity such as `500m`, `2`, or `4Gi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "QuantityRepr", into = "String")]
pub struct Quantity(String);

/// Quantities may appear as strings or bare numbers in inventory files.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<QuantityRepr> for Quantity {
    fn from(repr: QuantityRepr) -> Self {
        match repr {
            QuantityRepr::Text(s) => Quantity(s),
            QuantityRepr::Int(i) => Quantity(i.to_string()),
            QuantityRepr::Float(f) => Quantity(f.to_string()),
        }
    }
}

impl From<Quantity> for String {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl From<&str> for Quantity {
    fn from(s: &str) -> Self {
        Quantity(s.to_string())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Quantity {
    pub fn new(s: impl Into<String>) -> Self {
        Quantity(s.into())
    }

    /// The quantity in base units (cores, bytes, pods) as a float.
    pub fn as_f64(&self) -> Result<f64, QuantityError> {
        let text = self.0.trim();
        if text.is_empty() {
            return Err(QuantityError::Empty);
        }

        let caps = QUANTITY_PATTERN
            .captures(text)
            .ok_or_else(|| QuantityError::Invalid(text.to_string()))?;

        let mantissa: f64 = caps[1]
            .parse()
            .map_err(|_| QuantityError::Invalid(text.to_string()))?;
        let suffix = &caps[3];
        let exponent: i32 = match caps.get(2) {
            // An exponent and a suffix cannot be combined.
            Some(_) if !suffix.is_empty() => {
                return Err(QuantityError::Invalid(text.to_string()));
            }
            Some(e) => e
                .as_str()
                .parse()
                .map_err(|_| QuantityError::OutOfRange(text.to_string()))?,
            None => 0,
        };
        let multiplier = suffix_multiplier(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            quantity: text.to_string(),
            suffix: suffix.to_string(),
        })?;

        let value = mantissa * 10f64.powi(exponent) * multiplier;
        if !value.is_finite() {
            return Err(QuantityError::OutOfRange(text.to_string()));
        }
        Ok(value)
    }

    /// The quantity in thousandths of a base unit, rounded up.
    pub fn milli_value(&self) -> Result<i64, QuantityError> {
        round_up(self.as_f64()? * 1000.0, &self.0)
    }

    /// The quantity in base units, rounded up.
    pub fn value(&self) -> Result<i64, QuantityError> {
        round_up(self.as_f64()?, &self.0)
    }
}

fn suffix_multiplier(suffix: &str) -> Option<f64> {
    let m = match suffix {
        "" => 1.0,
        "n" => 1e-9,
        "u" => 1e-6,
        "m" => 1e-3,
        "k" => 1e3,
        "M" => 1e6,
        "G" => 1e9,
        "T" => 1e12,
        "P" => 1e15,
        "E" => 1e18,
        "Ki" => 1024.0,
        "Mi" => 1024f64.powi(2),
        "Gi" => 1024f64.powi(3),
        "Ti" => 1024f64.powi(4),
        "Pi" => 1024f64.powi(5),
        "Ei" => 1024f64.powi(6),
        _ => return None,
    };
    Some(m)
}

/// Round up to the next integer, ignoring float noise from suffix scaling
/// (`0.1 * 1000` must come out as 100, not 101).
fn round_up(value: f64, text: &str) -> Result<i64, QuantityError> {
    let nearest = value.round();
    let rounded = if (value - nearest).abs() < 1e-6 {
        nearest
    } else {
        value.ceil()
    };
    if rounded >= i64::MAX as f64 || rounded <= i64::MIN as f64 {
        return Err(QuantityError::OutOfRange(text.to_string()));
    }
    Ok(rounded as i64)
}
