use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// The closed interval `[low, high]` of coordinates along one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Domain {
    low: f64,
    high: f64,
}

impl Domain {
    /// Create a domain. Bounds are validated when a schema is built.
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// The lower bound, inclusive.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// The upper bound, inclusive.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// The number of integer cells the domain spans, `high - low + 1`.
    pub fn width(&self) -> f64 {
        self.high - self.low + 1.0
    }

    /// Whether the bounds form a non-empty interval of finite width.
    pub fn is_valid(&self) -> bool {
        self.low <= self.high && self.width().is_finite()
    }

    /// Whether `value` lies within the bounds.
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

impl From<(f64, f64)> for Domain {
    fn from((low, high): (f64, f64)) -> Self {
        Self::new(low, high)
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.low, self.high)
    }
}

/// A named axis of an array's coordinate space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    name: Arc<str>,
    domain: Domain,
}

impl Dimension {
    /// Create a dimension spanning `domain`.
    pub fn new(name: impl Into<Arc<str>>, domain: impl Into<Domain>) -> Self {
        Self {
            name: name.into(),
            domain: domain.into(),
        }
    }

    /// The dimension's name.
    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    /// The domain of the dimension.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub(crate) fn with_domain(&self, domain: Domain) -> Self {
        Self {
            name: self.name.clone(),
            domain,
        }
    }
}

impl Display for Dimension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.name, self.domain)
    }
}
