use crate::flags::Configuration;
use serde::{Serialize, Serializer};
use std::{cmp, fmt, time::Duration};

/// Measured cost of a configuration. `Unusable` sorts after every duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fitness {
    Measured(Duration),
    Unusable,
}

impl Fitness {
    /// Larger is better: `1 / seconds`, or 0 when unusable.
    pub fn score(&self) -> f64 {
        match self {
            Fitness::Measured(duration) if !duration.is_zero() => 1.0 / duration.as_secs_f64(),
            // A zero duration is below the clock's resolution.
            Fitness::Measured(_) => f64::MAX,
            Fitness::Unusable => 0.0,
        }
    }

    #[inline]
    pub fn is_usable(&self) -> bool {
        matches!(self, Fitness::Measured(_))
    }

    pub fn seconds(&self) -> Option<f64> {
        match self {
            Fitness::Measured(duration) => Some(duration.as_secs_f64()),
            Fitness::Unusable => None,
        }
    }
}

impl Ord for Fitness {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        match (self, other) {
            (Fitness::Measured(a), Fitness::Measured(b)) => a.cmp(b),
            (Fitness::Measured(_), Fitness::Unusable) => cmp::Ordering::Less,
            (Fitness::Unusable, Fitness::Measured(_)) => cmp::Ordering::Greater,
            (Fitness::Unusable, Fitness::Unusable) => cmp::Ordering::Equal,
        }
    }
}

impl PartialOrd for Fitness {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Fitness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fitness::Measured(duration) => write!(f, "{:.6} s", duration.as_secs_f64()),
            Fitness::Unusable => write!(f, "unusable"),
        }
    }
}

impl Serialize for Fitness {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.seconds().serialize(serializer)
    }
}

/// A configuration together with what it measured. Ordered by fitness only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Evaluation(pub Configuration, pub Fitness);

impl PartialEq for Evaluation {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

impl Eq for Evaluation {}

impl PartialOrd for Evaluation {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Evaluation {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.1.cmp(&other.1)
    }
}
