use argh::FromArgValue;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How repeated timings of one binary collapse into a single measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    Minimum,
    #[default]
    Median,
    Maximum,
}

impl FromArgValue for Criterion {
    fn from_arg_value(value: &str) -> Result<Self, String> {
        match value.to_lowercase().as_str() {
            "minimum" => Ok(Criterion::Minimum),
            "median" => Ok(Criterion::Median),
            "maximum" => Ok(Criterion::Maximum),
            _ => Err(format!("Invalid criterion: {}", value)),
        }
    }
}

impl Criterion {
    /// `None` when there is nothing to aggregate.
    pub fn extract_representative(&self, mut values: Vec<Duration>) -> Option<Duration> {
        match self {
            Criterion::Minimum => values.into_iter().min(),
            Criterion::Maximum => values.into_iter().max(),
            Criterion::Median => {
                values.sort();
                values.get(values.len() / 2).copied()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|v| Duration::from_millis(*v)).collect()
    }

    #[test]
    fn test_extract_representative() {
        let values = ms(&[30, 10, 20]);
        assert_eq!(
            Criterion::Minimum.extract_representative(values.clone()),
            Some(Duration::from_millis(10))
        );
        assert_eq!(
            Criterion::Median.extract_representative(values.clone()),
            Some(Duration::from_millis(20))
        );
        assert_eq!(
            Criterion::Maximum.extract_representative(values),
            Some(Duration::from_millis(30))
        );
        assert_eq!(Criterion::Median.extract_representative(Vec::new()), None);
    }

    #[test]
    fn parses_from_arguments() {
        assert_eq!(
            Criterion::from_arg_value("Median"),
            Ok(Criterion::Median)
        );
        assert!(Criterion::from_arg_value("mean").is_err());
    }
}
