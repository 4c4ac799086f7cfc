//! Chart time-span selection.

use std::str::FromStr;

use crate::error::Error;

/// Explicit spans the user can pick, in minutes.
pub const SPAN_MINUTES: [u32; 10] = [5, 15, 30, 60, 120, 240, 360, 480, 720, 1440];

/// How wide the chart window is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChartSpan {
    /// Size the window from the cook's progress.
    #[default]
    Auto,
    /// A fixed number of minutes.
    Minutes(u32),
}

impl ChartSpan {
    /// All selectable spans, `Auto` first.
    pub fn options() -> impl Iterator<Item = ChartSpan> {
        std::iter::once(ChartSpan::Auto).chain(SPAN_MINUTES.iter().map(|m| ChartSpan::Minutes(*m)))
    }

    /// The value used by the span selector.
    pub fn value(&self) -> String {
        match self {
            Self::Auto => "auto".to_string(),
            Self::Minutes(m) => m.to_string(),
        }
    }

    /// Translation key of the label, e.g. `"span_15"`.
    pub fn label_key(&self) -> String {
        format!("span_{}", self.value())
    }

    /// Short English label, e.g. `"15 min"` or `"2h"`.
    pub fn label(&self) -> String {
        match self {
            Self::Auto => "Auto".to_string(),
            Self::Minutes(m) if *m < 60 => format!("{} min", m),
            Self::Minutes(m) => format!("{}h", m / 60),
        }
    }
}

impl FromStr for ChartSpan {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "auto" {
            return Ok(Self::Auto);
        }

        match s.parse::<u32>() {
            Ok(m) if SPAN_MINUTES.contains(&m) => Ok(Self::Minutes(m)),
            _ => Err(Error::InvalidParameter {
                name: "span".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_parse() {
        assert_eq!("auto".parse::<ChartSpan>().unwrap(), ChartSpan::Auto);
        assert_eq!("120".parse::<ChartSpan>().unwrap(), ChartSpan::Minutes(120));
        assert!("7".parse::<ChartSpan>().is_err());
        assert!("0".parse::<ChartSpan>().is_err());
        assert!("soon".parse::<ChartSpan>().is_err());
    }

    #[test]
    fn test_span_labels() {
        let labels: Vec<_> = ChartSpan::options().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Auto", "5 min", "15 min", "30 min", "1h", "2h", "4h", "6h", "8h", "12h", "24h"
            ]
        );
    }

    #[test]
    fn test_span_value() {
        assert_eq!(ChartSpan::Auto.value(), "auto");
        assert_eq!(ChartSpan::Minutes(1440).value(), "1440");
        assert_eq!(ChartSpan::Auto.label_key(), "span_auto");
        assert_eq!(ChartSpan::Minutes(60).label_key(), "span_60");
    }
}
