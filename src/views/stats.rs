//! Aggregate statistics for list views
//!
//! Every metric is recomputed from the collection currently held by the list
//! view. Rates over an empty collection are 0, never NaN.

use serde::Serialize;

/// `part / total × 100`, or 0 when `total` is 0
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// `sum / count`, or 0 when `count` is 0 or the result is not finite
pub fn ratio(sum: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let r = sum / count as f64;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

/// Visual tone of a stat card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Good,
    Warn,
    Bad,
}

/// One KPI card shown above a list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub label: String,
    pub value: String,
    pub tone: Tone,
}

impl StatCard {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            tone: Tone::Neutral,
        }
    }

    pub fn count(label: impl Into<String>, n: usize) -> Self {
        Self::new(label, n.to_string())
    }

    pub fn percent(label: impl Into<String>, value: f64) -> Self {
        Self::new(label, format!("{:.1}%", value))
    }

    pub fn number(label: impl Into<String>, value: f64, precision: usize, unit: &str) -> Self {
        let formatted = format!("{:.prec$}", value, prec = precision);
        if unit.is_empty() {
            Self::new(label, formatted)
        } else {
            Self::new(label, format!("{} {}", formatted, unit))
        }
    }

    pub fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Tone a count that should ideally be zero
    pub fn alert_if_nonzero(self, n: usize) -> Self {
        self.tone(if n > 0 { Tone::Bad } else { Tone::Good })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_denominators_are_zero() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(ratio(0.0, 0), 0.0);
        assert_eq!(ratio(12.5, 0), 0.0);
        assert!(!percentage(0, 0).is_nan());
    }

    #[test]
    fn test_percentage_and_ratio() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 3), 100.0);
        assert_eq!(ratio(10.0, 4), 2.5);
        assert_eq!(ratio(f64::INFINITY, 1), 0.0);
    }

    #[test]
    fn test_card_formatting() {
        assert_eq!(StatCard::percent("Pass rate", 0.0).value, "0.0%");
        assert_eq!(StatCard::number("Avg gap", 2.345, 2, "mm").value, "2.35 mm");
        assert_eq!(StatCard::count("Total", 7).value, "7");
        assert_eq!(StatCard::count("Open", 2).alert_if_nonzero(2).tone, Tone::Bad);
    }
}
