//! Per-sweep outcome report.

use serde::Serialize;

/// What happened to one filter during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOutcome {
    Rendered,
    /// The filter returned no output.
    Absent,
    /// The filter panicked; treated as absent.
    Panicked,
    /// The filter exceeded the per-filter timeout; treated as absent.
    TimedOut,
}

impl FilterOutcome {
    pub fn is_rendered(self) -> bool {
        matches!(self, FilterOutcome::Rendered)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterReport {
    pub name: String,
    pub outcome: FilterOutcome,
    pub elapsed_ms: f64,
}

/// Outcome of one render sweep, in catalog order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub generation: u64,
    pub input_width: u32,
    pub input_height: u32,
    pub filters: Vec<FilterReport>,
    pub total_ms: f64,
}

impl SweepReport {
    pub fn new(generation: u64, input_width: u32, input_height: u32) -> Self {
        Self {
            generation,
            input_width,
            input_height,
            ..Default::default()
        }
    }

    pub fn push(&mut self, name: impl Into<String>, outcome: FilterOutcome, elapsed_ms: f64) {
        self.filters.push(FilterReport {
            name: name.into(),
            outcome,
            elapsed_ms,
        });
    }

    pub fn rendered_count(&self) -> usize {
        self.filters.iter().filter(|f| f.outcome.is_rendered()).count()
    }

    pub fn rendered(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|f| f.outcome.is_rendered())
            .map(|f| f.name.as_str())
    }

    pub fn absent(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|f| !f.outcome.is_rendered())
            .map(|f| f.name.as_str())
    }

    pub fn outcome(&self, name: &str) -> Option<FilterOutcome> {
        self.filters.iter().find(|f| f.name == name).map(|f| f.outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_lookup() {
        let mut report = SweepReport::new(3, 720, 720);
        report.push("Normal", FilterOutcome::Rendered, 0.1);
        report.push("Candy", FilterOutcome::Absent, 2.0);
        report.push("Udnie", FilterOutcome::TimedOut, 50.0);

        assert_eq!(report.rendered_count(), 1);
        assert_eq!(report.absent().collect::<Vec<_>>(), vec!["Candy", "Udnie"]);
        assert_eq!(report.outcome("Udnie"), Some(FilterOutcome::TimedOut));
        assert_eq!(report.outcome("Mosaic"), None);
    }

    #[test]
    fn test_serializes_snake_case_outcomes() {
        let mut report = SweepReport::new(1, 4, 4);
        report.push("The Scream", FilterOutcome::TimedOut, 1.5);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generation"], 1);
        assert_eq!(json["filters"][0]["name"], "The Scream");
        assert_eq!(json["filters"][0]["outcome"], "timed_out");
    }
}
