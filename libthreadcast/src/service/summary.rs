use serde::Serialize;

use crate::history::{SlotReport, SlotStatus};

/// Counts for a batch of processed slots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub total: usize,
    pub succeeded: usize,
    pub partial: usize,
    pub failed: usize,
}

impl DaySummary {
    pub fn from_reports(reports: &[SlotReport]) -> Self {
        reports.iter().fold(Self::default(), |mut summary, report| {
            summary.total += 1;
            match report.status {
                SlotStatus::Success => summary.succeeded += 1,
                SlotStatus::Partial => summary.partial += 1,
                SlotStatus::Failed => summary.failed += 1,
            }
            summary
        })
    }

    /// True when every slot was fully published
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let reports = vec![
            SlotReport::published("a", vec!["x".into()], 1, None, None, None),
            SlotReport::published("b", vec!["x".into(), "y".into()], 1, None, None, None),
            SlotReport::generation_failed("c", "down"),
        ];

        let summary = DaySummary::from_reports(&reports);
        assert_eq!(
            summary,
            DaySummary {
                total: 3,
                succeeded: 1,
                partial: 1,
                failed: 1
            }
        );
        assert!(!summary.all_succeeded());
    }

    #[test]
    fn test_empty_day_counts_as_success() {
        assert!(DaySummary::from_reports(&[]).all_succeeded());
    }
}
