//! Record-level quality checks, one module per score dimension.

pub mod completeness;
pub mod consistency;
pub mod validity;

use stream_model::QualityIssue;

/// Issues raised by one dimension and which records failed it.
#[derive(Debug, Clone, Default)]
pub struct DimensionOutcome {
    pub issues: Vec<QualityIssue>,
    /// Indexed like the input records.
    pub failed: Vec<bool>,
}

impl DimensionOutcome {
    pub(crate) fn new(records: usize) -> Self {
        Self {
            issues: Vec::new(),
            failed: vec![false; records],
        }
    }

    pub(crate) fn fail(&mut self, index: usize, issue: QualityIssue) {
        self.failed[index] = true;
        self.issues.push(issue);
    }

    /// Records that passed every check of this dimension.
    pub fn passed(&self) -> usize {
        self.failed.iter().filter(|failed| !**failed).count()
    }
}
