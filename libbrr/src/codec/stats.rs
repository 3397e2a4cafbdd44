use serde::{Deserialize, Serialize};

/// squared reconstruction error over one encode pass
///
/// Errors are measured on the 15-bit scale the encoder simulates. Only
/// blocks produced by the search are counted; the silent terminator
/// appended afterwards is not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorStats {
    pub total: f64,
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub blocks: usize,
}

impl ErrorStats {
    pub(crate) fn new() -> Self {
        ErrorStats {
            total: 0.0,
            average: 0.0,
            min: f64::MAX,
            max: 0.0,
            blocks: 0,
        }
    }

    /// record one committed block
    pub(crate) fn record(&mut self, error: f64) {
        self.total += error;
        self.min = self.min.min(error);
        self.max = self.max.max(error);
        self.blocks += 1;
    }

    pub(crate) fn finish(mut self) -> Self {
        if self.blocks == 0 {
            self.min = 0.0;
        } else {
            self.average = self.total / self.blocks as f64;
        }
        self
    }
}

impl Default for ErrorStats {
    fn default() -> Self {
        ErrorStats::new().finish()
    }
}
