//! Per-pixel diagnostic tracing.
//!
//! A handful of pixels can be marked for tracing before a run; every value
//! computed at those pixels, for every node and bin, is recorded. This is
//! the debugging path for "why is this cell wrong": the trace shows the
//! whole dependency chain at that location without rerunning anything.

use serde::{Deserialize, Serialize};

/// A grid cell marked for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticPixel {
    pub col: usize,
    pub row: usize,
}

/// One traced value: a variable at a pixel in a bin.
#[derive(Debug, Clone, Serialize)]
pub struct TraceRecord {
    pub pixel: DiagnosticPixel,
    pub variable: String,
    pub bin: usize,
    pub value: f32,
}

/// All values recorded at the diagnostic pixels during one run.
#[derive(Debug, Default, Serialize)]
pub struct DiagnosticTrace {
    records: Vec<TraceRecord>,
}

impl DiagnosticTrace {
    pub fn push(&mut self, record: TraceRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = TraceRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The traced time series of one variable at one pixel, in bin order.
    pub fn series(&self, pixel: DiagnosticPixel, variable: &str) -> Vec<(usize, f32)> {
        let mut out: Vec<(usize, f32)> = self
            .records
            .iter()
            .filter(|r| r.pixel == pixel && r.variable == variable)
            .map(|r| (r.bin, r.value))
            .collect();
        out.sort_by_key(|(bin, _)| *bin);
        out
    }

    /// Names of all variables traced at a pixel, sorted.
    pub fn variables_at(&self, pixel: DiagnosticPixel) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .filter(|r| r.pixel == pixel)
            .map(|r| r.variable.clone())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
