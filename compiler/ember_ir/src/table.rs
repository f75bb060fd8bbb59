use std::sync::Arc;

use crate::CodeUnit;

/// Append-only table of top-level code units owned by one VM.
#[derive(Debug, Default)]
pub struct CodeTable {
    units: Vec<Arc<CodeUnit>>,
}

impl CodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Append a unit, returning its index.
    pub fn push(&mut self, unit: Arc<CodeUnit>) -> usize {
        self.units.push(unit);
        self.units.len() - 1
    }

    pub fn get(&self, idx: usize) -> Option<&Arc<CodeUnit>> {
        self.units.get(idx)
    }

    /// Remove and return every unit added at or after `baseline`.
    pub fn drain_from(&mut self, baseline: usize) -> Vec<Arc<CodeUnit>> {
        let start = baseline.min(self.units.len());
        self.units.drain(start..).collect()
    }
}
