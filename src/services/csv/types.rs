use std::collections::HashSet;

use crate::models::ColumnStatistics;
use super::utils::{infer_data_type, parse_decimal, NumericSummary};

pub const FIELD_SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("CSV data must not be empty")]
    EmptyInput,
    #[error("Invalid CSV header")]
    InvalidHeader,
    #[error("Row {row} has a different number of columns than the header")]
    ColumnCountMismatch {
        /// 1-based, the header is row 1.
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Running statistics for a single column position during one analysis pass.
#[derive(Debug, Default)]
pub struct ColumnAccumulator {
    pub null_count: usize,
    pub distinct: HashSet<String>,
    pub numbers: Vec<f64>,
}

impl ColumnAccumulator {
    pub fn observe(&mut self, field: &str) {
        let value = field.trim();
        if value.is_empty() {
            self.null_count += 1;
            return;
        }

        if let Some(number) = parse_decimal(value) {
            self.numbers.push(number);
        }
        if !self.distinct.contains(value) {
            self.distinct.insert(value.to_string());
        }
    }

    pub fn finish(self, name: &str) -> ColumnStatistics {
        let summary = NumericSummary::from_values(&self.numbers);
        ColumnStatistics {
            column_name: name.to_string(),
            null_count: self.null_count,
            unique_count: self.distinct.len(),
            data_type: infer_data_type(&self.distinct),
            min: summary.map(|s| s.min),
            max: summary.map(|s| s.max),
            mean: summary.map(|s| s.mean),
            median: summary.map(|s| s.median),
        }
    }
}
