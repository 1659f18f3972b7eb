use chrono::Utc;

use crate::models::AnalysisReport;
use super::types::{AnalysisError, ColumnAccumulator};
use super::utils::{split_fields, split_lines};

/// Computes per-column statistics for raw CSV text. Holds no state between calls.
#[derive(Debug, Default, Clone, Copy)]
pub struct CsvAnalyzer;

impl CsvAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Parses and validates `raw`, then builds the report. The returned report has no id.
    pub fn analyze(&self, raw: &str) -> Result<AnalysisReport, AnalysisError> {
        let start = std::time::Instant::now();

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        let rows: Vec<Vec<&str>> = split_lines(trimmed).map(split_fields).collect();

        let header = match rows.first() {
            Some(header) if !header.is_empty() => header,
            _ => return Err(AnalysisError::InvalidHeader),
        };
        let column_count = header.len();

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != column_count)
        {
            tracing::warn!(
                "Rejecting CSV: row {} has {} fields, header has {}",
                idx + 1,
                row.len(),
                column_count
            );
            return Err(AnalysisError::ColumnCountMismatch {
                row: idx + 1,
                expected: column_count,
                found: row.len(),
            });
        }

        // Accumulators are keyed by position so repeated header names stay independent.
        let mut accumulators: Vec<ColumnAccumulator> =
            header.iter().map(|_| ColumnAccumulator::default()).collect();

        for row in rows.iter().skip(1) {
            for (acc, field) in accumulators.iter_mut().zip(row) {
                acc.observe(field);
            }
        }

        let column_statistics = header
            .iter()
            .zip(accumulators)
            .map(|(name, acc)| acc.finish(name))
            .collect();

        let report = AnalysisReport {
            id: None,
            number_of_rows: rows.len().saturating_sub(1),
            number_of_columns: column_count,
            // UTF-16 code units, so a character outside the BMP counts twice.
            total_characters: raw.encode_utf16().count(),
            column_statistics,
            created_at: Utc::now(),
        };

        tracing::debug!(
            "Analyzed CSV with {} rows and {} columns in {:?}",
            report.number_of_rows,
            report.number_of_columns,
            start.elapsed()
        );

        Ok(report)
    }
}
