use std::sync::Arc;

use crate::error::AppError;
use crate::models::AnalysisReport;
use crate::services::content_rules::ContentPolicy;
use crate::services::csv::CsvAnalyzer;
use crate::services::store::AnalysisStore;

/// Ingest, lookup and deletion of CSV analyses on top of the store.
pub struct AnalysisService {
    analyzer: CsvAnalyzer,
    policy: ContentPolicy,
    store: Arc<AnalysisStore>,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Analysis with id {} not found", id))
}

impl AnalysisService {
    pub fn new(store: Arc<AnalysisStore>, policy: ContentPolicy) -> Self {
        Self {
            analyzer: CsvAnalyzer::new(),
            policy,
            store,
        }
    }

    /// Validates and analyses `raw`, stores it and returns the report with its new id.
    /// Nothing is stored when validation fails.
    pub fn ingest(&self, raw: &str) -> Result<AnalysisReport, AppError> {
        self.policy.check(raw)?;
        let report = self.analyzer.analyze(raw)?;
        let id = self.store.insert(raw, &report)?;
        Ok(report.with_id(id))
    }

    pub fn get_by_id(&self, id: i64) -> Result<AnalysisReport, AppError> {
        self.store.find(id)?.ok_or_else(|| not_found(id))
    }

    /// Recomputes the full statistics, aggregates included, from the stored CSV text.
    /// This is a read: the recomputed report keeps the original id and timestamp and is not stored.
    pub fn get_statistics_by_id(&self, id: i64) -> Result<AnalysisReport, AppError> {
        let (raw, created_at) = self.store.raw_data(id)?.ok_or_else(|| not_found(id))?;

        let mut report = self.analyzer.analyze(&raw).map_err(|e| {
            // The text passed validation when it was stored.
            AppError::Internal(format!("Stored analysis {} no longer parses: {}", id, e))
        })?;
        report.created_at = created_at;
        Ok(report.with_id(id))
    }

    pub fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        if self.store.delete(id)? {
            Ok(())
        } else {
            Err(not_found(id))
        }
    }
}
