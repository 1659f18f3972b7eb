use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inferred type of a column's non-null values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    String,
    Integer,
    Decimal,
    Boolean,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "STRING",
            DataType::Integer => "INTEGER",
            DataType::Decimal => "DECIMAL",
            DataType::Boolean => "BOOLEAN",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown data type: {0}")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STRING" => Ok(DataType::String),
            "INTEGER" => Ok(DataType::Integer),
            "DECIMAL" => Ok(DataType::Decimal),
            "BOOLEAN" => Ok(DataType::Boolean),
            other => Err(UnknownDataType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatistics {
    pub column_name: String,
    pub null_count: usize,
    pub unique_count: usize,
    pub data_type: DataType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

impl ColumnStatistics {
    /// Statistics without numeric aggregates, as kept by the store.
    pub fn base(column_name: String, null_count: usize, unique_count: usize, data_type: DataType) -> Self {
        Self {
            column_name,
            null_count,
            unique_count,
            data_type,
            min: None,
            max: None,
            mean: None,
            median: None,
        }
    }

    #[cfg(test)]
    pub fn has_aggregates(&self) -> bool {
        self.min.is_some()
    }
}

/// Result of analysing one CSV document. `id` is assigned once the report is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub id: Option<i64>,
    pub number_of_rows: usize,
    pub number_of_columns: usize,
    pub total_characters: usize,
    pub column_statistics: Vec<ColumnStatistics>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Drops min/max/mean/median from every column.
    #[cfg(test)]
    pub fn without_aggregates(mut self) -> Self {
        for column in &mut self.column_statistics {
            column.min = None;
            column.max = None;
            column.mean = None;
            column.median = None;
        }
        self
    }
}
