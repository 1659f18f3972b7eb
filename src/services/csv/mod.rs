pub mod analyzer;
pub mod types;
pub mod utils;

pub use analyzer::CsvAnalyzer;
pub use types::AnalysisError;
