use crate::error::AppError;

pub const DEFAULT_FORBIDDEN_CONTENT: &[&str] = &["Sonny Hayes"];

/// Rejects uploads that contain any of a configured list of substrings.
#[derive(Debug, Clone)]
pub struct ContentPolicy {
    forbidden: Vec<String>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_CONTENT.iter().map(|s| s.to_string()).collect())
    }
}

impl ContentPolicy {
    pub fn new(forbidden: Vec<String>) -> Self {
        Self {
            forbidden: forbidden.into_iter().filter(|s| !s.is_empty()).collect(),
        }
    }

    pub fn check(&self, raw: &str) -> Result<(), AppError> {
        match self.forbidden.iter().find(|needle| raw.contains(needle.as_str())) {
            Some(needle) => {
                tracing::warn!("Rejecting CSV containing forbidden content '{}'", needle);
                Err(AppError::InvalidInput(format!(
                    "CSV data containing '{}' is not allowed",
                    needle
                )))
            }
            None => Ok(()),
        }
    }
}
