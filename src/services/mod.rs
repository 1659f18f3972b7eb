pub mod analysis;
pub mod content_rules;
pub mod csv;
pub mod store;
