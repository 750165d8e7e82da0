// Text measurement and page geometry for generated documents.
// The cover letter renderer wraps every paragraph through these tables.

pub mod font_metrics;

pub use font_metrics::{get_metrics, PageConfig, StandardFont};
