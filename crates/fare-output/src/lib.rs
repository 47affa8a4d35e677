#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/farepipe/fare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod report;
pub mod summary;

pub use export::{ExportError, ExportFormat, Exporter};
pub use report::{DataSummaryReport, MeanShift, ReportError};
pub use summary::{
    CategoricalSummary, ColumnStats, ColumnSummary, DataDefinition, DatasetSummary,
    NumericalSummary, summarize,
};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
