//! List queries over the stored collections
//!
//! Search, filter, sort and page analyses and market questions, and
//! summarize research activity. Queries borrow the collection and return
//! owned, ordered copies.

mod analyses;
mod collate;
mod metrics;
mod questions;
mod types;

pub use analyses::{AnalysisQuery, AnalysisSortKey, StatusFilter};
pub use collate::locale_cmp;
pub use metrics::{AnalystStats, ResearchMetrics};
pub use questions::{QuestionQuery, QuestionSortKey};
pub use types::QueryResult;
