//! Search, status filter and sort over analyses

use super::collate::{contains_folded, locale_cmp};
use super::types::QueryResult;
use crate::model::{Analysis, AnalysisStatus};
use std::str::FromStr;
use tracing::debug;

/// Status filter for the analyses list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(AnalysisStatus),
}

impl StatusFilter {
    pub fn admits(self, status: AnalysisStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }
}

/// Sort order for the analyses list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisSortKey {
    /// Most recently created first
    #[default]
    Date,
    /// Alphabetical by name
    Name,
    /// Completed, then in progress, then drafts
    Status,
}

impl FromStr for AnalysisSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "name" => Ok(Self::Name),
            "status" => Ok(Self::Status),
            other => Err(format!("unknown analysis sort key: {}", other)),
        }
    }
}

/// Query over a collection of analyses
///
/// Filtering runs before sorting. Sorting is stable, so analyses that
/// compare equal keep their input order. The input is never modified.
#[derive(Debug, Clone, Default)]
pub struct AnalysisQuery {
    /// Case-insensitive substring matched against name or description
    pub search: String,
    pub status: StatusFilter,
    pub sort: AnalysisSortKey,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl AnalysisQuery {
    /// Create a new empty query (all analyses, newest first)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn sort_by(mut self, key: AnalysisSortKey) -> Self {
        self.sort = key;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Execute the query against a collection
    pub fn execute(&self, analyses: &[Analysis]) -> QueryResult<Analysis> {
        let needle = self.search.to_lowercase();
        let mut matched: Vec<Analysis> = analyses
            .iter()
            .filter(|a| self.matches(a, &needle))
            .cloned()
            .collect();

        match self.sort {
            AnalysisSortKey::Date => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            AnalysisSortKey::Name => matched.sort_by(|a, b| locale_cmp(&a.name, &b.name)),
            AnalysisSortKey::Status => matched.sort_by_key(|a| a.status.rank()),
        }

        debug!(
            search = %self.search,
            sort = ?self.sort,
            input = analyses.len(),
            matched = matched.len(),
            "analysis query executed"
        );
        QueryResult::paged(matched, self.offset, self.limit)
    }

    fn matches(&self, analysis: &Analysis, needle: &str) -> bool {
        if !self.status.admits(analysis.status) {
            return false;
        }
        contains_folded(&analysis.name, needle) || contains_folded(&analysis.description, needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Period;
    use chrono::{Duration, TimeZone, Utc};

    fn analysis(name: &str, description: &str, status: AnalysisStatus, day: u32) -> Analysis {
        let created = Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap();
        let a = Analysis::draft(name, description, Period::Q1_2024).with_created_at(created);
        match status {
            AnalysisStatus::Draft => a,
            AnalysisStatus::InProgress => a.in_progress(40),
            AnalysisStatus::Completed => a.into_completed(),
        }
    }

    fn names(result: &QueryResult<Analysis>) -> Vec<&str> {
        result.items.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_status_sort_orders_completed_first() {
        let items = vec![
            analysis("D", "x", AnalysisStatus::Draft, 1),
            analysis("C", "x", AnalysisStatus::Completed, 2),
            analysis("P", "x", AnalysisStatus::InProgress, 3),
        ];
        let result = AnalysisQuery::new().sort_by(AnalysisSortKey::Status).execute(&items);
        assert_eq!(names(&result), vec!["C", "P", "D"]);
    }

    #[test]
    fn test_status_sort_is_stable_for_ties() {
        let items = vec![
            analysis("draft-1", "x", AnalysisStatus::Draft, 1),
            analysis("done-1", "x", AnalysisStatus::Completed, 2),
            analysis("draft-2", "x", AnalysisStatus::Draft, 3),
            analysis("done-2", "x", AnalysisStatus::Completed, 4),
        ];
        let result = AnalysisQuery::new().sort_by(AnalysisSortKey::Status).execute(&items);
        assert_eq!(names(&result), vec!["done-1", "done-2", "draft-1", "draft-2"]);
    }

    #[test]
    fn test_search_and_status_are_anded() {
        let items = vec![
            analysis("Q1 2024 Analysis", "x", AnalysisStatus::Completed, 1),
            analysis("Q2 Review", "x", AnalysisStatus::Completed, 2),
            analysis("Q1 draft", "x", AnalysisStatus::Draft, 3),
        ];
        let result = AnalysisQuery::new()
            .search("q1")
            .with_status(StatusFilter::Only(AnalysisStatus::Completed))
            .execute(&items);
        assert_eq!(names(&result), vec!["Q1 2024 Analysis"]);
    }

    #[test]
    fn test_search_matches_description() {
        let items = vec![
            analysis("Risk Assessment", "Credit RISK across banks", AnalysisStatus::Draft, 1),
            analysis("Market Share", "Regional growth", AnalysisStatus::Draft, 2),
        ];
        let result = AnalysisQuery::new().search("credit").execute(&items);
        assert_eq!(names(&result), vec!["Risk Assessment"]);
    }

    #[test]
    fn test_empty_search_matches_everything() {
        let items = vec![
            analysis("A", "x", AnalysisStatus::Draft, 1),
            analysis("B", "y", AnalysisStatus::Completed, 2),
        ];
        assert_eq!(AnalysisQuery::new().execute(&items).total_count, 2);
    }

    #[test]
    fn test_date_sort_newest_first() {
        let items = vec![
            analysis("old", "x", AnalysisStatus::Draft, 5),
            analysis("new", "x", AnalysisStatus::Draft, 25),
            analysis("mid", "x", AnalysisStatus::Draft, 15),
        ];
        let result = AnalysisQuery::new().execute(&items);
        assert_eq!(names(&result), vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_date_sort_keeps_input_order_on_equal_timestamps() {
        let mut a = analysis("first", "x", AnalysisStatus::Draft, 5);
        let mut b = analysis("second", "x", AnalysisStatus::Draft, 5);
        b.created_at = a.created_at;
        a.created_at += Duration::zero();
        let result = AnalysisQuery::new().execute(&[a, b]);
        assert_eq!(names(&result), vec!["first", "second"]);
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let items = vec![
            analysis("market share", "x", AnalysisStatus::Draft, 1),
            analysis("Digital Banking", "x", AnalysisStatus::Draft, 2),
            analysis("Risk", "x", AnalysisStatus::Draft, 3),
        ];
        let result = AnalysisQuery::new().sort_by(AnalysisSortKey::Name).execute(&items);
        assert_eq!(names(&result), vec!["Digital Banking", "market share", "Risk"]);
    }

    #[test]
    fn test_query_is_idempotent_and_leaves_input_untouched() {
        let items = vec![
            analysis("B", "x", AnalysisStatus::Draft, 1),
            analysis("A", "x", AnalysisStatus::Completed, 2),
        ];
        let before = items.clone();
        let query = AnalysisQuery::new().sort_by(AnalysisSortKey::Name);

        let first = query.execute(&items);
        let second = query.execute(&items);
        assert_eq!(first, second);
        assert_eq!(items, before);
    }

    #[test]
    fn test_pagination_after_sort() {
        let items: Vec<_> = (1..=5)
            .map(|d| analysis(&format!("day-{}", d), "x", AnalysisStatus::Draft, d))
            .collect();
        let result = AnalysisQuery::new().offset(1).limit(2).execute(&items);
        assert_eq!(names(&result), vec!["day-4", "day-3"]);
        assert_eq!(result.total_count, 5);
    }

    #[test]
    fn test_parse_filter_and_sort_key() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "in-progress".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(AnalysisStatus::InProgress)
        );
        assert!("archived".parse::<StatusFilter>().is_err());
        assert_eq!("name".parse::<AnalysisSortKey>().unwrap(), AnalysisSortKey::Name);
        assert!("size".parse::<AnalysisSortKey>().is_err());
    }
}
