//! Search and sort over market questions

use super::collate::{contains_folded, locale_cmp};
use super::types::QueryResult;
use crate::model::MarketQuestion;
use std::str::FromStr;
use tracing::debug;

/// Sort order for the questions list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionSortKey {
    /// Most recently asked first
    #[default]
    Date,
    /// Pending, in progress, answered, then drafts
    Status,
    /// Alphabetical by analysis name
    Analysis,
}

impl FromStr for QuestionSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(Self::Date),
            "status" => Ok(Self::Status),
            "analysis" => Ok(Self::Analysis),
            other => Err(format!("unknown question sort key: {}", other)),
        }
    }
}

/// Query over a collection of market questions
///
/// The search text is matched against the question, its analysis name and
/// its report label. There is no status filter on this list.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    pub search: String,
    pub sort: QuestionSortKey,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QuestionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = text.into();
        self
    }

    pub fn sort_by(mut self, key: QuestionSortKey) -> Self {
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

    pub fn execute(&self, questions: &[MarketQuestion]) -> QueryResult<MarketQuestion> {
        let needle = self.search.to_lowercase();
        let mut matched: Vec<MarketQuestion> = questions
            .iter()
            .filter(|q| Self::matches(q, &needle))
            .cloned()
            .collect();

        match self.sort {
            QuestionSortKey::Date => matched.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            QuestionSortKey::Status => matched.sort_by_key(|q| q.status.rank()),
            QuestionSortKey::Analysis => {
                matched.sort_by(|a, b| locale_cmp(&a.analysis_name, &b.analysis_name))
            }
        }

        debug!(
            search = %self.search,
            sort = ?self.sort,
            input = questions.len(),
            matched = matched.len(),
            "question query executed"
        );
        QueryResult::paged(matched, self.offset, self.limit)
    }

    fn matches(question: &MarketQuestion, needle: &str) -> bool {
        contains_folded(&question.question, needle)
            || contains_folded(&question.analysis_name, needle)
            || contains_folded(question.report.label(), needle)
    }
}
