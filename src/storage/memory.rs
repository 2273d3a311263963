//! In-process collection store

use super::traits::{admit_analysis, admit_question, CollectionStore, StorageError, StorageResult};
use crate::model::{
    Analysis, AnalysisId, MarketQuestion, QuestionId, QuestionStatus, ResearchResponse,
};
use std::sync::RwLock;
use tracing::debug;

/// Vec-backed store that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    analyses: RwLock<Vec<Analysis>>,
    questions: RwLock<Vec<MarketQuestion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store preloaded with the demo analyses and questions
    pub fn with_seed_data() -> StorageResult<Self> {
        let store = Self::new();
        super::seed::seed_store(&store)?;
        Ok(store)
    }
}

impl CollectionStore for MemoryStore {
    fn list_analyses(&self) -> StorageResult<Vec<Analysis>> {
        let analyses = self.analyses.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(analyses.clone())
    }

    fn get_analysis(&self, id: &AnalysisId) -> StorageResult<Option<Analysis>> {
        let analyses = self.analyses.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(analyses.iter().find(|a| &a.id == id).cloned())
    }

    fn insert_analysis(&self, analysis: &Analysis) -> StorageResult<()> {
        admit_analysis(analysis)?;
        let mut analyses = self.analyses.write().map_err(|_| StorageError::LockPoisoned)?;
        if analyses.iter().any(|a| a.id == analysis.id) {
            return Err(StorageError::Duplicate(analysis.id.to_string()));
        }
        analyses.push(analysis.clone());
        debug!(id = %analysis.id, total = analyses.len(), "analysis stored");
        Ok(())
    }

    fn list_market_questions(&self) -> StorageResult<Vec<MarketQuestion>> {
        let questions = self.questions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(questions.clone())
    }

    fn get_market_question(&self, id: &QuestionId) -> StorageResult<Option<MarketQuestion>> {
        let questions = self.questions.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(questions.iter().find(|q| &q.id == id).cloned())
    }

    fn insert_market_question(&self, question: &MarketQuestion) -> StorageResult<()> {
        admit_question(question)?;
        let mut questions = self.questions.write().map_err(|_| StorageError::LockPoisoned)?;
        if questions.iter().any(|q| q.id == question.id) {
            return Err(StorageError::Duplicate(question.id.to_string()));
        }
        questions.push(question.clone());
        debug!(id = %question.id, total = questions.len(), "market question stored");
        Ok(())
    }

    fn add_response(
        &self,
        id: &QuestionId,
        response: ResearchResponse,
    ) -> StorageResult<MarketQuestion> {
        let mut questions = self.questions.write().map_err(|_| StorageError::LockPoisoned)?;
        let question = questions
            .iter_mut()
            .find(|q| &q.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        question.add_response(response);
        Ok(question.clone())
    }

    fn set_question_status(
        &self,
        id: &QuestionId,
        status: QuestionStatus,
    ) -> StorageResult<MarketQuestion> {
        let mut questions = self.questions.write().map_err(|_| StorageError::LockPoisoned)?;
        let question = questions
            .iter_mut()
            .find(|q| &q.id == id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        question.status = status;
        debug!(id = %id, status = %status, "market question status updated");
        Ok(question.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalysisStatus, Dashboard, Period, Report};
    use chrono::Utc;

    fn sample_question() -> MarketQuestion {
        MarketQuestion::new(
            "How do deposit costs compare?",
            "Q1 Review",
            Dashboard::IncomeStatement,
            Report::NetInterestMargin,
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_list_preserves_order() {
        let store = MemoryStore::new();
        let a = Analysis::draft("A", "first", Period::Q1_2024);
        let b = Analysis::draft("B", "second", Period::Q2_2024);
        store.insert_analysis(&a).unwrap();
        store.insert_analysis(&b).unwrap();

        let names: Vec<_> = store.list_analyses().unwrap().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(store.get_analysis(&b.id).unwrap().unwrap().name, "B");
    }

    #[test]
    fn test_duplicate_analysis_id_is_rejected() {
        let store = MemoryStore::new();
        let a = Analysis::draft("A", "first", Period::Q1_2024);
        store.insert_analysis(&a).unwrap();
        assert!(matches!(store.insert_analysis(&a), Err(StorageError::Duplicate(_))));
        assert_eq!(store.list_analyses().unwrap().len(), 1);
    }

    #[test]
    fn test_broken_analysis_is_rejected() {
        let store = MemoryStore::new();
        let mut a = Analysis::draft("A", "first", Period::Q1_2024);
        a.status = AnalysisStatus::Completed;
        a.progress = Some(50);
        assert!(matches!(store.insert_analysis(&a), Err(StorageError::Invariant(_))));
    }

    #[test]
    fn test_question_with_foreign_report_is_rejected() {
        let store = MemoryStore::new();
        let mut q = sample_question();
        q.report = Report::NplRatio;
        assert!(matches!(
            store.insert_market_question(&q),
            Err(StorageError::Taxonomy(_))
        ));
        assert!(store.list_market_questions().unwrap().is_empty());
    }

    #[test]
    fn test_add_response_updates_stored_question() {
        let store = MemoryStore::new();
        let q = sample_question();
        store.insert_market_question(&q).unwrap();

        let updated = store
            .add_response(&q.id, ResearchResponse::new("Emma Insights", "Lower than peers."))
            .unwrap();
        assert_eq!(updated.status, QuestionStatus::Answered);
        assert_eq!(store.get_market_question(&q.id).unwrap().unwrap().responses.len(), 1);
    }

    #[test]
    fn test_completed_analysis_without_competitors_is_rejected() {
        let store = MemoryStore::new();
        let a = Analysis::completed("A", "first", Period::Q1_2024, vec![], Utc::now());
        assert!(matches!(store.insert_analysis(&a), Err(StorageError::Invariant(_))));
        assert!(store.list_analyses().unwrap().is_empty());
    }

    #[test]
    fn test_set_question_status_moves_pending_to_in_progress() {
        let store = MemoryStore::new();
        let q = sample_question();
        store.insert_market_question(&q).unwrap();

        let updated = store.set_question_status(&q.id, QuestionStatus::InProgress).unwrap();
        assert_eq!(updated.status, QuestionStatus::InProgress);
        assert_eq!(
            store.get_market_question(&q.id).unwrap().unwrap().status,
            QuestionStatus::InProgress
        );
        assert!(matches!(
            store.set_question_status(&QuestionId::from("nope"), QuestionStatus::Answered),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_response_to_missing_question() {
        let store = MemoryStore::new();
        let result = store.add_response(&QuestionId::from("nope"), ResearchResponse::new("a", "b"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }
}
