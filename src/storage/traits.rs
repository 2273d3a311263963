//! Storage trait definitions

use crate::model::{
    Analysis, AnalysisId, MarketQuestion, QuestionId, QuestionStatus, ResearchResponse,
    TaxonomyError,
};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate id: {0}")]
    Duplicate(String),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Invalid taxonomy: {0}")]
    Taxonomy(#[from] TaxonomyError),

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The collections behind the dashboard views
///
/// Lists come back in insertion order; callers sort through the query
/// engine. Implementations must be thread-safe (Send + Sync) so a
/// generation run and a list view can share one store.
pub trait CollectionStore: Send + Sync {
    // === Analyses ===

    /// All analyses, in insertion order
    fn list_analyses(&self) -> StorageResult<Vec<Analysis>>;

    fn get_analysis(&self, id: &AnalysisId) -> StorageResult<Option<Analysis>>;

    /// Append an analysis. Rejects duplicate ids and broken invariants.
    fn insert_analysis(&self, analysis: &Analysis) -> StorageResult<()>;

    // === Market questions ===

    /// All market questions, in insertion order
    fn list_market_questions(&self) -> StorageResult<Vec<MarketQuestion>>;

    fn get_market_question(&self, id: &QuestionId) -> StorageResult<Option<MarketQuestion>>;

    /// Append a question. Rejects duplicate ids and reports outside the
    /// question's dashboard.
    fn insert_market_question(&self, question: &MarketQuestion) -> StorageResult<()>;

    /// Attach an analyst response, returning the updated question
    fn add_response(
        &self,
        id: &QuestionId,
        response: ResearchResponse,
    ) -> StorageResult<MarketQuestion>;

    /// Move a question to `status` (e.g. pending to in-progress when an
    /// analyst picks it up), returning the updated question
    fn set_question_status(
        &self,
        id: &QuestionId,
        status: QuestionStatus,
    ) -> StorageResult<MarketQuestion>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CollectionStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Gate applied by every store before an analysis is appended
pub(crate) fn admit_analysis(analysis: &Analysis) -> StorageResult<()> {
    analysis.check_invariants().map_err(StorageError::Invariant)
}

/// Gate applied by every store before a question is appended
pub(crate) fn admit_question(question: &MarketQuestion) -> StorageResult<()> {
    if question.question.trim().is_empty() {
        return Err(StorageError::Invariant(format!(
            "question {} has no text",
            question.id
        )));
    }
    question.check_taxonomy()?;
    Ok(())
}
