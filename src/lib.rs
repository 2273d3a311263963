//! PeerLens: comparative bank analysis core
//!
//! Builds named analyses of a bank against its competitors, runs the staged
//! generation pipeline over them, and serves the stored analyses and
//! research questions back through search, filter and sort queries.
//!
//! # Core Concepts
//!
//! - **Construction state**: the form a user fills in before generating
//! - **Readiness**: the gate that decides whether generation may start
//! - **Orchestrator**: runs the seven stages and emits a completed analysis
//! - **Collection store**: where analyses and market questions live
//!
//! # Example
//!
//! ```
//! use peerlens::{AnalysisQuery, CollectionStore, MemoryStore};
//!
//! let store = MemoryStore::with_seed_data().unwrap();
//! let analyses = store.list_analyses().unwrap();
//! let page = AnalysisQuery::new().search("risk").execute(&analyses);
//! assert_eq!(page.total_count, 1);
//! ```

pub mod config;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod storage;

pub use config::{Config, ConfigError};
pub use model::{
    Analysis, AnalysisId, AnalysisStatus, Competitor, ConstructionState, Correction,
    CorrectionDraft, CorrectionError, Dashboard, DataWarehouse, DocumentHandle, MarketQuestion,
    PageSelection, Period, QuestionDraft, QuestionError, QuestionId, QuestionStatus, Report,
    ResearchResponse, TaxonomyError, ValidationError,
};
pub use pipeline::{
    check_readiness, is_ready, missing_requirements, CancellationToken, GenerationError,
    GenerationOrchestrator, GenerationOutcome, PipelineState, SessionId, SessionRegistry, Stage,
};
pub use query::{
    AnalysisQuery, AnalysisSortKey, AnalystStats, QueryResult, QuestionQuery, QuestionSortKey,
    ResearchMetrics, StatusFilter,
};
pub use storage::{
    seed_store, CollectionStore, MemoryStore, OpenStore, SqliteStore, StorageError, StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
