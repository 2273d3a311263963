//! Domain model: analyses, construction state and market questions

mod analysis;
mod construction;
mod correction;
mod question;

pub use analysis::{Analysis, AnalysisId, AnalysisStatus, Period};
pub use construction::{
    Competitor, ConstructionState, DataWarehouse, DocumentHandle, ValidationError,
};
pub use correction::{Correction, CorrectionDraft, CorrectionError, PageSelection};
pub use question::{
    Dashboard, MarketQuestion, QuestionDraft, QuestionError, QuestionId, QuestionStatus, Report,
    ResearchResponse, TaxonomyError,
};
