//! Analysis generation pipeline
//!
//! Readiness gating, the fixed stage table, the orchestrator state machine
//! and the sessions that feed it.

pub mod clock;
mod orchestrator;
pub mod readiness;
mod session;
mod stage;

pub use clock::{InstantClock, StageClock, TokioClock};
pub use orchestrator::{
    GenerationError, GenerationOrchestrator, GenerationOutcome, PipelineState,
    DEFAULT_STAGE_DELAY,
};
pub use readiness::{check_readiness, is_ready, missing_requirements};
pub use session::{GenerationTicket, SessionId, SessionRegistry};
pub use stage::{progress_after, Stage};
pub use tokio_util::sync::CancellationToken;
