//! Transfer orchestration and reporting.

mod orchestrator;
pub mod report;

pub use orchestrator::{
    CancellationToken, TransferOptions, TransferService, TransferStage, DESCRIPTION_PREFIX,
    NO_MATCH_REASON,
};
