//! Domain - ドメインモデル
//!
//! - **ids**: ログ相関用 ID（RunId, AttemptId）
//! - **attempt**: 永続化する AttemptState
//! - **candidate / resource / spec**: 何をどこに作るか
//! - **outcome / errors**: 結果と失敗の分類

pub mod attempt;
pub mod candidate;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod resource;
pub mod spec;

pub use attempt::AttemptState;
pub use candidate::PlacementCandidate;
pub use errors::{AllocatorError, ErrorKind, NotifyError, StoreError};
pub use ids::{AttemptId, RunId};
pub use outcome::{AcquisitionResult, FailureReason, Outcome, ReasonCode};
pub use resource::{ResourceAttributes, ResourceId};
pub use spec::{AddressPolling, LoopSettings, PlacementScope, ResourceSpec};
