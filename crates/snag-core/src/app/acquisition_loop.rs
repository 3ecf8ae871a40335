//! AcquisitionLoop - 希少リソースを取れるまで繰り返す retry loop
//!
//! # フロー
//! 1. StateStore から AttemptState を load（無ければゼロ値）
//! 2. `attempts < max_attempts` の間:
//!    - attempts を +1 して save
//!    - 候補を順に create（成功 / fatal で即終了、全部 transient なら次へ）
//!    - retry_interval だけ待つ（shutdown と select）
//! 3. 終了理由を 1 回だけログに出す
//!
//! # 状態
//! searching（初期）→ Acquired / Aborted / ExhaustedAttempts / Cancelled（終端）

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tracing::{Instrument, error, info, info_span, warn};

use super::address::await_address;
use super::message::success_message;
use crate::domain::{
    AcquisitionResult, AttemptState, FailureReason, LoopSettings, Outcome, PlacementCandidate,
    PlacementScope, ReasonCode, ResourceAttributes, ResourceId, ResourceSpec, StoreError,
};
use crate::ports::{Allocator, Clock, IdGenerator, Notifier, StateStore};

/// LoopError は loop を始められなかった時のエラー（CLI は exit 3）
#[derive(Debug, Error)]
pub enum LoopError {
    #[error("failed to load attempt state: {0}")]
    LoadState(#[source] StoreError),
}

/// Result of one pass over the candidates.
#[derive(Debug)]
enum AttemptOutcome {
    Acquired {
        candidate: PlacementCandidate,
        resource_id: ResourceId,
        attributes: ResourceAttributes,
    },
    Fatal(FailureReason),
    /// Every candidate failed transiently; carries the last reason seen.
    Exhausted(FailureReason),
}

/// Resolves once shutdown has been requested; never resolves if the sender is gone.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// AcquisitionLoop は LoopBuilder で組み立てる
///
/// `run` は 1 回だけ呼ぶ想定。終端の Outcome は必ず 1 つ返す。
pub struct AcquisitionLoop {
    pub(super) allocator: Arc<dyn Allocator>,
    pub(super) store: Arc<dyn StateStore>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) ids: Arc<dyn IdGenerator>,
    pub(super) spec: ResourceSpec,
    pub(super) scope: PlacementScope,
    pub(super) settings: LoopSettings,
    pub(super) shutdown: watch::Receiver<bool>,
}

impl AcquisitionLoop {
    pub fn settings(&self) -> &LoopSettings {
        &self.settings
    }

    /// Drive attempts until a terminal outcome.
    ///
    /// Only a failed initial load is an error; everything after that ends in
    /// an `Outcome`.
    pub async fn run(&self) -> Result<Outcome, LoopError> {
        let run_id = self.ids.generate_run_id();
        let outcome = self
            .run_inner()
            .instrument(info_span!("run", run_id = %run_id))
            .await?;
        report(&outcome);
        Ok(outcome)
    }

    async fn run_inner(&self) -> Result<Outcome, LoopError> {
        let mut shutdown = self.shutdown.clone();
        let loaded = self.store.load().await.map_err(LoopError::LoadState)?;

        let mut persisted = loaded.clone();
        let mut state = loaded.unwrap_or_else(|| AttemptState::new(self.clock.now()));

        // 成功済みのレコードがあれば二度目の launch / 通知はしない
        if state.succeeded {
            let Some(id) = state.resource_id.clone() else {
                return Ok(Outcome::Aborted {
                    reason: FailureReason::new(
                        ReasonCode::InvalidRequest,
                        "state file marks success but records no resource id; \
                         remove it to hunt again",
                    ),
                });
            };
            info!(resource = %id, "state file already records an acquired resource");
            return Ok(Outcome::Acquired {
                resource_id: ResourceId::new(id),
                attributes: ResourceAttributes::default(),
            });
        }

        info!(
            attempts = state.attempts,
            max_attempts = self.settings.max_attempts,
            region = %self.scope.region,
            shape = %self.spec.shape,
            "starting acquisition loop"
        );

        loop {
            if *shutdown.borrow() {
                return Ok(self.cancel(&state, &mut persisted).await);
            }
            if state.is_exhausted(self.settings.max_attempts) {
                return Ok(Outcome::ExhaustedAttempts {
                    attempts: state.attempts,
                });
            }

            let attempt = state.begin_attempt(self.clock.now());
            self.persist(&state, &mut persisted).await;

            let attempt_id = self.ids.generate_attempt_id();
            let result = self
                .attempt_once()
                .instrument(info_span!("attempt", attempt, attempt_id = %attempt_id))
                .await;

            match result {
                AttemptOutcome::Acquired {
                    candidate,
                    resource_id,
                    attributes,
                } => {
                    state.mark_succeeded(self.clock.now(), &resource_id);
                    self.persist(&state, &mut persisted).await;
                    info!(
                        attempt,
                        candidate = %candidate,
                        resource = %resource_id,
                        "resource created"
                    );

                    let attributes = await_address(
                        self.allocator.as_ref(),
                        &resource_id,
                        attributes,
                        self.settings.address_polling,
                        &mut shutdown,
                    )
                    .await;

                    let message =
                        success_message(&self.scope, &self.spec, &resource_id, &attributes);
                    if let Err(e) = self.notifier.notify(&message).await {
                        warn!(error = %e, "notification failed");
                    }
                    return Ok(Outcome::Acquired {
                        resource_id,
                        attributes,
                    });
                }
                AttemptOutcome::Fatal(reason) => {
                    state.record_failure(self.clock.now(), &reason);
                    self.persist(&state, &mut persisted).await;
                    return Ok(Outcome::Aborted { reason });
                }
                AttemptOutcome::Exhausted(reason) => {
                    state.record_failure(self.clock.now(), &reason);
                    self.persist(&state, &mut persisted).await;
                }
            }

            if state.is_exhausted(self.settings.max_attempts) {
                continue;
            }

            info!(
                "waiting {}s before next attempt",
                self.settings.retry_interval.as_secs()
            );
            tokio::select! {
                _ = tokio::time::sleep(self.settings.retry_interval) => {}
                _ = shutdown_requested(&mut shutdown) => {
                    return Ok(self.cancel(&state, &mut persisted).await);
                }
            }
        }
    }

    /// One attempt, bounded by `attempt_timeout` when set.
    async fn attempt_once(&self) -> AttemptOutcome {
        let Some(limit) = self.settings.attempt_timeout else {
            return self.try_candidates().await;
        };
        match tokio::time::timeout(limit, self.try_candidates()).await {
            Ok(outcome) => outcome,
            Err(_) => {
                let reason = FailureReason::new(
                    ReasonCode::Timeout,
                    format!("attempt exceeded {}s", limit.as_secs()),
                );
                warn!(code = ?reason.code, "{}", reason.message);
                AttemptOutcome::Exhausted(reason)
            }
        }
    }

    async fn try_candidates(&self) -> AttemptOutcome {
        let candidates = match self.allocator.list_placement_candidates(&self.scope).await {
            Ok(candidates) => candidates,
            Err(e) => {
                let reason = e.reason();
                if reason.code.is_fatal() {
                    error!(
                        code = ?reason.code,
                        "listing placement candidates failed: {}", reason.message
                    );
                    return AttemptOutcome::Fatal(reason);
                }
                warn!(
                    code = ?reason.code,
                    "listing placement candidates failed: {}", reason.message
                );
                return AttemptOutcome::Exhausted(reason);
            }
        };

        let mut last =
            FailureReason::new(ReasonCode::Unknown, "no placement candidates in scope");
        if candidates.is_empty() {
            warn!(region = %self.scope.region, "{}", last.message);
        }

        for candidate in candidates {
            info!("trying {} / {}", self.scope.region, candidate);
            match self.allocator.create_resource(&candidate, &self.spec).await {
                AcquisitionResult::Success {
                    resource_id,
                    attributes,
                } => {
                    return AttemptOutcome::Acquired {
                        candidate,
                        resource_id,
                        attributes,
                    };
                }
                AcquisitionResult::TransientFailure(reason) => {
                    info!(
                        candidate = %candidate,
                        code = ?reason.code,
                        "transient failure: {}", reason.message
                    );
                    last = reason;
                }
                AcquisitionResult::FatalFailure(reason) => {
                    error!(
                        candidate = %candidate,
                        code = ?reason.code,
                        "fatal failure: {}", reason.message
                    );
                    return AttemptOutcome::Fatal(reason);
                }
            }
        }
        AttemptOutcome::Exhausted(last)
    }

    /// Save `state`; on failure keep it in memory and try again next time.
    async fn persist(&self, state: &AttemptState, persisted: &mut Option<AttemptState>) {
        if persisted.as_ref() == Some(state) {
            return;
        }
        match self.store.save(state).await {
            Ok(()) => *persisted = Some(state.clone()),
            Err(e) => warn!(
                attempts = state.attempts,
                error = %e,
                "failed to persist attempt state; will retry"
            ),
        }
    }

    /// 最後に保存できたレコードを返す（一度も保存できていなければ in-memory の値）
    async fn cancel(&self, state: &AttemptState, persisted: &mut Option<AttemptState>) -> Outcome {
        self.persist(state, persisted).await;
        Outcome::Cancelled {
            state: persisted.clone().unwrap_or_else(|| state.clone()),
        }
    }
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Acquired {
            resource_id,
            attributes,
        } => info!(
            resource = %resource_id,
            address = attributes.public_address.as_deref().unwrap_or("pending"),
            "acquired; stopping"
        ),
        Outcome::Aborted { reason } => {
            error!(code = ?reason.code, "aborted: {}", reason.message)
        }
        Outcome::ExhaustedAttempts { attempts } => {
            warn!(attempts, "gave up: attempt cap reached")
        }
        Outcome::Cancelled { state } => {
            info!(attempts = state.attempts, "stopped by user")
        }
    }
}
