//! testing - app のテストで共有する ports の scripted fake

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    AcquisitionResult, AllocatorError, FailureReason, NotifyError, PlacementCandidate,
    PlacementScope, ReasonCode, ResourceAttributes, ResourceId, ResourceSpec,
};
use crate::ports::{Allocator, Notifier};

pub(crate) fn out_of_capacity() -> AcquisitionResult {
    AcquisitionResult::TransientFailure(FailureReason::new(
        ReasonCode::OutOfCapacity,
        "Out of host capacity.",
    ))
}

pub(crate) fn limit_exceeded() -> AcquisitionResult {
    AcquisitionResult::FatalFailure(FailureReason::new(
        ReasonCode::LimitExceeded,
        "standard-a1-core-count",
    ))
}

pub(crate) fn created(id: &str) -> AcquisitionResult {
    AcquisitionResult::success(ResourceId::new(id), ResourceAttributes::default())
}

/// Replays create results in order; once the script runs out every create is
/// out of capacity.
pub(crate) struct ScriptedAllocator {
    candidates: Vec<PlacementCandidate>,
    list_error: Mutex<Option<AllocatorError>>,
    creates: Mutex<VecDeque<AcquisitionResult>>,
    describes: Mutex<VecDeque<Result<ResourceAttributes, AllocatorError>>>,
    create_delay: Option<Duration>,
    pub(crate) list_calls: AtomicUsize,
    pub(crate) create_calls: AtomicUsize,
    pub(crate) describe_calls: AtomicUsize,
    tried: Mutex<Vec<PlacementCandidate>>,
}

impl ScriptedAllocator {
    pub(crate) fn new(candidates: &[&str]) -> Self {
        Self {
            candidates: candidates.iter().map(|c| PlacementCandidate::new(*c)).collect(),
            list_error: Mutex::new(None),
            creates: Mutex::new(VecDeque::new()),
            describes: Mutex::new(VecDeque::new()),
            create_delay: None,
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            describe_calls: AtomicUsize::new(0),
            tried: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_creates(self, results: Vec<AcquisitionResult>) -> Self {
        *self.creates.lock().unwrap() = results.into();
        self
    }

    pub(crate) fn with_describes(
        self,
        results: Vec<Result<ResourceAttributes, AllocatorError>>,
    ) -> Self {
        *self.describes.lock().unwrap() = results.into();
        self
    }

    pub(crate) fn with_list_error(self, error: AllocatorError) -> Self {
        *self.list_error.lock().unwrap() = Some(error);
        self
    }

    pub(crate) fn with_create_delay(mut self, delay: Duration) -> Self {
        self.create_delay = Some(delay);
        self
    }

    pub(crate) fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tried(&self) -> Vec<PlacementCandidate> {
        self.tried.lock().unwrap().clone()
    }
}

#[async_trait]
impl Allocator for ScriptedAllocator {
    async fn list_placement_candidates(
        &self,
        _scope: &PlacementScope,
    ) -> Result<Vec<PlacementCandidate>, AllocatorError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.candidates.clone())
    }

    async fn create_resource(
        &self,
        candidate: &PlacementCandidate,
        _spec: &ResourceSpec,
    ) -> AcquisitionResult {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.tried.lock().unwrap().push(candidate.clone());
        if let Some(delay) = self.create_delay {
            tokio::time::sleep(delay).await;
        }
        self.creates
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(out_of_capacity)
    }

    async fn describe_resource(
        &self,
        _id: &ResourceId,
    ) -> Result<ResourceAttributes, AllocatorError> {
        self.describe_calls.fetch_add(1, Ordering::SeqCst);
        self.describes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ResourceAttributes::default()))
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    fail: bool,
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            return Err(NotifyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}
