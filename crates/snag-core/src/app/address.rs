//! address - 作成直後のリソースの public address を bounded polling で待つ
//!
//! address は create の後に非同期で割り当てられます。`max_polls` 回で
//! 出てこなくても取得成功のまま扱い、address は pending として報告します。

use tokio::sync::watch;
use tracing::{debug, warn};

use super::acquisition_loop::shutdown_requested;
use crate::domain::{AddressPolling, ResourceAttributes, ResourceId};
use crate::ports::Allocator;

/// address が分かるか、`max_polls` 回 describe するか、shutdown されるまで待つ
pub async fn await_address(
    allocator: &dyn Allocator,
    resource_id: &ResourceId,
    initial: ResourceAttributes,
    polling: AddressPolling,
    shutdown: &mut watch::Receiver<bool>,
) -> ResourceAttributes {
    let mut attributes = initial;

    for poll in 1..=polling.max_polls {
        if attributes.has_address() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(polling.interval) => {}
            _ = shutdown_requested(shutdown) => {
                warn!(resource = %resource_id, "interrupted while waiting for public address");
                return attributes;
            }
        }

        match allocator.describe_resource(resource_id).await {
            Ok(latest) => {
                debug!(poll, address = ?latest.public_address, "describe");
                attributes = attributes.merge(latest);
            }
            Err(e) => warn!(poll, error = %e, "describe failed"),
        }
    }

    if !attributes.has_address() {
        warn!(
            resource = %resource_id,
            polls = polling.max_polls,
            "public address not assigned yet; reporting it as pending"
        );
    }
    attributes
}
